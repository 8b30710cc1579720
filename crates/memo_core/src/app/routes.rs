//! Route table and auth guards.

use crate::state::auth_store::AuthSnapshot;
use crate::util::lock;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Route {
    /// Login / sign-up.
    #[default]
    Home,
    Memo,
    Profile,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Memo => "/memo",
            Self::Profile => "/profile",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/" => Some(Self::Home),
            "/memo" => Some(Self::Memo),
            "/profile" => Some(Self::Profile),
            _ => None,
        }
    }

    pub fn requires_auth(self) -> bool {
        !matches!(self, Self::Home)
    }
}

/// Outcome of resolving a requested route against the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteResolution {
    /// Session state not known yet; nothing renders.
    Loading,
    Render(Route),
    Redirect(Route),
}

impl RouteResolution {
    /// The route that ends up on screen, if any.
    pub fn target(self) -> Option<Route> {
        match self {
            Self::Loading => None,
            Self::Render(route) | Self::Redirect(route) => Some(route),
        }
    }
}

/// Signed-in users skip the login page; anonymous users only see it.
pub fn resolve_route(requested: Route, auth: &AuthSnapshot) -> RouteResolution {
    if auth.loading {
        return RouteResolution::Loading;
    }
    match (requested, auth.is_signed_in()) {
        (Route::Home, true) => RouteResolution::Redirect(Route::Memo),
        (route, false) if route.requires_auth() => RouteResolution::Redirect(Route::Home),
        (route, _) => RouteResolution::Render(route),
    }
}

/// Current location of the app.
#[derive(Debug, Default)]
pub struct Navigator {
    current: Mutex<Route>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Route {
        *lock(&self.current)
    }

    /// Resolves `requested` and moves there when something renders.
    pub fn navigate(&self, requested: Route, auth: &AuthSnapshot) -> RouteResolution {
        let resolution = resolve_route(requested, auth);
        if let Some(route) = resolution.target() {
            *lock(&self.current) = route;
        }
        resolution
    }
}
