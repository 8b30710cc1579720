//! Single-slot modal dialog state with an auto-close countdown.
//!
//! # Responsibility
//! - Hold the one active dialog configuration.
//! - Drive the auto-close countdown on the tokio runtime.
//!
//! # Invariants
//! - `open` replaces the whole configuration; nothing of the previous
//!   dialog survives.
//! - `open`, `close` and `start_countdown` cancel any running countdown, so
//!   at most one countdown task exists.
//! - The countdown decrements once per second down to zero; when the full
//!   duration has elapsed it runs `on_expire` once, then closes the dialog
//!   unless `on_expire` opened another one.
//! - Callbacks run without the store lock held.

use crate::state::countdown::CountdownTask;
use crate::util::lock;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{sleep_until, Instant};

/// Callback bound to the dialog's primary button.
pub type ModalAction = Arc<dyn Fn() + Send + Sync>;

/// Severity/kind tag of a dialog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModalKind {
    #[default]
    Info,
    Error,
    Confirm,
    Success,
}

impl ModalKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Error => "error",
            Self::Confirm => "confirm",
            Self::Success => "success",
        }
    }
}

#[derive(Debug)]
pub enum ModalError {
    /// `start_countdown` was called outside a tokio runtime.
    NoRuntime,
}

impl Display for ModalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRuntime => write!(f, "countdown requires a running tokio runtime"),
        }
    }
}

impl Error for ModalError {}

/// Full configuration of a dialog to open.
#[derive(Clone, Default)]
pub struct ModalRequest {
    pub title: String,
    pub message: String,
    pub kind: ModalKind,
    pub primary_label: Option<String>,
    pub secondary_label: Option<String>,
    pub on_primary: Option<ModalAction>,
}

impl ModalRequest {
    pub fn new(kind: ModalKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            ..Self::default()
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ModalKind::Error, title, message)
    }

    pub fn confirm(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ModalKind::Confirm, title, message)
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ModalKind::Success, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ModalKind::Info, title, message)
    }

    pub fn primary_label(mut self, label: impl Into<String>) -> Self {
        self.primary_label = Some(label.into());
        self
    }

    pub fn secondary_label(mut self, label: impl Into<String>) -> Self {
        self.secondary_label = Some(label.into());
        self
    }

    pub fn on_primary(mut self, action: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_primary = Some(Arc::new(action));
        self
    }
}

impl std::fmt::Debug for ModalRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalRequest")
            .field("title", &self.title)
            .field("kind", &self.kind)
            .field("primary_label", &self.primary_label)
            .field("secondary_label", &self.secondary_label)
            .field("has_primary_action", &self.on_primary.is_some())
            .finish()
    }
}

/// Render-ready view of the dialog slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalView {
    pub open: bool,
    pub title: String,
    pub message: String,
    pub kind: ModalKind,
    pub primary_label: Option<String>,
    pub secondary_label: Option<String>,
    pub has_primary_action: bool,
    /// Seconds left before auto-close, while a countdown is shown.
    pub countdown: Option<u32>,
}

#[derive(Default)]
struct ModalState {
    view: ModalView,
    on_primary: Option<ModalAction>,
    /// Bumped on every open/close/countdown start; a countdown only acts
    /// while the generation it was started in is current.
    generation: u64,
    timer: Option<CountdownTask>,
}

impl ModalState {
    fn reset(&mut self) {
        self.generation += 1;
        self.timer = None;
        self.view = ModalView::default();
        self.on_primary = None;
    }
}

struct ModalInner {
    state: Mutex<ModalState>,
}

/// Shared handle to the dialog slot; clones address the same slot.
#[derive(Clone)]
pub struct ModalStore {
    inner: Arc<ModalInner>,
}

impl Default for ModalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ModalStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ModalInner {
                state: Mutex::new(ModalState::default()),
            }),
        }
    }

    /// Replaces the dialog configuration and shows it.
    pub fn open(&self, request: ModalRequest) {
        let replaced = {
            let mut state = lock(&self.inner.state);
            state.generation += 1;
            let timer = state.timer.take();
            let action = state.on_primary.take();
            state.view = ModalView {
                open: true,
                title: request.title,
                message: request.message,
                kind: request.kind,
                primary_label: request.primary_label,
                secondary_label: request.secondary_label,
                has_primary_action: request.on_primary.is_some(),
                countdown: None,
            };
            state.on_primary = request.on_primary;
            (timer, action)
        };
        drop(replaced);
        debug!("event=modal_open module=state status=ok");
    }

    /// Cancels any countdown and resets to the closed default.
    pub fn close(&self) {
        let (timer, action) = {
            let mut state = lock(&self.inner.state);
            let timer = state.timer.take();
            let action = state.on_primary.take();
            state.reset();
            (timer, action)
        };
        // Dropped outside the lock: the action may own store handles.
        drop(timer);
        drop(action);
    }

    /// Starts the auto-close countdown for the current dialog.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_countdown(
        &self,
        seconds: u32,
        on_expire: impl FnOnce() + Send + 'static,
    ) -> Result<(), ModalError> {
        let runtime = Handle::try_current().map_err(|_| ModalError::NoRuntime)?;

        let (generation, previous) = {
            let mut state = lock(&self.inner.state);
            state.generation += 1;
            state.view.countdown = Some(seconds);
            (state.generation, state.timer.take())
        };
        drop(previous);

        let task = runtime.spawn(run_countdown(
            Arc::downgrade(&self.inner),
            generation,
            seconds,
            on_expire,
        ));

        let mut state = lock(&self.inner.state);
        if state.generation == generation {
            state.timer = Some(CountdownTask::new(task));
        } else {
            // Already superseded (zero-length countdown or a racing open).
            drop(state);
            CountdownTask::new(task).detach();
        }
        info!("event=modal_countdown module=state status=start seconds={seconds}");
        Ok(())
    }

    pub fn view(&self) -> ModalView {
        lock(&self.inner.state).view.clone()
    }

    pub fn is_open(&self) -> bool {
        lock(&self.inner.state).view.open
    }

    pub fn countdown(&self) -> Option<u32> {
        lock(&self.inner.state).view.countdown
    }

    pub fn has_active_timer(&self) -> bool {
        lock(&self.inner.state)
            .timer
            .as_ref()
            .is_some_and(CountdownTask::is_active)
    }

    /// Current primary callback, if the dialog configured one.
    pub fn primary_action(&self) -> Option<ModalAction> {
        lock(&self.inner.state).on_primary.clone()
    }

    /// Presses the primary button: runs the callback, or closes the dialog
    /// when none is configured.
    pub fn trigger_primary(&self) {
        match self.primary_action() {
            Some(action) => action(),
            None => self.close(),
        }
    }

    /// Presses the secondary button, which always dismisses.
    pub fn trigger_secondary(&self) {
        self.close();
    }

    fn close_if_current(&self, generation: u64) {
        let current = lock(&self.inner.state).generation == generation;
        if current {
            self.close();
        }
    }
}

async fn run_countdown(
    inner: Weak<ModalInner>,
    generation: u64,
    seconds: u32,
    on_expire: impl FnOnce() + Send + 'static,
) {
    let started = Instant::now();
    for elapsed in 1..=seconds {
        sleep_until(started + Duration::from_secs(u64::from(elapsed))).await;
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let mut state = lock(&inner.state);
        if state.generation != generation {
            return;
        }
        state.view.countdown = Some(seconds - elapsed);
    }

    let Some(inner) = inner.upgrade() else {
        return;
    };
    {
        let mut state = lock(&inner.state);
        if state.generation != generation {
            return;
        }
        if let Some(timer) = state.timer.take() {
            timer.detach();
        }
    }

    on_expire();
    let store = ModalStore { inner };
    store.close_if_current(generation);
    debug!("event=modal_countdown module=state status=ok");
}
