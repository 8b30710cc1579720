//! Login / sign-up page controller.

use crate::app::context::AppContext;
use crate::app::messages;
use crate::app::routes::Route;
use crate::auth::identity::{AuthError, FederatedCredential};
use crate::service::account_service::AccountError;
use crate::state::modal_store::ModalRequest;
use crate::util::lock;
use crate::validation::{validate_email, ValidationError};
use log::warn;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginMode {
    #[default]
    SignIn,
    SignUp,
}

impl LoginMode {
    fn toggled(self) -> Self {
        match self {
            Self::SignIn => Self::SignUp,
            Self::SignUp => Self::SignIn,
        }
    }
}

/// Result of a submit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was sent: inline errors, empty fields or a request in flight.
    Rejected,
    /// Signed in (or signed up) and moved to the memo page.
    SignedIn,
    /// The attempt failed and a dialog explains why.
    DialogShown,
}

#[derive(Debug, Default)]
struct LoginForm {
    mode: LoginMode,
    email: String,
    password: String,
    nickname: String,
    loading: bool,
}

pub struct LoginPage {
    ctx: Arc<AppContext>,
    form: Arc<Mutex<LoginForm>>,
}

impl LoginPage {
    /// Mounts the page; any dialog left over from another page is closed.
    pub fn mount(ctx: Arc<AppContext>) -> Self {
        ctx.modal().close();
        Self {
            ctx,
            form: Arc::new(Mutex::new(LoginForm::default())),
        }
    }

    pub fn mode(&self) -> LoginMode {
        lock(&self.form).mode
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.form).loading
    }

    pub fn set_email(&self, email: &str) {
        lock(&self.form).email = email.to_string();
    }

    pub fn set_password(&self, password: &str) {
        lock(&self.form).password = password.to_string();
    }

    pub fn set_nickname(&self, nickname: &str) {
        lock(&self.form).nickname = nickname.to_string();
    }

    /// Inline e-mail error; empty input shows none.
    pub fn email_error(&self) -> Option<ValidationError> {
        let form = lock(&self.form);
        let email = form.email.trim();
        if email.is_empty() {
            return None;
        }
        validate_email(email).err()
    }

    /// Inline password error; empty input shows none.
    pub fn password_error(&self) -> Option<ValidationError> {
        let form = lock(&self.form);
        if form.password.is_empty() {
            return None;
        }
        self.ctx
            .accounts()
            .rules()
            .validate_password(&form.password)
            .err()
    }

    /// Inline nickname error in sign-up mode; blank input shows none.
    pub fn nickname_error(&self) -> Option<ValidationError> {
        let form = lock(&self.form);
        if form.mode != LoginMode::SignUp || form.nickname.trim().is_empty() {
            return None;
        }
        self.ctx
            .accounts()
            .rules()
            .validate_nickname(&form.nickname)
            .err()
    }

    pub fn switch_mode(&self) {
        {
            let mut form = lock(&self.form);
            form.mode = form.mode.toggled();
        }
        self.ctx.modal().close();
    }

    pub fn submit(&self) -> SubmitOutcome {
        if self.email_error().is_some()
            || self.password_error().is_some()
            || self.nickname_error().is_some()
        {
            return SubmitOutcome::Rejected;
        }
        let (mode, email, password, nickname) = {
            let mut form = lock(&self.form);
            let email = form.email.trim().to_string();
            if form.loading || email.is_empty() || form.password.is_empty() {
                return SubmitOutcome::Rejected;
            }
            form.loading = true;
            (form.mode, email, form.password.clone(), form.nickname.clone())
        };

        let outcome = match mode {
            LoginMode::SignIn => self.sign_in(&email, &password),
            LoginMode::SignUp => self.sign_up(&email, &password, &nickname),
        };
        lock(&self.form).loading = false;
        outcome
    }

    pub fn sign_in_with_google(&self, credential: &FederatedCredential) -> SubmitOutcome {
        {
            let mut form = lock(&self.form);
            if form.loading {
                return SubmitOutcome::Rejected;
            }
            form.loading = true;
        }

        let outcome = match self.ctx.accounts().sign_in_with_google(credential) {
            Ok(_) => {
                self.ctx.navigate(Route::Memo);
                SubmitOutcome::SignedIn
            }
            Err(err) => {
                log_failure("google_sign_in", &err);
                self.ctx.modal().open(ModalRequest::error(
                    messages::TITLE_GOOGLE_SIGN_IN_FAILED,
                    messages::GENERIC_RETRY,
                ));
                SubmitOutcome::DialogShown
            }
        };
        lock(&self.form).loading = false;
        outcome
    }

    fn sign_in(&self, email: &str, password: &str) -> SubmitOutcome {
        match self.ctx.accounts().sign_in(email, password) {
            Ok(_) => {
                self.ctx.navigate(Route::Memo);
                SubmitOutcome::SignedIn
            }
            Err(AccountError::Validation(_)) => SubmitOutcome::Rejected,
            Err(err) => {
                log_failure("sign_in", &err);
                self.show_sign_in_failure(email, &err);
                SubmitOutcome::DialogShown
            }
        }
    }

    fn show_sign_in_failure(&self, email: &str, err: &AccountError) {
        let modal = self.ctx.modal();
        match err {
            AccountError::Auth(AuthError::UserNotFound) => {
                let ctx = Arc::downgrade(&self.ctx);
                let form = Arc::downgrade(&self.form);
                modal.open(
                    ModalRequest::confirm(
                        messages::TITLE_ACCOUNT_NOT_FOUND,
                        messages::account_not_found(email),
                    )
                    .primary_label(messages::LABEL_SIGN_UP)
                    .secondary_label(messages::LABEL_CANCEL)
                    .on_primary(move || {
                        if let Some(form) = form.upgrade() {
                            lock(&form).mode = LoginMode::SignUp;
                        }
                        if let Some(ctx) = ctx.upgrade() {
                            ctx.modal().close();
                        }
                    }),
                );
            }
            AccountError::Auth(auth) if auth.is_credential_mismatch() => {
                modal.open(
                    ModalRequest::error(messages::TITLE_SIGN_IN_FAILED, messages::wrong_password())
                        .primary_label(messages::LABEL_RETRY),
                );
                let seconds = self.ctx.config().auto_close_countdown_seconds;
                if let Err(err) = modal.start_countdown(seconds, || {}) {
                    warn!("event=modal_countdown module=app status=error error={err}");
                }
            }
            _ => {
                modal.open(
                    ModalRequest::error(messages::TITLE_SIGN_IN_FAILED, messages::GENERIC_RETRY)
                        .primary_label(messages::LABEL_RETRY),
                );
            }
        }
    }

    fn sign_up(&self, email: &str, password: &str, nickname: &str) -> SubmitOutcome {
        match self.ctx.accounts().sign_up(email, password, nickname) {
            Ok(_) => {
                // The session started before the nickname was stored.
                self.ctx.auth().refresh();
                self.ctx.navigate(Route::Memo);
                SubmitOutcome::SignedIn
            }
            Err(AccountError::Validation(_)) => SubmitOutcome::Rejected,
            Err(err) => {
                log_failure("sign_up", &err);
                self.ctx.modal().open(ModalRequest::error(
                    messages::TITLE_ERROR,
                    messages::CONNECTION_ERROR,
                ));
                SubmitOutcome::DialogShown
            }
        }
    }
}

fn log_failure(event: &str, err: &AccountError) {
    warn!(
        "event={event} module=app status=error error_code={}",
        err.auth_code().unwrap_or("remote")
    );
}
