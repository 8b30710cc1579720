//! Profile page controller: nickname, password, sign-out, deletion.

use crate::app::context::AppContext;
use crate::app::messages;
use crate::app::pages::PageError;
use crate::app::routes::Route;
use crate::model::user::UserIdentity;
use crate::service::memo_service::MemoScope;
use crate::state::modal_store::ModalRequest;
use crate::util::lock;
use log::warn;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct ProfileForm {
    nickname: String,
    profile_loading: bool,
    updating_nickname: bool,
    show_password_form: bool,
    new_password: String,
    updating_password: bool,
}

pub struct ProfilePage {
    ctx: Arc<AppContext>,
    user: Arc<UserIdentity>,
    form: Mutex<ProfileForm>,
}

impl ProfilePage {
    /// Mounts the page and loads the stored nickname.
    pub fn mount(ctx: Arc<AppContext>) -> Result<Self, PageError> {
        let user = ctx.auth().current_user().ok_or(PageError::NotSignedIn)?;
        let page = Self {
            form: Mutex::new(ProfileForm {
                nickname: user.display_name.clone().unwrap_or_default(),
                profile_loading: true,
                ..ProfileForm::default()
            }),
            ctx,
            user,
        };
        page.load_profile();
        Ok(page)
    }

    fn load_profile(&self) {
        let stored = match self.ctx.accounts().load_profile(&self.user) {
            Ok(profile) => profile.map(|profile| profile.nickname),
            Err(err) => {
                warn!("event=profile_page_load module=app status=error error={err}");
                None
            }
        };
        let mut form = lock(&self.form);
        if let Some(nickname) = stored {
            form.nickname = nickname;
        }
        form.profile_loading = false;
    }

    pub fn user(&self) -> &UserIdentity {
        &self.user
    }

    pub fn is_profile_loading(&self) -> bool {
        lock(&self.form).profile_loading
    }

    pub fn is_google_user(&self) -> bool {
        !self.user.is_password_user()
    }

    /// Federated accounts have no password to change.
    pub fn password_form_available(&self) -> bool {
        self.user.is_password_user()
    }

    pub fn nickname(&self) -> String {
        lock(&self.form).nickname.clone()
    }

    pub fn set_nickname(&self, nickname: &str) {
        lock(&self.form).nickname = nickname.to_string();
    }

    pub fn is_updating_nickname(&self) -> bool {
        lock(&self.form).updating_nickname
    }

    /// Saves the nickname to the identity and the profile document.
    pub fn update_nickname(&self) -> bool {
        let nickname = {
            let mut form = lock(&self.form);
            let valid = self
                .ctx
                .accounts()
                .rules()
                .validate_nickname(&form.nickname)
                .is_ok();
            if form.updating_nickname || !valid {
                return false;
            }
            form.updating_nickname = true;
            form.nickname.clone()
        };

        let result = self.ctx.accounts().update_nickname(&self.user, &nickname);
        let mut form = lock(&self.form);
        form.updating_nickname = false;
        match result {
            Ok(trimmed) => {
                form.nickname = trimmed.clone();
                drop(form);
                self.ctx.auth().refresh();
                self.ctx.modal().open(ModalRequest::success(
                    messages::TITLE_CHANGED,
                    messages::nickname_changed(&trimmed),
                ));
                true
            }
            Err(err) => {
                drop(form);
                warn!("event=profile_page_nickname module=app status=error error={err}");
                self.ctx.modal().open(ModalRequest::error(
                    messages::TITLE_CHANGE_FAILED,
                    messages::PROFILE_UPDATE_FAILED,
                ));
                false
            }
        }
    }

    pub fn is_password_form_visible(&self) -> bool {
        lock(&self.form).show_password_form
    }

    pub fn toggle_password_form(&self) {
        if !self.password_form_available() {
            return;
        }
        let mut form = lock(&self.form);
        form.show_password_form = !form.show_password_form;
    }

    pub fn set_new_password(&self, password: &str) {
        lock(&self.form).new_password = password.to_string();
    }

    pub fn is_updating_password(&self) -> bool {
        lock(&self.form).updating_password
    }

    /// Changes the password. A too-short password is reported in a dialog.
    pub fn update_password(&self) -> bool {
        let password = {
            let mut form = lock(&self.form);
            if form.updating_password {
                return false;
            }
            if let Err(err) = self
                .ctx
                .accounts()
                .rules()
                .validate_password(&form.new_password)
            {
                drop(form);
                self.ctx.modal().open(ModalRequest::error(
                    messages::TITLE_PASSWORD_ERROR,
                    err.to_string(),
                ));
                return false;
            }
            form.updating_password = true;
            form.new_password.clone()
        };

        let result = self.ctx.accounts().update_password(&self.user, &password);
        let mut form = lock(&self.form);
        form.updating_password = false;
        match result {
            Ok(()) => {
                form.new_password.clear();
                form.show_password_form = false;
                drop(form);
                self.ctx.modal().open(ModalRequest::success(
                    messages::TITLE_CHANGED,
                    messages::PASSWORD_CHANGED,
                ));
                true
            }
            Err(err) if err.requires_recent_login() => {
                drop(form);
                let ctx = Arc::downgrade(&self.ctx);
                self.ctx.modal().open(
                    ModalRequest::error(
                        messages::TITLE_REAUTH_REQUIRED,
                        messages::REQUIRES_RECENT_LOGIN,
                    )
                    .primary_label(messages::LABEL_SIGN_OUT)
                    .on_primary(move || {
                        if let Some(ctx) = ctx.upgrade() {
                            sign_out_and_leave(&ctx);
                        }
                    }),
                );
                false
            }
            Err(err) => {
                drop(form);
                warn!("event=profile_page_password module=app status=error error={err}");
                self.ctx.modal().open(ModalRequest::error(
                    messages::TITLE_CHANGE_FAILED,
                    messages::PASSWORD_CHANGE_FAILED,
                ));
                false
            }
        }
    }

    /// Asks for confirmation, then signs out.
    pub fn request_logout(&self) {
        let ctx = Arc::downgrade(&self.ctx);
        let scope = MemoScope::for_user(&self.user);
        self.ctx.modal().open(
            ModalRequest::confirm(messages::TITLE_SIGN_OUT, messages::CONFIRM_SIGN_OUT)
                .primary_label(messages::LABEL_SIGN_OUT)
                .secondary_label(messages::LABEL_CANCEL)
                .on_primary(move || {
                    let Some(ctx) = ctx.upgrade() else {
                        return;
                    };
                    match ctx.accounts().sign_out() {
                        Ok(()) => {
                            ctx.memos().forget(&scope);
                            ctx.modal().close();
                            ctx.navigate(Route::Home);
                        }
                        Err(err) => {
                            warn!("event=profile_page_logout module=app status=error error={err}");
                            ctx.modal().open(ModalRequest::error(
                                messages::TITLE_ERROR,
                                messages::LOGOUT_FAILED,
                            ));
                        }
                    }
                }),
        );
    }

    /// Asks for confirmation, then deletes all data and the account.
    pub fn request_delete_account(&self) {
        let ctx = Arc::downgrade(&self.ctx);
        let user = Arc::clone(&self.user);
        self.ctx.modal().open(
            ModalRequest::confirm(
                messages::TITLE_DELETE_ACCOUNT,
                messages::CONFIRM_DELETE_ACCOUNT,
            )
            .primary_label(messages::LABEL_DELETE_ACCOUNT)
            .secondary_label(messages::LABEL_CANCEL)
            .on_primary(move || {
                if let Some(ctx) = ctx.upgrade() {
                    delete_account_confirmed(&ctx, &user);
                }
            }),
        );
    }
}

fn delete_account_confirmed(ctx: &Arc<AppContext>, user: &UserIdentity) {
    ctx.modal().open(
        ModalRequest::info(messages::TITLE_DELETING_ACCOUNT, messages::DELETING_ACCOUNT)
            .primary_label(messages::LABEL_PROCESSING),
    );

    match ctx.accounts().delete_account(user) {
        Ok(()) => {
            ctx.memos().forget(&MemoScope::for_user(user));
            ctx.modal().close();
            ctx.navigate(Route::Home);
        }
        Err(err) if err.requires_recent_login() => {
            let weak = Arc::downgrade(ctx);
            ctx.modal().open(
                ModalRequest::error(
                    messages::TITLE_REAUTH_REQUIRED,
                    messages::reauth_before_delete(),
                )
                .primary_label(messages::LABEL_SIGN_OUT)
                .on_primary(move || {
                    if let Some(ctx) = weak.upgrade() {
                        sign_out_and_leave(&ctx);
                    }
                }),
            );
        }
        Err(err) => {
            warn!("event=profile_page_delete module=app status=error error={err}");
            ctx.modal().open(ModalRequest::error(
                messages::TITLE_DELETE_ACCOUNT_FAILED,
                messages::delete_account_failed(),
            ));
        }
    }
}

fn forget_current_user(ctx: &AppContext) {
    if let Some(scope) = ctx.current_scope() {
        ctx.memos().forget(&scope);
    }
}

fn sign_out_and_leave(ctx: &AppContext) {
    forget_current_user(ctx);
    if let Err(err) = ctx.accounts().sign_out() {
        warn!("event=profile_page_logout module=app status=error error={err}");
    }
    ctx.modal().close();
    ctx.navigate(Route::Home);
}
