use memo_core::app::messages;
use memo_core::app::pages::{LoginMode, LoginPage, MemoPage, PageError, ProfilePage, SubmitOutcome};
use memo_core::{
    AppConfig, AppContext, FederatedCredential, ManualClock, ModalKind, QueryKey, Route,
    RouteResolution, SortOrder, ValidationError,
};
use std::sync::Arc;
use std::time::Duration;

const START_MILLIS: i64 = 1_700_000_000_000;

fn context() -> (Arc<ManualClock>, Arc<AppContext>) {
    let clock = Arc::new(ManualClock::new(START_MILLIS));
    let ctx = AppContext::open_in_memory_with_clock(AppConfig::default(), clock.clone()).unwrap();
    ctx.start();
    (clock, ctx)
}

fn signed_up(email: &str, nickname: &str) -> (Arc<ManualClock>, Arc<AppContext>) {
    let (clock, ctx) = context();
    ctx.accounts().sign_up(email, "secret1", nickname).unwrap();
    (clock, ctx)
}

fn contents(page: &MemoPage) -> Vec<String> {
    page.memos()
        .into_iter()
        .map(|memo| memo.content)
        .collect()
}

#[test]
fn routes_wait_for_session_then_guard_by_sign_in_state() {
    let clock = Arc::new(ManualClock::new(START_MILLIS));
    let ctx = AppContext::open_in_memory_with_clock(AppConfig::default(), clock).unwrap();

    assert_eq!(ctx.navigate(Route::Memo), RouteResolution::Loading);
    assert_eq!(ctx.current_route(), Route::Home);

    ctx.start();
    assert_eq!(
        ctx.navigate(Route::Profile),
        RouteResolution::Redirect(Route::Home)
    );

    ctx.accounts()
        .sign_up("ann@example.com", "secret1", "")
        .unwrap();
    assert_eq!(ctx.navigate(Route::Home), RouteResolution::Redirect(Route::Memo));
    assert_eq!(ctx.navigate(Route::Profile), RouteResolution::Render(Route::Profile));
    assert_eq!(ctx.current_route(), Route::Profile);
}

#[test]
fn login_page_shows_inline_errors_and_sends_nothing() {
    let (_clock, ctx) = context();
    let page = LoginPage::mount(Arc::clone(&ctx));

    assert_eq!(page.email_error(), None);
    page.set_email("ann@");
    page.set_password("123");
    assert_eq!(page.email_error(), Some(ValidationError::InvalidEmail));
    assert_eq!(
        page.password_error().map(|err| err.to_string()),
        Some("Password must be at least 6 characters.".to_string())
    );

    assert_eq!(page.submit(), SubmitOutcome::Rejected);
    assert!(!ctx.modal().is_open());
    assert!(!page.is_loading());
}

#[test]
fn over_long_sign_up_nickname_is_shown_inline_and_not_sent() {
    let (_clock, ctx) = context();
    let page = LoginPage::mount(Arc::clone(&ctx));
    page.set_email("ann@example.com");
    page.set_password("secret1");
    page.set_nickname(&"n".repeat(51));
    assert_eq!(page.nickname_error(), None);

    page.switch_mode();
    assert_eq!(page.mode(), LoginMode::SignUp);
    assert_eq!(
        page.nickname_error(),
        Some(ValidationError::NicknameTooLong { max: 50, actual: 51 })
    );

    assert_eq!(page.submit(), SubmitOutcome::Rejected);
    assert!(!ctx.modal().is_open());
    assert!(ctx.auth().current_user().is_none());

    page.set_nickname(&"n".repeat(50));
    assert_eq!(page.nickname_error(), None);
    assert_eq!(page.submit(), SubmitOutcome::SignedIn);
}

#[test]
fn unknown_account_offers_to_switch_to_sign_up() {
    let (_clock, ctx) = context();
    let page = LoginPage::mount(Arc::clone(&ctx));
    page.set_email("new@example.com");
    page.set_password("secret1");

    assert_eq!(page.submit(), SubmitOutcome::DialogShown);
    let view = ctx.modal().view();
    assert_eq!(view.kind, ModalKind::Confirm);
    assert_eq!(view.title, messages::TITLE_ACCOUNT_NOT_FOUND);
    assert_eq!(view.message, messages::account_not_found("new@example.com"));
    assert_eq!(view.primary_label.as_deref(), Some(messages::LABEL_SIGN_UP));

    ctx.modal().trigger_primary();
    assert_eq!(page.mode(), LoginMode::SignUp);
    assert!(!ctx.modal().is_open());

    page.set_nickname("Newbie");
    assert_eq!(page.submit(), SubmitOutcome::SignedIn);
    assert_eq!(ctx.current_route(), Route::Memo);
    let user = ctx.auth().current_user().unwrap();
    assert_eq!(user.display_name.as_deref(), Some("Newbie"));
}

#[tokio::test(start_paused = true)]
async fn wrong_password_dialog_counts_down_and_closes_itself() {
    let (_clock, ctx) = signed_up("ann@example.com", "");
    ctx.accounts().sign_out().unwrap();
    let page = LoginPage::mount(Arc::clone(&ctx));
    page.set_email("ann@example.com");
    page.set_password("secret2");

    assert_eq!(page.submit(), SubmitOutcome::DialogShown);
    let view = ctx.modal().view();
    assert_eq!(view.kind, ModalKind::Error);
    assert_eq!(view.message, messages::wrong_password());
    assert_eq!(view.primary_label.as_deref(), Some(messages::LABEL_RETRY));
    assert_eq!(view.countdown, Some(3));

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(ctx.modal().countdown(), Some(2));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(!ctx.modal().is_open());
    assert!(!ctx.modal().has_active_timer());
}

#[test]
fn offline_login_shows_generic_dialogs() {
    let (_clock, ctx) = context();
    ctx.backend().set_offline(true);
    let page = LoginPage::mount(Arc::clone(&ctx));
    page.set_email("ann@example.com");
    page.set_password("secret1");

    assert_eq!(page.submit(), SubmitOutcome::DialogShown);
    assert_eq!(ctx.modal().view().title, messages::TITLE_SIGN_IN_FAILED);
    assert_eq!(ctx.modal().view().message, messages::GENERIC_RETRY);

    page.switch_mode();
    assert!(!ctx.modal().is_open());
    assert_eq!(page.submit(), SubmitOutcome::DialogShown);
    assert_eq!(ctx.modal().view().title, messages::TITLE_ERROR);
    assert_eq!(ctx.modal().view().message, messages::CONNECTION_ERROR);

    let google = FederatedCredential {
        email: "ann@example.com".to_string(),
        display_name: None,
        photo_url: None,
    };
    assert_eq!(page.sign_in_with_google(&google), SubmitOutcome::DialogShown);
    assert_eq!(
        ctx.modal().view().title,
        messages::TITLE_GOOGLE_SIGN_IN_FAILED
    );
    assert_eq!(ctx.current_route(), Route::Home);
}

#[test]
fn pages_behind_the_guard_refuse_to_mount_signed_out() {
    let (_clock, ctx) = context();

    assert_eq!(
        MemoPage::mount(Arc::clone(&ctx)).err(),
        Some(PageError::NotSignedIn)
    );
    assert_eq!(
        ProfilePage::mount(Arc::clone(&ctx)).err(),
        Some(PageError::NotSignedIn)
    );
}

#[test]
fn memo_page_saves_sorts_edits_and_deletes() {
    let (clock, ctx) = signed_up("ann@example.com", "Ann");
    let page = MemoPage::mount(Arc::clone(&ctx)).unwrap();
    assert!(page.is_watching());
    assert!(!page.is_loading());
    assert!(page.memos().is_empty());

    page.set_draft("   ");
    assert!(!page.can_save());
    assert!(!page.save());

    for text in ["first", "second"] {
        page.set_draft(text);
        assert!(page.save());
        assert_eq!(page.draft(), "");
        clock.advance(1_000);
    }
    assert_eq!(contents(&page), ["second", "first"]);

    page.toggle_sort();
    assert_eq!(page.order(), SortOrder::OldestFirst);
    assert_eq!(contents(&page), ["first", "second"]);

    let first = page.memos()[0].clone();
    page.start_editing(&first.id, &first.content);
    page.set_edit_text("first, revised");
    assert!(page.update());
    assert_eq!(page.editing(), None);
    assert_eq!(contents(&page), ["first, revised", "second"]);

    page.request_delete(&first.id);
    let view = ctx.modal().view();
    assert_eq!(view.title, messages::TITLE_DELETE_MEMO);
    assert_eq!(view.primary_label.as_deref(), Some(messages::LABEL_DELETE));
    ctx.modal().trigger_primary();

    assert!(!ctx.modal().is_open());
    assert!(!page.is_deleting());
    assert_eq!(contents(&page), ["second"]);
}

#[test]
fn memo_page_reports_failed_writes_in_a_dialog() {
    let (_clock, ctx) = signed_up("ann@example.com", "");
    let page = MemoPage::mount(Arc::clone(&ctx)).unwrap();

    ctx.backend().set_offline(true);
    page.set_draft("will not save");
    assert!(!page.save());

    let view = ctx.modal().view();
    assert_eq!(view.kind, ModalKind::Error);
    assert_eq!(view.title, messages::TITLE_SAVE_FAILED);
    assert_eq!(page.draft(), "will not save");
    assert!(!page.is_saving());
}

#[test]
fn memo_page_mounted_offline_shows_load_failure() {
    let (_clock, ctx) = signed_up("ann@example.com", "");
    ctx.backend().set_offline(true);

    let page = MemoPage::mount(Arc::clone(&ctx)).unwrap();

    assert!(!page.is_watching());
    assert!(!page.is_loading());
    assert_eq!(ctx.modal().view().title, messages::TITLE_LOAD_FAILED);
}

#[test]
fn dropping_memo_page_ends_its_subscription() {
    let (_clock, ctx) = signed_up("ann@example.com", "");
    let page = MemoPage::mount(Arc::clone(&ctx)).unwrap();
    let key = QueryKey::memos(page.scope().partition(), SortOrder::NewestFirst);
    assert!(ctx.memos().cache().is_live(&key));

    drop(page);

    assert!(!ctx.memos().cache().is_live(&key));
}

#[test]
fn profile_page_updates_nickname_and_identity() {
    let (_clock, ctx) = signed_up("ann@example.com", "Ann");
    let page = ProfilePage::mount(Arc::clone(&ctx)).unwrap();
    assert_eq!(page.nickname(), "Ann");
    assert!(!page.is_profile_loading());
    assert!(page.password_form_available());

    page.set_nickname("  Annie ");
    assert!(page.update_nickname());

    assert_eq!(page.nickname(), "Annie");
    let view = ctx.modal().view();
    assert_eq!(view.kind, ModalKind::Success);
    assert_eq!(view.message, messages::nickname_changed("Annie"));
    let user = ctx.auth().current_user().unwrap();
    assert_eq!(user.display_name.as_deref(), Some("Annie"));
}

#[test]
fn google_users_get_no_password_form() {
    let (_clock, ctx) = context();
    ctx.accounts()
        .sign_in_with_google(&FederatedCredential {
            email: "carol@example.com".to_string(),
            display_name: Some("Carol".to_string()),
            photo_url: None,
        })
        .unwrap();
    let page = ProfilePage::mount(Arc::clone(&ctx)).unwrap();

    assert!(page.is_google_user());
    assert!(!page.password_form_available());
    page.toggle_password_form();
    assert!(!page.is_password_form_visible());
    assert_eq!(page.nickname(), "Carol");
}

#[test]
fn short_new_password_is_reported_in_a_dialog() {
    let (_clock, ctx) = signed_up("ann@example.com", "");
    let page = ProfilePage::mount(Arc::clone(&ctx)).unwrap();
    page.toggle_password_form();
    page.set_new_password("123");

    assert!(!page.update_password());
    let view = ctx.modal().view();
    assert_eq!(view.title, messages::TITLE_PASSWORD_ERROR);
    assert_eq!(view.message, "Password must be at least 6 characters.");
    assert!(page.is_password_form_visible());
}

#[test]
fn stale_session_password_change_offers_sign_out() {
    let (clock, ctx) = signed_up("ann@example.com", "");
    let page = ProfilePage::mount(Arc::clone(&ctx)).unwrap();
    clock.advance(301_000);
    page.toggle_password_form();
    page.set_new_password("secret2");

    assert!(!page.update_password());
    let view = ctx.modal().view();
    assert_eq!(view.title, messages::TITLE_REAUTH_REQUIRED);
    assert_eq!(view.primary_label.as_deref(), Some(messages::LABEL_SIGN_OUT));

    ctx.modal().trigger_primary();
    assert!(ctx.auth().current_user().is_none());
    assert!(!ctx.modal().is_open());
    assert_eq!(ctx.current_route(), Route::Home);
}

#[test]
fn logout_confirmation_signs_out_and_forgets_cached_memos() {
    let (_clock, ctx) = signed_up("ann@example.com", "");
    let scope = ctx.current_scope().unwrap();
    ctx.memos().create(&scope, "cached").unwrap();
    ctx.memos().list(&scope, SortOrder::NewestFirst).unwrap();
    assert!(!ctx.memos().cache().is_empty());

    let page = ProfilePage::mount(Arc::clone(&ctx)).unwrap();
    page.request_logout();
    assert_eq!(ctx.modal().view().title, messages::TITLE_SIGN_OUT);
    ctx.modal().trigger_primary();

    assert!(ctx.auth().current_user().is_none());
    assert!(ctx.memos().cache().is_empty());
    assert!(!ctx.modal().is_open());
    assert_eq!(ctx.current_route(), Route::Home);
}

#[test]
fn account_deletion_from_profile_removes_everything() {
    let (_clock, ctx) = signed_up("ann@example.com", "Ann");
    let scope = ctx.current_scope().unwrap();
    ctx.memos().create(&scope, "one").unwrap();
    ctx.memos().create(&scope, "two").unwrap();
    let user = ctx.auth().current_user().unwrap();

    let page = ProfilePage::mount(Arc::clone(&ctx)).unwrap();
    page.request_delete_account();
    assert_eq!(ctx.modal().view().title, messages::TITLE_DELETE_ACCOUNT);
    ctx.modal().trigger_primary();

    assert!(!ctx.modal().is_open());
    assert_eq!(ctx.current_route(), Route::Home);
    assert!(ctx.auth().current_user().is_none());
    assert!(ctx
        .memos()
        .list(&scope, SortOrder::NewestFirst)
        .unwrap()
        .is_empty());
    assert!(ctx.accounts().load_profile(&user).unwrap().is_none());
}
