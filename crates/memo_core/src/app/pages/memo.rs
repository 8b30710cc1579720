//! Memo list page controller.
//!
//! # Invariants
//! - The page holds exactly one live watch, for the current sort order.
//! - Service calls run without the page state lock held; snapshots pushed
//!   during a mutation take that lock.

use crate::app::context::AppContext;
use crate::app::format::format_memo_timestamp;
use crate::app::messages;
use crate::app::pages::PageError;
use crate::model::memo::{Memo, MemoId, SortOrder};
use crate::service::memo_service::{MemoScope, MemoWatch};
use crate::state::modal_store::ModalRequest;
use crate::util::lock;
use log::warn;
use std::sync::{Arc, Mutex, Weak};

#[derive(Debug, Default)]
struct MemoPageState {
    memos: Vec<Memo>,
    loading: bool,
    order: SortOrder,
    draft: String,
    editing: Option<MemoId>,
    edit_text: String,
    saving: bool,
    updating: bool,
    deleting: bool,
}

pub struct MemoPage {
    ctx: Arc<AppContext>,
    scope: MemoScope,
    state: Arc<Mutex<MemoPageState>>,
    watch: Mutex<Option<MemoWatch>>,
}

impl MemoPage {
    /// Mounts the page for the signed-in user and starts the live list.
    pub fn mount(ctx: Arc<AppContext>) -> Result<Self, PageError> {
        let scope = ctx.current_scope().ok_or(PageError::NotSignedIn)?;
        let page = Self {
            ctx,
            scope,
            state: Arc::new(Mutex::new(MemoPageState {
                loading: true,
                ..MemoPageState::default()
            })),
            watch: Mutex::new(None),
        };
        page.watch_order(SortOrder::default());
        Ok(page)
    }

    fn watch_order(&self, order: SortOrder) {
        let previous = lock(&self.watch).take();
        drop(previous);
        {
            let mut state = lock(&self.state);
            state.order = order;
            state.loading = true;
        }

        let state = Arc::downgrade(&self.state);
        let result = self.ctx.memos().watch(&self.scope, order, move |memos| {
            apply_snapshot(&state, order, memos);
        });
        match result {
            Ok(watch) => *lock(&self.watch) = Some(watch),
            Err(err) => {
                warn!("event=memo_page_watch module=app status=error error={err}");
                lock(&self.state).loading = false;
                self.ctx.modal().open(ModalRequest::error(
                    messages::TITLE_LOAD_FAILED,
                    messages::MEMO_LOAD_FAILED,
                ));
            }
        }
    }

    pub fn scope(&self) -> &MemoScope {
        &self.scope
    }

    pub fn memos(&self) -> Vec<Memo> {
        lock(&self.state).memos.clone()
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).loading
    }

    pub fn is_watching(&self) -> bool {
        lock(&self.watch)
            .as_ref()
            .is_some_and(MemoWatch::is_active)
    }

    pub fn order(&self) -> SortOrder {
        lock(&self.state).order
    }

    /// Flips the sort order and re-subscribes with it.
    pub fn toggle_sort(&self) {
        let next = self.order().toggled();
        self.watch_order(next);
    }

    /// Display string of a memo's creation time.
    pub fn display_time(&self, memo: &Memo) -> String {
        format_memo_timestamp(memo.created_at, self.ctx.clock().now_millis())
    }

    pub fn draft(&self) -> String {
        lock(&self.state).draft.clone()
    }

    pub fn set_draft(&self, text: &str) {
        lock(&self.state).draft = text.to_string();
    }

    pub fn can_save(&self) -> bool {
        let state = lock(&self.state);
        !state.saving
            && self
                .ctx
                .memos()
                .rules()
                .validate_memo_content(&state.draft)
                .is_ok()
    }

    pub fn is_saving(&self) -> bool {
        lock(&self.state).saving
    }

    /// Saves the draft as a new memo; the draft is cleared on success.
    pub fn save(&self) -> bool {
        if !self.can_save() {
            return false;
        }
        let draft = {
            let mut state = lock(&self.state);
            state.saving = true;
            state.draft.clone()
        };

        let result = self.ctx.memos().create(&self.scope, &draft);
        let mut state = lock(&self.state);
        state.saving = false;
        match result {
            Ok(_) => {
                state.draft.clear();
                true
            }
            Err(err) => {
                drop(state);
                warn!("event=memo_page_save module=app status=error error={err}");
                self.ctx.modal().open(ModalRequest::error(
                    messages::TITLE_SAVE_FAILED,
                    messages::MEMO_SAVE_FAILED,
                ));
                false
            }
        }
    }

    pub fn start_editing(&self, id: &MemoId, content: &str) {
        let mut state = lock(&self.state);
        state.editing = Some(id.clone());
        state.edit_text = content.to_string();
    }

    pub fn editing(&self) -> Option<MemoId> {
        lock(&self.state).editing.clone()
    }

    pub fn edit_text(&self) -> String {
        lock(&self.state).edit_text.clone()
    }

    pub fn set_edit_text(&self, text: &str) {
        lock(&self.state).edit_text = text.to_string();
    }

    pub fn cancel_editing(&self) {
        let mut state = lock(&self.state);
        state.editing = None;
        state.edit_text.clear();
    }

    pub fn is_updating(&self) -> bool {
        lock(&self.state).updating
    }

    /// Saves the edit in progress; editing ends on success.
    pub fn update(&self) -> bool {
        let (id, text) = {
            let mut state = lock(&self.state);
            let Some(id) = state.editing.clone() else {
                return false;
            };
            let valid = self
                .ctx
                .memos()
                .rules()
                .validate_memo_content(&state.edit_text)
                .is_ok();
            if state.updating || !valid {
                return false;
            }
            state.updating = true;
            (id, state.edit_text.clone())
        };

        let result = self.ctx.memos().update(&self.scope, &id, &text);
        let mut state = lock(&self.state);
        state.updating = false;
        match result {
            Ok(()) => {
                state.editing = None;
                state.edit_text.clear();
                true
            }
            Err(err) => {
                drop(state);
                warn!("event=memo_page_update module=app status=error error={err}");
                self.ctx.modal().open(ModalRequest::error(
                    messages::TITLE_UPDATE_FAILED,
                    messages::MEMO_UPDATE_FAILED,
                ));
                false
            }
        }
    }

    pub fn is_deleting(&self) -> bool {
        lock(&self.state).deleting
    }

    /// Asks for confirmation; the dialog's primary action deletes.
    pub fn request_delete(&self, id: &MemoId) {
        let ctx = Arc::downgrade(&self.ctx);
        let state = Arc::downgrade(&self.state);
        let scope = self.scope.clone();
        let id = id.clone();
        self.ctx.modal().open(
            ModalRequest::confirm(messages::TITLE_DELETE_MEMO, messages::CONFIRM_DELETE_MEMO)
                .primary_label(messages::LABEL_DELETE)
                .secondary_label(messages::LABEL_CANCEL)
                .on_primary(move || {
                    if let Some(ctx) = ctx.upgrade() {
                        delete_confirmed(&ctx, &state, &scope, &id);
                    }
                }),
        );
    }
}

fn apply_snapshot(state: &Weak<Mutex<MemoPageState>>, order: SortOrder, memos: &[Memo]) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut state = lock(&state);
    if state.order == order {
        state.memos = memos.to_vec();
        state.loading = false;
    }
}

fn delete_confirmed(
    ctx: &AppContext,
    state: &Weak<Mutex<MemoPageState>>,
    scope: &MemoScope,
    id: &MemoId,
) {
    let state = state.upgrade();
    if let Some(state) = &state {
        lock(state).deleting = true;
    }

    let result = ctx.memos().delete(scope, id);
    if let Some(state) = &state {
        lock(state).deleting = false;
    }
    match result {
        Ok(()) => ctx.modal().close(),
        Err(err) => {
            warn!("event=memo_page_delete module=app status=error error={err}");
            ctx.modal().open(ModalRequest::error(
                messages::TITLE_DELETE_FAILED,
                messages::MEMO_DELETE_FAILED,
            ));
        }
    }
}
