//! User-facing dialog and inline texts.

pub const PASSWORD_MISMATCH: &str = "The password does not match.";
pub const REQUIRES_RECENT_LOGIN: &str = "For your security, please sign in again and retry.";

pub const MEMO_LOAD_FAILED: &str = "Something went wrong while loading your memos.";
pub const MEMO_SAVE_FAILED: &str = "The memo could not be saved.";
pub const MEMO_UPDATE_FAILED: &str = "The memo could not be updated.";
pub const MEMO_DELETE_FAILED: &str = "Something went wrong while deleting the memo.";

pub const PROFILE_UPDATE_FAILED: &str = "Something went wrong while updating your profile.";
pub const LOGOUT_FAILED: &str = "Something went wrong while signing out.";
pub const DELETE_ACCOUNT_FAILED: &str = "Something went wrong while deleting your account.";

pub const CONNECTION_ERROR: &str =
    "The service is not responding.\nPlease check your internet connection.";
pub const GENERIC_RETRY: &str = "An error occurred while signing in.\nPlease try again.";

pub const TITLE_ACCOUNT_NOT_FOUND: &str = "Account not found";
pub const TITLE_SIGN_IN_FAILED: &str = "Sign-in failed";
pub const TITLE_GOOGLE_SIGN_IN_FAILED: &str = "Google sign-in failed";
pub const TITLE_ERROR: &str = "Error";
pub const TITLE_LOAD_FAILED: &str = "Load failed";
pub const TITLE_SAVE_FAILED: &str = "Save failed";
pub const TITLE_UPDATE_FAILED: &str = "Update failed";
pub const TITLE_DELETE_MEMO: &str = "Delete memo";
pub const TITLE_DELETE_FAILED: &str = "Delete failed";
pub const TITLE_SIGN_OUT: &str = "Sign out";
pub const TITLE_DELETE_ACCOUNT: &str = "Delete account";
pub const TITLE_DELETING_ACCOUNT: &str = "Deleting account...";
pub const TITLE_REAUTH_REQUIRED: &str = "Re-authentication required";
pub const TITLE_DELETE_ACCOUNT_FAILED: &str = "Account deletion failed";
pub const TITLE_CHANGED: &str = "Changed";
pub const TITLE_CHANGE_FAILED: &str = "Change failed";
pub const TITLE_PASSWORD_ERROR: &str = "Password error";

pub const LABEL_SIGN_UP: &str = "Sign up";
pub const LABEL_CANCEL: &str = "Cancel";
pub const LABEL_RETRY: &str = "Try again";
pub const LABEL_DELETE: &str = "Delete";
pub const LABEL_SIGN_OUT: &str = "Sign out";
pub const LABEL_DELETE_ACCOUNT: &str = "Delete account";
pub const LABEL_PROCESSING: &str = "Processing...";

pub const CONFIRM_DELETE_MEMO: &str = "Delete this memo?";
pub const CONFIRM_SIGN_OUT: &str = "Do you really want to sign out?";
pub const CONFIRM_DELETE_ACCOUNT: &str =
    "Delete your account? All of your memos and account data will be removed permanently.";
pub const DELETING_ACCOUNT: &str = "Your data is being deleted permanently. Please wait.";
pub const PASSWORD_CHANGED: &str = "Your password has been changed.";
pub const PASSWORD_CHANGE_FAILED: &str = "The password could not be changed.";

pub fn account_not_found(email: &str) -> String {
    format!("{email} is not registered yet.\nWould you like to sign up?")
}

pub fn wrong_password() -> String {
    format!("{PASSWORD_MISMATCH}\nPlease check it again.")
}

pub fn nickname_changed(nickname: &str) -> String {
    format!("Your nickname is now '{nickname}'.")
}

pub fn reauth_before_delete() -> String {
    format!("{REQUIRES_RECENT_LOGIN}\nSign out, sign in again and retry.")
}

pub fn delete_account_failed() -> String {
    format!("{DELETE_ACCOUNT_FAILED} Please try again.")
}
