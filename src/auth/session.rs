use actix_session::Session;

use crate::error::{AppError, AppResult};

const SESSION_USER_ID_KEY: &str = "user_id";
const SESSION_IS_ADMIN_KEY: &str = "is_admin";

/// Store the signed-in user in the session
pub fn set_user_session(session: &Session, user_id: i64, is_admin: bool) -> AppResult<()> {
    session
        .insert(SESSION_USER_ID_KEY, user_id)
        .and_then(|_| session.insert(SESSION_IS_ADMIN_KEY, is_admin))
        .map_err(|e| AppError::Internal(format!("Failed to set session: {}", e)))
}

/// Get user ID from session
pub fn get_user_id_from_session(session: &Session) -> Option<i64> {
    session.get::<i64>(SESSION_USER_ID_KEY).ok().flatten()
}

/// True when the session belongs to an administrator
pub fn is_admin_session(session: &Session) -> bool {
    session
        .get::<bool>(SESSION_IS_ADMIN_KEY)
        .ok()
        .flatten()
        .unwrap_or(false)
}
