use actix_session::SessionExt;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::session::{get_user_id_from_session, is_admin_session};
use crate::auth::token::{bearer_token, secrets_match};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::Caller;

/// Resolves the authentication class of a request.
///
/// A Bearer token equal to the configured API secret is an admin. Otherwise a
/// signed-in session is an admin or a reader depending on its flag, and
/// everything else is anonymous.
pub fn resolve_caller(req: &HttpRequest) -> Caller {
    let api_secret = req
        .app_data::<web::Data<Config>>()
        .and_then(|c| c.security.api_secret.clone());

    if let (Some(secret), Some(token)) = (api_secret, bearer_token(req)) {
        if secrets_match(token, &secret) {
            return Caller::Admin;
        }
    }

    let session = req.get_session();
    match get_user_id_from_session(&session) {
        Some(_) if is_admin_session(&session) => Caller::Admin,
        Some(_) => Caller::Reader,
        None => Caller::Anonymous,
    }
}

/// Guards write operations
pub fn require_admin(caller: Caller) -> AppResult<()> {
    if !caller.is_admin() {
        return Err(AppError::NotAuthenticated(
            "administrator access required".to_string(),
        ));
    }
    Ok(())
}

/// Usage in handlers:
/// ```ignore
/// async fn my_handler(caller: Caller) -> HttpResponse {
///     // caller is Anonymous, Reader or Admin
/// }
/// ```
impl FromRequest for Caller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(resolve_caller(req)))
    }
}
