pub mod extractors;
pub mod session;
pub mod token;

pub use extractors::{require_admin, resolve_caller};
pub use session::{get_user_id_from_session, is_admin_session, set_user_session};
pub use token::{bearer_token, secrets_match};
