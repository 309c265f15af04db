//! Credential checks and the session gate.

mod password;
mod session;

pub use password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking,
    verify_unknown_user_blocking,
};
pub use session::{establish_session, Viewer, SESSION_USER_ID_KEY};
