//! Database rows and their client-safe projections.

mod friendship;
mod todo;
mod user;

pub use friendship::FriendPair;
pub use todo::Todo;
pub use user::User;
