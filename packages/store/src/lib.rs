pub mod board;
pub mod cache;
pub mod config;
pub mod models;
pub mod visibility;

pub use board::{BackendError, TodoBackend, TodoBoard};
pub use cache::{OptimisticCache, Snapshot};
pub use config::LunaTodoConfig;
pub use models::{
    parse_due_date, NewTodo, Preferences, PreferencesUpdate, TodoInfo, TodoPage, TodoPatch,
    UserInfo, UserSummary,
};
pub use visibility::{BoardView, Panel, TaskViews};
