//! # Task views — partition, filter and sort of the visible todos
//!
//! Given every todo a viewer may see (their own plus their friends'), [`TaskViews::build`]
//! produces the three lists the board shows:
//!
//! | View | Contents | `hide_completed` applies |
//! |------|----------|--------------------------|
//! | My Tasks | todos owned by the viewer | yes |
//! | Friends' Tasks | todos owned by anyone else | no |
//! | Finished Tasks | the viewer's completed todos | no |
//!
//! Each list is sorted with [`compare_todos`]: ascending due date with undated todos
//! last when `sort_by_due_date` is set, newest first otherwise. The sort is stable, so
//! ties keep the order the server returned them in.
//!
//! Only one of Friends' Tasks and Finished Tasks is on screen at a time; [`Panel`]
//! selects which.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{Preferences, TodoInfo};

/// The secondary list shown beside My Tasks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    #[default]
    Friends,
    Finished,
}

impl Panel {
    pub fn title(&self) -> &'static str {
        match self {
            Panel::Friends => "Friends' Tasks",
            Panel::Finished => "Finished Tasks",
        }
    }
}

/// Order two todos according to the sort preference.
pub fn compare_todos(a: &TodoInfo, b: &TodoInfo, sort_by_due_date: bool) -> Ordering {
    if sort_by_due_date {
        match (a.due_date, b.due_date) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    } else {
        b.created_at.cmp(&a.created_at)
    }
}

pub fn sort_todos(todos: &mut [TodoInfo], sort_by_due_date: bool) {
    todos.sort_by(|a, b| compare_todos(a, b, sort_by_due_date));
}

/// Split into (owned by the viewer, owned by someone else), preserving order.
pub fn partition(todos: &[TodoInfo], viewer_id: &str) -> (Vec<TodoInfo>, Vec<TodoInfo>) {
    todos.iter().cloned().partition(|t| t.is_owned_by(viewer_id))
}

/// The three sorted views of a viewer's visible todos.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskViews {
    pub my_tasks: Vec<TodoInfo>,
    pub friends_tasks: Vec<TodoInfo>,
    pub finished_tasks: Vec<TodoInfo>,
}

impl TaskViews {
    pub fn build(todos: &[TodoInfo], viewer_id: &str, preferences: Preferences) -> Self {
        let (mut my_tasks, mut friends_tasks) = partition(todos, viewer_id);

        let mut finished_tasks: Vec<TodoInfo> =
            my_tasks.iter().filter(|t| t.completed).cloned().collect();

        if preferences.hide_completed {
            my_tasks.retain(|t| !t.completed);
        }

        sort_todos(&mut my_tasks, preferences.sort_by_due_date);
        sort_todos(&mut friends_tasks, preferences.sort_by_due_date);
        sort_todos(&mut finished_tasks, preferences.sort_by_due_date);

        Self {
            my_tasks,
            friends_tasks,
            finished_tasks,
        }
    }

    pub fn panel(&self, panel: Panel) -> &[TodoInfo] {
        match panel {
            Panel::Friends => &self.friends_tasks,
            Panel::Finished => &self.finished_tasks,
        }
    }

    pub fn into_board(self, panel: Panel, preferences: Preferences) -> BoardView {
        let panel_tasks = match panel {
            Panel::Friends => self.friends_tasks,
            Panel::Finished => self.finished_tasks,
        };
        BoardView {
            my_tasks: self.my_tasks,
            panel,
            panel_tasks,
            preferences,
        }
    }
}

/// What the board renders: My Tasks plus the selected panel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub my_tasks: Vec<TodoInfo>,
    pub panel: Panel,
    pub panel_tasks: Vec<TodoInfo>,
    pub preferences: Preferences,
}
