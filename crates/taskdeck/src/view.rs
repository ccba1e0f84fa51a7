//! Plain-text rendering of slice state.

use std::fmt::Write as _;

use taskdeck_core::{Folder, List, Task};

/// One-line rendering of a folder.
pub fn folder_line(folder: &Folder) -> String {
    format!("{}  {}", folder.id, folder.name)
}

/// One-line rendering of a list.
pub fn list_line(list: &List) -> String {
    format!("{}  {}  (in {})", list.id, list.content, list.folder_id)
}

/// One-line rendering of a task: checkbox, id, title, priority, tags.
pub fn task_line(task: &Task) -> String {
    let checkbox = if task.done { "[x]" } else { "[ ]" };
    let mut line = format!("{checkbox} {}  {}  ({})", task.id, task.title, task.priority);
    if let Some(tags) = &task.tags {
        for tag in tags {
            let _ = write!(line, " #{tag}");
        }
    }
    line
}

/// Multi-line rendering of one task.
pub fn task_details(task: &Task) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", task_line(task));
    let _ = writeln!(out, "    list: {}", task.list_id);
    if let Some(description) = &task.description {
        let _ = writeln!(out, "    {description}");
    }
    out
}
