//! Partial-update payloads for tasks.

use taskdeck_core::{Priority, Task};

/// Patch for an optional field.
///
/// This makes the merge semantics explicit: [`FieldPatch::Clear`] erases the
/// stored value (the equivalent of sending the field with an explicit
/// "nothing" in the original wire format), while [`FieldPatch::Keep`] leaves
/// it untouched. There is no implicit skip-on-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldPatch<T> {
    /// Leave the stored value as-is.
    #[default]
    Keep,
    /// Overwrite with a new value.
    Set(T),
    /// Erase the stored value.
    Clear,
}

impl<T> FieldPatch<T> {
    /// Returns true when the patch leaves the field untouched.
    #[must_use]
    pub const fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    /// Apply the patch to the stored slot.
    pub fn apply(self, slot: &mut Option<T>) {
        match self {
            Self::Keep => {}
            Self::Set(value) => *slot = Some(value),
            Self::Clear => *slot = None,
        }
    }
}

/// Aggregate task update payload.
///
/// `None` in the plain fields means "leave unchanged". `tags` replaces the
/// whole array on `Set`; it never merges with the stored tags.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    /// Overwrite the title.
    pub title: Option<String>,
    /// Patch applied to the description.
    pub description: FieldPatch<String>,
    /// Overwrite the completion state.
    pub done: Option<bool>,
    /// Patch applied to the tag array.
    pub tags: FieldPatch<Vec<String>>,
    /// Overwrite the priority.
    pub priority: Option<Priority>,
}

impl TaskPatch {
    /// Returns true when the patch would not change anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_keep()
            && self.done.is_none()
            && self.tags.is_keep()
            && self.priority.is_none()
    }

    /// Merge the patch into `task`, field by field.
    pub fn apply(self, task: &mut Task) {
        let Self {
            title,
            description,
            done,
            tags,
            priority,
        } = self;

        if let Some(title) = title {
            task.title = title;
        }
        description.apply(&mut task.description);
        if let Some(done) = done {
            task.done = done;
        }
        tags.apply(&mut task.tags);
        if let Some(priority) = priority {
            task.priority = priority;
        }
    }
}
