use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// Failure to parse a prefixed identifier string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {expected} id: {value:?}")]
pub struct ParseIdError {
    /// The id prefix that was expected (`fldr`, `list`, `task`).
    pub expected: &'static str,
    /// The rejected input.
    pub value: String,
}

fn parse_prefixed(prefix: &'static str, s: &str) -> Result<u64, ParseIdError> {
    s.strip_prefix(prefix)
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| ParseIdError {
            expected: prefix,
            value: s.to_owned(),
        })
}

/// Identifier of a folder (`fldr<n>`).
///
/// The numeric part comes from the per-type counter; ids are unique only among
/// currently-live folders (the counter is cleared once the last folder is
/// deleted, so the next folder restarts at `fldr1`).
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct FolderId(pub u64);

impl FolderId {
    /// Id prefix in the string form.
    pub const PREFIX: &'static str = "fldr";
    /// Key prefix for persisted folder records.
    pub const STORAGE_PREFIX: &'static str = "folder:";
    /// Key holding the folder id counter.
    pub const COUNTER_KEY: &'static str = "folder_id_counter";

    /// Storage key of the folder record, e.g. `folder:fldr3`.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{}{self}", Self::STORAGE_PREFIX)
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl FromStr for FolderId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed(Self::PREFIX, s).map(Self)
    }
}

impl Serialize for FolderId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FolderId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Identifier of a list (`list<n>`).
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct ListId(pub u64);

impl ListId {
    /// Id prefix in the string form.
    pub const PREFIX: &'static str = "list";
    /// Key prefix for persisted list records.
    pub const STORAGE_PREFIX: &'static str = "list:";
    /// Key holding the list id counter.
    pub const COUNTER_KEY: &'static str = "list_id_counter";

    /// Storage key of the list record, e.g. `list:list2`.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{}{self}", Self::STORAGE_PREFIX)
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl FromStr for ListId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed(Self::PREFIX, s).map(Self)
    }
}

impl Serialize for ListId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ListId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Identifier of a task (`task<n>`).
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Id prefix in the string form.
    pub const PREFIX: &'static str = "task";
    /// Key prefix for persisted task records.
    pub const STORAGE_PREFIX: &'static str = "task:";
    /// Key holding the task id counter.
    pub const COUNTER_KEY: &'static str = "task_id_counter";

    /// Storage key of the task record, e.g. `task:task9`.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{}{self}", Self::STORAGE_PREFIX)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl FromStr for TaskId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed(Self::PREFIX, s).map(Self)
    }
}

impl Serialize for TaskId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn folder_id_roundtrip() {
        let id = FolderId(3);
        assert_eq!(id.to_string(), "fldr3");
        let parsed: FolderId = "fldr3".parse().expect("must parse folder id");
        assert_eq!(parsed, id);
    }

    #[test]
    fn storage_keys_use_flat_namespace() {
        assert_eq!(FolderId(3).storage_key(), "folder:fldr3");
        assert_eq!(ListId(2).storage_key(), "list:list2");
        assert_eq!(TaskId(9).storage_key(), "task:task9");
    }

    #[test]
    fn parse_rejects_wrong_prefix() {
        let err = "list2".parse::<FolderId>().expect_err("wrong prefix");
        assert_eq!(err.expected, "fldr");
        assert!("task".parse::<TaskId>().is_err());
        assert!("taskx".parse::<TaskId>().is_err());
    }

    #[test]
    fn ids_serialize_as_prefixed_strings() {
        let json = serde_json::to_string(&TaskId(7)).expect("serialize task id");
        assert_eq!(json, "\"task7\"");
        let back: TaskId = serde_json::from_str(&json).expect("deserialize task id");
        assert_eq!(back, TaskId(7));
    }
}
