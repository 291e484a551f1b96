use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Identifier of a page (a tab holding one or more groups).
///
/// Rendered as `page-<uuid>`; the prefix makes the string form
/// self-describing, so an id stored in a snapshot can be told apart from a
/// group or terminal id without extra context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(Uuid);

/// Identifier of a group (a split column within a page). Rendered as
/// `group-<uuid>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(Uuid);

/// Identifier of a terminal, derived from the creation timestamp (in
/// milliseconds) of its backing resource rather than generated randomly.
/// Rendered as `terminal-<ms>`. Because the resource is recreated with the
/// same timestamp on restore, the key is stable across a save/restore round
/// trip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalKey(i64);

impl PageId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl GroupId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl TerminalKey {
    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn millis(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page-{}", self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group-{}", self.0)
    }
}

impl fmt::Display for TerminalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "terminal-{}", self.0)
    }
}

impl FromStr for PageId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("page-").ok_or(ParseIdError)?;
        Uuid::parse_str(raw).map(Self).map_err(|_| ParseIdError)
    }
}

impl FromStr for GroupId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("group-").ok_or(ParseIdError)?;
        Uuid::parse_str(raw).map(Self).map_err(|_| ParseIdError)
    }
}

impl FromStr for TerminalKey {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("terminal-").ok_or(ParseIdError)?;
        raw.parse::<i64>().map(Self).map_err(|_| ParseIdError)
    }
}

/// An id string did not carry the expected prefix or payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseIdError;

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a recognized node id")
    }
}

impl std::error::Error for ParseIdError {}

/// Any node id, discriminated by its prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeId {
    Page(PageId),
    Group(GroupId),
    Terminal(TerminalKey),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Page(id) => id.fmt(f),
            NodeId::Group(id) => id.fmt(f),
            NodeId::Terminal(id) => id.fmt(f),
        }
    }
}

impl FromStr for NodeId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("page-") {
            s.parse().map(NodeId::Page)
        } else if s.starts_with("group-") {
            s.parse().map(NodeId::Group)
        } else if s.starts_with("terminal-") {
            s.parse().map(NodeId::Terminal)
        } else {
            Err(ParseIdError)
        }
    }
}

impl From<PageId> for NodeId {
    fn from(id: PageId) -> Self {
        NodeId::Page(id)
    }
}

impl From<GroupId> for NodeId {
    fn from(id: GroupId) -> Self {
        NodeId::Group(id)
    }
}

impl From<TerminalKey> for NodeId {
    fn from(id: TerminalKey) -> Self {
        NodeId::Terminal(id)
    }
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(PageId);
string_serde!(GroupId);
string_serde!(TerminalKey);
string_serde!(NodeId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_prefix() {
        let page = PageId::random();
        let group = GroupId::random();
        let terminal = TerminalKey::from_millis(1_700_000_000_000);

        assert!(page.to_string().starts_with("page-"));
        assert!(group.to_string().starts_with("group-"));
        assert_eq!(terminal.to_string(), "terminal-1700000000000");
    }

    #[test]
    fn test_parse_roundtrip() {
        let page = PageId::random();
        assert_eq!(page.to_string().parse::<PageId>().unwrap(), page);

        let group = GroupId::random();
        assert_eq!(group.to_string().parse::<GroupId>().unwrap(), group);

        let terminal = TerminalKey::from_millis(42);
        assert_eq!(terminal.to_string().parse::<TerminalKey>().unwrap(), terminal);
    }

    #[test]
    fn test_parse_rejects_wrong_prefix() {
        let group = GroupId::random();
        assert!(group.to_string().parse::<PageId>().is_err());
        assert!("page-not-a-uuid".parse::<PageId>().is_err());
        assert!("terminal-abc".parse::<TerminalKey>().is_err());
    }

    #[test]
    fn test_node_id_dispatches_on_prefix() {
        let terminal = TerminalKey::from_millis(7);
        let parsed: NodeId = terminal.to_string().parse().unwrap();
        assert_eq!(parsed, NodeId::Terminal(terminal));

        let page = PageId::random();
        let parsed: NodeId = page.to_string().parse().unwrap();
        assert_eq!(parsed, NodeId::Page(page));

        assert!("window-abc".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_serde_uses_string_form() {
        let terminal = TerminalKey::from_millis(1_700_000_000_000);
        let json = serde_json::to_string(&terminal).unwrap();
        assert_eq!(json, "\"terminal-1700000000000\"");
        let back: TerminalKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, terminal);

        let page = PageId::random();
        let json = serde_json::to_string(&page).unwrap();
        let back: PageId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, page);
    }
}
