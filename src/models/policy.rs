//! Conflict policies, resolution actions and push modes.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rule set deciding which side wins when local and remote diverge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Keep the local collection untouched, ignore remote additions.
    LocalWins,
    /// Replace the local collection with the remote one.
    ServerWins,
    /// Keep local records and append records only the remote has.
    #[default]
    Merge,
}

impl ConflictPolicy {
    /// Returns the policy as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LocalWins => "local-wins",
            Self::ServerWins => "server-wins",
            Self::Merge => "merge",
        }
    }

    /// Parses a policy from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "local-wins" | "local_wins" | "local" => Some(Self::LocalWins),
            "server-wins" | "server_wins" | "server" | "remote" => Some(Self::ServerWins),
            "merge" => Some(Self::Merge),
            _ => None,
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConflictPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::InvalidInput(format!("unknown conflict policy: {s}")))
    }
}

/// A manual resolution decision taken after inspecting a sync result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveAction {
    /// Keep the local collection as it is.
    Local,
    /// Replace the local collection with the remote one.
    Server,
    /// Run a merge sync.
    Merge,
}

impl ResolveAction {
    /// Returns the action as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Server => "server",
            Self::Merge => "merge",
        }
    }

    /// Parses an action from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Some(Self::Local),
            "server" => Some(Self::Server),
            "merge" => Some(Self::Merge),
            _ => None,
        }
    }
}

impl fmt::Display for ResolveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResolveAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::InvalidInput(format!("unknown resolve action: {s}")))
    }
}

/// Which local records are pushed to the remote after a sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PushMode {
    /// Do not push.
    None,
    /// Push records the remote did not have.
    #[default]
    OnlyLocal,
    /// Push every local record.
    All,
}

impl PushMode {
    /// Returns the mode as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::OnlyLocal => "only-local",
            Self::All => "all",
        }
    }

    /// Parses a mode from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" => Some(Self::None),
            "only-local" | "only_local" | "local" => Some(Self::OnlyLocal),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

impl fmt::Display for PushMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("merge", ConflictPolicy::Merge)]
    #[test_case("Server-Wins", ConflictPolicy::ServerWins)]
    #[test_case("local_wins", ConflictPolicy::LocalWins)]
    fn test_policy_parse(input: &str, expected: ConflictPolicy) {
        assert_eq!(ConflictPolicy::parse(input), Some(expected));
        assert_eq!(input.parse::<ConflictPolicy>().unwrap(), expected);
    }

    #[test]
    fn test_policy_default_is_merge() {
        assert_eq!(ConflictPolicy::default(), ConflictPolicy::Merge);
    }

    #[test]
    fn test_policy_parse_rejects_unknown() {
        assert!(ConflictPolicy::parse("newest").is_none());
        assert!(matches!(
            "newest".parse::<ConflictPolicy>(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_resolve_action_roundtrip() {
        for action in [ResolveAction::Local, ResolveAction::Server, ResolveAction::Merge] {
            assert_eq!(ResolveAction::parse(action.as_str()), Some(action));
        }
    }

    #[test]
    fn test_push_mode_parse() {
        assert_eq!(PushMode::parse("only-local"), Some(PushMode::OnlyLocal));
        assert_eq!(PushMode::parse("ALL"), Some(PushMode::All));
        assert_eq!(PushMode::parse("off"), Some(PushMode::None));
        assert_eq!(PushMode::default(), PushMode::OnlyLocal);
    }
}
