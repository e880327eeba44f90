//! Typed identifiers used across the orchestration engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed ID wrappers prevent mixing up agent node ids, artifact ids, etc.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new typed ID from anything that converts to String.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(
    NodeId,
    "A resolved agent node id — `group__name` when grouped, else `name`."
);
typed_id!(EntryId, "Identifier of a semantic memory entry.");
typed_id!(ToolCallId, "Identifier correlating a tool call with its result.");

/// Identifier of an artifact row. Artifact ids are autoincrement integers
/// assigned by the store, not caller-chosen.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(pub i64);

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A conversation session identifier of the form `{user_id}_{YYYY-MM-DD}_{seq}`.
///
/// `user_id` may itself contain underscores, so parsing proceeds
/// right-to-left: the final `_`-delimited component is `seq`, the ten
/// characters before it (with fixed hyphen positions) are the date, and
/// everything remaining is `user_id`.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

/// The three parts recovered by [`SessionId::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdParts {
    /// The user this session belongs to.
    pub user_id: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Sequence number within the day, starting at 0.
    pub seq: u64,
}

/// Errors constructing or parsing a [`SessionId`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionIdError {
    /// The string has no `_`-delimited sequence suffix.
    #[error("missing sequence component in session id: {0}")]
    MissingSeq(String),
    /// The suffix after the last `_` is not a valid non-negative integer.
    #[error("invalid sequence number in session id: {0}")]
    InvalidSeq(String),
    /// The remainder does not end in `_YYYY-MM-DD`.
    #[error("missing or malformed date component in session id: {0}")]
    InvalidDate(String),
    /// The user id portion is empty.
    #[error("empty user id in session id: {0}")]
    EmptyUserId(String),
}

impl SessionId {
    /// Build a session id from its parts. Does not validate `user_id`
    /// contents beyond non-emptiness (callers are expected to pass a
    /// sane user id; delimiters are not escaped).
    pub fn build(user_id: &str, date: &str, seq: u64) -> Self {
        Self(format!("{user_id}_{date}_{seq}"))
    }

    /// Borrow the raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a session id string into its `(user_id, date, seq)` parts.
    ///
    /// Parsing is right-to-left per the session identity contract: find
    /// the last `_`, parse the tail as an integer `seq`; the remainder
    /// must end in `_YYYY-MM-DD` with hyphens at fixed positions; the
    /// prefix before that is `user_id` and must be non-empty.
    pub fn parse(s: &str) -> Result<SessionIdParts, SessionIdError> {
        let last_us = s
            .rfind('_')
            .ok_or_else(|| SessionIdError::MissingSeq(s.to_string()))?;
        let (rest, seq_str) = (&s[..last_us], &s[last_us + 1..]);
        let seq: u64 = seq_str
            .parse()
            .map_err(|_| SessionIdError::InvalidSeq(s.to_string()))?;

        // rest must end in "_YYYY-MM-DD" (11 chars: underscore + 10-char date)
        if rest.len() < 11 {
            return Err(SessionIdError::InvalidDate(s.to_string()));
        }
        let split_at = rest.len() - 10;
        let (user_part, date_part) = rest.split_at(split_at);
        let user_id = user_part
            .strip_suffix('_')
            .ok_or_else(|| SessionIdError::InvalidDate(s.to_string()))?;

        if !is_valid_date(date_part) {
            return Err(SessionIdError::InvalidDate(s.to_string()));
        }
        if user_id.is_empty() {
            return Err(SessionIdError::EmptyUserId(s.to_string()));
        }

        Ok(SessionIdParts {
            user_id: user_id.to_string(),
            date: date_part.to_string(),
            seq,
        })
    }
}

fn is_valid_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 10 {
        return false;
    }
    let digit = |i: usize| bytes[i].is_ascii_digit();
    bytes[4] == b'-'
        && bytes[7] == b'-'
        && (0..4).all(digit)
        && (5..7).all(digit)
        && (8..10).all(digit)
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_then_parse_roundtrips() {
        let id = SessionId::build("alice", "2026-02-27", 3);
        assert_eq!(id.as_str(), "alice_2026-02-27_3");
        let parts = SessionId::parse(id.as_str()).unwrap();
        assert_eq!(parts.user_id, "alice");
        assert_eq!(parts.date, "2026-02-27");
        assert_eq!(parts.seq, 3);
    }

    #[test]
    fn user_id_with_underscores_roundtrips() {
        let id = SessionId::build("alice_smith_99", "2026-02-27", 0);
        let parts = SessionId::parse(id.as_str()).unwrap();
        assert_eq!(parts.user_id, "alice_smith_99");
        assert_eq!(parts.date, "2026-02-27");
        assert_eq!(parts.seq, 0);
    }

    #[test]
    fn missing_seq_is_rejected() {
        assert!(matches!(
            SessionId::parse("alice"),
            Err(SessionIdError::MissingSeq(_))
        ));
    }

    #[test]
    fn malformed_date_is_rejected() {
        assert!(matches!(
            SessionId::parse("alice_notadate_0"),
            Err(SessionIdError::InvalidDate(_))
        ));
    }

    #[test]
    fn empty_user_id_is_rejected() {
        assert!(matches!(
            SessionId::parse("_2026-02-27_0"),
            Err(SessionIdError::EmptyUserId(_))
        ));
    }

    #[test]
    fn non_integer_seq_is_rejected() {
        assert!(matches!(
            SessionId::parse("alice_2026-02-27_x"),
            Err(SessionIdError::InvalidSeq(_))
        ));
    }

    #[test]
    fn node_id_roundtrips_through_string() {
        let n = NodeId::from("support__triage");
        assert_eq!(n.as_str(), "support__triage");
        assert_eq!(n.to_string(), "support__triage");
    }
}
