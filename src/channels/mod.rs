//! Channel naming and pattern matching
//!
//! Channels are colon-separated segments: `room:lobby`, `feed:user-42:posts`
//! Each segment must match: [a-zA-Z0-9_-]+
//!
//! Wildcards are only allowed as the trailing segment:
//! - `room:*` matches `room:lobby`, `room:42:history`
//! - `*` matches everything
//!
//! Patterns order by prefix (literal before wildcard on ties) so they can
//! key a `BTreeMap` and give credential encodings a stable order.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Valid characters for a channel segment
fn is_valid_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Validate a single segment
fn is_valid_segment(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_valid_segment_char)
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel name cannot be empty")]
    Empty,

    #[error("invalid segment '{0}': must match [a-zA-Z0-9_-]+")]
    InvalidSegment(String),

    #[error("wildcard '*' can only appear as the last segment")]
    WildcardNotAtEnd,

    #[error("empty segment in channel name")]
    EmptySegment,
}

/// A validated channel name (no wildcards)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel {
    /// The full channel name, e.g. "room:lobby"
    name: String,
}

impl Channel {
    /// Parse and validate a channel name
    pub fn parse(name: &str) -> Result<Self, ChannelError> {
        if name.is_empty() {
            return Err(ChannelError::Empty);
        }

        for part in name.split(':') {
            if part.is_empty() {
                return Err(ChannelError::EmptySegment);
            }

            if part == "*" {
                return Err(ChannelError::WildcardNotAtEnd);
            }

            if !is_valid_segment(part) {
                return Err(ChannelError::InvalidSegment(part.to_string()));
            }
        }

        Ok(Self {
            name: name.to_string(),
        })
    }

    /// Get the channel name as a string slice
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A channel pattern that may include a trailing wildcard
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelPattern {
    /// The prefix before the wildcard (or full name if no wildcard)
    prefix: String,
    /// Whether this pattern ends with a wildcard
    is_wildcard: bool,
}

impl ChannelPattern {
    /// Parse a channel pattern (may end with :*)
    pub fn parse(pattern: &str) -> Result<Self, ChannelError> {
        if pattern.is_empty() {
            return Err(ChannelError::Empty);
        }

        // Special case: "*" matches everything
        if pattern == "*" {
            return Ok(Self {
                prefix: String::new(),
                is_wildcard: true,
            });
        }

        // Check for wildcard
        let (prefix, is_wildcard) = if let Some(stripped) = pattern.strip_suffix(":*") {
            (stripped, true)
        } else if pattern.ends_with('*') {
            // Wildcard glued to a segment, e.g. "room*" - invalid
            return Err(ChannelError::WildcardNotAtEnd);
        } else {
            (pattern, false)
        };

        for part in prefix.split(':') {
            if part.is_empty() {
                return Err(ChannelError::EmptySegment);
            }

            if part == "*" {
                return Err(ChannelError::WildcardNotAtEnd);
            }

            if !is_valid_segment(part) {
                return Err(ChannelError::InvalidSegment(part.to_string()));
            }
        }

        Ok(Self {
            prefix: prefix.to_string(),
            is_wildcard,
        })
    }

    /// Check if this pattern matches a channel
    ///
    /// O(1) prefix comparison - just a string starts_with check.
    pub fn matches(&self, channel: &Channel) -> bool {
        if self.is_wildcard {
            if self.prefix.is_empty() {
                // Pattern is "*", matches everything
                return true;
            }
            // Pattern is "prefix:*", channel must start with "prefix:"
            channel.name.starts_with(&self.prefix)
                && channel.name.len() > self.prefix.len()
                && channel.name.as_bytes()[self.prefix.len()] == b':'
        } else {
            // Exact match
            channel.name == self.prefix
        }
    }

    /// Get the prefix (without wildcard)
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Check if this is a wildcard pattern
    pub fn is_wildcard(&self) -> bool {
        self.is_wildcard
    }
}

impl fmt::Display for ChannelPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_wildcard {
            if self.prefix.is_empty() {
                write!(f, "*")
            } else {
                write!(f, "{}:*", self.prefix)
            }
        } else {
            write!(f, "{}", self.prefix)
        }
    }
}

impl Ord for ChannelPattern {
    fn cmp(&self, other: &Self) -> Ordering {
        // Prefix first, literal before wildcard on ties; the canonical
        // credential encoding relies on this order being stable.
        self.prefix
            .cmp(&other.prefix)
            .then(self.is_wildcard.cmp(&other.is_wildcard))
    }
}

impl PartialOrd for ChannelPattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for ChannelPattern {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChannelPattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ChannelPattern::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_parse_valid() {
        assert!(Channel::parse("room").is_ok());
        assert!(Channel::parse("room:lobby").is_ok());
        assert!(Channel::parse("feed:user-42:posts").is_ok());
        assert!(Channel::parse("agent:worker_5:status").is_ok());
    }

    #[test]
    fn test_channel_parse_invalid() {
        assert!(Channel::parse("").is_err());
        assert!(Channel::parse("room::lobby").is_err());
        assert!(Channel::parse("room:*:history").is_err());
        assert!(Channel::parse("room:lobby chat").is_err());
        assert!(Channel::parse("room:lobby@2").is_err());
        assert!(Channel::parse("room:*").is_err());
    }

    #[test]
    fn test_pattern_parse_valid() {
        assert!(ChannelPattern::parse("room").is_ok());
        assert!(ChannelPattern::parse("room:lobby").is_ok());
        assert!(ChannelPattern::parse("room:*").is_ok());
        assert!(ChannelPattern::parse("feed:user-42:*").is_ok());
        assert!(ChannelPattern::parse("*").is_ok());
    }

    #[test]
    fn test_pattern_parse_invalid() {
        assert!(ChannelPattern::parse("").is_err());
        assert!(ChannelPattern::parse("room*").is_err()); // Missing separator before *
        assert!(ChannelPattern::parse("room:*:history").is_err()); // Wildcard not at end
        assert!(ChannelPattern::parse("room::*").is_err());
    }

    #[test]
    fn test_pattern_matching() {
        let pattern_all = ChannelPattern::parse("*").unwrap();
        let pattern_room = ChannelPattern::parse("room:*").unwrap();
        let pattern_specific = ChannelPattern::parse("room:42:*").unwrap();
        let pattern_exact = ChannelPattern::parse("room:lobby").unwrap();

        let lobby = Channel::parse("room:lobby").unwrap();
        let history = Channel::parse("room:42:history").unwrap();
        let inbox = Channel::parse("user:123:inbox").unwrap();

        // "*" matches everything
        assert!(pattern_all.matches(&lobby));
        assert!(pattern_all.matches(&inbox));

        // "room:*" matches room:anything
        assert!(pattern_room.matches(&lobby));
        assert!(pattern_room.matches(&history));
        assert!(!pattern_room.matches(&inbox));

        // "room:42:*" matches room:42:anything
        assert!(pattern_specific.matches(&history));
        assert!(!pattern_specific.matches(&lobby));

        // Exact match
        assert!(pattern_exact.matches(&lobby));
        assert!(!pattern_exact.matches(&history));
    }

    #[test]
    fn test_pattern_no_partial_match() {
        // "room:*" should NOT match "rooms:abc" (different prefix)
        let pattern = ChannelPattern::parse("room:*").unwrap();
        let channel = Channel::parse("rooms:abc").unwrap();
        assert!(!pattern.matches(&channel));
    }

    #[test]
    fn test_wildcard_does_not_match_bare_prefix() {
        let pattern = ChannelPattern::parse("room:*").unwrap();
        let channel = Channel::parse("room").unwrap();
        assert!(!pattern.matches(&channel));
    }

    #[test]
    fn test_pattern_ordering() {
        let literal = ChannelPattern::parse("room").unwrap();
        let wildcard = ChannelPattern::parse("room:*").unwrap();
        let other = ChannelPattern::parse("user:*").unwrap();

        assert!(literal < wildcard); // Literal sorts before wildcard on equal prefix
        assert!(wildcard < other);
    }

    #[test]
    fn test_pattern_serde_round_trip() {
        let pattern = ChannelPattern::parse("room:42:*").unwrap();
        let json = serde_json::to_string(&pattern).unwrap();
        assert_eq!(json, "\"room:42:*\"");

        let back: ChannelPattern = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pattern);
    }
}
