//! Channel permissions
//!
//! A `Permission` is a pair of capability bits (read, write). A
//! `PermissionSet` maps channel patterns to permissions; resolving a concrete
//! channel picks the most specific matching pattern: a literal match beats
//! any wildcard, and among wildcards the longest prefix wins.

use crate::channels::{Channel, ChannelPattern};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Capability bits granted on a channel or channel namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// No access
    None,
    /// Receive events from matching channels
    Read,
    /// Push events to matching channels
    Write,
    /// Both read and write
    ReadWrite,
}

impl Permission {
    /// Build from individual bits
    pub fn from_bits(read: bool, write: bool) -> Self {
        match (read, write) {
            (false, false) => Permission::None,
            (true, false) => Permission::Read,
            (false, true) => Permission::Write,
            (true, true) => Permission::ReadWrite,
        }
    }

    pub fn can_read(self) -> bool {
        matches!(self, Permission::Read | Permission::ReadWrite)
    }

    pub fn can_write(self) -> bool {
        matches!(self, Permission::Write | Permission::ReadWrite)
    }

    /// Bitwise union: combining grants never loses a capability
    pub fn union(self, other: Permission) -> Permission {
        Permission::from_bits(
            self.can_read() || other.can_read(),
            self.can_write() || other.can_write(),
        )
    }

    /// Whether every bit of `other` is present in `self`
    pub fn covers(self, other: Permission) -> bool {
        (!other.can_read() || self.can_read()) && (!other.can_write() || self.can_write())
    }

    /// Whether this permission allows the given operation
    pub fn allows(self, op: Operation) -> bool {
        match op {
            Operation::Subscribe => self.can_read(),
            Operation::Publish => self.can_write(),
        }
    }

    /// Parse from string ("none", "read", "write", "readwrite")
    pub fn parse(s: &str) -> Option<Permission> {
        match s.to_lowercase().as_str() {
            "none" => Some(Permission::None),
            "read" => Some(Permission::Read),
            "write" => Some(Permission::Write),
            "readwrite" | "all" => Some(Permission::ReadWrite),
            _ => None,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::None => write!(f, "none"),
            Permission::Read => write!(f, "read"),
            Permission::Write => write!(f, "write"),
            Permission::ReadWrite => write!(f, "readwrite"),
        }
    }
}

/// Broker-side actions gated by a credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Receive events (requires the read bit)
    Subscribe,
    /// Send events (requires the write bit)
    Publish,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Subscribe => write!(f, "subscribe"),
            Operation::Publish => write!(f, "publish"),
        }
    }
}

/// A mapping from channel patterns to permissions, one entry per pattern
///
/// Backed by a `BTreeMap` so iteration order (and thus the credential's
/// canonical encoding) is stable regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    entries: BTreeMap<ChannelPattern, Permission>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Grant a permission on a pattern
    ///
    /// If the pattern already has an entry the bits are unioned, so layering
    /// grants never narrows access.
    pub fn grant(&mut self, pattern: ChannelPattern, permission: Permission) {
        self.entries
            .entry(pattern)
            .and_modify(|p| *p = p.union(permission))
            .or_insert(permission);
    }

    /// Remove a pattern entirely
    pub fn remove(&mut self, pattern: &ChannelPattern) {
        self.entries.remove(pattern);
    }

    /// Resolve a concrete channel to the most specific matching permission
    ///
    /// Literal match beats any wildcard; among wildcard matches the longest
    /// prefix wins. Returns `Permission::None` if nothing matches.
    pub fn resolve(&self, channel: &Channel) -> Permission {
        // Literal entries take precedence
        if let Some(p) = self
            .entries
            .iter()
            .find(|(pat, _)| !pat.is_wildcard() && pat.matches(channel))
        {
            return *p.1;
        }

        // Longest-prefix wildcard wins
        self.entries
            .iter()
            .filter(|(pat, _)| pat.is_wildcard() && pat.matches(channel))
            .max_by_key(|(pat, _)| pat.prefix().len())
            .map(|(_, p)| *p)
            .unwrap_or(Permission::None)
    }

    /// Resolve with a configured fallback for unmatched channels
    pub fn resolve_or(&self, channel: &Channel, default: Permission) -> Permission {
        if self.entries.iter().any(|(pat, _)| pat.matches(channel)) {
            self.resolve(channel)
        } else {
            default
        }
    }

    /// Union of two sets: both-defined patterns get the bit-union permission
    pub fn merge(a: &PermissionSet, b: &PermissionSet) -> PermissionSet {
        let mut merged = a.clone();
        for (pattern, permission) in &b.entries {
            merged.grant(pattern.clone(), *permission);
        }
        merged
    }

    /// Iterate entries in canonical (sorted) order
    pub fn iter(&self) -> impl Iterator<Item = (&ChannelPattern, &Permission)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(ChannelPattern, Permission)> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = (ChannelPattern, Permission)>>(iter: T) -> Self {
        let mut set = PermissionSet::new();
        for (pattern, permission) in iter {
            set.grant(pattern, permission);
        }
        set
    }
}
