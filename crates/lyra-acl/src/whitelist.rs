//! Address whitelist
//!
//! The whitelist is an address-keyed table of permission narrowings with an
//! optional forced identity. Keys are exact addresses, trailing-`*` IPv4
//! wildcards (`192.168.1.*`), or the literal `default` entry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use lyra_core::Operation;

/// Key of the fallback entry consulted when no address matches
pub const DEFAULT_ENTRY: &str = "default";

/// The literal user value meaning "keep the authenticated identity"
pub const KEEP_AUTH_USER: &str = "auth";

/// Per-resource override: `None` leaves the role grant untouched,
/// `Some(v)` is ANDed into it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideGrant {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execute: Option<bool>,
}

impl OverrideGrant {
    pub fn get(&self, op: Operation) -> Option<bool> {
        match op {
            Operation::Read => self.read,
            Operation::Write => self.write,
            Operation::List => self.list,
            Operation::Create => self.create,
            Operation::Delete => self.delete,
            Operation::Execute => self.execute,
        }
    }
}

/// One whitelist entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    /// Forced identity, or `"auth"` to keep the authenticated user
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub object: OverrideGrant,
    #[serde(default)]
    pub state: OverrideGrant,
    #[serde(default)]
    pub file: OverrideGrant,
}

fn default_user() -> String {
    KEEP_AUTH_USER.to_owned()
}

/// Address-keyed override table
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WhitelistTable {
    entries: HashMap<String, WhitelistEntry>,
}

impl WhitelistTable {
    pub fn new() -> Self {
        WhitelistTable::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: WhitelistEntry) {
        self.entries.insert(key.into(), entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the entry for a client address.
    ///
    /// Precedence: exact match, then the most specific trailing-`*` IPv4
    /// wildcard whose literal octets match, then the `default` entry.
    pub fn entry_for(&self, address: &str) -> Option<&WhitelistEntry> {
        if let Some(entry) = self.entries.get(address) {
            return Some(entry);
        }

        if let Some(key) = self.best_wildcard(address) {
            return self.entries.get(&key);
        }

        self.entries.get(DEFAULT_ENTRY)
    }

    fn best_wildcard(&self, address: &str) -> Option<String> {
        let octets: Vec<&str> = address.split('.').collect();
        if octets.len() != 4 {
            // wildcard keys are IPv4 only
            return None;
        }

        let mut best: Option<(usize, &str)> = None;
        for key in self.entries.keys().filter(|k| k.contains('*')) {
            let Some(literal) = wildcard_literal_octets(key, &octets) else {
                continue;
            };
            if best.map_or(true, |(n, _)| literal > n) {
                best = Some((literal, key));
            }
        }

        best.map(|(_, key)| key.to_owned())
    }
}

/// Match a trailing-`*` wildcard key against address octets, returning the
/// number of literal octets on success.
fn wildcard_literal_octets(key: &str, octets: &[&str]) -> Option<usize> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.len() != 4 {
        return None;
    }

    let mut literal = 0;
    let mut wildcarded = false;
    for (part, octet) in parts.iter().zip(octets) {
        if *part == "*" {
            wildcarded = true;
        } else if wildcarded || part != octet {
            // literal octet after a wildcard, or a mismatch
            return None;
        } else {
            literal += 1;
        }
    }

    wildcarded.then_some(literal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(user: &str) -> WhitelistEntry {
        WhitelistEntry {
            user: user.to_owned(),
            object: OverrideGrant::default(),
            state: OverrideGrant::default(),
            file: OverrideGrant::default(),
        }
    }

    #[test]
    fn test_exact_match_wins() {
        let mut table = WhitelistTable::new();
        table.insert("192.168.1.50", entry("exact"));
        table.insert("192.168.1.*", entry("wild"));
        table.insert(DEFAULT_ENTRY, entry("fallback"));

        assert_eq!(table.entry_for("192.168.1.50").unwrap().user, "exact");
    }

    #[test]
    fn test_wildcard_match_applies() {
        // wildcard entries must actually apply, not just parse
        let mut table = WhitelistTable::new();
        table.insert("192.168.1.*", entry("wild"));
        table.insert(DEFAULT_ENTRY, entry("fallback"));

        assert_eq!(table.entry_for("192.168.1.7").unwrap().user, "wild");
        assert_eq!(table.entry_for("192.168.2.7").unwrap().user, "fallback");
    }

    #[test]
    fn test_most_specific_wildcard_wins() {
        let mut table = WhitelistTable::new();
        table.insert("192.168.*.*", entry("coarse"));
        table.insert("192.168.1.*", entry("fine"));

        assert_eq!(table.entry_for("192.168.1.9").unwrap().user, "fine");
        assert_eq!(table.entry_for("192.168.4.9").unwrap().user, "coarse");
    }

    #[test]
    fn test_ipv6_only_exact_or_default() {
        let mut table = WhitelistTable::new();
        table.insert("192.168.1.*", entry("wild"));

        assert!(table.entry_for("fe80::1").is_none());
    }

    #[test]
    fn test_deserialize_table() {
        let json = r#"{
            "192.168.1.50": {
                "user": "auth",
                "state": {"write": false}
            }
        }"#;
        let table: WhitelistTable = serde_json::from_str(json).unwrap();
        let e = table.entry_for("192.168.1.50").unwrap();
        assert_eq!(e.user, KEEP_AUTH_USER);
        assert_eq!(e.state.write, Some(false));
        assert_eq!(e.state.read, None);
    }
}
