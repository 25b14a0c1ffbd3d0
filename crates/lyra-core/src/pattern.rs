//! Subscription patterns
//!
//! A pattern is a glob-like string where `*` matches zero or more of any
//! character and `.` matches literally. A side without a wildcard is
//! anchored: `foo.*` requires the `foo.` prefix, `*.bar` requires the
//! `.bar` suffix, and `foo.bar` matches only itself. The single pattern
//! `*` matches everything. Empty patterns are rejected - they must never
//! silently mean "subscribe to everything".

use crate::error::GatewayError;

/// Compiled form of a subscription pattern
#[derive(Clone, Debug, PartialEq, Eq)]
enum MatchKind {
    /// `*` (or a pattern of only wildcards) - matches any identifier
    Any,
    /// No wildcard at all - exact comparison
    Literal,
    /// One or more wildcards - literal segments matched in order
    Glob {
        segments: Vec<String>,
        anchored_start: bool,
        anchored_end: bool,
    },
}

/// A precompiled subscription pattern
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    kind: MatchKind,
}

impl Pattern {
    /// Compile a pattern string. Empty patterns are an error.
    pub fn compile(pattern: &str) -> Result<Pattern, GatewayError> {
        if pattern.is_empty() {
            return Err(GatewayError::EmptyPattern);
        }

        let kind = if !pattern.contains('*') {
            MatchKind::Literal
        } else {
            let segments: Vec<String> = pattern
                .split('*')
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect();

            if segments.is_empty() {
                MatchKind::Any
            } else {
                MatchKind::Glob {
                    segments,
                    anchored_start: !pattern.starts_with('*'),
                    anchored_end: !pattern.ends_with('*'),
                }
            }
        };

        Ok(Pattern {
            raw: pattern.to_owned(),
            kind,
        })
    }

    /// The original pattern string (registry key)
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Test an identifier against this pattern. Pure, no side effects.
    pub fn matches(&self, id: &str) -> bool {
        match &self.kind {
            MatchKind::Any => true,
            MatchKind::Literal => id == self.raw,
            MatchKind::Glob {
                segments,
                anchored_start,
                anchored_end,
            } => {
                let mut rest = id;
                let mut segs = segments.as_slice();

                if *anchored_start {
                    let Some((first, tail)) = segs.split_first() else {
                        return true;
                    };
                    match rest.strip_prefix(first.as_str()) {
                        Some(r) => rest = r,
                        None => return false,
                    }
                    segs = tail;
                }

                if *anchored_end {
                    if let Some((last, head)) = segs.split_last() {
                        match rest.strip_suffix(last.as_str()) {
                            Some(r) => rest = r,
                            None => return false,
                        }
                        segs = head;
                    }
                }

                for seg in segs {
                    match rest.find(seg.as_str()) {
                        Some(pos) => rest = &rest[pos + seg.len()..],
                        None => return false,
                    }
                }
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_star_matches_everything() {
        let p = Pattern::compile("*").unwrap();
        assert!(p.matches(""));
        assert!(p.matches("lamp.kitchen"));
        assert!(p.matches("system.adapter.admin.0.alive"));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert!(matches!(
            Pattern::compile(""),
            Err(GatewayError::EmptyPattern)
        ));
    }

    #[test]
    fn test_trailing_star_anchors_prefix() {
        let p = Pattern::compile("foo.*").unwrap();
        assert!(p.matches("foo.bar"));
        assert!(p.matches("foo.bar.baz"));
        assert!(!p.matches("foo"));
        assert!(!p.matches("foobar"));
        assert!(!p.matches("xfoo.bar"));
    }

    #[test]
    fn test_leading_star_anchors_suffix() {
        let p = Pattern::compile("*.bar").unwrap();
        assert!(p.matches("foo.bar"));
        assert!(p.matches("a.b.bar"));
        assert!(!p.matches("foo.barbaz"));
        assert!(!p.matches("bar"));
    }

    #[test]
    fn test_literal_is_exact() {
        let p = Pattern::compile("foo.bar").unwrap();
        assert!(p.matches("foo.bar"));
        assert!(!p.matches("foo.barbaz"));
        assert!(!p.matches("foo.ba"));
        // dot is literal, not "any character"
        assert!(!p.matches("fooxbar"));
    }

    #[test]
    fn test_inner_star() {
        let p = Pattern::compile("hm-rpc.*.LEVEL").unwrap();
        assert!(p.matches("hm-rpc.0.ABC.LEVEL"));
        assert!(!p.matches("hm-rpc.0.ABC.STATE"));
        assert!(!p.matches("xm-rpc.0.ABC.LEVEL"));
    }

    #[test]
    fn test_multiple_stars() {
        let p = Pattern::compile("a*b*c").unwrap();
        assert!(p.matches("abc"));
        assert!(p.matches("a1b2c"));
        assert!(p.matches("aXbYbZc"));
        assert!(!p.matches("acb"));
        assert!(!p.matches("ab"));
    }

    #[test]
    fn test_only_stars_is_any() {
        let p = Pattern::compile("**").unwrap();
        assert!(p.matches("anything"));
    }

    proptest! {
        #[test]
        fn prop_literal_pattern_matches_only_itself(
            id in "[a-z0-9.]{1,20}",
            other in "[a-z0-9.]{1,20}",
        ) {
            let p = Pattern::compile(&id).unwrap();
            prop_assert!(p.matches(&id));
            if other != id {
                prop_assert!(!p.matches(&other));
            }
        }

        #[test]
        fn prop_prefix_pattern_matches_extensions(
            prefix in "[a-z0-9.]{1,12}",
            tail in "[a-z0-9.]{0,12}",
        ) {
            let p = Pattern::compile(&format!("{prefix}*")).unwrap();
            let candidate = format!("{prefix}{tail}");
            prop_assert!(p.matches(&candidate));
        }

        #[test]
        fn prop_suffix_pattern_matches_extensions(
            head in "[a-z0-9.]{0,12}",
            suffix in "[a-z0-9.]{1,12}",
        ) {
            let p = Pattern::compile(&format!("*{suffix}")).unwrap();
            let candidate = format!("{head}{suffix}");
            prop_assert!(p.matches(&candidate));
        }
    }
}
