use anyhow::{Context, Result};
use regex::Regex;
use std::fmt;

/// Result of checking a chat message for the command marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    NoMatch,
    /// Text left after removing the marker, untrimmed.
    Matched(String),
}

/// Recognizes messages that start with one of a set of synonym markers,
/// e.g. the half-width and full-width colon forms of `點:`.
#[derive(Debug, Clone)]
pub struct CommandMatcher {
    pattern: Regex,
}

impl CommandMatcher {
    pub fn new<S: AsRef<str>>(markers: &[S]) -> Result<Self> {
        let mut markers: Vec<&str> = markers
            .iter()
            .map(|m| m.as_ref())
            .filter(|m| !m.is_empty())
            .collect();
        if markers.is_empty() {
            anyhow::bail!("At least one command marker is required");
        }

        // Longest first so a marker that prefixes another never shadows it
        markers.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        markers.dedup();

        let alternation = markers
            .iter()
            .map(|m| regex::escape(m))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!("^({})", alternation))
            .with_context(|| format!("Invalid command marker pattern: {}", alternation))?;

        Ok(Self { pattern })
    }

    pub fn matches(&self, text: &str) -> MatchResult {
        let Some(caps) = self.pattern.captures(text) else {
            return MatchResult::NoMatch;
        };
        // Whole match plus exactly one marker group
        if caps.len() != 2 {
            return MatchResult::NoMatch;
        }
        let Some(marker) = caps.get(1) else {
            return MatchResult::NoMatch;
        };

        MatchResult::Matched(text.replacen(marker.as_str(), "", 1))
    }
}

/// Trimmed, non-empty item title taken from a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPayload(String);

impl NormalizedPayload {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim surrounding whitespace; `None` when nothing is left.
pub fn normalize(raw: &str) -> Option<NormalizedPayload> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(NormalizedPayload(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> CommandMatcher {
        CommandMatcher::new(&["點:", "點："]).unwrap()
    }

    fn extract(text: &str) -> Option<String> {
        match matcher().matches(text) {
            MatchResult::Matched(raw) => normalize(&raw).map(|p| p.to_string()),
            MatchResult::NoMatch => None,
        }
    }

    #[test]
    fn test_half_width_marker() {
        assert_eq!(
            matcher().matches("點: Song Name"),
            MatchResult::Matched(" Song Name".to_string())
        );
        assert_eq!(extract("點: Song Name").as_deref(), Some("Song Name"));
    }

    #[test]
    fn test_full_width_marker() {
        assert_eq!(extract("點：Song Name").as_deref(), Some("Song Name"));
        assert_eq!(extract("點： Song Name  ").as_deref(), Some("Song Name"));
    }

    #[test]
    fn test_no_marker() {
        assert_eq!(matcher().matches("hello everyone"), MatchResult::NoMatch);
        assert_eq!(matcher().matches(""), MatchResult::NoMatch);
    }

    #[test]
    fn test_marker_must_anchor_at_start() {
        assert_eq!(matcher().matches("please 點: Song"), MatchResult::NoMatch);
        assert_eq!(matcher().matches(" 點: Song"), MatchResult::NoMatch);
    }

    #[test]
    fn test_marker_removed_once() {
        assert_eq!(extract("點: 點: twice").as_deref(), Some("點: twice"));
    }

    #[test]
    fn test_marker_with_only_whitespace_is_empty() {
        assert_eq!(
            matcher().matches("點:   "),
            MatchResult::Matched("   ".to_string())
        );
        assert_eq!(extract("點:   "), None);
        assert_eq!(extract("點："), None);
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let m = CommandMatcher::new(&["!sr.", "?"]).unwrap();
        assert_eq!(m.matches("!srx song"), MatchResult::NoMatch);
        assert_eq!(m.matches("!sr. song"), MatchResult::Matched(" song".to_string()));
        assert_eq!(m.matches("? song"), MatchResult::Matched(" song".to_string()));
    }

    #[test]
    fn test_longer_synonym_wins() {
        let m = CommandMatcher::new(&["!s", "!sr"]).unwrap();
        assert_eq!(m.matches("!sr song"), MatchResult::Matched(" song".to_string()));
    }

    #[test]
    fn test_duplicate_markers_collapse() {
        let m = CommandMatcher::new(&["a", "b", "a"]).unwrap();
        assert_eq!(m.pattern.as_str(), "^(a|b)");
        let m = CommandMatcher::new(&["點:", "點：", "點:"]).unwrap();
        assert_eq!(m.pattern.as_str(), "^(點：|點:)");
    }

    #[test]
    fn test_empty_marker_list_rejected() {
        assert!(CommandMatcher::new::<&str>(&[]).is_err());
        assert!(CommandMatcher::new(&[""]).is_err());
    }

    #[test]
    fn test_normalize_trims_unicode_whitespace() {
        assert_eq!(normalize("\u{3000}Song\t ").unwrap().as_str(), "Song");
        assert!(normalize(" \t\n").is_none());
    }
}
