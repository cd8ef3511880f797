//! Field pattern matching.
//!
//! A field pattern is a dotted path in which any array index may be replaced
//! by the wildcard segment `$` (e.g. `orders.$.items.$.price`). Patterns are
//! compiled once, when the tracker is configured, into anchored matchers.

use crate::errors::{Result, TrackError};
use regex::Regex;

/// Wildcard segment matching any non-negative array index.
pub const INDEX_WILDCARD: &str = "$";

/// Characters that would change the meaning of a compiled matcher.
const IRREGULAR_CHARS: &[char] = &[
    '(', ')', '[', ']', '{', '}', '*', '+', '?', '|', '^', '\\',
];

/// A compiled field pattern.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    source: String,
    matcher: Regex,
}

impl FieldPattern {
    /// Compile a pattern into an anchored matcher.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` if the pattern is empty, has an empty segment,
    /// uses `$` inside a segment rather than as a whole segment, or contains
    /// irregular characters.
    pub fn compile(pattern: &str) -> Result<Self> {
        let invalid = |reason: String| TrackError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        if pattern.trim().is_empty() {
            return Err(invalid("pattern is empty".to_string()));
        }

        let mut parts = Vec::new();
        for (position, segment) in pattern.split('.').enumerate() {
            if segment.is_empty() {
                return Err(invalid(format!("segment {} is empty", position)));
            }
            if segment == INDEX_WILDCARD {
                parts.push("[0-9]+".to_string());
                continue;
            }
            if segment.contains(INDEX_WILDCARD) {
                return Err(invalid(format!(
                    "wildcard `$` must be a whole segment, got `{}`",
                    segment
                )));
            }
            if let Some(c) = segment
                .chars()
                .find(|c| c.is_whitespace() || IRREGULAR_CHARS.contains(c))
            {
                return Err(invalid(format!(
                    "segment `{}` contains irregular character {:?}",
                    segment, c
                )));
            }
            parts.push(regex::escape(segment));
        }

        let matcher = Regex::new(&format!("^{}$", parts.join(r"\.")))
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            source: pattern.to_string(),
            matcher,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True iff `path` matches the whole pattern.
    pub fn matches(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }
}

impl std::fmt::Display for FieldPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Match a concrete field path against an uncompiled pattern.
///
/// An invalid pattern matches nothing.
pub fn matches_pattern(path: &str, pattern: &str) -> bool {
    FieldPattern::compile(pattern).is_ok_and(|p| p.matches(path))
}

/// Decide whether a path is tracked.
///
/// Exclusion wins unconditionally: a path starting with any excluded prefix
/// is never tracked. Otherwise an empty track list tracks everything, and a
/// non-empty one tracks only paths matching at least one pattern.
pub fn should_track(path: &str, track: &[FieldPattern], exclude: &[String]) -> bool {
    if is_excluded(path, exclude) {
        return false;
    }
    track.is_empty() || track.iter().any(|p| p.matches(path))
}

/// True if `path` starts with any excluded prefix.
pub fn is_excluded(path: &str, exclude: &[String]) -> bool {
    exclude.iter().any(|prefix| path.starts_with(prefix.as_str()))
}

/// Compiled include/exclude configuration.
#[derive(Debug, Clone, Default)]
pub struct FieldFilter {
    track: Vec<FieldPattern>,
    exclude: Vec<String>,
}

impl FieldFilter {
    /// Compile the track list and keep the exclusion prefixes.
    ///
    /// # Errors
    ///
    /// Returns the first `InvalidPattern` found in `track`.
    pub fn new(track: &[String], exclude: &[String]) -> Result<Self> {
        let track = track
            .iter()
            .map(|p| FieldPattern::compile(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            track,
            exclude: exclude.to_vec(),
        })
    }

    pub fn should_track(&self, path: &str) -> bool {
        should_track(path, &self.track, &self.exclude)
    }

    /// Exclusion check alone, for paths reached by recursion.
    pub fn is_excluded(&self, path: &str) -> bool {
        is_excluded(path, &self.exclude)
    }

    pub fn patterns(&self) -> &[FieldPattern] {
        &self.track
    }
}
