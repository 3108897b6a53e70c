//! Topic paths and subscription filters.
//!
//! A published event is addressed by a `TopicPath` (`"thing/created"`).
//! Local subscriptions use `TopicFilter`s, which additionally allow `+`
//! (exactly one segment) and a trailing `#` (any remainder). Wildcard
//! matching happens only against the authoritative local table; the
//! replicated signature works on literal prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from parsing topic paths and filters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicParseError {
    /// Empty input or an empty segment (`"a//b"`).
    #[error("Empty topic segment in '{0}'")]
    EmptySegment(String),

    /// `#` is only valid as the final segment of a filter.
    #[error("Multi-level wildcard '#' must be the last segment in '{0}'")]
    HashNotLast(String),

    /// Wildcards are not allowed in concrete topic paths.
    #[error("Wildcard segment '{segment}' not allowed in topic path '{topic}'")]
    WildcardInPath { topic: String, segment: String },
}

/// A concrete topic: ordered, non-empty string segments.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TopicPath {
    segments: Vec<String>,
}

impl TopicPath {
    /// Parse a `/`-separated topic path. Rejects empty and wildcard segments.
    pub fn parse(raw: &str) -> Result<Self, TopicParseError> {
        let segments = split_segments(raw)?;
        for segment in &segments {
            if segment == "+" || segment == "#" {
                return Err(TopicParseError::WildcardInPath {
                    topic: raw.to_string(),
                    segment: segment.clone(),
                });
            }
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// All proper and improper prefixes of this path, shortest first,
    /// rendered in canonical `/` form. Used by signature probing: a node
    /// subscribed to `"thing"` must be a candidate for `"thing/created"`.
    pub fn prefixes(&self) -> impl Iterator<Item = String> + '_ {
        (1..=self.segments.len()).map(move |n| self.segments[..n].join("/"))
    }
}

impl fmt::Display for TopicPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl TryFrom<String> for TopicPath {
    type Error = TopicParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TopicPath> for String {
    fn from(topic: TopicPath) -> String {
        topic.to_string()
    }
}

/// One segment of a subscription filter.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FilterSegment {
    /// Matches exactly this segment.
    Literal(String),
    /// `+`: matches exactly one segment, any value.
    SingleLevel,
    /// `#`: matches the entire remainder, including none. Final only.
    MultiLevel,
}

/// A subscription filter: literal segments with optional wildcards.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TopicFilter {
    segments: Vec<FilterSegment>,
}

impl TopicFilter {
    /// Parse a `/`-separated filter with `+` and trailing-`#` wildcards.
    pub fn parse(raw: &str) -> Result<Self, TopicParseError> {
        let raw_segments = split_segments(raw)?;
        let last = raw_segments.len() - 1;
        let mut segments = Vec::with_capacity(raw_segments.len());
        for (i, segment) in raw_segments.into_iter().enumerate() {
            segments.push(match segment.as_str() {
                "+" => FilterSegment::SingleLevel,
                "#" if i == last => FilterSegment::MultiLevel,
                "#" => return Err(TopicParseError::HashNotLast(raw.to_string())),
                _ => FilterSegment::Literal(segment),
            });
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[FilterSegment] {
        &self.segments
    }

    /// True if the filter contains no wildcard segments.
    pub fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, FilterSegment::Literal(_)))
    }

    /// Exact matching against a concrete topic. This is the authoritative
    /// local check; no probabilistic structure is involved.
    pub fn matches(&self, topic: &TopicPath) -> bool {
        let path = topic.segments();
        let mut i = 0;
        for segment in &self.segments {
            match segment {
                FilterSegment::MultiLevel => return true,
                FilterSegment::SingleLevel => {
                    if i >= path.len() {
                        return false;
                    }
                    i += 1;
                }
                FilterSegment::Literal(expected) => {
                    if i >= path.len() || &path[i] != expected {
                        return false;
                    }
                    i += 1;
                }
            }
        }
        i == path.len()
    }

    /// The literal segment run before the first wildcard, rendered in
    /// canonical `/` form; `None` for a leading wildcard.
    ///
    /// This is what gets hashed into the replicated signature: inserting
    /// only the prefix keeps wildcard subscriptions a safe
    /// over-approximation (remote probes test every prefix of the
    /// published topic).
    pub fn signature_key(&self) -> Option<String> {
        let literals: Vec<&str> = self
            .segments
            .iter()
            .map_while(|s| match s {
                FilterSegment::Literal(l) => Some(l.as_str()),
                _ => None,
            })
            .collect();
        if literals.is_empty() {
            None
        } else {
            Some(literals.join("/"))
        }
    }
}

impl fmt::Display for TopicFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<&str> = self
            .segments
            .iter()
            .map(|s| match s {
                FilterSegment::Literal(l) => l.as_str(),
                FilterSegment::SingleLevel => "+",
                FilterSegment::MultiLevel => "#",
            })
            .collect();
        f.write_str(&rendered.join("/"))
    }
}

impl TryFrom<String> for TopicFilter {
    type Error = TopicParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TopicFilter> for String {
    fn from(filter: TopicFilter) -> String {
        filter.to_string()
    }
}

fn split_segments(raw: &str) -> Result<Vec<String>, TopicParseError> {
    if raw.is_empty() {
        return Err(TopicParseError::EmptySegment(raw.to_string()));
    }
    let segments: Vec<String> = raw.split('/').map(str::to_string).collect();
    if segments.iter().any(String::is_empty) {
        return Err(TopicParseError::EmptySegment(raw.to_string()));
    }
    Ok(segments)
}
