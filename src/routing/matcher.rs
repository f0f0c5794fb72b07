//! Path template matching.
//!
//! # Responsibilities
//! - Parse `/users/{userId+}/messages/{messageId+}` style templates
//! - Match a concrete path segment by segment
//! - Extract the values bound to parameter segments

use std::collections::BTreeMap;

/// One `/`-delimited piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the path segment exactly.
    Literal(String),
    /// `{name+}`: binds any single path segment.
    Param(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix('{').and_then(|s| s.strip_suffix("+}")) {
            Some(name) if !name.is_empty() => Segment::Param(name.to_owned()),
            _ => Segment::Literal(raw.to_owned()),
        }
    }
}

/// Split a path into its non-empty segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// A parsed route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_owned(),
            segments: segments(raw).map(Segment::parse).collect(),
        }
    }

    /// The template as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the parameter segments, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// True when segment counts agree and every literal matches exactly.
    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = segments(path).collect();
        parts.len() == self.segments.len()
            && self.segments.iter().zip(&parts).all(|(segment, part)| match segment {
                Segment::Literal(literal) => literal == part,
                Segment::Param(_) => true,
            })
    }

    /// Values bound to each parameter segment.
    ///
    /// Callers are expected to have checked [`PathTemplate::matches`]; only
    /// the positional pairing is performed here.
    pub fn extract(&self, path: &str) -> BTreeMap<String, String> {
        self.segments
            .iter()
            .zip(segments(path))
            .filter_map(|(segment, part)| match segment {
                Segment::Param(name) => Some((name.clone(), part.to_owned())),
                Segment::Literal(_) => None,
            })
            .collect()
    }
}

impl std::fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segments() {
        let template = PathTemplate::parse("/users/{userId+}/messages/{messageId+}");
        assert_eq!(
            template.segments(),
            &[
                Segment::Literal("users".into()),
                Segment::Param("userId".into()),
                Segment::Literal("messages".into()),
                Segment::Param("messageId".into()),
            ]
        );
        assert_eq!(template.param_names().collect::<Vec<_>>(), vec!["userId", "messageId"]);
    }

    #[test]
    fn test_non_greedy_braces_are_literals() {
        let template = PathTemplate::parse("/users/{userId}/{+}");
        assert_eq!(template.segments()[1], Segment::Literal("{userId}".into()));
        assert_eq!(template.segments()[2], Segment::Literal("{+}".into()));
        assert!(!template.matches("/users/42/x"));
        assert!(template.matches("/users/{userId}/{+}"));
    }

    #[test]
    fn test_literal_matching_is_exact() {
        let template = PathTemplate::parse("/users");
        assert!(template.matches("/users"));
        assert!(template.matches("users/"));
        assert!(template.matches("//users//"));
        assert!(!template.matches("/Users"));
        assert!(!template.matches("/users/1"));
        assert!(!template.matches("/"));
    }

    #[test]
    fn test_root_template() {
        let template = PathTemplate::parse("/");
        assert!(template.matches("/"));
        assert!(template.matches(""));
        assert!(!template.matches("/users"));
    }

    #[test]
    fn test_param_binds_any_segment() {
        let template = PathTemplate::parse("/users/{userId+}/messages/{messageId+}");
        let path = "/users/42/messages/7";
        assert!(template.matches(path));

        let params = template.extract(path);
        assert_eq!(params.get("userId").map(String::as_str), Some("42"));
        assert_eq!(params.get("messageId").map(String::as_str), Some("7"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_param_accepts_uuid_like_values() {
        let template = PathTemplate::parse("/orders/{orderId+}");
        let id = "3f2b8c1e-9d4a-4e6b-a1f0-2c7d5e8b9a10";
        let path = format!("/orders/{}", id);
        assert!(template.matches(&path));
        assert_eq!(template.extract(&path)["orderId"], id);
    }

    #[test]
    fn test_param_does_not_span_segments() {
        let template = PathTemplate::parse("/files/{key+}");
        assert!(!template.matches("/files/a/b"));
        assert!(!template.matches("/files"));
    }
}
