//! Document paths and collection names.
//!
//! A path alternates collection and document id segments, e.g.
//! `events/e1/comments/c9`. Top-level documents have two segments.

use std::fmt;

use crate::error::CoreError;

pub const USERS: &str = "users";
pub const EVENTS: &str = "events";
pub const COMMENTS: &str = "comments";
pub const HELP_BEACONS: &str = "helpBeacons";
pub const CHATS: &str = "chats";
pub const MESSAGES: &str = "messages";
pub const MARKETPLACE: &str = "marketplace";
pub const CARS: &str = "cars";

/// A parsed, validated document path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    /// Parse a slash-separated path.
    pub fn parse(path: &str) -> Result<Self, CoreError> {
        let segments: Vec<String> = path.trim_matches('/').split('/').map(str::to_string).collect();
        if segments.len() < 2 || segments.len() % 2 != 0 || segments.iter().any(String::is_empty) {
            return Err(CoreError::InvalidPath(path.to_string()));
        }
        Ok(Self { segments })
    }

    /// Path of a top-level document.
    pub fn top_level(collection: &str, id: &str) -> Self {
        Self {
            segments: vec![collection.to_string(), id.to_string()],
        }
    }

    /// Path of a document nested one level below `parent`.
    pub fn child(&self, collection: &str, id: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(collection.to_string());
        segments.push(id.to_string());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Id of the document itself (last segment).
    pub fn id(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// Name of the collection holding the document (second to last segment).
    pub fn collection_id(&self) -> &str {
        &self.segments[self.segments.len() - 2]
    }

    /// Full path of the holding collection, e.g. `events/e1/comments`.
    pub fn collection_path(&self) -> String {
        self.segments[..self.segments.len() - 1].join("/")
    }

    /// Path of the enclosing document, if nested.
    pub fn parent(&self) -> Option<Self> {
        (self.segments.len() > 2).then(|| Self {
            segments: self.segments[..self.segments.len() - 2].to_vec(),
        })
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parses_nested_path() {
        let path = DocumentPath::parse("events/e1/comments/c9").unwrap();
        assert_eq!(path.id(), "c9");
        assert_eq!(path.collection_id(), COMMENTS);
        assert_eq!(path.collection_path(), "events/e1/comments");
        assert_eq!(path.parent(), Some(DocumentPath::top_level(EVENTS, "e1")));
        assert_eq!(path.to_string(), "events/e1/comments/c9");
    }

    #[test]
    fn top_level_path_has_no_parent() {
        let path = DocumentPath::parse("/users/u1/").unwrap();
        assert_eq!(path.collection_path(), USERS);
        assert!(path.parent().is_none());
    }

    #[test]
    fn child_extends_parent() {
        let path = DocumentPath::top_level(CHATS, "room").child(MESSAGES, "m1");
        assert_eq!(path.to_string(), "chats/room/messages/m1");
    }

    #[test]
    fn rejects_malformed_paths() {
        for bad in ["", "users", "users/u1/friends", "users//x", "a/b/c//"] {
            assert_matches!(DocumentPath::parse(bad), Err(CoreError::InvalidPath(_)), "{bad}");
        }
    }
}
