//! Supporting data models: users, organizations, nested references, and
//! search mentions.

use std::fmt;

use serde::Deserialize;

/// A DocumentCloud user.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
}

/// A DocumentCloud organization.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Organization {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

/// A reference to a related object that the API serializes either as a
/// bare integer id or, when expanded, as the embedded object itself.
///
/// Inflation is explicit: [`crate::documents::Document::user`] and friends
/// perform the fetch-and-cache transition; merely reading the field never
/// triggers I/O.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RemoteRef<T> {
    Resolved(T),
    Unresolved(i64),
}

impl<T> RemoteRef<T> {
    pub fn resolved(&self) -> Option<&T> {
        match self {
            RemoteRef::Resolved(obj) => Some(obj),
            RemoteRef::Unresolved(_) => None,
        }
    }
}

/// A search-match snippet tied to a page of a document.
///
/// Derived from a document's highlight mapping; not persisted server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    /// Page label with the `page_no_` prefix stripped.
    pub page: String,
    /// Snippet text, possibly containing `<em>` match markers.
    pub text: String,
}

impl Mention {
    pub fn new(page: &str, text: &str) -> Self {
        let page = page.strip_prefix("page_no_").unwrap_or(page);
        Self {
            page: page.to_string(),
            text: text.to_string(),
        }
    }
}

impl fmt::Display for Mention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - \"{}\"", self.page, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mention_strips_page_prefix() {
        let mention = Mention::new("page_no_42", "text");
        assert_eq!(mention.page, "42");
        assert_eq!(mention.to_string(), "42 - \"text\"");
    }

    #[test]
    fn test_mention_without_prefix_kept_verbatim() {
        let mention = Mention::new("7", "snippet");
        assert_eq!(mention.page, "7");
    }

    #[test]
    fn test_remote_ref_from_bare_id() {
        let r: RemoteRef<User> = serde_json::from_str("12").unwrap();
        assert_eq!(r, RemoteRef::Unresolved(12));
        assert!(r.resolved().is_none());
    }

    #[test]
    fn test_remote_ref_from_embedded_object() {
        let r: RemoteRef<User> =
            serde_json::from_str(r#"{"id": 12, "name": "Jo", "username": "jo"}"#).unwrap();
        match r {
            RemoteRef::Resolved(user) => {
                assert_eq!(user.id, 12);
                assert_eq!(user.name, "Jo");
            }
            RemoteRef::Unresolved(_) => panic!("expected resolved user"),
        }
    }
}
