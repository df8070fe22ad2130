use std::fmt;
use std::str::FromStr;

use bson::{Bson, Document};

/// A dotted field path (`"hat.size"`) split into its ordered segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    Empty,
    EmptySegment(String),
    NotADocument { path: String, segment: String },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Empty => write!(f, "field path is empty"),
            PathError::EmptySegment(path) => write!(f, "field path '{path}' has an empty segment"),
            PathError::NotADocument { path, segment } => {
                write!(f, "field path '{path}': intermediate '{segment}' is not a document")
            }
        }
    }
}

impl std::error::Error for PathError {}

impl FieldPath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(PathError::EmptySegment(path.to_string()));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment: the top-level field this path lives under.
    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    pub fn leaf(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// Walk the path, returning `None` as soon as a segment is absent.
    ///
    /// Numeric segments index into arrays, so `"items.0.name"` reaches the
    /// `name` of the first element of `items`.
    pub fn resolve<'a>(&self, doc: &'a Document) -> Option<&'a Bson> {
        let (first, rest) = self.segments.split_first()?;
        let mut current = doc.get(first)?;
        for segment in rest {
            current = step(current, segment)?;
            if matches!(current, Bson::Null) {
                return None;
            }
        }
        match current {
            Bson::Null => None,
            value => Some(value),
        }
    }

    /// Resolve the document holding the leaf, plus the leaf name.
    ///
    /// With `create`, missing intermediates are inserted as empty documents;
    /// without it, a missing intermediate yields `Ok(None)`.
    pub fn parent_mut<'a>(
        &'a self,
        doc: &'a mut Document,
        create: bool,
    ) -> Result<Option<(&'a mut Document, &'a str)>, PathError> {
        let (leaf, intermediates) = match self.segments.split_last() {
            Some(parts) => parts,
            None => return Err(PathError::Empty),
        };

        let mut current = doc;
        for segment in intermediates {
            if !current.contains_key(segment) {
                if !create {
                    return Ok(None);
                }
                current.insert(segment.clone(), Bson::Document(Document::new()));
            }
            current = match current.get_mut(segment) {
                Some(Bson::Document(sub)) => sub,
                Some(_) => {
                    return Err(PathError::NotADocument {
                        path: self.to_string(),
                        segment: segment.clone(),
                    });
                }
                None => return Ok(None),
            };
        }
        Ok(Some((current, leaf.as_str())))
    }

    pub fn get_mut<'a>(&'a self, doc: &'a mut Document) -> Result<Option<&'a mut Bson>, PathError> {
        Ok(self
            .parent_mut(doc, false)?
            .and_then(|(parent, leaf)| parent.get_mut(leaf)))
    }
}

fn step<'a>(value: &'a Bson, segment: &str) -> Option<&'a Bson> {
    match value {
        Bson::Document(doc) => doc.get(segment),
        Bson::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Value at a dotted path, e.g. `get_value(&doc, "hat.size")`. Malformed paths
/// resolve to nothing.
pub fn get_value<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    FieldPath::parse(path).ok()?.resolve(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn parse_splits_segments() {
        let p = FieldPath::parse("hat.size").unwrap();
        assert_eq!(p.segments(), ["hat", "size"]);
        assert_eq!(p.root(), "hat");
        assert_eq!(p.leaf(), "size");
        assert!(p.is_nested());
    }

    #[test]
    fn parse_rejects_empty() {
        assert_eq!(FieldPath::parse(""), Err(PathError::Empty));
        assert!(matches!(FieldPath::parse("a..b"), Err(PathError::EmptySegment(_))));
    }

    #[test]
    fn resolve_top_level() {
        let d = doc! { "name": "alice" };
        assert_eq!(get_value(&d, "name"), Some(&Bson::String("alice".into())));
    }

    #[test]
    fn resolve_nested() {
        let d = doc! { "hat": { "size": 7 } };
        assert_eq!(get_value(&d, "hat.size"), Some(&Bson::Int32(7)));
    }

    #[test]
    fn resolve_missing_intermediate_is_none() {
        let d = doc! { "hat": { "size": 7 } };
        assert_eq!(get_value(&d, "coat.size"), None);
        assert_eq!(get_value(&d, "hat.color.shade"), None);
    }

    #[test]
    fn resolve_through_scalar_is_none() {
        let d = doc! { "hat": 3 };
        assert_eq!(get_value(&d, "hat.size"), None);
    }

    #[test]
    fn resolve_null_is_none() {
        let d = doc! { "hat": Bson::Null };
        assert_eq!(get_value(&d, "hat"), None);
        assert_eq!(get_value(&d, "hat.size"), None);
    }

    #[test]
    fn resolve_array_index() {
        let d = doc! { "parts": [ { "id": "a", "qty": 1 }, { "id": "b", "qty": 2 } ] };
        assert_eq!(get_value(&d, "parts.1.qty"), Some(&Bson::Int32(2)));
        assert_eq!(get_value(&d, "parts.5.qty"), None);
        assert_eq!(get_value(&d, "parts.x"), None);
    }

    #[test]
    fn parent_mut_creates_intermediates() {
        let mut d = doc! {};
        let p = FieldPath::parse("a.b.c").unwrap();
        let (parent, leaf) = p.parent_mut(&mut d, true).unwrap().unwrap();
        assert_eq!(leaf, "c");
        parent.insert(leaf, 1);
        assert_eq!(get_value(&d, "a.b.c"), Some(&Bson::Int32(1)));
    }

    #[test]
    fn parent_mut_without_create_stops_on_missing() {
        let mut d = doc! { "a": 1 };
        let p = FieldPath::parse("x.y").unwrap();
        assert!(p.parent_mut(&mut d, false).unwrap().is_none());
    }

    #[test]
    fn parent_mut_rejects_scalar_intermediate() {
        let mut d = doc! { "a": 42 };
        let p = FieldPath::parse("a.b").unwrap();
        assert!(matches!(
            p.parent_mut(&mut d, true),
            Err(PathError::NotADocument { .. })
        ));
    }
}
