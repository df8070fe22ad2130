use std::fmt;
use std::sync::Arc;

use bson::{Bson, Document};

/// Produces a fresh, valid document without `_id` on every call.
pub type DocumentFactory = Arc<dyn Fn() -> Document + Send + Sync>;

/// Produces a fresh object-array element. Two calls must differ.
pub type ElementFactory = Arc<dyn Fn() -> Bson + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A top-level array of scalars. Factory documents hold exactly one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringArray {
    pub name: String,
}

/// A top-level array of objects. Factory documents hold exactly one element.
#[derive(Clone)]
pub struct ObjArray {
    pub name: String,
    /// Element field that identifies an element within the array.
    pub key_field: Option<String>,
    /// Element field present in factory elements.
    pub populated_field: Field,
    /// Element field absent from factory elements.
    pub unpopulated_field: Option<Field>,
    pub create_element: ElementFactory,
}

impl ObjArray {
    pub fn new(
        name: impl Into<String>,
        populated_field: Field,
        create_element: impl Fn() -> Bson + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            key_field: None,
            populated_field,
            unpopulated_field: None,
            create_element: Arc::new(create_element),
        }
    }

    pub fn key_field(mut self, key_field: impl Into<String>) -> Self {
        self.key_field = Some(key_field.into());
        self
    }

    pub fn unpopulated_field(mut self, field: Field) -> Self {
        self.unpopulated_field = Some(field);
        self
    }
}

impl fmt::Debug for ObjArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjArray")
            .field("name", &self.name)
            .field("key_field", &self.key_field)
            .field("populated_field", &self.populated_field)
            .field("unpopulated_field", &self.unpopulated_field)
            .finish_non_exhaustive()
    }
}

/// Which fields of the backend's schema play which role in the suite.
///
/// Every role is optional. Cases that need a missing role are skipped.
#[derive(Debug, Clone, Default)]
pub struct TestFields {
    /// Top-level field present in factory documents. Its value is a string or
    /// a number so that a distinct value can be derived from it.
    pub populated_string: Option<String>,
    /// Top-level string field absent from factory documents.
    pub unpopulated_string: Option<String>,
    /// Top-level field whose value differs in every factory document.
    pub unique_key_fieldname: Option<String>,
    pub string_array: Option<StringArray>,
    pub obj_array: Option<ObjArray>,
}

impl TestFields {
    pub fn obj_array_key(&self) -> Option<&str> {
        self.obj_array.as_ref()?.key_field.as_deref()
    }
}
