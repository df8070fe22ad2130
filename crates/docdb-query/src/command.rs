use std::fmt;

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use crate::path::FieldPath;
use crate::{ID_FIELD, VERSION_FIELD};

/// Rejection for `unset` aimed at a whole array or array element.
pub const UNSET_ARRAY_WITHOUT_SUBFIELD: &str =
    "cmd=unset not allowed on array without a subfield, use cmd=remove";

/// The four partial-update operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateCmd {
    /// Create or overwrite a field, an array element, or a field inside an element.
    Set,
    /// Remove a field, or a field inside an array element.
    Unset,
    /// Append a value to an array.
    Insert,
    /// Delete an array element.
    Remove,
}

impl UpdateCmd {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateCmd::Set => "set",
            UpdateCmd::Unset => "unset",
            UpdateCmd::Insert => "insert",
            UpdateCmd::Remove => "remove",
        }
    }
}

impl fmt::Display for UpdateCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One atomic partial mutation within an `update` call.
///
/// Without `element_id` the command acts on `field` itself. With it, `field`
/// must hold an array and the command acts on the element whose value equals
/// `element_id`, or, when `key_field` is given, on the object element whose
/// `key_field` equals `element_id`. `subfield` narrows a `set`/`unset` to a
/// path inside that element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateFieldCommand {
    pub cmd: UpdateCmd,
    pub field: String,
    #[serde(default)]
    pub key_field: Option<String>,
    #[serde(default)]
    pub element_id: Option<Bson>,
    #[serde(default)]
    pub subfield: Option<String>,
    #[serde(default)]
    pub value: Option<Bson>,
}

impl UpdateFieldCommand {
    fn new(cmd: UpdateCmd, field: impl Into<String>) -> Self {
        Self {
            cmd,
            field: field.into(),
            key_field: None,
            element_id: None,
            subfield: None,
            value: None,
        }
    }

    pub fn set(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::new(UpdateCmd::Set, field).value(value)
    }

    pub fn unset(field: impl Into<String>) -> Self {
        Self::new(UpdateCmd::Unset, field)
    }

    pub fn insert(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::new(UpdateCmd::Insert, field).value(value)
    }

    pub fn remove(field: impl Into<String>) -> Self {
        Self::new(UpdateCmd::Remove, field)
    }

    /// Select the scalar array element equal to `element_id`.
    pub fn element(mut self, element_id: impl Into<Bson>) -> Self {
        self.element_id = Some(element_id.into());
        self
    }

    /// Select the object array element whose `key_field` equals `element_id`.
    pub fn keyed_element(
        mut self,
        key_field: impl Into<String>,
        element_id: impl Into<Bson>,
    ) -> Self {
        self.key_field = Some(key_field.into());
        self.element_id = Some(element_id.into());
        self
    }

    pub fn subfield(mut self, subfield: impl Into<String>) -> Self {
        self.subfield = Some(subfield.into());
        self
    }

    pub fn value(mut self, value: impl Into<Bson>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Whether this command targets an array element rather than a field.
    pub fn targets_element(&self) -> bool {
        self.element_id.is_some()
    }

    /// Check the shape of the command without looking at a document.
    ///
    /// Rules that depend on the stored value (for instance `unset` of a field
    /// that turns out to hold an array) are enforced when the command is applied.
    pub fn validate(&self) -> Result<(), ParseError> {
        let path = FieldPath::parse(&self.field)
            .map_err(|e| ParseError(format!("invalid field: {e}")))?;
        if path.root() == ID_FIELD || path.root() == VERSION_FIELD {
            return Err(ParseError(format!("cannot update reserved field {}", path.root())));
        }
        if let Some(subfield) = &self.subfield {
            FieldPath::parse(subfield).map_err(|e| ParseError(format!("invalid subfield: {e}")))?;
            if self.element_id.is_none() {
                return Err(ParseError(format!(
                    "cmd={} with a subfield requires element_id",
                    self.cmd
                )));
            }
        }
        if self.key_field.is_some() && self.element_id.is_none() && self.cmd != UpdateCmd::Insert {
            return Err(ParseError(format!(
                "cmd={} with key_field requires element_id",
                self.cmd
            )));
        }

        match &self.element_id {
            Some(Bson::Null | Bson::Undefined) => {
                return Err(ParseError("element_id must not be null".into()));
            }
            Some(Bson::Array(items)) if items.is_empty() => {
                return Err(ParseError("element_id must not be an empty array".into()));
            }
            _ => {}
        }

        match self.cmd {
            UpdateCmd::Set if self.value.is_none() => {
                Err(ParseError("cmd=set requires a value".into()))
            }
            UpdateCmd::Insert if self.value.is_none() => {
                Err(ParseError("cmd=insert requires a value".into()))
            }
            UpdateCmd::Insert if self.element_id.is_some() || self.subfield.is_some() => Err(
                ParseError("cmd=insert appends to the array, element_id and subfield are not allowed".into()),
            ),
            UpdateCmd::Remove if self.element_id.is_none() => {
                Err(ParseError("cmd=remove requires element_id".into()))
            }
            UpdateCmd::Remove if self.subfield.is_some() => Err(ParseError(
                "cmd=remove deletes a whole element, use cmd=unset for a subfield".into(),
            )),
            UpdateCmd::Unset if self.element_id.is_some() && self.subfield.is_none() => {
                Err(ParseError(UNSET_ARRAY_WITHOUT_SUBFIELD.into()))
            }
            _ => Ok(()),
        }
    }
}

/// Parse a command from its document form:
/// `{ cmd: "set", field: "tags", element_id: "a", value: "b" }`.
pub fn parse_command(doc: &Document) -> Result<UpdateFieldCommand, ParseError> {
    let cmd = match doc.get("cmd") {
        Some(Bson::String(s)) => match s.as_str() {
            "set" => UpdateCmd::Set,
            "unset" => UpdateCmd::Unset,
            "insert" => UpdateCmd::Insert,
            "remove" => UpdateCmd::Remove,
            other => return Err(ParseError(format!("unknown cmd: {other}"))),
        },
        Some(_) => return Err(ParseError("cmd must be a string".into())),
        None => return Err(ParseError("cmd is required".into())),
    };
    let field = match doc.get("field") {
        Some(Bson::String(s)) => s.clone(),
        Some(_) => return Err(ParseError("field must be a string".into())),
        None => return Err(ParseError("field is required".into())),
    };

    let command = UpdateFieldCommand {
        cmd,
        field,
        key_field: optional_string(doc, "key_field")?,
        element_id: optional_value(doc, "element_id"),
        subfield: optional_string(doc, "subfield")?,
        value: optional_value(doc, "value"),
    };
    command.validate()?;
    Ok(command)
}

/// Parse an array of command documents.
pub fn parse_commands(docs: &[Document]) -> Result<Vec<UpdateFieldCommand>, ParseError> {
    if docs.is_empty() {
        return Err(ParseError("no update commands".into()));
    }
    docs.iter().map(parse_command).collect()
}

/// Parse error for update commands.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError(pub String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseError {}

// ── Internal helpers ────────────────────────────────────────────

fn optional_string(doc: &Document, key: &str) -> Result<Option<String>, ParseError> {
    match doc.get(key) {
        None | Some(Bson::Null) => Ok(None),
        Some(Bson::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ParseError(format!("{key} must be a string"))),
    }
}

fn optional_value(doc: &Document, key: &str) -> Option<Bson> {
    match doc.get(key) {
        None | Some(Bson::Null) => None,
        Some(v) => Some(v.clone()),
    }
}
