pub mod command;
pub mod compare;
mod cursor;
pub mod path;
mod query;

pub use command::{
    ParseError, UNSET_ARRAY_WITHOUT_SUBFIELD, UpdateCmd, UpdateFieldCommand, parse_command,
    parse_commands,
};
pub use compare::{deep_equal_marshalled, documents_equal};
pub use cursor::{Cursor, DEFAULT_COUNT};
pub use path::{FieldPath, PathError, get_value};
pub use query::{Conditions, Fields, FindQuery, Sort};

/// Backend-assigned document identifier.
pub const ID_FIELD: &str = "_id";

/// Object version, 1 on create and incremented on every replace/update.
pub const VERSION_FIELD: &str = "_obj_ver";
