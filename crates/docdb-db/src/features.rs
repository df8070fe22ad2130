use std::fmt;

use docdb_query::{UpdateCmd, UpdateFieldCommand};
use serde::{Deserialize, Serialize};

/// Which optional contract behaviors a backend fully supports.
///
/// `create`, `read` and `delete` are always required and have no flag. The
/// matrix drives test selection in the conformance harness; a backend may also
/// use it to fail fast on calls it cannot honor. It is never sent on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedFeatures {
    pub replace: bool,
    pub update: UpdateFeatures,
    pub find: FindFeatures,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateFeatures {
    pub object: ObjectFeatures,
    pub array: ArrayFeatures,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectFeatures {
    pub set: bool,
    pub unset: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayFeatures {
    pub set: bool,
    pub unset: bool,
    pub insert: bool,
    pub remove: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindFeatures {
    pub all: bool,
}

/// One flag of the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Replace,
    ObjectSet,
    ObjectUnset,
    ArraySet,
    ArrayUnset,
    ArrayInsert,
    ArrayRemove,
    FindAll,
}

impl Capability {
    /// The capability an update command exercises.
    ///
    /// `insert` and `remove` always operate on arrays; `set` and `unset` do when
    /// they select an element.
    pub fn of_command(command: &UpdateFieldCommand) -> Self {
        match (command.cmd, command.targets_element()) {
            (UpdateCmd::Set, false) => Capability::ObjectSet,
            (UpdateCmd::Unset, false) => Capability::ObjectUnset,
            (UpdateCmd::Set, true) => Capability::ArraySet,
            (UpdateCmd::Unset, true) => Capability::ArrayUnset,
            (UpdateCmd::Insert, _) => Capability::ArrayInsert,
            (UpdateCmd::Remove, _) => Capability::ArrayRemove,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Replace => "replace",
            Capability::ObjectSet => "update.object.set",
            Capability::ObjectUnset => "update.object.unset",
            Capability::ArraySet => "update.array.set",
            Capability::ArrayUnset => "update.array.unset",
            Capability::ArrayInsert => "update.array.insert",
            Capability::ArrayRemove => "update.array.remove",
            Capability::FindAll => "find.all",
        };
        f.write_str(name)
    }
}

impl SupportedFeatures {
    /// Every optional behavior supported.
    pub fn all() -> Self {
        Self {
            replace: true,
            update: UpdateFeatures {
                object: ObjectFeatures {
                    set: true,
                    unset: true,
                },
                array: ArrayFeatures {
                    set: true,
                    unset: true,
                    insert: true,
                    remove: true,
                },
            },
            find: FindFeatures { all: true },
        }
    }

    /// Only the mandatory operations.
    pub fn none() -> Self {
        Self::default()
    }

    /// Load a matrix shipped as JSON, e.g. next to a backend's test config.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Replace => self.replace,
            Capability::ObjectSet => self.update.object.set,
            Capability::ObjectUnset => self.update.object.unset,
            Capability::ArraySet => self.update.array.set,
            Capability::ArrayUnset => self.update.array.unset,
            Capability::ArrayInsert => self.update.array.insert,
            Capability::ArrayRemove => self.update.array.remove,
            Capability::FindAll => self.find.all,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_and_none() {
        let all = SupportedFeatures::all();
        let none = SupportedFeatures::none();
        for cap in [
            Capability::Replace,
            Capability::ObjectSet,
            Capability::ObjectUnset,
            Capability::ArraySet,
            Capability::ArrayUnset,
            Capability::ArrayInsert,
            Capability::ArrayRemove,
            Capability::FindAll,
        ] {
            assert!(all.supports(cap), "{cap}");
            assert!(!none.supports(cap), "{cap}");
        }
    }

    #[test]
    fn from_json() {
        let json = r#"{
            "replace": false,
            "update": {
                "object": { "set": true, "unset": true },
                "array": { "set": false, "unset": false, "insert": true, "remove": true }
            },
            "find": { "all": true }
        }"#;
        let f = SupportedFeatures::from_json_str(json).unwrap();
        assert!(!f.replace);
        assert!(f.update.object.set);
        assert!(!f.update.array.set);
        assert!(f.update.array.insert);
        assert!(f.find.all);
    }

    #[test]
    fn command_capability() {
        assert_eq!(
            Capability::of_command(&UpdateFieldCommand::set("a", 1)),
            Capability::ObjectSet
        );
        assert_eq!(
            Capability::of_command(&UpdateFieldCommand::set("tags", "b").element("a")),
            Capability::ArraySet
        );
        assert_eq!(
            Capability::of_command(&UpdateFieldCommand::insert("tags", "a")),
            Capability::ArrayInsert
        );
        assert_eq!(Capability::ArrayRemove.to_string(), "update.array.remove");
    }
}
