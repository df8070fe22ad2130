mod callback;
mod contract;
mod document;
mod error;
mod features;
pub mod update;

pub use bson::{Bson, Document};
pub use callback::CallbackExt;
pub use contract::DocumentDatabase;
pub use document::{document_id, object_version};
pub use error::{DbError, ID_INVALID, ID_NOT_ALLOWED_FOR_CREATE, ID_OR_IDS_INVALID};
pub use features::{ArrayFeatures, Capability, FindFeatures, ObjectFeatures, SupportedFeatures, UpdateFeatures};
pub use docdb_query::UNSET_ARRAY_WITHOUT_SUBFIELD;
