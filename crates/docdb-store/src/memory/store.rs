use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use docdb_db::update::{apply_commands, bump_version};
use docdb_db::{
    Capability, DbError, DocumentDatabase, ID_INVALID, ID_NOT_ALLOWED_FOR_CREATE,
    ID_OR_IDS_INVALID, document_id, object_version,
};
use docdb_query::{Conditions, FieldPath, FindQuery, ID_FIELD, UpdateFieldCommand, VERSION_FIELD};
use imbl::OrdMap;
use tokio::sync::Mutex;

use super::config::MemoryConfig;
use crate::filter::matches;
use crate::sort::sort_documents;

/// Documents keyed by `_id`. Hex ObjectIds sort in creation order.
pub(crate) type Collection = OrdMap<String, Document>;

/// In-memory document store.
///
/// Readers load an immutable snapshot and never block. Writers are serialized
/// by `write_lock`, build the next snapshot from the current one (cheap thanks
/// to structural sharing) and publish it in one swap, so every call is atomic.
pub struct MemoryStore {
    docs: ArcSwap<Collection>,
    write_lock: Mutex<()>,
    config: MemoryConfig,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_config(MemoryConfig::default())
    }

    pub fn with_config(config: MemoryConfig) -> Self {
        Self {
            docs: ArcSwap::new(Arc::new(OrdMap::new())),
            write_lock: Mutex::new(()),
            config,
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.docs.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn require(&self, capability: Capability) -> Result<(), DbError> {
        if self.config.features.supports(capability) {
            Ok(())
        } else {
            tracing::warn!(%capability, "call rejected, capability disabled");
            Err(DbError::Unsupported(capability.to_string()))
        }
    }

    /// Locate the single document an update applies to.
    fn match_one(&self, docs: &Collection, conditions: &Conditions) -> Result<Document, DbError> {
        let candidates: Vec<&Document> = match conditions.get(ID_FIELD) {
            Some(Bson::String(id)) => docs.get(id).into_iter().collect(),
            _ => docs.values().collect(),
        };
        let mut kept = Vec::new();
        for doc in candidates {
            if matches(doc, conditions)? {
                kept.push(doc);
            }
        }
        match kept.as_slice() {
            [] => Err(DbError::NoMatch),
            [doc] => Ok((*doc).clone()),
            many => Err(DbError::AmbiguousMatch(many.len())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn is_valid_id(id: &str) -> bool {
    ObjectId::parse_str(id).is_ok()
}

fn expected_version(value: Option<&Bson>) -> Result<Option<i64>, DbError> {
    match value {
        None | Some(Bson::Null) => Ok(None),
        Some(Bson::Int32(v)) => Ok(Some(*v as i64)),
        Some(Bson::Int64(v)) => Ok(Some(*v)),
        Some(Bson::Double(v)) if v.fract() == 0.0 => Ok(Some(*v as i64)),
        Some(other) => Err(DbError::validation(format!("_obj_ver is invalid: {other}"))),
    }
}

fn check_version(expected: Option<i64>, stored: &Document) -> Result<(), DbError> {
    let actual = object_version(stored).unwrap_or(0);
    match expected {
        Some(expected) if expected != actual => {
            Err(DbError::VersionConflict { expected, actual })
        }
        _ => Ok(()),
    }
}

/// Keep `_id` plus the listed paths.
fn project(doc: &Document, fields: &[String]) -> Result<Document, DbError> {
    let mut out = Document::new();
    if let Some(id) = doc.get(ID_FIELD) {
        out.insert(ID_FIELD, id.clone());
    }
    for field in fields {
        let path = FieldPath::parse(field)?;
        if let Some(value) = path.resolve(doc) {
            if let Some((parent, leaf)) = path.parent_mut(&mut out, true)? {
                parent.insert(leaf, value.clone());
            }
        }
    }
    Ok(out)
}

#[async_trait]
impl DocumentDatabase for MemoryStore {
    async fn create(&self, doc: &Document) -> Result<Document, DbError> {
        if !matches!(doc.get(ID_FIELD), None | Some(Bson::Null)) {
            return Err(DbError::validation(ID_NOT_ALLOWED_FOR_CREATE));
        }

        let id = ObjectId::new().to_hex();
        let mut created = Document::new();
        created.insert(ID_FIELD, id.clone());
        for (key, value) in doc {
            if key.as_str() != ID_FIELD && key.as_str() != VERSION_FIELD {
                created.insert(key.clone(), value.clone());
            }
        }
        created.insert(VERSION_FIELD, Bson::Int64(1));

        let _guard = self.write_lock.lock().await;
        let mut next = (**self.docs.load()).clone();
        next.insert(id.clone(), created.clone());
        self.docs.store(Arc::new(next));

        tracing::debug!(%id, "created document");
        Ok(created)
    }

    async fn read(&self, id: &str) -> Result<Option<Document>, DbError> {
        if !is_valid_id(id) {
            return Err(DbError::validation(ID_OR_IDS_INVALID));
        }
        let found = self.docs.load().get(id).cloned();
        tracing::debug!(%id, found = found.is_some(), "read document");
        Ok(found)
    }

    async fn read_many(&self, ids: &[String]) -> Result<Vec<Document>, DbError> {
        if ids.iter().any(|id| !is_valid_id(id)) {
            return Err(DbError::validation(ID_OR_IDS_INVALID));
        }
        let docs = self.docs.load();
        let found: Vec<Document> = ids.iter().filter_map(|id| docs.get(id).cloned()).collect();
        tracing::debug!(requested = ids.len(), found = found.len(), "read documents");
        Ok(found)
    }

    async fn replace(&self, doc: &Document) -> Result<Document, DbError> {
        self.require(Capability::Replace)?;
        let id = match document_id(doc) {
            Some(id) if is_valid_id(&id) => id,
            _ => return Err(DbError::validation(ID_INVALID)),
        };
        let expected = expected_version(doc.get(VERSION_FIELD))?;

        let _guard = self.write_lock.lock().await;
        let current = self.docs.load();
        let stored = current.get(&id).ok_or(DbError::NoMatch)?;
        check_version(expected, stored)?;

        let mut replaced = Document::new();
        replaced.insert(ID_FIELD, id.clone());
        for (key, value) in doc {
            if key.as_str() != ID_FIELD && key.as_str() != VERSION_FIELD {
                replaced.insert(key.clone(), value.clone());
            }
        }
        replaced.insert(VERSION_FIELD, Bson::Int64(object_version(stored).unwrap_or(0)));
        let version = bump_version(&mut replaced);

        let mut next = (**current).clone();
        next.insert(id.clone(), replaced.clone());
        self.docs.store(Arc::new(next));

        tracing::debug!(%id, version, "replaced document");
        Ok(replaced)
    }

    async fn update(
        &self,
        conditions: &Conditions,
        updates: &[UpdateFieldCommand],
    ) -> Result<Document, DbError> {
        for command in updates {
            self.require(Capability::of_command(command))?;
        }
        let expected = expected_version(conditions.get(VERSION_FIELD))?;
        let mut match_conditions = conditions.clone();
        match_conditions.remove(VERSION_FIELD);

        let _guard = self.write_lock.lock().await;
        let current = self.docs.load();
        let mut doc = self.match_one(&current, &match_conditions)?;
        check_version(expected, &doc)?;

        apply_commands(&mut doc, updates)?;
        let version = bump_version(&mut doc);
        let id = document_id(&doc).ok_or_else(|| DbError::backend("stored document without _id"))?;

        let mut next = (**current).clone();
        next.insert(id.clone(), doc.clone());
        self.docs.store(Arc::new(next));

        tracing::debug!(%id, version, commands = updates.len(), "updated document");
        Ok(doc)
    }

    async fn delete(&self, id: &str) -> Result<(), DbError> {
        if !is_valid_id(id) {
            return Err(DbError::validation(ID_INVALID));
        }
        let _guard = self.write_lock.lock().await;
        let current = self.docs.load();
        if !current.contains_key(id) {
            tracing::debug!(%id, "delete of absent document");
            return Ok(());
        }
        let mut next = (**current).clone();
        next.remove(id);
        self.docs.store(Arc::new(next));
        tracing::debug!(%id, "deleted document");
        Ok(())
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<Document>, DbError> {
        let conditions = query.conditions.clone().unwrap_or_default();
        if conditions.is_empty() {
            self.require(Capability::FindAll)?;
        }

        let docs = self.docs.load();
        let mut hits = Vec::new();
        for doc in docs.values() {
            if matches(doc, &conditions)? {
                hits.push(doc.clone());
            }
        }
        sort_documents(&mut hits, query.sort.as_ref())?;

        let total = hits.len();
        let page = query.window().window(hits);
        let page = match &query.fields {
            Some(fields) => page
                .iter()
                .map(|doc| project(doc, fields))
                .collect::<Result<Vec<_>, _>>()?,
            None => page,
        };
        tracing::debug!(total, returned = page.len(), "find");
        Ok(page)
    }
}
