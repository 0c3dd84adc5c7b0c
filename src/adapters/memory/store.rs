//! In-process storage state
//!
//! Plain data structures behind [`MemoryBackend`](super::MemoryBackend): blob
//! containers, tables ordered by (partition key, row key), and the entity
//! operation semantics of the table service.

use crate::adapters::backend::traits::{QuerySegment, DEFAULT_CONTENT_TYPE};
use crate::domain::entity::{status, Entity, EntityOperation, TableResult};
use crate::domain::query::{TableQuery, MAX_PAGE_SIZE};
use crate::domain::{ContinuationToken, StorageError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use uuid::Uuid;

/// Largest number of operations accepted in one batch
pub const MAX_BATCH_OPERATIONS: usize = 100;

/// Rows of one table: partition key → row key → entity
pub type Rows = BTreeMap<String, BTreeMap<String, Entity>>;

/// A stored blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBlob {
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
    pub content_type: String,
    pub etag: String,
}

impl StoredBlob {
    /// New blob with the default content type
    pub fn new(content: Vec<u8>) -> Self {
        Self {
            content,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            etag: new_etag(),
        }
    }
}

/// Complete emulator state, serialized as the snapshot file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Store {
    #[serde(default)]
    pub containers: BTreeMap<String, BTreeMap<String, StoredBlob>>,

    #[serde(default)]
    pub tables: BTreeMap<String, Rows>,
}

pub(crate) fn new_etag() -> String {
    format!("W/\"{}\"", Uuid::new_v4().simple())
}

/// Stamps an entity with a fresh timestamp and ETag
fn stamp(mut entity: Entity) -> Entity {
    entity.timestamp = Some(Utc::now());
    entity.etag = Some(new_etag());
    entity
}

fn find<'a>(rows: &'a Rows, partition_key: &str, row_key: &str) -> Option<&'a Entity> {
    rows.get(partition_key).and_then(|p| p.get(row_key))
}

fn put(rows: &mut Rows, entity: Entity) -> TableResult {
    let entity = stamp(entity);
    let etag = entity.etag.clone();
    rows.entry(entity.partition_key().to_string())
        .or_default()
        .insert(entity.row_key().to_string(), entity);
    TableResult {
        status: status::NO_CONTENT,
        entity: None,
        etag,
    }
}

/// Applies one entity operation to a table's rows
///
/// Service outcomes are reported as statuses: 200 for a found entity, 204
/// for writes, 404 for a missing entity and 409 for an insert conflict.
pub fn apply(rows: &mut Rows, operation: EntityOperation) -> TableResult {
    match operation {
        EntityOperation::Insert(entity) => {
            if find(rows, entity.partition_key(), entity.row_key()).is_some() {
                return TableResult::with_status(status::CONFLICT);
            }
            put(rows, entity)
        }
        EntityOperation::InsertOrReplace(entity) => put(rows, entity),
        EntityOperation::InsertOrMerge(entity) => {
            let merged = match find(rows, entity.partition_key(), entity.row_key()) {
                Some(existing) => {
                    let mut merged = existing.clone();
                    merged.merge_from(&entity);
                    merged
                }
                None => entity,
            };
            put(rows, merged)
        }
        EntityOperation::Replace(entity) => {
            if find(rows, entity.partition_key(), entity.row_key()).is_none() {
                return TableResult::not_found();
            }
            put(rows, entity)
        }
        EntityOperation::Merge(entity) => {
            let Some(existing) = find(rows, entity.partition_key(), entity.row_key()) else {
                return TableResult::not_found();
            };
            let mut merged = existing.clone();
            merged.merge_from(&entity);
            put(rows, merged)
        }
        EntityOperation::Delete(entity) => {
            let (partition_key, row_key) = entity.key();
            let removed = rows.get_mut(partition_key).and_then(|p| p.remove(row_key));
            if rows.get(partition_key).is_some_and(|p| p.is_empty()) {
                rows.remove(partition_key);
            }
            match removed {
                Some(_) => TableResult::with_status(status::NO_CONTENT),
                None => TableResult::not_found(),
            }
        }
        EntityOperation::Retrieve {
            partition_key,
            row_key,
        } => match find(rows, &partition_key, &row_key) {
            Some(entity) => TableResult::with_entity(status::OK, entity.clone()),
            None => TableResult::not_found(),
        },
    }
}

/// Applies a group of operations to a table's rows, all or nothing
///
/// The group follows the table service's batch rules: at most 100
/// operations, one partition key, and each entity at most once.
///
/// # Errors
///
/// Returns a `Backend` error, leaving `rows` untouched, if the group breaks a
/// batch rule or any operation does not succeed.
pub fn apply_batch(
    rows: &mut Rows,
    operations: Vec<EntityOperation>,
) -> std::result::Result<Vec<TableResult>, StorageError> {
    if operations.len() > MAX_BATCH_OPERATIONS {
        return Err(StorageError::backend(
            status::BAD_REQUEST,
            format!(
                "Batch of {} operations exceeds the limit of {MAX_BATCH_OPERATIONS}",
                operations.len()
            ),
        ));
    }

    let mut seen = HashSet::new();
    let mut partition: Option<String> = None;
    for operation in &operations {
        let (partition_key, row_key) = operation.key();
        match partition {
            Some(ref pk) if pk != partition_key => {
                return Err(StorageError::backend(
                    status::BAD_REQUEST,
                    "All operations of a batch must share one partition key",
                ));
            }
            Some(_) => {}
            None => partition = Some(partition_key.to_string()),
        }
        if !seen.insert(row_key.to_string()) {
            return Err(StorageError::backend(
                status::BAD_REQUEST,
                format!("Entity '{partition_key}/{row_key}' appears more than once in the batch"),
            ));
        }
    }

    let mut staged = rows.clone();
    let mut results = Vec::with_capacity(operations.len());
    for (index, operation) in operations.into_iter().enumerate() {
        let name = operation.name();
        let result = apply(&mut staged, operation);
        if !result.is_success() {
            return Err(StorageError::backend(
                result.status,
                format!("Batch operation {index} ({name}) failed with status {}", result.status),
            ));
        }
        results.push(result);
    }

    *rows = staged;
    Ok(results)
}

/// Reads one segment of a query in (partition key, row key) order
///
/// The segment starts at the token's key when a token is given, seeking
/// straight to it rather than scanning the rows before it. When more matches
/// remain, the returned token names the first of them.
pub fn query_segment(
    rows: &Rows,
    query: &TableQuery,
    token: Option<&ContinuationToken>,
) -> QuerySegment {
    let take = query.page_size().clamp(1, MAX_PAGE_SIZE);
    let resume_partition = token.map(|t| t.next_partition_key.as_str());

    let mut matches = rows
        .range::<str, _>((lower_bound(resume_partition), Bound::Unbounded))
        .flat_map(move |(partition_key, partition)| {
            let resume_row = token
                .filter(|t| t.next_partition_key == *partition_key)
                .and_then(|t| t.next_row_key.as_deref());
            partition
                .range::<str, _>((lower_bound(resume_row), Bound::Unbounded))
                .map(|(_, entity)| entity)
        })
        .filter(|entity| query.matches(entity));

    let entities: Vec<Entity> = matches.by_ref().take(take).cloned().collect();
    let continuation = matches.next().map(|next| {
        ContinuationToken::new(next.partition_key(), Some(next.row_key().to_string()))
    });

    QuerySegment {
        entities,
        continuation,
    }
}

fn lower_bound(key: Option<&str>) -> Bound<&str> {
    key.map_or(Bound::Unbounded, Bound::Included)
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}
