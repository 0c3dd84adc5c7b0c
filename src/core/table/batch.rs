//! Chunking of batched entity operations
//!
//! The table service accepts at most 100 operations per atomic batch. Larger
//! inputs are split into consecutive chunks that keep the input order.

use crate::domain::entity::{status, TableResult};
use crate::domain::{StorageError, StowageError};

/// Largest number of operations submitted in one backend batch call
pub const MAX_BATCH_SIZE: usize = 100;

/// Splits `items` into consecutive chunks of at most `size` items
///
/// `size` is clamped to `1..=MAX_BATCH_SIZE`.
pub fn chunk<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let size = size.clamp(1, MAX_BATCH_SIZE);
    let mut chunks = Vec::with_capacity(items.len().div_ceil(size));
    let mut current = Vec::with_capacity(size.min(items.len()));

    for item in items {
        current.push(item);
        if current.len() == size {
            chunks.push(std::mem::replace(&mut current, Vec::with_capacity(size)));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Builds the error for a chunk that failed after `completed` results
///
/// A failure of the first chunk committed nothing and is returned as is.
/// Later failures carry the results of the committed chunks.
pub fn abort(completed: Vec<TableResult>, failed_chunk: usize, error: StowageError) -> StowageError {
    if failed_chunk == 0 {
        return error;
    }

    let source = match error {
        StowageError::Storage(source) => source,
        other => StorageError::backend(status::INTERNAL_SERVER_ERROR, other.to_string()),
    };

    StorageError::BatchAborted {
        completed,
        failed_chunk,
        source: Box::new(source),
    }
    .into()
}
