//! Single-flight cache of resolved collection handles
//!
//! Each name maps to a [`OnceCell`]. Concurrent first resolutions of the same
//! name wait on the same cell, so the backend sees one existence check (and at
//! most one creation call). A resolution that fails or finds nothing leaves
//! the cell empty and the next caller tries again.

use crate::domain::{Result, StowageError};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

/// Name-keyed cache of handles
#[derive(Debug)]
pub struct HandleCache<H> {
    cells: Mutex<HashMap<String, Arc<OnceCell<H>>>>,
}

/// Why a resolution left its cell empty
enum Miss {
    Absent,
    Failed(StowageError),
}

impl<H: Clone> HandleCache<H> {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached handle for `name`, if resolved
    pub fn get(&self, name: &str) -> Option<H> {
        let cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells.get(name).and_then(|cell| cell.get().cloned())
    }

    /// Number of resolved names
    pub fn len(&self) -> usize {
        let cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells.values().filter(|cell| cell.initialized()).count()
    }

    /// Returns `true` if no name has been resolved
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell(&self, name: &str) -> Arc<OnceCell<H>> {
        let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    /// Returns the cached handle for `name`, running `resolve` on a miss
    ///
    /// `resolve` returns `Ok(None)` when the collection does not exist; that
    /// outcome is passed through and not cached.
    pub async fn get_or_resolve<F, Fut>(&self, name: &str, resolve: F) -> Result<Option<H>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<H>>>,
    {
        let cell = self.cell(name);
        let outcome = cell
            .get_or_try_init(|| async {
                match resolve().await {
                    Ok(Some(handle)) => Ok(handle),
                    Ok(None) => Err(Miss::Absent),
                    Err(e) => Err(Miss::Failed(e)),
                }
            })
            .await;

        match outcome {
            Ok(handle) => Ok(Some(handle.clone())),
            Err(Miss::Absent) => Ok(None),
            Err(Miss::Failed(e)) => Err(e),
        }
    }
}

impl<H: Clone> Default for HandleCache<H> {
    fn default() -> Self {
        Self::new()
    }
}
