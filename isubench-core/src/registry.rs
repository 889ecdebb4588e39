//! Ordered, indexed entity registry
//!
//! A [`Registry`] keeps its entities newest first (creation time descending,
//! then ID descending) alongside an ID index over the same elements. Both
//! are guarded by one lock so positional and ID lookups never disagree.

use crate::error::{BenchError, BenchResult};
use crate::model::Entity;
use parking_lot::RwLock;
use rand::Rng;
use serde::de::DeserializeOwned;
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
struct Inner<T> {
    list: VecDeque<Arc<T>>,
    index: HashMap<u64, Arc<T>>,
}

/// Thread-safe registry of one entity kind
#[derive(Debug)]
pub struct Registry<T> {
    inner: RwLock<Inner<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Inner {
                list: VecDeque::new(),
                index: HashMap::new(),
            }),
        }
    }
}

/// Feed order: newer first, higher ID first among equal timestamps
fn feed_order<T: Entity>(a: &T, b: &T) -> Ordering {
    b.created_at()
        .cmp(&a.created_at())
        .then_with(|| b.id().cmp(&a.id()))
}

impl<T: Entity> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().list.is_empty()
    }

    /// Entity at `index` in feed order
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn at(&self, index: usize) -> Arc<T> {
        Arc::clone(&self.inner.read().list[index])
    }

    /// Most recently inserted entity carrying `id`
    pub fn get(&self, id: u64) -> Option<Arc<T>> {
        self.inner.read().index.get(&id).cloned()
    }

    /// Insert `entity` at its feed position; entities with ID 0 are refused
    ///
    /// An entity whose key equals an existing one goes after it. A repeated
    /// ID replaces the index entry but leaves both entries in the sequence.
    pub fn insert(&self, entity: T) -> bool {
        let id = entity.id();
        if id == 0 {
            return false;
        }

        let entity = Arc::new(entity);
        let mut inner = self.inner.write();
        let pos = inner
            .list
            .partition_point(|occupant| feed_order(occupant.as_ref(), entity.as_ref()) != Ordering::Greater);
        inner.list.insert(pos, Arc::clone(&entity));
        inner.index.insert(id, entity);
        true
    }

    /// Call `f(position, entity)` over a snapshot taken when the call starts
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(usize, &Arc<T>),
    {
        let snapshot: Vec<Arc<T>> = self.inner.read().list.iter().cloned().collect();
        for (position, entity) in snapshot.iter().enumerate() {
            f(position, entity);
        }
    }

    /// Uniformly random entity, `None` when empty
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Arc<T>> {
        let inner = self.inner.read();
        if inner.list.is_empty() {
            return None;
        }
        let index = rng.random_range(0..inner.list.len());
        Some(Arc::clone(&inner.list[index]))
    }
}

impl<T: Entity + DeserializeOwned> Registry<T> {
    /// Load a JSON array dump, inserting elements in file order
    pub fn load_json(&self, path: impl AsRef<Path>) -> BenchResult<usize> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| BenchError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let loaded = self.load_json_reader(BufReader::new(file)).map_err(|e| match e {
            BenchError::Json { source, .. } => BenchError::Json {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        debug!("Loaded {} entities from {}", loaded, path.display());
        Ok(loaded)
    }

    /// Load a JSON array from any reader
    pub fn load_json_reader<R: Read>(&self, reader: R) -> BenchResult<usize> {
        let entities: Vec<T> =
            serde_json::from_reader(reader).map_err(|source| BenchError::Json {
                path: Default::default(),
                source,
            })?;

        let count = entities.len();
        for (index, entity) in entities.into_iter().enumerate() {
            if !self.insert(entity) {
                return Err(BenchError::InvalidEntity { index });
            }
        }
        Ok(count)
    }
}
