//! In-memory tables with snapshot transactions.

use std::collections::{BTreeMap, HashSet};

use indexmap::IndexMap;

use forma_config::StoreConfig;
use forma_core::store::UnitOfWork;
use forma_core::value::{is_blank, render};
use forma_core::{Attributes, EntityError, Store, StoreError, Value};

use crate::journal::{StoreOp, StoreOperation};

/// Records of one kind, keyed by the rendered key. `7` and `"7"` address the
/// same record.
type Table = IndexMap<String, StoredRecord>;

#[derive(Debug, Clone)]
struct StoredRecord {
    key: Value,
    attributes: Attributes,
}

#[derive(Debug)]
struct Snapshot {
    tables: BTreeMap<String, Table>,
    journal_len: usize,
}

#[derive(Debug)]
pub struct MemoryStore {
    tables: BTreeMap<String, Table>,
    next_key: u64,
    journal: Vec<StoreOperation>,
    failing: HashSet<String>,
    depth: usize,
    transactions: usize,
    rollbacks: usize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&StoreConfig::default())
    }

    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            tables: BTreeMap::new(),
            next_key: config.first_key,
            journal: Vec::new(),
            failing: HashSet::new(),
            depth: 0,
            transactions: 0,
            rollbacks: 0,
        }
    }

    /// Seed a record under a freshly assigned key and return the key.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if writes to `kind` are set to fail.
    pub fn insert(&mut self, kind: &str, record: Attributes) -> Result<Value, StoreError> {
        self.save(kind, None, &record)
    }

    #[must_use]
    pub fn get(&self, kind: &str, key: &Value) -> Option<&Attributes> {
        self.tables
            .get(kind)?
            .get(&render(key))
            .map(|stored| &stored.attributes)
    }

    /// Stored records of `kind`, in insertion order.
    pub fn records(&self, kind: &str) -> impl Iterator<Item = (&Value, &Attributes)> {
        self.tables
            .get(kind)
            .into_iter()
            .flat_map(|table| table.values().map(|stored| (&stored.key, &stored.attributes)))
    }

    #[must_use]
    pub fn len(&self, kind: &str) -> usize {
        self.tables.get(kind).map_or(0, IndexMap::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.values().all(IndexMap::is_empty)
    }

    /// Committed writes, oldest first.
    #[must_use]
    pub fn journal(&self) -> &[StoreOperation] {
        &self.journal
    }

    /// Make every subsequent write to `kind` fail with a backend error.
    pub fn fail_on(&mut self, kind: impl Into<String>) {
        self.failing.insert(kind.into());
    }

    pub fn clear_failures(&mut self) {
        self.failing.clear();
    }

    /// Number of outermost transactions started.
    #[must_use]
    pub const fn transactions(&self) -> usize {
        self.transactions
    }

    /// Number of outermost transactions rolled back.
    #[must_use]
    pub const fn rollbacks(&self) -> usize {
        self.rollbacks
    }

    #[must_use]
    pub const fn in_transaction(&self) -> bool {
        self.depth > 0
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            tables: self.tables.clone(),
            journal_len: self.journal.len(),
        }
    }

    /// Keys handed out inside the rolled-back work stay spent, so an entity
    /// still holding one never collides with a later insert.
    fn restore(&mut self, snapshot: Snapshot) {
        self.tables = snapshot.tables;
        self.journal.truncate(snapshot.journal_len);
    }

    fn assign_key(&mut self) -> Value {
        let key = Value::from(self.next_key);
        self.next_key += 1;
        key
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn find(&self, kind: &str, key: &Value) -> Result<Attributes, StoreError> {
        self.get(kind, key).cloned().ok_or_else(|| StoreError::NotFound {
            kind: kind.to_string(),
            key: render(key),
        })
    }

    fn save(
        &mut self,
        kind: &str,
        key: Option<&Value>,
        record: &Attributes,
    ) -> Result<Value, StoreError> {
        if self.failing.contains(kind) {
            return Err(StoreError::Backend(format!("writes to {kind} are failing")));
        }

        let key = match key.filter(|k| !is_blank(k)) {
            Some(key) => key.clone(),
            None => self.assign_key(),
        };
        let table = self.tables.entry(kind.to_string()).or_default();
        let op = match table.insert(
            render(&key),
            StoredRecord {
                key: key.clone(),
                attributes: record.clone(),
            },
        ) {
            Some(_) => StoreOp::Update,
            None => StoreOp::Insert,
        };

        tracing::debug!(%kind, key = %key, %op, "store write");
        self.journal.push(StoreOperation {
            op,
            kind: kind.to_string(),
            key: key.clone(),
            data: record.clone(),
        });
        Ok(key)
    }

    fn transaction(&mut self, work: &mut UnitOfWork<'_>) -> Result<(), EntityError> {
        if self.depth > 0 {
            self.depth += 1;
            let result = work(self);
            self.depth -= 1;
            return result;
        }

        let snapshot = self.snapshot();
        self.transactions += 1;
        self.depth = 1;
        let result = work(self);
        self.depth = 0;

        if let Err(e) = &result {
            self.restore(snapshot);
            self.rollbacks += 1;
            tracing::warn!(error = %e, "transaction rolled back");
        }
        result
    }
}
