mod docs;
mod postings;
mod visited;
mod vocab;

use sled::transaction::TransactionError;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

pub(crate) const DOC_PREFIX: &str = "doc:";
pub(crate) const WORD_PREFIX: &str = "word:";
pub(crate) const ID_PREFIX: &str = "id:";
pub(crate) const POSTING_PREFIX: &str = "posting:";
pub(crate) const VISITED_PREFIX: &str = "visited:";
pub(crate) const MAX_ID_KEY: &[u8] = b"max_id";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found")]
    NotFound,
    #[error("storage engine: {0}")]
    Backend(#[from] sled::Error),
    #[error("record codec: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<TransactionError<StoreError>> for StoreError {
    fn from(err: TransactionError<StoreError>) -> Self {
        match err {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => StoreError::Backend(e),
        }
    }
}

/// One handle over the on-disk index database. All namespaces (documents,
/// postings, vocabulary, visited set) share the single keyspace; writes are
/// serialized by the engine.
pub struct IndexStore {
    db: sled::Db,
}

impl IndexStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    pub(crate) fn db(&self) -> &sled::Db {
        &self.db
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}

pub(crate) fn doc_key(id: &Uuid) -> Vec<u8> {
    format!("{DOC_PREFIX}{id}").into_bytes()
}

pub(crate) fn word_key(term: &str) -> Vec<u8> {
    format!("{WORD_PREFIX}{term}").into_bytes()
}

pub(crate) fn id_key(id: u64) -> Vec<u8> {
    format!("{ID_PREFIX}{id}").into_bytes()
}

pub(crate) fn posting_key(term: &str, doc: &Uuid) -> Vec<u8> {
    format!("{POSTING_PREFIX}{term}:{doc}").into_bytes()
}

pub(crate) fn visited_key(url: &str) -> Vec<u8> {
    format!("{VISITED_PREFIX}{url}").into_bytes()
}

pub(crate) fn parse_u64(bytes: &[u8]) -> Result<u64, StoreError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| StoreError::Corrupt(format!("not a decimal integer: {bytes:?}")))
}

pub(crate) fn parse_u32(bytes: &[u8]) -> Result<u32, StoreError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| StoreError::Corrupt(format!("not a decimal integer: {bytes:?}")))
}
