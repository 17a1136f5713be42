use super::{id_key, parse_u64, word_key, IndexStore, StoreError, ID_PREFIX, MAX_ID_KEY};
use sled::transaction::ConflictableTransactionError;
use std::collections::HashMap;

impl IndexStore {
    /// Map terms to their dense integer ids. With `allow_create`, unknown
    /// terms are assigned `max_id + 1` and both directions plus the new
    /// `max_id` are committed in the same transaction; without it, unknown
    /// terms yield 0. The whole batch is all-or-nothing.
    pub fn intern(&self, terms: &[String], allow_create: bool) -> Result<Vec<u64>, StoreError> {
        let ids = self.db().transaction(|tx| {
            let mut ids = Vec::with_capacity(terms.len());
            let mut max_id = match tx.get(MAX_ID_KEY)? {
                Some(v) => parse_u64(&v).map_err(ConflictableTransactionError::Abort)?,
                None => 0,
            };
            for term in terms {
                let key = word_key(term);
                match tx.get(&key)? {
                    Some(v) => {
                        ids.push(parse_u64(&v).map_err(ConflictableTransactionError::Abort)?);
                    }
                    None if allow_create => {
                        max_id += 1;
                        tx.insert(id_key(max_id), term.as_bytes())?;
                        tx.insert(key, max_id.to_string().as_bytes())?;
                        tx.insert(MAX_ID_KEY, max_id.to_string().as_bytes())?;
                        ids.push(max_id);
                    }
                    None => ids.push(0),
                }
            }
            Ok(ids)
        })?;
        Ok(ids)
    }

    /// Inverse mapping; an unknown id yields the empty string.
    pub fn lookup(&self, ids: &[u64]) -> Result<Vec<String>, StoreError> {
        let mut terms = Vec::with_capacity(ids.len());
        for id in ids {
            match self.db().get(id_key(*id))? {
                Some(v) => terms.push(
                    String::from_utf8(v.to_vec())
                        .map_err(|e| StoreError::Corrupt(e.to_string()))?,
                ),
                None => terms.push(String::new()),
            }
        }
        Ok(terms)
    }

    pub fn max_id(&self) -> Result<u64, StoreError> {
        match self.db().get(MAX_ID_KEY)? {
            Some(v) => parse_u64(&v),
            None => Ok(0),
        }
    }

    /// Full id -> term dictionary, for diagnostics.
    pub fn vocabulary(&self) -> Result<HashMap<u64, String>, StoreError> {
        let mut vocab = HashMap::new();
        for entry in self.db().scan_prefix(ID_PREFIX) {
            let (key, value) = entry?;
            let id = std::str::from_utf8(&key)
                .ok()
                .and_then(|k| k.strip_prefix(ID_PREFIX))
                .and_then(|k| k.parse().ok())
                .ok_or_else(|| StoreError::Corrupt(format!("bad vocabulary key: {key:?}")))?;
            let term = String::from_utf8(value.to_vec())
                .map_err(|e| StoreError::Corrupt(e.to_string()))?;
            vocab.insert(id, term);
        }
        Ok(vocab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, IndexStore) {
        let dir = tempdir().unwrap();
        let store = IndexStore::open(dir.path()).unwrap();
        (dir, store)
    }

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn intern_allocates_monotonic_ids() {
        let (_dir, store) = store();
        let ids = store.intern(&terms(&["alpha", "beta", "gamma"]), true).unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(store.max_id().unwrap(), 3);
        // existing terms keep their ids
        let again = store.intern(&terms(&["beta", "alpha"]), true).unwrap();
        assert_eq!(again, vec![2, 1]);
        assert_eq!(store.max_id().unwrap(), 3);
    }

    #[test]
    fn bijection_holds_through_lookup() {
        let (_dir, store) = store();
        let words = terms(&["crawl", "index", "rank"]);
        let ids = store.intern(&words, true).unwrap();
        let back = store.lookup(&ids).unwrap();
        assert_eq!(back, words);
    }

    #[test]
    fn read_only_miss_yields_zero() {
        let (_dir, store) = store();
        store.intern(&terms(&["known"]), true).unwrap();
        let ids = store.intern(&terms(&["known", "unknown"]), false).unwrap();
        assert_eq!(ids, vec![1, 0]);
        assert_eq!(store.max_id().unwrap(), 1);
    }

    #[test]
    fn unknown_id_yields_empty_string() {
        let (_dir, store) = store();
        assert_eq!(store.lookup(&[42]).unwrap(), vec![String::new()]);
    }

    #[test]
    fn vocabulary_snapshot_is_complete() {
        let (_dir, store) = store();
        store.intern(&terms(&["one", "two"]), true).unwrap();
        let vocab = store.vocabulary().unwrap();
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab[&1], "one");
        assert_eq!(vocab[&2], "two");
    }
}
