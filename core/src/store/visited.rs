use super::{visited_key, IndexStore, StoreError, VISITED_PREFIX};
use dashmap::DashSet;

impl IndexStore {
    /// Populate the in-memory visited set from the `visited:` namespace.
    pub fn load_visited(&self, set: &DashSet<String>) -> Result<(), StoreError> {
        for entry in self.db().scan_prefix(VISITED_PREFIX) {
            let (key, _) = entry?;
            let url = std::str::from_utf8(&key)
                .ok()
                .and_then(|k| k.strip_prefix(VISITED_PREFIX))
                .ok_or_else(|| StoreError::Corrupt(format!("bad visited key: {key:?}")))?;
            set.insert(url.to_string());
        }
        Ok(())
    }

    /// Persist the visited set at job end.
    pub fn save_visited(&self, set: &DashSet<String>) -> Result<(), StoreError> {
        let mut batch = sled::Batch::default();
        for url in set.iter() {
            batch.insert(visited_key(url.key()), &b""[..]);
        }
        self.db().apply_batch(batch)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn visited_set_round_trips() {
        let dir = tempdir().unwrap();
        let store = IndexStore::open(dir.path()).unwrap();
        let set = DashSet::new();
        set.insert("http://a.test".to_string());
        set.insert("http://a.test/page".to_string());
        store.save_visited(&set).unwrap();

        let loaded = DashSet::new();
        store.load_visited(&loaded).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.contains("http://a.test/page"));
    }

    #[test]
    fn concurrent_inserts_dedup_to_one() {
        let set = Arc::new(DashSet::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let set = set.clone();
            handles.push(std::thread::spawn(move || {
                set.insert("http://a.test/same".to_string())
            }));
        }
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|inserted| *inserted)
            .count();
        assert_eq!(wins, 1);
        assert_eq!(set.len(), 1);
    }
}
