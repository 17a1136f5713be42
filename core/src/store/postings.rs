use super::{parse_u32, posting_key, IndexStore, StoreError, POSTING_PREFIX};
use std::collections::HashMap;
use uuid::Uuid;

impl IndexStore {
    /// Record the term frequencies of one document. Each stem's posting for
    /// `doc` becomes its frequency in this call; a document is indexed once,
    /// so frequencies replace rather than accumulate.
    pub fn index_document(&self, doc: &Uuid, stems: &[String]) -> Result<(), StoreError> {
        let mut freqs: HashMap<&str, u32> = HashMap::new();
        for stem in stems {
            *freqs.entry(stem.as_str()).or_insert(0) += 1;
        }
        for (term, freq) in freqs {
            self.db()
                .insert(posting_key(term, doc), freq.to_string().as_bytes())?;
        }
        Ok(())
    }

    /// All documents containing `term`, with occurrence counts.
    pub fn postings(&self, term: &str) -> Result<HashMap<Uuid, u32>, StoreError> {
        let prefix = format!("{POSTING_PREFIX}{term}:");
        let mut map = HashMap::new();
        for entry in self.db().scan_prefix(prefix.as_bytes()) {
            let (key, value) = entry?;
            let id = std::str::from_utf8(&key)
                .ok()
                .and_then(|k| k.strip_prefix(&prefix))
                .and_then(|k| Uuid::parse_str(k).ok())
                .ok_or_else(|| StoreError::Corrupt(format!("bad posting key: {key:?}")))?;
            map.insert(id, parse_u32(&value)?);
        }
        Ok(map)
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

    fn stems(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn frequencies_are_counted_per_document() {
        let (_dir, store) = store();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.index_document(&a, &stems(&["fox", "fox", "dog"])).unwrap();
        store.index_document(&b, &stems(&["fox"])).unwrap();

        let fox = store.postings("fox").unwrap();
        assert_eq!(fox.len(), 2);
        assert_eq!(fox[&a], 2);
        assert_eq!(fox[&b], 1);

        let dog = store.postings("dog").unwrap();
        assert_eq!(dog.len(), 1);
        assert_eq!(dog[&a], 1);
    }

    #[test]
    fn unknown_term_has_empty_posting() {
        let (_dir, store) = store();
        assert!(store.postings("ghost").unwrap().is_empty());
    }

    #[test]
    fn reindexing_replaces_frequency() {
        let (_dir, store) = store();
        let a = Uuid::new_v4();
        store.index_document(&a, &stems(&["fox", "fox"])).unwrap();
        store.index_document(&a, &stems(&["fox"])).unwrap();
        assert_eq!(store.postings("fox").unwrap()[&a], 1);
    }

    #[test]
    fn prefix_terms_do_not_collide() {
        let (_dir, store) = store();
        let a = Uuid::new_v4();
        store.index_document(&a, &stems(&["cat", "catalog"])).unwrap();
        assert_eq!(store.postings("cat").unwrap().len(), 1);
        assert_eq!(store.postings("catalog").unwrap().len(), 1);
    }
}
