use super::{doc_key, IndexStore, StoreError, DOC_PREFIX};
use crate::document::Document;
use uuid::Uuid;

impl IndexStore {
    /// Upsert a document record under `doc:<uuid>`.
    pub fn save_document(&self, doc: &Document) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(doc)?;
        self.db().insert(doc_key(&doc.id), bytes)?;
        Ok(())
    }

    pub fn document(&self, id: &Uuid) -> Result<Document, StoreError> {
        let bytes = self.db().get(doc_key(id))?.ok_or(StoreError::NotFound)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn documents(&self) -> Result<Vec<Document>, StoreError> {
        let mut docs = Vec::new();
        for entry in self.db().scan_prefix(DOC_PREFIX) {
            let (_, value) = entry?;
            docs.push(serde_json::from_slice(&value)?);
        }
        Ok(docs)
    }

    pub fn document_count(&self) -> Result<usize, StoreError> {
        let mut count = 0;
        for entry in self.db().scan_prefix(DOC_PREFIX) {
            entry?;
            count += 1;
        }
        Ok(count)
    }
}
