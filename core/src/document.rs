use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A crawled page as persisted under the `doc:` namespace.
///
/// `words` carries the stemmed body between the spider and the indexer;
/// it is persisted as postings, not inside the record, so serde skips it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "words_count")]
    pub word_count: usize,
    pub part_of_full_size: f64,
    #[serde(default)]
    pub vec: Vec<Vec<f64>>,
    #[serde(skip)]
    pub words: Vec<String>,
}

/// How much of the cleaned body is kept as the description snippet.
const DESCRIPTION_CHARS: usize = 200;

impl Document {
    /// Build a document from a fetched page. `stems` is the tokenized body
    /// and `raw_tokens` the token count before stopword filtering, which
    /// yields the retained fraction used for length normalization.
    pub fn from_crawl(url: String, text: &str, stems: Vec<String>, raw_tokens: usize) -> Self {
        let part_of_full_size = if raw_tokens > 0 {
            stems.len() as f64 / raw_tokens as f64
        } else {
            1.0
        };
        Self {
            id: Uuid::new_v4(),
            url,
            description: text.chars().take(DESCRIPTION_CHARS).collect(),
            word_count: stems.len(),
            part_of_full_size,
            vec: Vec::new(),
            words: stems,
        }
    }

    /// Effective document length: retained tokens scaled back to the full
    /// body. Clamped to 1 when a page produced no tokens at all, so the
    /// ranking formulas never divide by zero.
    pub fn full_size(&self) -> f64 {
        let size = self.word_count as f64 * self.part_of_full_size;
        if size == 0.0 {
            1.0
        } else {
            size
        }
    }
}
