use std::cmp::Ordering;
use uuid::Uuid;

pub const K1: f64 = 1.2;
pub const B: f64 = 0.75;

/// Per-candidate ranking signals accumulated over the query terms.
#[derive(Debug, Default, Clone)]
pub struct Signals {
    /// How many query terms the document contains.
    pub includes_words: u32,
    /// Semantic relevance in [0, 1]; 0 when no scorer ran.
    pub relation: f64,
    pub tf_idf: f64,
    pub bm25: f64,
}

impl Signals {
    /// Fold in one term occurrence.
    pub fn accumulate(&mut self, freq: f64, idf: f64, full_size: f64, avg_len: f64) {
        self.includes_words += 1;
        self.tf_idf += freq / full_size * (idf - 1.0);
        self.bm25 += bm25_term(idf, freq, full_size, avg_len);
    }
}

pub fn bm25_term(idf: f64, tf: f64, full_size: f64, avg_len: f64) -> f64 {
    idf * (tf * (K1 + 1.0)) / (tf + K1 * (1.0 - B + B * full_size / avg_len))
}

/// Strict total order over candidates: term coverage, then semantic
/// relation, then BM25, then TF-IDF, all descending; document id bytes
/// ascending as the deterministic final tiebreak.
pub fn order(a: &Signals, b: &Signals, a_id: &Uuid, b_id: &Uuid) -> Ordering {
    b.includes_words
        .cmp(&a.includes_words)
        .then_with(|| b.relation.total_cmp(&a.relation))
        .then_with(|| b.bm25.total_cmp(&a.bm25))
        .then_with(|| b.tf_idf.total_cmp(&a.tf_idf))
        .then_with(|| a_id.as_bytes().cmp(b_id.as_bytes()))
}
