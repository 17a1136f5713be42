pub mod ranking;
pub mod scorer;
pub mod tree;

use beacon_core::tokenizer::tokenize;
use beacon_core::{ConfigError, CrawlConfig, Document, IndexStore, StoreError};
use beacon_crawler::{CancelHandle, CancelToken, DocumentSink, RateLimiter, Spider, WorkerPool};
use dashmap::DashSet;
use parking_lot::{Mutex, RwLock};
use ranking::Signals;
use scorer::RelevanceScorer;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tree::CrawlTree;
use url::Url;
use uuid::Uuid;

/// Hard cap on search results.
pub const MAX_RESULTS: usize = 50;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = "beacon-bot/0.1 (+https://beacon.example/bot)";

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("persistent store failure: {0}")]
    Fatal(String),
}

/// The search engine core: orchestrates crawl jobs, persists documents and
/// postings, and answers queries with multi-signal ranking.
pub struct SearchIndex<S> {
    store: Arc<IndexStore>,
    scorer: S,
    /// Cached mean document length. Doubles as the write gate for document
    /// ingestion; 0 means "recompute on next search".
    avg_len: RwLock<f64>,
    urls_crawled: AtomicU32,
    fatal: Mutex<Option<String>>,
    job_cancel: Mutex<Option<CancelHandle>>,
    tree: CrawlTree,
}

impl<S> SearchIndex<S>
where
    S: RelevanceScorer + Send + Sync + 'static,
{
    pub fn new(store: Arc<IndexStore>, scorer: S) -> Self {
        Self {
            store,
            scorer,
            avg_len: RwLock::new(0.0),
            urls_crawled: AtomicU32::new(0),
            fatal: Mutex::new(None),
            job_cancel: Mutex::new(None),
            tree: CrawlTree::new(),
        }
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Link structure discovered by the most recent crawl job.
    pub fn crawl_tree(&self) -> &CrawlTree {
        &self.tree
    }

    pub fn urls_crawled(&self) -> u32 {
        self.urls_crawled.load(Ordering::Relaxed)
    }

    /// Log-line facade for the control layer.
    pub fn write(&self, line: &str) {
        tracing::info!(target: "beacon_index", "{}", line);
    }

    /// Run one crawl job to completion. Returns when every seed's BFS has
    /// drained, the job deadline expired, or `cancel` fired; the visited
    /// set is persisted in all three cases. The first persistent store
    /// error fails the job.
    pub async fn index(self: &Arc<Self>, config: &CrawlConfig, cancel: CancelToken) -> Result<(), IndexError> {
        config.validate()?;

        let job = CancelHandle::new();
        *self.job_cancel.lock() = Some(job.clone());
        *self.fatal.lock() = None;
        self.tree.reset();

        let pool = Arc::new(WorkerPool::new(config.workers, config.tasks));
        let visited = Arc::new(DashSet::new());
        self.store.load_visited(&visited)?;
        let limiter = (config.rate > 0).then(|| Arc::new(RateLimiter::new(config.rate)));

        // one deadline task folds the caller's cancel and the job clock
        // into the job-local handle every suspension point watches
        let deadline = tokio::spawn({
            let job = job.clone();
            let timeout = config.timeout();
            async move {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(timeout) => {}
                }
                job.cancel();
            }
        });

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let sink: Arc<dyn DocumentSink> = self.clone();
        for seed in &config.base_urls {
            let url = match Url::parse(seed) {
                Ok(url) => url,
                Err(err) => {
                    tracing::warn!(%seed, %err, "skipping unparseable seed");
                    continue;
                }
            };
            let node = self.tree.add_child(CrawlTree::ROOT, url.as_str());
            let spider = Arc::new(Spider::new(
                &url,
                client.clone(),
                Arc::clone(&visited),
                Arc::clone(&pool),
                Arc::clone(&sink),
                job.token(),
                limiter.clone(),
                config.max_depth,
                config.max_links_in_page,
                config.only_same_domain,
            ));
            spider.submit(url, 0, node).await;
        }

        pool.wait().await;
        pool.stop().await;
        deadline.abort();
        if let Some(limiter) = &limiter {
            limiter.shutdown();
        }

        self.store.save_visited(&visited)?;
        self.store.flush()?;
        *self.job_cancel.lock() = None;

        tracing::info!(
            discovered = self.tree.len(),
            crawled = self.urls_crawled(),
            "crawl job finished"
        );

        if let Some(msg) = self.fatal.lock().take() {
            return Err(IndexError::Fatal(msg));
        }
        Ok(())
    }

    /// Answer a free-text query. `min_score` filters on the semantic
    /// relation signal when a scorer produced one; `max_results` lowers
    /// the hard result cap (0 keeps the default). Unexpected store errors
    /// surface as an empty result.
    pub async fn search(&self, query: &str, min_score: f64, max_results: usize) -> Vec<Document> {
        match self.evaluate(query, min_score, max_results).await {
            Ok(docs) => docs,
            Err(err) => {
                tracing::error!(%err, "search failed");
                Vec::new()
            }
        }
    }

    async fn evaluate(&self, query: &str, min_score: f64, max_results: usize) -> Result<Vec<Document>, StoreError> {
        let terms = tokenize(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let total_docs = self.store.document_count()?;
        if total_docs == 0 {
            return Ok(Vec::new());
        }
        let avg_len = self.ensure_avg_len()?;

        let mut signals: HashMap<Uuid, Signals> = HashMap::new();
        let mut docs: HashMap<Uuid, Document> = HashMap::new();
        for term in &terms {
            let posting = self.store.postings(term)?;
            if posting.is_empty() {
                continue;
            }
            let idf = (total_docs as f64 / posting.len() as f64).ln() + 1.0;
            for (doc_id, freq) in posting {
                let doc = match docs.entry(doc_id) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => match self.store.document(&doc_id) {
                        Ok(doc) => entry.insert(doc),
                        Err(StoreError::NotFound) => continue,
                        Err(err) => return Err(err),
                    },
                };
                signals
                    .entry(doc_id)
                    .or_default()
                    .accumulate(f64::from(freq), idf, doc.full_size(), avg_len);
            }
        }
        if signals.is_empty() {
            return Ok(Vec::new());
        }

        let mut candidates: Vec<Document> = docs.into_values().collect();

        let mut scored = false;
        match self.scorer.score(&terms, &candidates).await {
            Ok(scores) if !scores.is_empty() => {
                scored = true;
                for (doc_id, score) in scores {
                    if let Some(entry) = signals.get_mut(&doc_id) {
                        entry.relation = score.clamp(0.0, 1.0);
                    }
                }
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(%err, "relevance scorer unavailable, ranking on lexical signals");
            }
        }

        if scored && min_score > 0.0 {
            candidates.retain(|doc| signals[&doc.id].relation >= min_score);
        }
        candidates.sort_by(|a, b| ranking::order(&signals[&a.id], &signals[&b.id], &a.id, &b.id));

        let cap = if max_results == 0 {
            MAX_RESULTS
        } else {
            max_results.min(MAX_RESULTS)
        };
        candidates.truncate(cap);
        Ok(candidates)
    }

    /// Mean effective document length, recomputed lazily after boot or an
    /// insert invalidated it.
    fn ensure_avg_len(&self) -> Result<f64, StoreError> {
        let cached = *self.avg_len.read();
        if cached > 0.0 {
            return Ok(cached);
        }
        let docs = self.store.documents()?;
        if docs.is_empty() {
            return Ok(0.0);
        }
        let total: f64 = docs.iter().map(Document::full_size).sum();
        let avg = total / docs.len() as f64;
        *self.avg_len.write() = avg;
        Ok(avg)
    }

    /// Persist one document: vocabulary, postings, then the record itself,
    /// serialized under the ingestion write gate.
    pub fn add_document(&self, doc: &Document) -> Result<(), StoreError> {
        let mut avg_len = self.avg_len.write();
        self.store.intern(&doc.words, true)?;
        self.store.index_document(&doc.id, &doc.words)?;
        self.store.save_document(doc)?;
        *avg_len = 0.0;
        Ok(())
    }
}

impl<S> DocumentSink for SearchIndex<S>
where
    S: RelevanceScorer + Send + Sync + 'static,
{
    fn add_document(&self, doc: Document) -> Result<(), StoreError> {
        match SearchIndex::add_document(self, &doc) {
            Ok(()) => Ok(()),
            Err(err) => {
                // first persistent error ends the job; later ones only log
                {
                    let mut fatal = self.fatal.lock();
                    if fatal.is_none() {
                        *fatal = Some(err.to_string());
                    }
                }
                if let Some(job) = self.job_cancel.lock().as_ref() {
                    job.cancel();
                }
                Err(err)
            }
        }
    }

    fn record_crawled(&self) {
        self.urls_crawled.fetch_add(1, Ordering::Relaxed);
    }

    fn record_link(&self, parent: usize, url: &str) -> usize {
        self.tree.add_child(parent, url)
    }
}
