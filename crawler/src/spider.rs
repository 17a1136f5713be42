use crate::cancel::CancelToken;
use crate::limiter::RateLimiter;
use crate::page::{self, canonicalize, registrable_domain};
use crate::pool::WorkerPool;
use beacon_core::tokenizer::tokenize_counted;
use beacon_core::{Document, StoreError};
use dashmap::DashSet;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use url::Url;

/// Where crawled pages go. Implemented by the indexer; the spider stays
/// decoupled from storage and ranking.
pub trait DocumentSink: Send + Sync + 'static {
    /// Persist one crawled document. An error here means the store itself
    /// is failing, which ends the job.
    fn add_document(&self, doc: Document) -> Result<(), StoreError>;
    /// Bump the job's crawled-URL counter.
    fn record_crawled(&self);
    /// Record a discovered edge in the crawl tree, returning the child node.
    fn record_link(&self, parent: usize, url: &str) -> usize;
}

/// Depth-bounded BFS over the worker pool. Every fetched page becomes a
/// document; every kept link becomes a new task at depth + 1.
pub struct Spider {
    client: Client,
    visited: Arc<DashSet<String>>,
    pool: Arc<WorkerPool>,
    sink: Arc<dyn DocumentSink>,
    cancel: CancelToken,
    limiter: Option<Arc<RateLimiter>>,
    max_depth: usize,
    max_links: usize,
    only_same_domain: bool,
    seed_domain: Option<String>,
    seed_host: Option<String>,
}

impl Spider {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        seed: &Url,
        client: Client,
        visited: Arc<DashSet<String>>,
        pool: Arc<WorkerPool>,
        sink: Arc<dyn DocumentSink>,
        cancel: CancelToken,
        limiter: Option<Arc<RateLimiter>>,
        max_depth: usize,
        max_links: usize,
        only_same_domain: bool,
    ) -> Self {
        Self {
            client,
            visited,
            pool,
            sink,
            cancel,
            limiter,
            max_depth,
            max_links,
            only_same_domain,
            seed_domain: registrable_domain(seed),
            seed_host: seed.host_str().map(str::to_owned),
        }
    }

    /// Enqueue a crawl task for `url` at `depth`. Backpressure from a full
    /// queue is abandoned when the job is cancelled.
    pub fn submit(
        self: &Arc<Self>,
        url: Url,
        depth: usize,
        node: usize,
    ) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        let this = Arc::clone(self);
        Box::pin(async move {
            let spider = Arc::clone(&this);
            let task = Box::pin(async move { spider.crawl(url, depth, node).await });
            if this
                .pool
                .submit_unless_cancelled(task, &this.cancel)
                .await
                .is_err()
            {
                tracing::debug!("task queue unavailable, dropping crawl task");
            }
        })
    }

    async fn crawl(self: Arc<Self>, url: Url, depth: usize, node: usize) {
        if self.cancel.is_cancelled() || depth > self.max_depth {
            return;
        }
        let canonical = canonicalize(&url);
        if !self.visited.insert(canonical.clone()) {
            return;
        }
        if let Some(limiter) = &self.limiter {
            limiter.acquire(&self.cancel).await;
            if self.cancel.is_cancelled() {
                return;
            }
        }

        let body = match page::fetch(&self.client, &url, &self.cancel).await {
            Ok(Some(body)) => body,
            Ok(None) => return,
            Err(err) => {
                tracing::debug!(%url, %err, "fetch failed, skipping");
                return;
            }
        };

        let extracted = page::extract(&url, &body);
        let (stems, raw_tokens) = tokenize_counted(&extracted.text);
        let doc = Document::from_crawl(canonical, &extracted.text, stems, raw_tokens);
        if let Err(err) = self.sink.add_document(doc) {
            tracing::error!(%url, %err, "failed to persist document");
            return;
        }
        self.sink.record_crawled();

        let mut kept = 0;
        for link in extracted.links {
            if kept == self.max_links {
                break;
            }
            if self.only_same_domain && !self.same_site(&link) {
                continue;
            }
            kept += 1;
            let child = self.sink.record_link(node, link.as_str());
            self.submit(link, depth + 1, child).await;
        }
    }

    /// Registrable-domain comparison against the seed, falling back to
    /// exact host equality when the host has no registrable domain
    /// (IP literals, localhost).
    fn same_site(&self, link: &Url) -> bool {
        match (&self.seed_domain, registrable_domain(link)) {
            (Some(seed), Some(link)) => *seed == link,
            _ => match (&self.seed_host, link.host_str()) {
                (Some(seed), Some(host)) => seed == host,
                _ => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullSink;
    impl DocumentSink for NullSink {
        fn add_document(&self, _doc: Document) -> Result<(), StoreError> {
            Ok(())
        }
        fn record_crawled(&self) {}
        fn record_link(&self, _parent: usize, _url: &str) -> usize {
            0
        }
    }

    fn spider(seed: &str, only_same_domain: bool) -> Arc<Spider> {
        let seed = Url::parse(seed).unwrap();
        Arc::new(Spider::new(
            &seed,
            Client::new(),
            Arc::new(DashSet::new()),
            Arc::new(WorkerPool::new(1, 1)),
            Arc::new(NullSink),
            crate::cancel::CancelHandle::new().token(),
            None,
            1,
            10,
            only_same_domain,
        ))
    }

    #[tokio::test]
    async fn same_site_uses_registrable_domain() {
        let s = spider("http://news.a.test/", true);
        assert!(s.same_site(&Url::parse("http://blog.a.test/x").unwrap()));
        assert!(!s.same_site(&Url::parse("http://b.test/x").unwrap()));
    }

    #[tokio::test]
    async fn same_site_falls_back_to_host_for_ips() {
        let s = spider("http://127.0.0.1:9000/", true);
        assert!(s.same_site(&Url::parse("http://127.0.0.1:9000/x").unwrap()));
        assert!(!s.same_site(&Url::parse("http://b.test/x").unwrap()));
    }
}
