use beacon_core::Document;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

const SCORE_TIMEOUT: Duration = Duration::from_secs(15);

/// Semantic relevance of candidate documents to a query, in [0, 1].
/// Implementations may be remote; callers tolerate failure and fall back
/// to lexical ranking.
pub trait RelevanceScorer: Send + Sync {
    fn score(
        &self,
        query: &[String],
        docs: &[Document],
    ) -> impl Future<Output = anyhow::Result<Vec<(Uuid, f64)>>> + Send;
}

/// Scores nothing; ranking proceeds on lexical signals alone.
pub struct NoopScorer;

impl RelevanceScorer for NoopScorer {
    async fn score(&self, _query: &[String], _docs: &[Document]) -> anyhow::Result<Vec<(Uuid, f64)>> {
        Ok(Vec::new())
    }
}

#[derive(Serialize)]
struct ScoreRequest<'a> {
    query: &'a [String],
    docs: Vec<ScoreDoc<'a>>,
}

#[derive(Serialize)]
struct ScoreDoc<'a> {
    id: Uuid,
    description: &'a str,
}

#[derive(Deserialize)]
struct ScoreResponse {
    scores: Vec<ScoreEntry>,
}

#[derive(Deserialize)]
struct ScoreEntry {
    id: Uuid,
    score: f64,
}

/// Client for the external binary-score service. Without an endpoint it
/// degrades to a no-op, so the evaluator works with no service deployed.
pub struct HttpScorer {
    client: reqwest::Client,
    endpoint: Option<Url>,
}

impl HttpScorer {
    pub fn new(endpoint: Option<Url>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SCORE_TIMEOUT)
            .build()?;
        Ok(Self { client, endpoint })
    }
}

impl RelevanceScorer for HttpScorer {
    async fn score(&self, query: &[String], docs: &[Document]) -> anyhow::Result<Vec<(Uuid, f64)>> {
        let Some(endpoint) = &self.endpoint else {
            return Ok(Vec::new());
        };
        let request = ScoreRequest {
            query,
            docs: docs
                .iter()
                .map(|d| ScoreDoc { id: d.id, description: &d.description })
                .collect(),
        };
        let response = self
            .client
            .post(endpoint.clone())
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        let parsed: ScoreResponse = response.json().await?;
        Ok(parsed
            .scores
            .into_iter()
            .map(|entry| (entry.id, entry.score.clamp(0.0, 1.0)))
            .collect())
    }
}
