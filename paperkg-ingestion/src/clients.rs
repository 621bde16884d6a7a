//! Source-client boundary: `BibliographicSourceClient` (paginated search,
//! per-identifier lookup) and `OpenAccessClient` (best-available PDF
//! location lookup), each an HTTP adapter that shares one rate limiter.

use crate::error::SourceError;
use async_trait::async_trait;
use paperkg_core::Paper;
use paperkg_ratelimit::TokenBucketRateLimiter;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Every call a caller makes through a source client passes through this
/// rate limiter before hitting the network.
pub const STORE_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Paginated search and per-identifier lookup against a bibliographic API.
#[async_trait]
pub trait BibliographicSourceClient: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>, SourceError>;

    async fn get_by_doi(&self, doi: &str) -> Result<Option<Paper>, SourceError>;

    async fn get_by_external_id(&self, external_id: &str) -> Result<Option<Paper>, SourceError>;

    /// Fetch many DOIs, reporting progress as each completes. The default
    /// implementation serializes calls through `get_by_doi`; a real client
    /// with a batch endpoint would override this.
    async fn get_batch_by_doi(
        &self,
        dois: &[String],
        mut on_progress: Box<dyn FnMut(usize, usize) + Send>,
    ) -> HashMap<String, Paper> {
        let mut out = HashMap::new();
        for (i, doi) in dois.iter().enumerate() {
            if let Ok(Some(paper)) = self.get_by_doi(doi).await {
                out.insert(doi.clone(), paper);
            }
            on_progress(i + 1, dois.len());
        }
        out
    }
}

/// Supplementary fields available via DOI lookup against an open-access
/// resolver: best-available PDF location and anything else enrichment
/// wants to merge onto a `Paper` that is missing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenAccessRecord {
    pub pdf_url: Option<String>,
    pub citation_count: Option<u64>,
    pub references: Vec<String>,
}

/// DOI-keyed open-access lookup. A 404 means "no record for this DOI", not
/// an error, so it is modeled as `Ok(None)`.
#[async_trait]
pub trait OpenAccessClient: Send + Sync {
    fn name(&self) -> &str;

    async fn lookup(&self, doi: &str) -> Result<Option<OpenAccessRecord>, SourceError>;
}

/// Wraps every outbound client call in the shared rate limiter before
/// delegating to `reqwest`.
struct RateLimitedHttp {
    http: reqwest::Client,
    limiter: Arc<TokenBucketRateLimiter>,
}

impl RateLimitedHttp {
    fn new(limiter: Arc<TokenBucketRateLimiter>) -> Self {
        let http = reqwest::Client::builder().timeout(STORE_CALL_TIMEOUT).build().expect("reqwest client build");
        Self { http, limiter }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, source: &str, url: &str) -> Result<Option<T>, SourceError> {
        self.limiter.acquire(1.0).await;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| classify_transport(source, &e))?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if response.status().is_server_error() {
            return Err(SourceError::UpstreamServerError { source: source.to_string(), status: response.status().as_u16() });
        }
        if response.status().as_u16() == 429 {
            return Err(SourceError::RateLimited { source: source.to_string(), status: 429 });
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(SourceError::ClientError { source: source.to_string(), status, message });
        }

        let body: T = response.json().await.map_err(|e| SourceError::Transport { source: source.to_string(), message: e.to_string() })?;
        Ok(Some(body))
    }
}

fn classify_transport(source: &str, err: &reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout { source: source.to_string() }
    } else {
        SourceError::Transport { source: source.to_string(), message: err.to_string() }
    }
}

#[derive(Debug, Deserialize)]
struct ArxivAuthorWire {
    name: String,
    #[serde(default)]
    affiliations: Vec<String>,
    #[serde(default)]
    external_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArxivPaperWire {
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    external_id: Option<String>,
    title: String,
    authors: Vec<ArxivAuthorWire>,
    #[serde(rename = "abstract")]
    abstract_text: String,
    published_date: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    citation_count: Option<u64>,
    #[serde(default)]
    references: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ArxivSearchResponseWire {
    results: Vec<ArxivPaperWire>,
}

fn wire_to_paper(wire: ArxivPaperWire, source: paperkg_core::PaperSource) -> Paper {
    use paperkg_core::{Author, PaperId, ProcessingStatus};
    let now = chrono::Utc::now();
    let authors = wire
        .authors
        .into_iter()
        .map(|a| Author { name: a.name, affiliations: a.affiliations, external_id: a.external_id })
        .collect::<Vec<_>>();
    let id = wire.doi.clone().or_else(|| wire.external_id.clone()).unwrap_or_else(|| uuid::Uuid::now_v7().to_string());
    let mut paper = Paper {
        id: PaperId::new(id),
        title: wire.title,
        authors,
        abstract_text: wire.abstract_text,
        published_date: wire.published_date,
        source,
        categories: wire.categories,
        content_hash: String::new(),
        ingestion_date: now,
        last_updated: now,
        processing_status: ProcessingStatus::Ingested,
        doi: wire.doi,
        external_id: wire.external_id,
        citation_count: wire.citation_count,
        references: wire.references,
    };
    paper.recompute_content_hash();
    paper
}

/// HTTP adapter for a bibliographic preprint source ("arXiv"-shaped API).
/// Preconfigured, by default, at the conservative 1-token/3-second limiter
/// the documented source policy recommends.
pub struct ArxivClient {
    base_url: String,
    http: RateLimitedHttp,
}

impl ArxivClient {
    pub fn new(base_url: impl Into<String>, limiter: Arc<TokenBucketRateLimiter>) -> Self {
        Self { base_url: base_url.into(), http: RateLimitedHttp::new(limiter) }
    }
}

#[async_trait]
impl BibliographicSourceClient for ArxivClient {
    fn name(&self) -> &str {
        "arxiv"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>, SourceError> {
        let url = format!("{}/search?q={}&max_results={}", self.base_url, urlencode(query), max_results);
        let response: Option<ArxivSearchResponseWire> = self.http.get_json(self.name(), &url).await?;
        Ok(response
            .map(|r| r.results.into_iter().map(|w| wire_to_paper(w, paperkg_core::PaperSource::Bibliographic)).collect())
            .unwrap_or_default())
    }

    async fn get_by_doi(&self, doi: &str) -> Result<Option<Paper>, SourceError> {
        let url = format!("{}/paper?doi={}", self.base_url, urlencode(doi));
        let wire: Option<ArxivPaperWire> = self.http.get_json(self.name(), &url).await?;
        Ok(wire.map(|w| wire_to_paper(w, paperkg_core::PaperSource::Bibliographic)))
    }

    async fn get_by_external_id(&self, external_id: &str) -> Result<Option<Paper>, SourceError> {
        let url = format!("{}/paper?id={}", self.base_url, urlencode(external_id));
        let wire: Option<ArxivPaperWire> = self.http.get_json(self.name(), &url).await?;
        Ok(wire.map(|w| wire_to_paper(w, paperkg_core::PaperSource::Bibliographic)))
    }
}

#[derive(Debug, Deserialize)]
struct OaLocationWire {
    #[serde(default)]
    url_for_pdf: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OaResponseWire {
    #[serde(default)]
    best_oa_location: Option<OaLocationWire>,
    #[serde(default)]
    oa_locations: Vec<OaLocationWire>,
    #[serde(default)]
    citation_count: Option<u64>,
    #[serde(default)]
    references: Vec<String>,
}

/// HTTP adapter for an open-access PDF resolver ("Unpaywall"-shaped API),
/// requiring a caller-provided contact string on every request per the
/// documented external-interface contract.
pub struct OpenAlexStyleClient {
    base_url: String,
    contact_email: String,
    http: RateLimitedHttp,
}

impl OpenAlexStyleClient {
    pub fn new(base_url: impl Into<String>, contact_email: impl Into<String>, limiter: Arc<TokenBucketRateLimiter>) -> Self {
        Self { base_url: base_url.into(), contact_email: contact_email.into(), http: RateLimitedHttp::new(limiter) }
    }
}

#[async_trait]
impl OpenAccessClient for OpenAlexStyleClient {
    fn name(&self) -> &str {
        "open-access"
    }

    async fn lookup(&self, doi: &str) -> Result<Option<OpenAccessRecord>, SourceError> {
        let url = format!("{}/{}?email={}", self.base_url, urlencode(doi), urlencode(&self.contact_email));
        let wire: Option<OaResponseWire> = self.http.get_json(self.name(), &url).await?;
        Ok(wire.map(|w| {
            let pdf_url = w
                .best_oa_location
                .and_then(|loc| loc.url_for_pdf)
                .or_else(|| w.oa_locations.into_iter().find_map(|loc| loc.url_for_pdf));
            OpenAccessRecord { pdf_url, citation_count: w.citation_count, references: w.references }
        }))
    }
}

fn urlencode(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '~') { c.to_string() } else { format!("%{:02X}", c as u32) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencode_escapes_reserved_characters() {
        assert_eq!(urlencode("10.1234/x y"), "10.1234%2Fx%20y");
        assert_eq!(urlencode("a-b_c.d~e"), "a-b_c.d~e");
    }
}
