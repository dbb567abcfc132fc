use std::time::Duration;

use indexmap::{IndexMap, IndexSet};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::ProviderSettings;
use crate::error::KiraError;

/// Terms of one provider query. A batch of one must go out as `Single`; the
/// provider rejects one-element arrays with a 400.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTerms {
    Single(String),
    Batch(Vec<String>),
}

impl QueryTerms {
    pub fn from_vec(mut terms: Vec<String>) -> Self {
        if terms.len() == 1 {
            QueryTerms::Single(terms.remove(0))
        } else {
            QueryTerms::Batch(terms)
        }
    }

    pub fn as_slice(&self) -> &[String] {
        match self {
            QueryTerms::Single(term) => std::slice::from_ref(term),
            QueryTerms::Batch(terms) => terms,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub terms: QueryTerms,
    /// Comma-joined identifier types, e.g. `entrezgene,retired`.
    pub scopes: String,
    /// Comma-joined output fields.
    pub fields: String,
    /// Comma-joined taxids or `all`.
    pub species: String,
}

/// One entry of the provider's `out` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Hit {
    #[serde(deserialize_with = "query_string")]
    pub query: String,
    #[serde(default)]
    pub notfound: bool,
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Hit {
    pub fn not_found(query: &str) -> Self {
        Self {
            query: query.to_string(),
            notfound: true,
            id: None,
            fields: Map::new(),
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// `returnall`-style response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    pub out: Vec<Hit>,
    pub missing: Vec<String>,
    pub dup: Vec<String>,
}

impl QueryResponse {
    /// Derives `missing` (not-found queries) and `dup` (queries with more
    /// than one hit) from the raw hit list, in first-seen order.
    pub fn from_hits(out: Vec<Hit>) -> Self {
        let mut missing: IndexSet<&str> = IndexSet::new();
        let mut seen: IndexMap<&str, usize> = IndexMap::new();
        for hit in &out {
            if hit.notfound {
                missing.insert(hit.query.as_str());
            } else {
                *seen.entry(hit.query.as_str()).or_insert(0) += 1;
            }
        }
        let missing = missing.into_iter().map(str::to_string).collect();
        let dup = seen
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(query, _)| query.to_string())
            .collect();
        Self { out, missing, dup }
    }
}

pub trait GeneProvider: Send + Sync {
    fn query_many(&self, request: &QueryRequest) -> Result<QueryResponse, KiraError>;
}

impl<P: GeneProvider + ?Sized> GeneProvider for &P {
    fn query_many(&self, request: &QueryRequest) -> Result<QueryResponse, KiraError> {
        (**self).query_many(request)
    }
}

#[derive(Clone)]
pub struct MyGeneHttpClient {
    client: Client,
    base_url: String,
    batch_size: usize,
}

impl MyGeneHttpClient {
    pub fn new() -> Result<Self, KiraError> {
        Self::with_settings(&ProviderSettings::default())
    }

    pub fn with_settings(settings: &ProviderSettings) -> Result<Self, KiraError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-gsr/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| KiraError::ProviderHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|err| KiraError::ProviderHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            batch_size: settings.batch_size.max(1),
        })
    }

    fn query_url(&self) -> String {
        format!("{}/query", self.base_url)
    }

    fn post_query(&self, q: &str, request: &QueryRequest) -> Result<Vec<Hit>, KiraError> {
        let url = self.query_url();
        debug!(url = %url, scopes = %request.scopes, species = %request.species, "posting query");
        let response = self
            .client
            .post(&url)
            .form(&[
                ("q", q),
                ("scopes", request.scopes.as_str()),
                ("fields", request.fields.as_str()),
                ("species", request.species.as_str()),
            ])
            .send()
            .map_err(|err| KiraError::ProviderHttp(err.to_string()))?;
        let response = Self::handle_status(response)?;
        let payload: Value = response
            .json()
            .map_err(|err| KiraError::ProviderHttp(err.to_string()))?;
        parse_hits(payload)
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, KiraError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "mygene.info request failed".to_string());
        Err(KiraError::ProviderStatus { status, message })
    }
}

impl GeneProvider for MyGeneHttpClient {
    fn query_many(&self, request: &QueryRequest) -> Result<QueryResponse, KiraError> {
        query_in_chunks(request.terms.as_slice(), self.batch_size, |chunk| {
            self.post_query(&chunk.join(","), request)
        })
    }
}

/// Sends `terms` in chunks of at most `batch_size` and concatenates the hits.
///
/// A one-term chunk answered with a 400 is the provider's single-element
/// rejection: its term is reported missing and the other chunks are kept.
/// Any other failure, including a 400 for a larger chunk, fails the query.
pub fn query_in_chunks<F>(
    terms: &[String],
    batch_size: usize,
    mut send: F,
) -> Result<QueryResponse, KiraError>
where
    F: FnMut(&[String]) -> Result<Vec<Hit>, KiraError>,
{
    let mut out = Vec::new();
    for chunk in terms.chunks(batch_size.max(1)) {
        match send(chunk) {
            Ok(hits) => out.extend(hits),
            Err(err) if err.is_single_element_rejection() && chunk.len() == 1 => {
                warn!(term = %chunk[0], "provider rejected single-term query: {err}");
                out.push(Hit::not_found(&chunk[0]));
            }
            Err(err) => return Err(err),
        }
    }
    Ok(QueryResponse::from_hits(out))
}

/// The endpoint answers with a list of hits, or a single hit object for a
/// scalar query.
pub fn parse_hits(payload: Value) -> Result<Vec<Hit>, KiraError> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(_) => vec![payload],
        other => {
            return Err(KiraError::ProviderHttp(format!(
                "unexpected response payload: {other}"
            )));
        }
    };
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value::<Hit>(item)
                .map_err(|err| KiraError::ProviderHttp(format!("malformed hit: {err}")))
        })
        .collect()
}

fn query_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(num) => Ok(num.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "query must be a string, got {other}"
        ))),
    }
}
