// 🔎 Issuer Lookup - BIN prefix -> issuer metadata
//
// The production client talks to a binlist-compatible HTTP service. Every
// call is bounded by a timeout; expiry, transport errors and non-success
// statuses all surface as LookupError.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::card::{Country, IssuerBank, IssuerDetails};

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup for {prefix} timed out after {timeout:?}")]
    Timeout { prefix: String, timeout: Duration },

    #[error("lookup for {prefix} returned status {status}")]
    Status { prefix: String, status: u16 },

    #[error("lookup for {prefix} failed: {message}")]
    Transport { prefix: String, message: String },

    #[error("no usable issuer result for {0}")]
    NoResult(String),
}

/// External issuer metadata source
#[async_trait]
pub trait IssuerLookup: Send + Sync {
    async fn lookup(&self, prefix: &str) -> Result<IssuerDetails, LookupError>;
}

// ============================================================================
// BINLIST RESPONSE (wire form)
// ============================================================================

/// Raw lookup response. Every field is optional on the wire; a response is
/// only usable if it names a country.
#[derive(Debug, Deserialize)]
struct BinlistResponse {
    scheme: Option<String>,
    #[serde(rename = "type")]
    card_type: Option<String>,
    brand: Option<String>,
    prepaid: Option<bool>,
    country: Option<Country>,
    bank: Option<IssuerBank>,
}

impl BinlistResponse {
    fn into_details(self, prefix: &str) -> Result<IssuerDetails, LookupError> {
        let country = self
            .country
            .filter(|c| !c.name.trim().is_empty())
            .ok_or_else(|| LookupError::NoResult(prefix.to_string()))?;

        Ok(IssuerDetails {
            country,
            scheme: self.scheme,
            card_type: self.card_type,
            brand: self.brand,
            prepaid: self.prepaid,
            bank: self.bank,
        })
    }
}

// ============================================================================
// HTTP CLIENT
// ============================================================================

pub struct BinlistClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl BinlistClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Transport {
                prefix: String::new(),
                message: e.to_string(),
            })?;

        Ok(BinlistClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn transport_error(&self, prefix: &str, err: reqwest::Error) -> LookupError {
        if err.is_timeout() {
            LookupError::Timeout {
                prefix: prefix.to_string(),
                timeout: self.timeout,
            }
        } else {
            LookupError::Transport {
                prefix: prefix.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl IssuerLookup for BinlistClient {
    async fn lookup(&self, prefix: &str) -> Result<IssuerDetails, LookupError> {
        let url = format!("{}/{}", self.base_url, prefix);
        debug!(%url, "looking up card issuer");

        let response = self
            .client
            .get(&url)
            .header("Accept-Version", "3")
            .send()
            .await
            .map_err(|e| self.transport_error(prefix, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(prefix, status = status.as_u16(), "issuer lookup rejected");
            return Err(LookupError::Status {
                prefix: prefix.to_string(),
                status: status.as_u16(),
            });
        }

        let body: BinlistResponse = response
            .json()
            .await
            .map_err(|e| self.transport_error(prefix, e))?;

        body.into_details(prefix)
    }
}

// ============================================================================
// STATIC LOOKUP (offline / tests)
// ============================================================================

/// Fixed prefix table. Unknown prefixes answer `NoResult`.
#[derive(Default)]
pub struct StaticLookup {
    entries: HashMap<String, IssuerDetails>,
    calls: AtomicUsize,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, prefix: &str, details: IssuerDetails) -> Self {
        self.entries.insert(prefix.to_string(), details);
        self
    }

    /// Number of lookups served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl IssuerLookup for StaticLookup {
    async fn lookup(&self, prefix: &str) -> Result<IssuerDetails, LookupError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        self.entries
            .get(prefix)
            .cloned()
            .ok_or_else(|| LookupError::NoResult(prefix.to_string()))
    }
}
