//! Corrector service client
//!
//! One `GET http://<addr>/correct?text=<context>` per request with a short
//! timeout. The service answers `{"error": "...", "return": ["..."]}`; both
//! fields are optional. Any failure degrades to offering the context itself
//! as the only candidate.

use std::time::Duration;

use serde::Deserialize;

use crate::discovery::CorrectorLocator;
use crate::{Error, Result};

/// Request timeout for a corrector round trip
pub const CORRECTOR_TIMEOUT: Duration = Duration::from_millis(1500);

/// Reply body from the corrector service
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CorrectorReply {
    /// Service-reported error
    #[serde(default)]
    pub error: Option<String>,

    /// Replacement candidates, best first
    #[serde(default, rename = "return")]
    pub candidates: Option<Vec<String>>,
}

impl CorrectorReply {
    /// Candidates to show for `context`, never empty
    #[must_use]
    pub fn candidates_for(self, context: &str) -> Vec<String> {
        match self.candidates {
            Some(c) if !c.is_empty() => c,
            _ => vec![context.to_string()],
        }
    }
}

/// HTTP client for the corrector service
#[derive(Debug, Clone)]
pub struct CorrectionClient {
    client: reqwest::Client,
}

impl CorrectionClient {
    /// Create a client with the given request timeout
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mavis/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Http)?;

        Ok(Self { client })
    }

    /// URL for correcting `context` at `addr` (`host:port`)
    #[must_use]
    pub fn request_url(addr: &str, context: &str) -> String {
        format!(
            "http://{addr}/correct?text={}",
            urlencoding::encode(context)
        )
    }

    /// Issue exactly one correction request
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on timeout or connection failure and
    /// [`Error::Corrector`] if the body is not a valid reply
    pub async fn fetch(&self, addr: &str, context: &str) -> Result<CorrectorReply> {
        let url = Self::request_url(addr, context);
        tracing::debug!(url, "requesting corrections");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                tracing::warn!(addr, "corrector request timeout");
            } else if e.is_connect() {
                tracing::warn!(addr, error = %e, "corrector connection failed");
            } else {
                tracing::warn!(addr, error = %e, "corrector fetch error");
            }
            Error::Http(e)
        })?;

        let body = response.bytes().await?;
        let reply: CorrectorReply = serde_json::from_slice(&body)
            .map_err(|e| Error::Corrector(format!("malformed reply: {e}")))?;

        if let Some(err) = &reply.error {
            tracing::warn!(addr, error = %err, "corrector reported an error");
        }

        Ok(reply)
    }

    /// Fetch candidates for `context`, degrading to `[context]` on failure
    ///
    /// A failed round trip makes `locator` forget its address so the next
    /// request re-resolves the service.
    pub async fn fetch_candidates(
        &self,
        addr: &str,
        context: &str,
        locator: &dyn CorrectorLocator,
    ) -> Vec<String> {
        match self.fetch(addr, context).await {
            Ok(reply) => reply.candidates_for(context),
            Err(e) => {
                tracing::info!(error = %e, "corrector unavailable, offering original text");
                locator.forget();
                vec![context.to_string()]
            }
        }
    }
}
