//! Fire-and-forget client for the third-party endpoint hit by `GET /users`
//!
//! The call exists only to put nested client spans into request traces.
//! Nothing in a response depends on it: results and failures are discarded.

use tracing::{field, Instrument};

use crate::config::OutboundConfig;
use crate::telemetry::propagation::current_context_headers;

#[derive(Clone, Debug)]
pub struct OutboundClient {
    client: reqwest::Client,
    url: String,
    enabled: bool,
}

impl OutboundClient {
    pub fn new(client: reqwest::Client, config: &OutboundConfig) -> Self {
        Self {
            client,
            url: config.url.clone(),
            enabled: config.enabled,
        }
    }

    pub fn from_config(config: &OutboundConfig) -> Self {
        Self::new(reqwest::Client::new(), config)
    }

    /// Issue one GET and throw the outcome away
    pub async fn ping(&self) {
        if !self.enabled {
            return;
        }

        let span = tracing::info_span!(
            "http.client",
            otel.name = "GET",
            otel.kind = "client",
            otel.status_code = field::Empty,
            http.request.method = "GET",
            url.full = %self.url,
            http.response.status_code = field::Empty,
        );

        async {
            let result = self
                .client
                .get(&self.url)
                .headers(current_context_headers())
                .send()
                .await;

            let current = tracing::Span::current();
            match result {
                Ok(response) => {
                    let status = response.status();
                    current.record("http.response.status_code", status.as_u16());
                    if status.is_server_error() {
                        current.record("otel.status_code", "ERROR");
                    }
                    tracing::debug!(status = status.as_u16(), "Outbound call completed");
                }
                Err(e) => {
                    current.record("otel.status_code", "ERROR");
                    tracing::debug!(error = %e, "Outbound call failed, ignoring");
                }
            }
        }
        .instrument(span)
        .await
    }
}
