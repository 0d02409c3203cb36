use std::time::Instant;

use http::Extensions;
use reqwest_middleware::{Middleware, Next};
use tracing::{debug, warn};

/// Emits one trace line per outgoing request and one per transport failure.
///
/// Purely observational; the request passes through unchanged, so the
/// one-call-per-fetch contract of the page adapter holds.
#[derive(Clone, Debug)]
pub(crate) struct TraceMiddleware;

#[async_trait::async_trait]
impl Middleware for TraceMiddleware {
    async fn handle(
        &self,
        req: reqwest::Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<reqwest::Response> {
        let method = req.method().clone();
        let url = req.url().clone();
        let start = Instant::now();

        match next.run(req, extensions).await {
            Ok(resp) => {
                debug!(
                    %method,
                    %url,
                    status = %resp.status(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "backend request"
                );
                Ok(resp)
            }
            Err(err) => {
                warn!(
                    %method,
                    %url,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "backend request failed: {err}"
                );
                Err(err)
            }
        }
    }
}
