use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::error::OmicsBrowseError;
use crate::sources::omics::OmicsClient;

#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthRow {
    pub api: String,
    pub status: String,
    pub latency: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthReport {
    pub healthy: usize,
    pub total: usize,
    pub rows: Vec<HealthRow>,
}

impl HealthReport {
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# OmicsBrowse Health Check\n\n");
        out.push_str("| API | Status | Latency |\n");
        out.push_str("|-----|--------|---------|\n");
        for row in &self.rows {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                row.api, row.status, row.latency
            ));
        }
        out.push_str(&format!(
            "\nStatus: {}/{} APIs healthy\n",
            self.healthy, self.total
        ));
        out
    }
}

async fn check_one(
    client: reqwest::Client,
    api: &str,
    url: &str,
    query: &[(&str, String)],
) -> HealthRow {
    let start = Instant::now();
    let resp = client
        .get(url)
        .query(query)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await;

    match resp {
        Ok(resp) => {
            let status = resp.status();
            let elapsed = start.elapsed().as_millis();
            if status.is_success() {
                HealthRow {
                    api: api.to_string(),
                    status: "ok".into(),
                    latency: format!("{elapsed}ms"),
                }
            } else {
                HealthRow {
                    api: api.to_string(),
                    status: "error".into(),
                    latency: format!("{elapsed}ms (HTTP {})", status.as_u16()),
                }
            }
        }
        Err(err) => {
            let reason = if err.is_timeout() {
                "timeout"
            } else if err.is_connect() {
                "connect"
            } else {
                "error"
            };
            HealthRow {
                api: api.to_string(),
                status: "error".into(),
                latency: reason.into(),
            }
        }
    }
}

fn health_http_client() -> Result<reqwest::Client, OmicsBrowseError> {
    static HEALTH_HTTP_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

    if let Some(client) = HEALTH_HTTP_CLIENT.get() {
        return Ok(client.clone());
    }

    let client = reqwest::Client::builder()
        // Keep health checks snappy and deterministic.
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(5))
        .user_agent(concat!("omicsbrowse-cli/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(OmicsBrowseError::HttpClientInit)?;

    match HEALTH_HTTP_CLIENT.set(client.clone()) {
        Ok(()) => Ok(client),
        Err(_) => HEALTH_HTTP_CLIENT
            .get()
            .cloned()
            .ok_or_else(|| OmicsBrowseError::Api {
                api: "health".into(),
                message: "Health HTTP client initialization race".into(),
            }),
    }
}

/// Probes the pathway listing endpoint with a minimal single-row page.
///
/// # Errors
///
/// Returns an error when the probe HTTP client cannot be created; an
/// unreachable or erroring backend is reported in the rows, not as an error.
pub async fn check() -> Result<HealthReport, OmicsBrowseError> {
    let omics = OmicsClient::new()?;
    check_client(&omics).await
}

async fn check_client(omics: &OmicsClient) -> Result<HealthReport, OmicsBrowseError> {
    let client = health_http_client()?;
    let query_str = crate::query::build_pathway_query(&[], &[])?;

    let rows = vec![
        check_one(
            client,
            "Omics backend",
            &omics.listing_endpoint(),
            &[
                ("page", "1".to_string()),
                ("page_size", "1".to_string()),
                ("query_str", query_str),
            ],
        )
        .await,
    ];
    let healthy = rows.iter().filter(|r| r.status == "ok").count();
    Ok(HealthReport {
        healthy,
        total: rows.len(),
        rows,
    })
}
