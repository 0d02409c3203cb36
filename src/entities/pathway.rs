use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::OmicsBrowseError;
use crate::query::{self, SortOrder};
use crate::sources::omics::OmicsClient;
use crate::transform;

/// One KEGG pathway-to-gene association row as the table renders it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathwayGeneRecord {
    /// Stable row identity, derived as `{pathway_id}_{ensembl_id}`.
    pub key: String,
    pub pathway_id: String,
    pub pathway_name: String,
    pub gene_symbol: String,
    pub ensembl_id: String,
    pub entrez_id: String,
    /// Backend fields beyond the column set, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Table state for one page fetch.
///
/// `filters` keeps the caller's field order; the reserved `current` and
/// `pageSize` names never become predicates even if a caller slips them in.
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    /// 1-based page number; the backend default applies when absent.
    pub current: Option<u32>,
    pub page_size: Option<u32>,
    pub filters: Vec<(String, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub total: u64,
    pub success: bool,
    pub data: Vec<PathwayGeneRecord>,
}

impl PageResult {
    /// What the table sees when a fetch fails under
    /// [`ErrorPolicy::EmptyPage`]: indistinguishable from zero matches.
    pub fn empty() -> Self {
        Self {
            total: 0,
            success: true,
            data: Vec::new(),
        }
    }
}

/// What the fetch adapter does with a failed backend call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Swallow the failure and hand the table an empty page. The historical
    /// behavior of this browser: "no results" and "request failed" look the
    /// same to the caller, with the detail only in the logs.
    #[default]
    EmptyPage,
    /// Surface the failure to the caller.
    Propagate,
}

/// Per-column enumerated filter selections as a table widget reports them.
/// Accepted for interface compatibility and logged; no predicates are derived
/// from it.
pub type FilterMap = BTreeMap<String, Option<Vec<String>>>;

/// Fetches one page of pathway-gene associations.
///
/// Builds the backend query from `request.filters` and `sort`, issues a
/// single listing call, and normalizes the outcome: every row gains its
/// derived `key` and `success` is forced to `true` regardless of what the
/// backend reported. A failed call follows `policy`; a malformed request
/// (bad filter or sort field) is always an error, since no call was made.
pub async fn fetch_page(
    request: &PageRequest,
    sort: &[(String, SortOrder)],
    filter: &FilterMap,
    policy: ErrorPolicy,
) -> Result<PageResult, OmicsBrowseError> {
    let client = OmicsClient::new()?;
    fetch_page_with(&client, request, sort, filter, policy).await
}

async fn fetch_page_with(
    client: &OmicsClient,
    request: &PageRequest,
    sort: &[(String, SortOrder)],
    filter: &FilterMap,
    policy: ErrorPolicy,
) -> Result<PageResult, OmicsBrowseError> {
    let query_str = query::build_pathway_query(&request.filters, sort)?;
    if !filter.is_empty() {
        debug!(filter = ?filter, "column filter selections accepted but unused");
    }
    debug!(
        page = ?request.current,
        page_size = ?request.page_size,
        query = %query_str,
        "requesting pathway page"
    );

    match client
        .get_pathways(request.current, request.page_size, &query_str)
        .await
    {
        Ok(raw) => {
            if raw.success == Some(false) {
                debug!("backend reported success=false; overriding for the table");
            }
            Ok(PageResult {
                total: raw.total,
                success: true,
                data: raw
                    .data
                    .into_iter()
                    .map(transform::pathway::from_raw_record)
                    .collect(),
            })
        }
        Err(err) => match policy {
            ErrorPolicy::EmptyPage => {
                warn!(query = %query_str, "pathway page fetch failed, returning empty page: {err}");
                Ok(PageResult::empty())
            }
            ErrorPolicy::Propagate => Err(err),
        },
    }
}
