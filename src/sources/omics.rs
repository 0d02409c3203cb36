use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::OmicsBrowseError;

const OMICS_BASE: &str = "http://localhost:3000";
const OMICS_API: &str = "omics-data";
const OMICS_BASE_ENV: &str = "OMICSBROWSE_OMICS_BASE";

/// Client for the omics-data backend that serves the pathway tables.
pub struct OmicsClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
}

impl OmicsClient {
    pub fn new() -> Result<Self, OmicsBrowseError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: crate::sources::env_base(OMICS_BASE, OMICS_BASE_ENV),
        })
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(base: String) -> Result<Self, OmicsBrowseError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: Cow::Owned(base),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base.as_ref().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// URL probed by the health check.
    pub(crate) fn listing_endpoint(&self) -> String {
        self.endpoint("api/pathways")
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        req: reqwest_middleware::RequestBuilder,
    ) -> Result<T, OmicsBrowseError> {
        let resp = req.send().await?;
        let status = resp.status();
        let content_type = resp.headers().get(reqwest::header::CONTENT_TYPE).cloned();
        let bytes = crate::sources::read_limited_body(resp, OMICS_API).await?;
        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(OmicsBrowseError::Api {
                api: OMICS_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }
        crate::sources::ensure_json_content_type(OMICS_API, content_type.as_ref(), &bytes)?;
        serde_json::from_slice(&bytes).map_err(|source| OmicsBrowseError::ApiJson {
            api: OMICS_API.to_string(),
            source,
        })
    }

    /// Lists KEGG pathway-to-gene association rows.
    ///
    /// `page` and `page_size` are forwarded only when present so the
    /// backend's own defaults apply; `query_str` always travels, even when it
    /// carries no predicates.
    pub async fn get_pathways(
        &self,
        page: Option<u32>,
        page_size: Option<u32>,
        query_str: &str,
    ) -> Result<RawPathwayPage, OmicsBrowseError> {
        let url = self.endpoint("api/pathways");
        let mut req = self.client.get(&url);
        if let Some(page) = page {
            req = req.query(&[("page", page)]);
        }
        if let Some(page_size) = page_size {
            req = req.query(&[("page_size", page_size)]);
        }
        req = req.query(&[("query_str", query_str)]);
        self.get_json(req).await
    }

    /// Raw call against the general omics-data endpoint.
    ///
    /// The parameter bag is forwarded untouched and the response payload is
    /// not reshaped; this endpoint has no fixed schema beyond the page
    /// envelope.
    pub async fn get_omics_data(
        &self,
        params: &[(String, String)],
    ) -> Result<OmicsDataPage, OmicsBrowseError> {
        let url = self.endpoint("api/omics-data");
        self.get_json(self.client.get(&url).query(params)).await
    }
}

/// Wire shape of the pathway listing response.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPathwayPage {
    #[serde(default)]
    pub total: u64,
    /// Backend success flag; the page adapter overrides it, so it is kept
    /// only for diagnostics.
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Vec<RawPathwayRecord>,
}

/// One association row as the backend sends it. Unknown fields are collected
/// rather than dropped so the table can pass them through.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPathwayRecord {
    pub pathway_id: Option<String>,
    pub pathway_name: Option<String>,
    pub gene_symbol: Option<String>,
    pub ensembl_id: Option<String>,
    pub entrez_id: Option<StringOrU64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum StringOrU64 {
    String(String),
    Number(u64),
}

impl StringOrU64 {
    pub fn as_string(&self) -> String {
        match self {
            StringOrU64::String(s) => s.clone(),
            StringOrU64::Number(n) => n.to_string(),
        }
    }
}

/// Page envelope of the omics-data endpoint; `data` stays opaque by
/// contract.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OmicsDataPage {
    #[serde(default)]
    pub total: u64,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn get_pathways_forwards_page_controls_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/pathways"))
            .and(query_param("page", "2"))
            .and(query_param("page_size", "25"))
            .and(query_param(
                "query_str",
                "{:select [:*] :from [:kegg_pathway]  :where [:like :gene_symbol \"%BRCA1%\"]}",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total": 1,
                "success": true,
                "data": [{
                    "pathway_id": "hsa00010",
                    "pathway_name": "Glycolysis",
                    "gene_symbol": "BRCA1",
                    "ensembl_id": "ENSG00000012048",
                    "entrez_id": 672
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OmicsClient::new_for_test(server.uri()).unwrap();
        let page = client
            .get_pathways(
                Some(2),
                Some(25),
                "{:select [:*] :from [:kegg_pathway]  :where [:like :gene_symbol \"%BRCA1%\"]}",
            )
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].pathway_id.as_deref(), Some("hsa00010"));
        assert_eq!(
            page.data[0].entrez_id.as_ref().map(StringOrU64::as_string),
            Some("672".to_string())
        );
    }

    #[tokio::test]
    async fn get_pathways_omits_absent_page_controls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/pathways"))
            .and(query_param_is_missing("page"))
            .and(query_param_is_missing("page_size"))
            .and(query_param(
                "query_str",
                "{:select [:*] :from [:kegg_pathway]  }",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total": 0,
                "success": true,
                "data": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OmicsClient::new_for_test(server.uri()).unwrap();
        let page = client
            .get_pathways(None, None, "{:select [:*] :from [:kegg_pathway]  }")
            .await
            .unwrap();
        assert_eq!(page.total, 0);
        assert!(page.data.is_empty());
    }

    #[tokio::test]
    async fn get_pathways_collects_unknown_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/pathways"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total": 1,
                "success": true,
                "data": [{
                    "pathway_id": "hsa04110",
                    "ensembl_id": "ENSG1",
                    "organism": "Homo sapiens",
                    "score": 0.93
                }]
            })))
            .mount(&server)
            .await;

        let client = OmicsClient::new_for_test(server.uri()).unwrap();
        let page = client.get_pathways(None, None, "{}").await.unwrap();
        let row = &page.data[0];
        assert_eq!(row.extra.get("organism").and_then(|v| v.as_str()), Some("Homo sapiens"));
        assert_eq!(row.extra.get("score").and_then(|v| v.as_f64()), Some(0.93));
    }

    #[tokio::test]
    async fn get_pathways_maps_server_error_to_api_error_with_excerpt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/pathways"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
            .mount(&server)
            .await;

        let client = OmicsClient::new_for_test(server.uri()).unwrap();
        let err = client.get_pathways(None, None, "{}").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("omics-data"));
        assert!(msg.contains("HTTP 500"));
        assert!(msg.contains("backend exploded"));
    }

    #[tokio::test]
    async fn get_pathways_rejects_html_responses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/pathways"))
            .respond_with(
                // set_body_string would clobber the content-type with
                // text/plain; set_body_raw keeps the HTML media type.
                ResponseTemplate::new(200).set_body_raw(
                    "<html><body>login required</body></html>",
                    "text/html; charset=utf-8",
                ),
            )
            .mount(&server)
            .await;

        let client = OmicsClient::new_for_test(server.uri()).unwrap();
        let err = client.get_pathways(None, None, "{}").await.unwrap_err();
        assert!(err.to_string().contains("HTML"));
    }

    #[tokio::test]
    async fn get_pathways_maps_malformed_body_to_api_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/pathways"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string("{\"total\": "),
            )
            .mount(&server)
            .await;

        let client = OmicsClient::new_for_test(server.uri()).unwrap();
        let err = client.get_pathways(None, None, "{}").await.unwrap_err();
        assert!(matches!(err, OmicsBrowseError::ApiJson { .. }));
    }

    #[tokio::test]
    async fn get_omics_data_forwards_param_bag_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/omics-data"))
            .and(query_param("page", "1"))
            .and(query_param("assay", "rna-seq"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total": 3,
                "page": 1,
                "page_size": 10,
                "data": [{"sample": "S1"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OmicsClient::new_for_test(server.uri()).unwrap();
        let page = client
            .get_omics_data(&[
                ("page".to_string(), "1".to_string()),
                ("assay".to_string(), "rna-seq".to_string()),
            ])
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.page, Some(1));
        assert!(page.data.is_array());
    }
}
