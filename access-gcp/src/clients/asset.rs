//! Cloud Asset Inventory client.
//!
//! `searchAllIamPolicies` returns every IAM policy under a scope, one result
//! per bound resource, paged by `nextPageToken`.

use access_matrix::{Cursor, PolicyRecord, PolicySearch, SourceResult};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::IamPolicy;
use crate::config::ServiceEndpoint;
use crate::error::GcpResult;
use crate::http::{GcpHttp, Page, PageCursor};

/// Cloud Asset Inventory client.
#[derive(Debug, Clone)]
pub struct AssetClient {
    http: GcpHttp,
    endpoint: ServiceEndpoint,
}

impl AssetClient {
    /// Create a new Cloud Asset client.
    pub fn new(http: GcpHttp, endpoint: ServiceEndpoint) -> Self {
        Self { http, endpoint }
    }

    /// Open a lazy search over every IAM policy under `scope`
    /// (e.g. `projects/my-project`).
    #[instrument(skip(self))]
    pub fn search_all_iam_policies(&self, scope: &str) -> PageCursor<SearchPage> {
        let url = self
            .endpoint
            .url(&format!("/v1/{}:searchAllIamPolicies", scope));
        debug!(url = %url, "Opening IAM policy search");

        PageCursor::new(self.http.clone(), url).with_query("pageSize", self.http.page_size())
    }
}

#[async_trait]
impl PolicySearch for AssetClient {
    async fn search_all(&self, scope: &str) -> SourceResult<Box<dyn Cursor<PolicyRecord>>> {
        Ok(Box::new(self.search_all_iam_policies(scope)))
    }
}

/// One page of `searchAllIamPolicies`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    results: Vec<SearchResult>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    resource: String,
    #[serde(default)]
    policy: IamPolicy,
}

impl Page for SearchPage {
    type Item = PolicyRecord;

    fn into_parts(self) -> GcpResult<(Vec<PolicyRecord>, Option<String>)> {
        let records = self
            .results
            .into_iter()
            .map(|result| PolicyRecord::new(result.resource, result.policy.bindings))
            .collect();
        Ok((records, self.next_page_token))
    }
}
