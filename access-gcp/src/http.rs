//! Shared HTTP plumbing for the Google Cloud clients.
//!
//! [`GcpHttp`] sends authorized JSON requests with retry and maps HTTP
//! statuses to [`GcpError`]. [`PageCursor`] walks a `nextPageToken`-paged
//! listing one page at a time.

use access_matrix::{Cursor, SourceResult};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::VecDeque;
use std::marker::PhantomData;
use tracing::{debug, error, warn};

use crate::config::GcpConfig;
use crate::error::{GcpError, GcpResult};
use crate::retry::{with_retry_if, RetryConfig};

/// Authorized JSON client shared by every API client.
#[derive(Clone)]
pub struct GcpHttp {
    /// HTTP client instance.
    client: Client,

    /// Bearer token, if configured.
    access_token: Option<String>,

    /// Retry policy applied to every request.
    retry: RetryConfig,

    /// Page size requested from listings.
    page_size: u32,
}

impl std::fmt::Debug for GcpHttp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpHttp")
            .field("authorized", &self.access_token.is_some())
            .field("retry", &self.retry)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl GcpHttp {
    /// Create a client from `config`.
    pub fn new(config: &GcpConfig) -> GcpResult<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            access_token: config.access_token.clone(),
            retry: config.retry(),
            page_size: config.page_size,
        })
    }

    /// Page size requested from listings.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// GET `url` and decode the JSON body.
    pub async fn get_json<T>(&self, url: &str, query: &[(&str, String)]) -> GcpResult<T>
    where
        T: DeserializeOwned,
    {
        with_retry_if(
            &self.retry,
            || {
                let pending = self.authorize(self.client.get(url).query(query)).send();
                async move { handle_response(pending.await?).await }
            },
            GcpError::is_transient,
        )
        .await
    }

    /// POST `body` as JSON to `url` and decode the JSON body.
    pub async fn post_json<T, B>(&self, url: &str, body: &B) -> GcpResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        with_retry_if(
            &self.retry,
            || {
                let pending = self.authorize(self.client.post(url).json(body)).send();
                async move { handle_response(pending.await?).await }
            },
            GcpError::is_transient,
        )
        .await
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }
}

/// Map a response to a decoded body or a [`GcpError`].
async fn handle_response<T>(response: Response) -> GcpResult<T>
where
    T: DeserializeOwned,
{
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        error!("Google Cloud authentication failed");
        return Err(GcpError::AuthenticationFailed);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(GcpError::NotFound(response.url().path().to_string()));
    }

    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        warn!(status = status.as_u16(), message = %message, "Google Cloud API error");
        return Err(GcpError::ApiError {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json()
        .await
        .map_err(|e| GcpError::InvalidResponse(e.to_string()))
}

/// One page of a paged listing.
pub trait Page: DeserializeOwned + Send + 'static {
    /// Record type the page yields.
    type Item: Send + 'static;

    /// Split the page into its records and the next page token.
    fn into_parts(self) -> GcpResult<(Vec<Self::Item>, Option<String>)>;
}

/// Lazy cursor over a paged listing.
///
/// Pages are fetched on demand; nothing is requested until the first call to
/// [`Cursor::next`]. A failed page ends the cursor.
pub struct PageCursor<P: Page> {
    http: GcpHttp,
    url: String,
    query: Vec<(&'static str, String)>,
    buffer: VecDeque<P::Item>,
    page_token: Option<String>,
    exhausted: bool,
    pages: u32,
    _page: PhantomData<fn() -> P>,
}

impl<P: Page> PageCursor<P> {
    /// Create a cursor over `url`.
    pub fn new(http: GcpHttp, url: String) -> Self {
        Self {
            http,
            url,
            query: Vec::new(),
            buffer: VecDeque::new(),
            page_token: None,
            exhausted: false,
            pages: 0,
            _page: PhantomData,
        }
    }

    /// Add a query parameter sent with every page request.
    pub fn with_query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    async fn fetch_page(&mut self) -> GcpResult<()> {
        let mut query = self.query.clone();
        if let Some(token) = self.page_token.take() {
            query.push(("pageToken", token));
        }

        let page: P = self.http.get_json(&self.url, &query).await?;
        let (items, next) = page.into_parts()?;
        self.pages += 1;
        debug!(url = %self.url, page = self.pages, items = items.len(), "Fetched page");

        self.buffer.extend(items);
        self.page_token = next.filter(|token| !token.is_empty());
        self.exhausted = self.page_token.is_none();
        Ok(())
    }
}

#[async_trait]
impl<P: Page> Cursor<P::Item> for PageCursor<P> {
    async fn next(&mut self) -> SourceResult<Option<P::Item>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Ok(Some(item));
            }
            if self.exhausted {
                return Ok(None);
            }
            if let Err(e) = self.fetch_page().await {
                self.exhausted = true;
                return Err(e.into());
            }
        }
    }
}
