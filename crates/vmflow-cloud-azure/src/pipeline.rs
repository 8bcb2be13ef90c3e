//! Shared ARM request pipeline
//!
//! Every typed client goes through [`ArmClient`]: it attaches the bearer
//! token, decodes ARM error bodies, follows `nextLink` pagination and waits
//! for long-running operations to finish. A failed request is returned as an
//! error, never resent.

use crate::credential::TokenCredential;
use crate::error::{AzureError, ErrorDetail, Result};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";
const LOCATION_HEADER: &str = "location";

/// How long-running operations are awaited
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// Delay between status checks when the service sends no `Retry-After`
    pub interval: Duration,
    /// Upper bound for a single operation
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(30 * 60),
        }
    }
}

/// Authenticated ARM client for one subscription
#[derive(Clone)]
pub struct ArmClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    credential: Arc<dyn TokenCredential>,
    endpoint: String,
    subscription_id: String,
    poll: PollOptions,
}

impl ArmClient {
    pub fn new(subscription_id: impl Into<String>, credential: Arc<dyn TokenCredential>) -> Self {
        Self {
            inner: Arc::new(Inner {
                http: reqwest::Client::new(),
                credential,
                endpoint: DEFAULT_ENDPOINT.to_string(),
                subscription_id: subscription_id.into(),
                poll: PollOptions::default(),
            }),
        }
    }

    /// Point the client at another management endpoint
    pub fn with_endpoint(self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        self.map_inner(|inner| inner.endpoint = endpoint)
    }

    pub fn with_poll_options(self, poll: PollOptions) -> Self {
        self.map_inner(|inner| inner.poll = poll)
    }

    fn map_inner(self, f: impl FnOnce(&mut Inner)) -> Self {
        let mut inner = Arc::try_unwrap(self.inner).unwrap_or_else(|shared| Inner {
            http: shared.http.clone(),
            credential: Arc::clone(&shared.credential),
            endpoint: shared.endpoint.clone(),
            subscription_id: shared.subscription_id.clone(),
            poll: shared.poll,
        });
        f(&mut inner);
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn subscription_id(&self) -> &str {
        &self.inner.subscription_id
    }

    pub fn credential(&self) -> &Arc<dyn TokenCredential> {
        &self.inner.credential
    }

    /// `{endpoint}/subscriptions/{id}`
    pub fn subscription_url(&self) -> String {
        format!(
            "{}/subscriptions/{}",
            self.inner.endpoint, self.inner.subscription_id
        )
    }

    /// `{endpoint}/subscriptions/{id}/resourceGroups/{group}`
    pub fn resource_group_url(&self, group: &str) -> String {
        format!("{}/resourceGroups/{}", self.subscription_url(), group)
    }

    /// `.../resourceGroups/{group}/providers/{provider_path}`
    pub fn provider_url(&self, group: &str, provider_path: &str) -> String {
        format!(
            "{}/providers/{}",
            self.resource_group_url(group),
            provider_path
        )
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let token = self.inner.credential.token().await?;
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .inner
            .http
            .request(method, url)
            .bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(AzureError::from_response(status.as_u16(), &body))
    }

    /// GET a resource and decode it
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.send::<()>(Method::GET, url, None).await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    /// GET every page of a list operation
    pub async fn list<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());

        while let Some(page_url) = next {
            let page: Page<T> = self.get(&page_url).await?;
            items.extend(page.value);
            next = page.next_link.filter(|link| !link.is_empty());
        }

        Ok(items)
    }

    /// PUT a resource, wait for provisioning, and return its final representation
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let response = self.send(Method::PUT, url, Some(body)).await?;
        let response = Self::check(response).await?;

        let pending = PendingOperation::from_response(&response);
        if pending.is_pending() {
            self.wait(pending, url).await?;
            return self.get(url).await;
        }

        Ok(response.json().await?)
    }

    /// POST an action (start, restart, ...) and wait for it to finish
    pub async fn post_action(&self, url: &str) -> Result<()> {
        let response = self.send::<()>(Method::POST, url, None).await?;
        let response = Self::check(response).await?;

        let pending = PendingOperation::from_response(&response);
        if pending.is_pending() {
            self.wait(pending, url).await?;
        }
        Ok(())
    }

    /// DELETE a resource and wait until it is gone; a missing resource is not an error
    pub async fn delete(&self, url: &str) -> Result<()> {
        let response = self.send::<()>(Method::DELETE, url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Resource already absent: {}", url);
            return Ok(());
        }
        let response = Self::check(response).await?;

        let pending = PendingOperation::from_response(&response);
        if pending.is_pending() {
            self.wait(pending, url).await?;
        }
        Ok(())
    }

    /// HEAD a resource; true when it exists
    pub async fn exists(&self, url: &str) -> Result<bool> {
        let response = self.send::<()>(Method::HEAD, url, None).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(AzureError::from_response(status.as_u16(), "")),
        }
    }

    async fn wait(&self, pending: PendingOperation, what: &str) -> Result<()> {
        let timeout = self.inner.poll.timeout;
        match tokio::time::timeout(timeout, self.poll_until_done(pending)).await {
            Ok(result) => result,
            Err(_) => Err(AzureError::Timeout(format!(
                "{} after {}s",
                strip_query(what),
                timeout.as_secs()
            ))),
        }
    }

    async fn poll_until_done(&self, mut pending: PendingOperation) -> Result<()> {
        if let Some(status_url) = pending.async_operation.take() {
            return self.poll_async_operation(&status_url, pending.retry_after).await;
        }
        if let Some(location) = pending.location.take() {
            return self.poll_location(&location, pending.retry_after).await;
        }
        Ok(())
    }

    /// Poll an `Azure-AsyncOperation` status document until it is terminal
    async fn poll_async_operation(&self, url: &str, retry_after: Option<Duration>) -> Result<()> {
        let mut delay = retry_after.unwrap_or(self.inner.poll.interval);

        loop {
            tokio::time::sleep(delay).await;

            let response = self.send::<()>(Method::GET, url, None).await?;
            let response = Self::check(response).await?;
            delay = retry_after_header(response.headers()).unwrap_or(self.inner.poll.interval);

            let status: OperationStatus = response.json().await?;
            tracing::debug!("Operation status: {}", status.status);

            match status.status.as_str() {
                "Succeeded" => return Ok(()),
                "Failed" | "Canceled" => {
                    let detail = status.error.unwrap_or_default();
                    return Err(AzureError::OperationFailed {
                        status: status.status.to_lowercase(),
                        code: detail.code,
                        message: detail.message,
                    });
                }
                _ => continue,
            }
        }
    }

    /// Poll a `Location` URL until it stops answering 202
    async fn poll_location(&self, url: &str, retry_after: Option<Duration>) -> Result<()> {
        let mut delay = retry_after.unwrap_or(self.inner.poll.interval);

        loop {
            tokio::time::sleep(delay).await;

            let response = self.send::<()>(Method::GET, url, None).await?;
            if response.status() != StatusCode::ACCEPTED {
                Self::check(response).await?;
                return Ok(());
            }
            delay = retry_after_header(response.headers()).unwrap_or(self.inner.poll.interval);
        }
    }
}

/// Completion hints carried by a mutating response
#[derive(Debug, Default)]
struct PendingOperation {
    async_operation: Option<String>,
    location: Option<String>,
    retry_after: Option<Duration>,
}

impl PendingOperation {
    fn from_response(response: &Response) -> Self {
        let headers = response.headers();
        let async_operation = header_string(headers, ASYNC_OPERATION_HEADER);
        // Location only signals an unfinished operation on 202
        let location = if response.status() == StatusCode::ACCEPTED {
            header_string(headers, LOCATION_HEADER)
        } else {
            None
        };

        Self {
            async_operation,
            location,
            retry_after: retry_after_header(headers),
        }
    }

    fn is_pending(&self) -> bool {
        self.async_operation.is_some() || self.location.is_some()
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn retry_after_header(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// One page of an ARM list operation
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    next_link: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct OperationStatus {
    status: String,
    error: Option<ErrorDetail>,
}
