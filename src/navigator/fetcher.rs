//! Rate-limited HTTP fetcher for the portal
//!
//! One fetcher instance serves all targets. The cookie store carries the
//! portal's session cookies across the steps of an attempt; rate limiting
//! keeps a tick from bursting the upstream site; every request runs through
//! the retry executor with the configured delay schedule.

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{Client, Method};
use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use crate::navigator::headers::{build_portal_headers, random_user_agent};
use crate::utils::error::FetchError;
use crate::utils::retry::{run_with_retry, RetryError, RetryPolicy};

/// Outcome of one successful network step
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Response body
    pub body: String,

    /// HTTP status code
    pub status: u16,

    /// Final URL after redirects; becomes the next step's action fallback
    pub url: String,

    /// Wall-clock time the step took, including redirects
    pub elapsed: Duration,
}

/// Portal HTTP fetcher with rate limiting and retry
pub struct PortalFetcher {
    /// HTTP client with cookie store and configured timeout
    client: Client,

    /// Rate limiter to control request frequency against the portal
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    /// Retry policy applied to every step
    policy: RetryPolicy,

    /// Portal origin; step paths and form actions are resolved against it
    base_url: String,
}

impl PortalFetcher {
    /// Create a fetcher with the default retry schedule and a 60s timeout
    pub fn new(base_url: &str, requests_per_second: u32) -> Result<Self, FetchError> {
        Self::with_config(
            base_url,
            requests_per_second,
            RetryPolicy::default(),
            Duration::from_secs(60),
        )
    }

    /// Create a fetcher with custom retry policy and timeout
    pub fn with_config(
        base_url: &str,
        requests_per_second: u32,
        policy: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .cookie_store(true)
            .build()?;

        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::new(1).unwrap());
        let quota = Quota::per_second(rate);
        let rate_limiter = RateLimiter::direct(quota);

        Ok(Self {
            client,
            rate_limiter,
            policy,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The configured retry policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// GET a portal page
    pub async fn get(&self, path: &str, label: &str) -> Result<StepResult, RetryError> {
        self.rate_limiter.until_ready().await;

        run_with_retry(&self.policy, label, || {
            self.attempt(Method::GET, path, None)
        })
        .await
    }

    /// POST a form submission
    pub async fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
        label: &str,
    ) -> Result<StepResult, RetryError> {
        self.rate_limiter.until_ready().await;

        run_with_retry(&self.policy, label, || {
            self.attempt(Method::POST, path, Some(form))
        })
        .await
    }

    /// One request attempt, classified for the retry executor.
    ///
    /// 2xx produces a [`StepResult`]; 429 and 5xx are transient; other
    /// statuses are client errors and fail the step immediately.
    async fn attempt(
        &self,
        method: Method,
        path: &str,
        form: Option<&[(String, String)]>,
    ) -> Result<StepResult, FetchError> {
        let url = self.full_url(path);
        let headers = build_portal_headers(random_user_agent());
        let started = Instant::now();

        let mut request = self.client.request(method, &url).headers(headers);
        if let Some(form) = form {
            request = request.form(form);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    let final_url = response.url().to_string();
                    let body = response.text().await?;
                    Ok(StepResult {
                        body,
                        status: status.as_u16(),
                        url: final_url,
                        elapsed: started.elapsed(),
                    })
                } else if status.as_u16() == 429 {
                    Err(FetchError::RateLimited)
                } else if status.is_server_error() {
                    Err(FetchError::ServerError(status.as_u16()))
                } else {
                    Err(FetchError::ClientError(status.as_u16()))
                }
            }
            Err(e) => {
                if e.is_timeout() {
                    Err(FetchError::Timeout)
                } else {
                    Err(FetchError::Http(e))
                }
            }
        }
    }

    /// Resolve a path or form action against the portal origin
    fn full_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}
