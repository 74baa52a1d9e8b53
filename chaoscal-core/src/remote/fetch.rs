//! Feed transport.
//!
//! The reconciler only needs "GET this URL and give me the body as text".
//! `FeedFetcher` is that seam; `HttpFetcher` implements it with reqwest.

use async_trait::async_trait;
use url::Url;

use crate::config::SyncConfig;
use crate::error::{ChaosCalError, ChaosCalResult};
use crate::subscription::CalendarSubscription;

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch `url` and return the response body.
    ///
    /// Non-2xx responses must be reported as `ChaosCalError::FeedStatus`.
    async fn fetch(&self, url: &Url) -> ChaosCalResult<String>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &SyncConfig) -> ChaosCalResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ChaosCalError::FeedRequest(format!("Could not build HTTP client: {e}")))?;

        Ok(HttpFetcher { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> ChaosCalResult<String> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| ChaosCalError::FeedRequest(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChaosCalError::FeedStatus(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| ChaosCalError::FeedBody(e.to_string()))
    }
}

/// Resolve the URL to fetch for a subscription.
///
/// `webcal://` is fetched over https. With `use_proxy`, the feed URL is
/// percent-encoded into the proxy's `url` query parameter.
pub fn feed_url(subscription: &CalendarSubscription, proxy_url: &str) -> ChaosCalResult<Url> {
    let raw = subscription.url.trim();
    let raw = match strip_prefix_ignore_case(raw, "webcal://") {
        Some(rest) => format!("https://{rest}"),
        None => raw.to_string(),
    };

    let target = Url::parse(&raw)
        .map_err(|e| ChaosCalError::InvalidFeedUrl(format!("{}: {e}", subscription.url)))?;

    if !subscription.use_proxy {
        return Ok(target);
    }

    Url::parse_with_params(proxy_url, &[("url", target.as_str())])
        .map_err(|e| ChaosCalError::InvalidFeedUrl(format!("{proxy_url}: {e}")))
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}
