//! HTTP remote provider.
//!
//! Talks to a JSON collection endpoint:
//! - `GET {url}` returns a JSON array
//! - `POST {url}` accepts one quote as `{text, category}`
//!
//! Two payload shapes are understood on fetch. [`RemoteFormat::Quotes`] expects
//! quote objects. [`RemoteFormat::Posts`] reads JSONPlaceholder-style posts and
//! files every `title` under a fixed category.

use crate::models::Quote;
use crate::storage::traits::RemoteProvider;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Shape of the JSON array returned by the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoteFormat {
    /// An array of `{text, category}` objects.
    #[default]
    Quotes,
    /// An array of posts; `title` becomes the quote text.
    Posts,
}

impl RemoteFormat {
    /// Parses a format from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "quotes" => Some(Self::Quotes),
            "posts" => Some(Self::Posts),
            _ => None,
        }
    }

    /// Returns the format as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Quotes => "quotes",
            Self::Posts => "posts",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
}

/// Remote provider over HTTP using `reqwest`.
pub struct HttpRemote {
    client: reqwest::Client,
    url: String,
    format: RemoteFormat,
    default_category: String,
}

impl HttpRemote {
    /// Creates a provider for `url`.
    ///
    /// `timeout` bounds every request; `None` waits indefinitely.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL is empty or the client cannot be built.
    pub fn new(
        url: impl Into<String>,
        format: RemoteFormat,
        default_category: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(Error::Config("remote url is empty".to_string()));
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(format!("quote-sync/{}", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(4);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            url,
            format,
            default_category: default_category.into(),
        })
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Decodes a fetch body according to the configured format.
    fn decode(&self, body: &[u8]) -> Result<Vec<Quote>> {
        decode_body(self.format, &self.default_category, body)
    }
}

/// Decodes a remote payload into quotes, dropping records that fail validation.
pub(crate) fn decode_body(
    format: RemoteFormat,
    default_category: &str,
    body: &[u8],
) -> Result<Vec<Quote>> {
    let raw: Vec<Quote> = match format {
        RemoteFormat::Quotes => {
            serde_json::from_slice(body).map_err(|e| Error::remote("decode_quotes", e))?
        },
        RemoteFormat::Posts => {
            let posts: Vec<Post> =
                serde_json::from_slice(body).map_err(|e| Error::remote("decode_posts", e))?;
            posts
                .into_iter()
                .map(|p| Quote {
                    text: p.title,
                    category: default_category.to_string(),
                })
                .collect()
        },
    };

    let total = raw.len();
    let quotes: Vec<Quote> = raw
        .into_iter()
        .filter_map(|q| q.normalized().ok())
        .collect();
    if quotes.len() < total {
        warn!(
            dropped = total - quotes.len(),
            "Dropped invalid remote records"
        );
    }
    Ok(quotes)
}

#[async_trait]
impl RemoteProvider for HttpRemote {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_all(&self) -> Result<Vec<Quote>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| Error::remote("fetch_all", e))?;
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::remote("fetch_all", e))?;

        let quotes = self.decode(&body)?;
        debug!(count = quotes.len(), "Fetched remote collection");
        Ok(quotes)
    }

    #[instrument(skip(self, quote), fields(url = %self.url))]
    async fn push(&self, quote: &Quote) -> Result<()> {
        self.client
            .post(&self.url)
            .json(quote)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map(|_| ())
            .map_err(|e| Error::remote("push", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_quotes_format() {
        let body = br#"[{"text":"A","category":"x"},{"text":"B","category":"y"}]"#;
        let quotes = decode_body(RemoteFormat::Quotes, "Server", body).unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[1], Quote::new("B", "y").unwrap());
    }

    #[test]
    fn test_decode_posts_format() {
        let body = br#"[{"userId":1,"id":1,"title":"sunt aut facere","body":"..."},
                        {"userId":1,"id":2,"title":"qui est esse","body":"..."}]"#;
        let quotes = decode_body(RemoteFormat::Posts, "Server", body).unwrap();
        assert_eq!(
            quotes,
            vec![
                Quote::new("sunt aut facere", "Server").unwrap(),
                Quote::new("qui est esse", "Server").unwrap(),
            ]
        );
    }

    #[test]
    fn test_decode_posts_ignores_quote_strictness() {
        // Posts carry extra fields; only the quotes format must be exact.
        let body = br#"[{"id":1,"title":"A"}]"#;
        assert!(decode_body(RemoteFormat::Posts, "Server", body).is_ok());
        assert!(decode_body(RemoteFormat::Quotes, "Server", body).unwrap_err().is_remote());
    }

    #[test]
    fn test_decode_drops_blank_records() {
        let body = br#"[{"text":"","category":"x"},{"text":"B","category":"y"}]"#;
        let quotes = decode_body(RemoteFormat::Quotes, "Server", body).unwrap();
        assert_eq!(quotes.len(), 1);
    }

    #[test]
    fn test_decode_garbage_is_remote_error() {
        let err = decode_body(RemoteFormat::Quotes, "Server", b"{oops").unwrap_err();
        assert!(err.is_remote());
    }

    #[test]
    fn test_new_rejects_empty_url() {
        let result = HttpRemote::new("  ", RemoteFormat::Quotes, "Server", None);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(RemoteFormat::parse("Posts"), Some(RemoteFormat::Posts));
        assert_eq!(RemoteFormat::parse("quotes"), Some(RemoteFormat::Quotes));
        assert!(RemoteFormat::parse("xml").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_remote_is_remote_error() {
        let remote = HttpRemote::new(
            "http://127.0.0.1:9/quotes",
            RemoteFormat::Quotes,
            "Server",
            Some(Duration::from_secs(2)),
        )
        .unwrap();

        let err = remote.fetch_all().await.unwrap_err();
        assert!(err.is_remote());

        let quote = Quote::new("A", "x").unwrap();
        assert!(remote.push(&quote).await.unwrap_err().is_remote());
    }
}
