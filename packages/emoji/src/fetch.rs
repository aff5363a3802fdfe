//! Remote emoji lookup against a host's API surface.
//!
//! The fetcher is a trait so the resolver can be exercised in tests without
//! a network; the HTTP implementation talks to the two documented endpoints:
//!
//! - `GET https://{host}/api/emoji?name={name}` → `{ "url": string | null }`
//! - `GET https://{host}/api/emojis` → `{ "emojis": [{ "name", "url", ... }] }`

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{EmojiError, EmojiResult};

/// One entry of the bulk emoji listing. Only `name` → `url` is consumed by
/// the render engine; the remaining fields ride along for completeness.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteEmoji {
    pub name: String,
    pub url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmojiListResponse {
    emojis: Vec<RemoteEmoji>,
}

#[derive(Debug, Deserialize)]
struct SingleEmojiResponse {
    url: Option<String>,
}

#[async_trait]
pub trait EmojiFetcher: Send + Sync {
    /// Resolve one name against the host. `Ok(None)` = the host does not
    /// know the name.
    async fn fetch_one(&self, host: &str, name: &str) -> EmojiResult<Option<String>>;

    /// Full emoji listing of the host, used by batched prefetch.
    async fn fetch_all(&self, host: &str) -> EmojiResult<Vec<RemoteEmoji>>;
}

pub struct HttpEmojiFetcher {
    client: reqwest::Client,
}

impl HttpEmojiFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpEmojiFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmojiFetcher for HttpEmojiFetcher {
    async fn fetch_one(&self, host: &str, name: &str) -> EmojiResult<Option<String>> {
        let url = format!("https://{}/api/emoji", host);
        let response = self
            .client
            .get(&url)
            .query(&[("name", name)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(EmojiError::Payload(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }
        let body: SingleEmojiResponse = response.json().await?;
        Ok(body.url)
    }

    async fn fetch_all(&self, host: &str) -> EmojiResult<Vec<RemoteEmoji>> {
        let url = format!("https://{}/api/emojis", host);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(EmojiError::Payload(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }
        let body: EmojiListResponse = response.json().await?;
        Ok(body.emojis)
    }
}
