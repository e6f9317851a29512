//! X API client
//!
//! Typed client over the platform's v2 posting endpoint and the legacy
//! v1.1 media upload endpoint. Write calls are signed per request with
//! OAuth 1.0a user context (HMAC-SHA1); the up-front credential check uses
//! the bearer token.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::multipart;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::config::Credentials;
use crate::error::{PlatformError, Result};
use crate::types::MediaHandle;

use super::{CreatePost, CreatedPost, PostingPlatform};

const API_BASE: &str = "https://api.twitter.com";
const UPLOAD_BASE: &str = "https://upload.twitter.com";

pub struct XApiClient {
    http: reqwest::Client,
    credentials: Credentials,
    api_base: String,
    upload_base: String,
    authenticated: bool,
}

#[derive(Serialize)]
struct TweetRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<ReplyTarget<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<MediaIds<'a>>,
}

#[derive(Serialize)]
struct ReplyTarget<'a> {
    in_reply_to_tweet_id: &'a str,
}

#[derive(Serialize)]
struct MediaIds<'a> {
    media_ids: Vec<&'a str>,
}

#[derive(Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[derive(Deserialize)]
struct TweetData {
    id: String,
}

#[derive(Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

impl XApiClient {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            api_base: API_BASE.to_string(),
            upload_base: UPLOAD_BASE.to_string(),
            authenticated: false,
        }
    }

    fn oauth_header(&self, method: &str, url: &str) -> String {
        let keys = SigningKeys {
            consumer_key: self.credentials.api_key.expose_secret(),
            consumer_secret: self.credentials.api_secret.expose_secret(),
            token: self.credentials.access_token.expose_secret(),
            token_secret: self.credentials.access_secret.expose_secret(),
        };

        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        build_oauth_header(method, url, &keys, &nonce, timestamp)
    }
}

#[async_trait]
impl PostingPlatform for XApiClient {
    async fn authenticate(&mut self) -> Result<()> {
        let url = format!("{}/2/users/me", self.api_base);

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.credentials.bearer_token.expose_secret())
            .send()
            .await
            .map_err(|e| PlatformError::Authentication(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PlatformError::Authentication(format!(
                "credential check returned {}: {}",
                status, detail
            ))
            .into());
        }

        self.authenticated = true;
        debug!("credential check passed");
        Ok(())
    }

    async fn create_post(&self, request: CreatePost<'_>) -> Result<CreatedPost> {
        if !self.authenticated {
            return Err(
                PlatformError::Authentication("session not established".to_string()).into(),
            );
        }

        let url = format!("{}/2/tweets", self.api_base);
        let body = TweetRequest {
            text: request.text,
            reply: request.in_reply_to.map(|id| ReplyTarget {
                in_reply_to_tweet_id: id,
            }),
            media: request.media.map(|handle| MediaIds {
                media_ids: vec![handle.as_str()],
            }),
        };

        let response = self
            .http
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                self.oauth_header("POST", &url),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PlatformError::Posting(format!(
                "create post returned {}: {}",
                status, detail
            ))
            .into());
        }

        let parsed: TweetResponse = response
            .json()
            .await
            .map_err(|_| PlatformError::MissingPostId)?;
        if parsed.data.id.is_empty() {
            return Err(PlatformError::MissingPostId.into());
        }

        debug!(id = %parsed.data.id, "post created");
        Ok(CreatedPost { id: parsed.data.id })
    }

    async fn upload_media(&self, path: &Path) -> Result<MediaHandle> {
        if !self.authenticated {
            return Err(
                PlatformError::Authentication("session not established".to_string()).into(),
            );
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PlatformError::MediaUpload(format!("read staged file: {}", e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "media".to_string());

        let url = format!("{}/1.1/media/upload.json", self.upload_base);
        let part = multipart::Part::bytes(bytes).file_name(file_name);
        let form = multipart::Form::new().part("media", part);

        // The legacy endpoint gets its own signed handshake per request
        // rather than reusing the v2 session.
        let response = self
            .http
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                self.oauth_header("POST", &url),
            )
            .multipart(form)
            .send()
            .await
            .map_err(|e| PlatformError::MediaUpload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PlatformError::MediaUpload(format!(
                "upload returned {}: {}",
                status, detail
            ))
            .into());
        }

        let parsed: MediaUploadResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::MediaUpload(format!("unexpected response: {}", e)))?;

        debug!(media_id = %parsed.media_id_string, "media uploaded");
        Ok(MediaHandle(parsed.media_id_string))
    }

    fn name(&self) -> &str {
        "x"
    }
}

struct SigningKeys<'a> {
    consumer_key: &'a str,
    consumer_secret: &'a str,
    token: &'a str,
    token_secret: &'a str,
}

fn build_oauth_header(
    method: &str,
    url: &str,
    keys: &SigningKeys<'_>,
    nonce: &str,
    timestamp: u64,
) -> String {
    let mut params = vec![
        (
            "oauth_consumer_key".to_string(),
            keys.consumer_key.to_string(),
        ),
        ("oauth_nonce".to_string(), nonce.to_string()),
        (
            "oauth_signature_method".to_string(),
            "HMAC-SHA1".to_string(),
        ),
        ("oauth_timestamp".to_string(), timestamp.to_string()),
        ("oauth_token".to_string(), keys.token.to_string()),
        ("oauth_version".to_string(), "1.0".to_string()),
    ];

    let signature = sign_request(
        method,
        url,
        &params,
        keys.consumer_secret,
        keys.token_secret,
    );
    params.push(("oauth_signature".to_string(), signature));
    params.sort();

    let fields = params
        .iter()
        .map(|(k, v)| format!(r#"{}="{}""#, percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {}", fields)
}

/// RFC 3986 percent-encoding; `urlencoding` keeps exactly the unreserved
/// set the signature algorithm requires.
fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// The signature base string: method, encoded url, and the sorted,
/// individually encoded parameter string.
fn signature_base(method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&normalized)
    )
}

fn sign_request(
    method: &str,
    url: &str,
    params: &[(String, String)],
    consumer_secret: &str,
    token_secret: &str,
) -> String {
    let base = signature_base(method, url, params);
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );

    let mut mac =
        Hmac::<Sha1>::new_from_slice(key.as_bytes()).expect("hmac accepts keys of any length");
    mac.update(base.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}
