use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use mailroom_core::{Email, EmailPatch, MailBackend, Mailbox, NewEmail, SendOutcome};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const SESSION_COOKIE: &str = "sessionid";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid base url '{0}'")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub base_url: String,
    pub session_id: Option<String>,
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            session_id: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// `MailBackend` over the REST API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    session_id: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &HttpConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidUrl(config.base_url.clone()));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url,
            session_id: config
                .session_id
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn compose_url(&self) -> String {
        format!("{}/emails", self.base_url)
    }

    fn mailbox_url(&self, mailbox: Mailbox) -> String {
        format!("{}/emails/{}", self.base_url, mailbox.as_str())
    }

    fn email_url(&self, id: i64) -> String {
        format!("{}/emails/{}", self.base_url, id)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        match &self.session_id {
            Some(session) => {
                builder.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, session))
            }
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        debug!(url, "GET");
        let response = self.request(Method::GET, url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn fetch_mailbox(&self, mailbox: Mailbox) -> Result<Vec<Email>, ApiError> {
        self.get_json(&self.mailbox_url(mailbox)).await
    }

    pub async fn fetch_email(&self, id: i64) -> Result<Email, ApiError> {
        self.get_json(&self.email_url(id)).await
    }

    /// The outcome is decided by the presence of an `error` field, not by the status.
    pub async fn post_email(&self, email: &NewEmail) -> Result<SendOutcome, ApiError> {
        let url = self.compose_url();
        debug!(url = %url, "POST");
        let response = self.request(Method::POST, &url).json(email).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(status = status.as_u16(), "POST response");
        parse_send_response(&body)
    }

    /// The response body is never examined; a non-2xx status is only logged.
    pub async fn put_email(&self, id: i64, patch: &EmailPatch) -> Result<(), ApiError> {
        let url = self.email_url(id);
        debug!(url = %url, ?patch, "PUT");
        let response = self.request(Method::PUT, &url).json(patch).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(id, status = status.as_u16(), "PUT returned non-success status");
        }
        Ok(())
    }
}

fn status_error(status: StatusCode, body: &[u8]) -> ApiError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => ApiError::Server {
            status: status.as_u16(),
            message: parsed.error,
        },
        Err(_) => ApiError::Status(status.as_u16()),
    }
}

fn parse_send_response(body: &[u8]) -> Result<SendOutcome, ApiError> {
    let parsed: SendResponse = serde_json::from_slice(body)?;
    Ok(match parsed.error {
        Some(error) => SendOutcome::Rejected { error },
        None => SendOutcome::Accepted {
            message: parsed.message,
        },
    })
}

#[async_trait]
impl MailBackend for HttpBackend {
    async fn list_mailbox(&self, mailbox: Mailbox) -> anyhow::Result<Vec<Email>> {
        Ok(self.fetch_mailbox(mailbox).await?)
    }

    async fn get_email(&self, id: i64) -> anyhow::Result<Email> {
        Ok(self.fetch_email(id).await?)
    }

    async fn send_email(&self, email: &NewEmail) -> anyhow::Result<SendOutcome> {
        Ok(self.post_email(email).await?)
    }

    async fn update_email(&self, id: i64, patch: &EmailPatch) -> anyhow::Result<()> {
        Ok(self.put_email(id, patch).await?)
    }
}
