use std::env;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS, COMPLETION_REQUESTS,
    IMAGE_REQUESTS,
};
use crate::types::{
    ChatCompletion, ChatCompletionParams, ImageGenerateParams, ImageSize, ImagesResponse, Message,
    Model,
};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variable consulted when no API key is passed explicitly.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Generates assistant replies from a role-tagged conversation.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the reply to `messages`, oldest message first.
    async fn complete(&self, model: &Model, messages: &[Message]) -> Result<String>;
}

/// Generates images from a text prompt.
#[async_trait::async_trait]
pub trait ImageClient: Send + Sync {
    /// Returns a reference (URL) to the generated image.
    async fn generate_image(&self, prompt: &str, size: ImageSize) -> Result<String>;
}

/// Client for OpenAI-compatible chat completion and image endpoints.
#[derive(Debug, Clone)]
pub struct OpenAi {
    api_key: String,
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl OpenAi {
    /// Create a new client.
    ///
    /// The API key can be provided directly or read from the OPENAI_API_KEY
    /// environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => env::var(API_KEY_ENV).map_err(|_| {
                Error::authentication(format!(
                    "API key not provided and {API_KEY_ENV} environment variable not set"
                ))
            })?,
        };
        if api_key.trim().is_empty() {
            return Err(Error::authentication("API key is empty"));
        }

        let base_url = parse_base_url(base_url.as_deref().unwrap_or(DEFAULT_API_URL))?;
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
        })
    }

    /// Returns the base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| Error::authentication("API key contains invalid header characters"))?;
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            #[serde(rename = "type")]
            error_type: Option<String>,
            message: Option<String>,
            param: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error);
        let error_type = detail.as_ref().and_then(|e| e.error_type.clone());
        let error_param = detail.as_ref().and_then(|e| e.param.clone());
        let error_message = match detail.and_then(|e| e.message) {
            Some(message) => single_line(&message),
            None => fallback_message(status_code, &error_body),
        };

        match status_code {
            400 => Error::bad_request(error_message, error_param),
            401 => Error::authentication(error_message),
            403 => Error::permission(error_message),
            404 => Error::not_found(error_message),
            408 => Error::timeout(error_message, None),
            429 => Error::rate_limit(error_message, retry_after),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(error_message, retry_after),
            _ => Error::api(status_code, error_type, error_message),
        }
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: serde::Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.base_url.join(path)?;
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        log::debug!("POST {url}");

        let result = self.send_json(url, body).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            CLIENT_REQUEST_ERRORS.click();
            log::warn!("request to {path} failed: {err}");
        }
        result
    }

    async fn send_json<B, R>(&self, url: Url, body: &B) -> Result<R>
    where
        B: serde::Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .headers(self.default_headers()?)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {}", e),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        response.json::<R>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }
}

#[async_trait::async_trait]
impl CompletionClient for OpenAi {
    async fn complete(&self, model: &Model, messages: &[Message]) -> Result<String> {
        COMPLETION_REQUESTS.click();
        let params = ChatCompletionParams::new(model.clone(), messages.to_vec());
        let completion: ChatCompletion = self.post_json("chat/completions", &params).await?;
        completion
            .text()
            .map(str::to_string)
            .ok_or_else(|| Error::serialization("completion contained no message content", None))
    }
}

#[async_trait::async_trait]
impl ImageClient for OpenAi {
    async fn generate_image(&self, prompt: &str, size: ImageSize) -> Result<String> {
        IMAGE_REQUESTS.click();
        let params = ImageGenerateParams::new(prompt, size);
        let images: ImagesResponse = self.post_json("images/generations", &params).await?;
        images
            .first_url()
            .map(str::to_string)
            .ok_or_else(|| Error::serialization("image response contained no URL", None))
    }
}

const MAX_ERROR_MESSAGE_CHARS: usize = 200;

/// Collapses a service message onto one line, capped in length.
fn single_line(message: &str) -> String {
    let joined = message.split_whitespace().collect::<Vec<_>>().join(" ");
    if joined.chars().count() <= MAX_ERROR_MESSAGE_CHARS {
        joined
    } else {
        let mut capped: String = joined.chars().take(MAX_ERROR_MESSAGE_CHARS).collect();
        capped.push_str("...");
        capped
    }
}

/// Message for an error body that carries no JSON error detail. Markup pages
/// from proxies and empty bodies reduce to the status line.
fn fallback_message(status_code: u16, body: &str) -> String {
    let first_line = body.lines().map(str::trim).find(|line| !line.is_empty());
    match first_line {
        Some(line) if !line.starts_with('<') => single_line(line),
        _ => {
            let reason = reqwest::StatusCode::from_u16(status_code)
                .ok()
                .and_then(|status| status.canonical_reason());
            match reason {
                Some(reason) => format!("HTTP {status_code} {reason}"),
                None => format!("HTTP {status_code}"),
            }
        }
    }
}

/// Parses a base URL, adding the trailing slash `Url::join` needs to keep the
/// final path segment.
fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
