use std::fmt;
use std::sync::OnceLock;

use reqwest::{
    header::{HeaderName, HeaderValue},
    Method, Request, Response, Url,
};
use serde_json::Value as JsonValue;

use crate::{FetchError, NetworkError, RequestInit, ResponseParts, Result};

/// Target of a fetch: a URL or a fully built request.
#[derive(Debug)]
pub enum FetchInput {
    /// URL in text form; parsed when the request is built.
    Location(String),
    Url(Url),
    Request(Request),
}

impl From<&str> for FetchInput {
    fn from(value: &str) -> Self {
        Self::Location(value.to_owned())
    }
}

impl From<String> for FetchInput {
    fn from(value: String) -> Self {
        Self::Location(value)
    }
}

impl From<&String> for FetchInput {
    fn from(value: &String) -> Self {
        Self::Location(value.clone())
    }
}

impl From<Url> for FetchInput {
    fn from(value: Url) -> Self {
        Self::Url(value)
    }
}

impl From<Request> for FetchInput {
    fn from(value: Request) -> Self {
        Self::Request(value)
    }
}

#[derive(Clone, Default)]
/// Issues requests and turns non-success responses into [`NetworkError`]s.
pub struct Fetcher {
    http: reqwest::Client,
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher").finish_non_exhaustive()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Uses a preconfigured client (proxies, default headers, TLS roots).
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.http
    }

    /// Sends one request.
    ///
    /// A 2xx response is returned as-is with its body unread. Any other
    /// status has its body read and parsed, and is returned as
    /// [`FetchError::Network`]. Transport failures are returned unmodified as
    /// [`FetchError::Transport`].
    pub async fn fetch_with_error(
        &self,
        input: impl Into<FetchInput>,
        init: Option<RequestInit>,
    ) -> Result<Response> {
        let mut request = self.build_request(input.into())?;
        if let Some(init) = init {
            apply_init(&mut request, init)?;
        }

        let response = self.http.execute(request).await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let parts = ResponseParts {
            status: response.status(),
            headers: response.headers().clone(),
            url: response.url().clone(),
        };
        let response_data = parse_response(response).await?;
        let err = NetworkError::from_parts(parts, response_data);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            status = err.status().as_u16(),
            url = %err.response().url,
            "request failed: {}",
            err.message()
        );

        Err(FetchError::Network(err))
    }

    fn build_request(&self, input: FetchInput) -> Result<Request> {
        match input {
            FetchInput::Location(location) => Ok(self.http.get(location).build()?),
            FetchInput::Url(url) => Ok(Request::new(Method::GET, url)),
            FetchInput::Request(request) => Ok(request),
        }
    }
}

/// [`Fetcher::fetch_with_error`] on a process-wide default client.
pub async fn fetch_with_error(
    input: impl Into<FetchInput>,
    init: Option<RequestInit>,
) -> Result<Response> {
    static DEFAULT: OnceLock<Fetcher> = OnceLock::new();
    DEFAULT
        .get_or_init(Fetcher::new)
        .fetch_with_error(input, init)
        .await
}

/// Reads a response body once.
///
/// Empty bodies become `""`. Bodies that are not valid JSON (HTML error pages,
/// plain text) are kept as a JSON string holding the raw text.
pub async fn parse_response(response: Response) -> std::result::Result<JsonValue, reqwest::Error> {
    let body = response.text().await?;
    if body.is_empty() {
        return Ok(JsonValue::String(body));
    }

    Ok(serde_json::from_str(&body).unwrap_or(JsonValue::String(body)))
}

fn apply_init(request: &mut Request, init: RequestInit) -> Result<()> {
    if let Some(method) = init.method {
        *request.method_mut() = method;
    }

    for (name, value) in init.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
            FetchError::InvalidRequest(format!("invalid header name '{name}': {err}"))
        })?;
        let header_value = HeaderValue::from_str(&value).map_err(|err| {
            FetchError::InvalidRequest(format!("invalid value for header '{name}': {err}"))
        })?;
        request.headers_mut().insert(header_name, header_value);
    }

    if let Some(body) = init.body {
        *request.body_mut() = Some(body.into());
    }

    if let Some(timeout) = init.timeout {
        *request.timeout_mut() = Some(timeout);
    }

    Ok(())
}
