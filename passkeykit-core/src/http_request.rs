use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use url::{Host, Url};

use crate::error::PasskeyKitError;

/// A simple wrapper on an HTTP client for making requests. Sets sensible defaults such as timeouts,
/// user-agent & flagging plain-text URLs. Requests are sent once; retry policy belongs to the caller.
#[derive(Debug, Clone)]
pub struct Request {
    client: reqwest::Client,
    timeout: Duration,
}

impl Request {
    /// Initializes a new `Request` instance.
    pub(crate) fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Creates a request builder with defaults applied.
    pub(crate) fn req(&self, method: Method, url: &str) -> RequestBuilder {
        if is_plain_text_remote(url) {
            log::warn!("sending plain-text request to {url}");
        }

        self.client
            .request(method, url)
            .timeout(self.timeout)
            .header(
                "User-Agent",
                format!("passkeykit-core/{}", env!("CARGO_PKG_VERSION")),
            )
    }

    /// Creates a GET request builder with defaults applied.
    pub(crate) fn get(&self, url: &str) -> RequestBuilder {
        self.req(Method::GET, url)
    }

    /// Creates a POST request builder with defaults applied.
    pub(crate) fn post(&self, url: &str) -> RequestBuilder {
        self.req(Method::POST, url)
    }

    /// Sends a request built by `req`/`get`/`post`.
    ///
    /// Any HTTP status is returned as a response; only transport failures are errors.
    pub(crate) async fn handle(
        &self,
        request_builder: RequestBuilder,
    ) -> Result<Response, PasskeyKitError> {
        let (client, request) = request_builder.build_split();
        let request = request.map_err(|err| PasskeyKitError::NetworkError {
            url: err
                .url()
                .map_or_else(|| "<unknown>".to_string(), ToString::to_string),
            status: None,
            error: format!("request build failed: {err}"),
        })?;
        let url = request.url().to_string();

        client
            .execute(request)
            .await
            .map_err(|err| PasskeyKitError::NetworkError {
                url,
                status: None,
                error: if err.is_timeout() {
                    format!("request timed out: {err}")
                } else {
                    format!("request failed: {err}")
                },
            })
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `url` is plain HTTP to anything but a loopback host.
fn is_plain_text_remote(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if parsed.scheme() != "http" {
        return false;
    }
    let loopback = match parsed.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    };
    !loopback
}
