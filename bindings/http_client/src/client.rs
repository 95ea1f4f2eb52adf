use std::sync::Arc;

use anyhow::Context;
use load_driver_instruments::{report_operation, OperationRecord, Reporter};
use reqwest::header::HeaderMap;
use reqwest::{Client, Response};

/// A `reqwest` client that records every request it makes as an operation.
///
/// Operations are named `<METHOD> <path>` so that the same route is grouped across virtual users.
#[derive(Debug, Clone)]
pub struct HttpClientInstrumented {
    inner: Client,
    base_url: String,
    virtual_user: String,
    reporter: Arc<Reporter>,
}

impl HttpClientInstrumented {
    /// Create a client for `base_url`.
    ///
    /// Paths passed to [HttpClientInstrumented::get] are appended to the base URL as-is, so a base
    /// URL with a path prefix keeps it.
    pub fn new(
        base_url: &str,
        virtual_user: impl Into<String>,
        reporter: Arc<Reporter>,
    ) -> anyhow::Result<Self> {
        let parsed =
            url::Url::parse(base_url).with_context(|| format!("Invalid base URL [{base_url}]"))?;
        anyhow::ensure!(
            matches!(parsed.scheme(), "http" | "https") && parsed.has_host(),
            "Base URL [{base_url}] must be an http or https URL with a host"
        );

        let inner = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            inner,
            base_url: base_url.trim_end_matches('/').to_string(),
            virtual_user: virtual_user.into(),
            reporter,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The full URL for a request path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a GET request with exactly the given headers.
    ///
    /// A response with any status code is `Ok`, only transport failures are errors. Both are
    /// recorded as an operation, failed operations being the transport failures.
    pub async fn get(&self, path: &str, headers: HeaderMap) -> reqwest::Result<Response> {
        let mut record = OperationRecord::new(format!("GET {path}"))
            .with_attribute("virtual_user", self.virtual_user.clone());

        let result = self
            .inner
            .get(self.url_for(path))
            .headers(headers)
            .send()
            .await;

        if let Ok(response) = &result {
            record.add_attribute("status", response.status().as_u16().to_string());
        }
        report_operation(&self.reporter, record, &result);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, HOST};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn url_for_appends_path_to_base() {
        let reporter = Arc::new(Reporter::noop());
        let client = HttpClientInstrumented::new("http://localhost:8080/", "vu-0", reporter.clone())
            .unwrap();
        assert_eq!(
            "http://localhost:8080/api/service-a/hello",
            client.url_for("/api/service-a/hello")
        );

        let prefixed =
            HttpClientInstrumented::new("http://localhost:8080/gateway", "vu-0", reporter).unwrap();
        assert_eq!(
            "http://localhost:8080/gateway/api/service-b/hello",
            prefixed.url_for("/api/service-b/hello")
        );
    }

    #[test]
    fn reject_invalid_base_url() {
        let reporter = Arc::new(Reporter::noop());
        for base_url in ["localhost", "localhost:8080", "ftp://localhost:8080"] {
            assert!(
                HttpClientInstrumented::new(base_url, "vu-0", reporter.clone()).is_err(),
                "{base_url} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn get_sends_given_headers_and_returns_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/service-a/slow"))
            .and(header("host", "api.demo.local"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            HttpClientInstrumented::new(&server.uri(), "vu-0", Arc::new(Reporter::noop())).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("api.demo.local"));

        let response = client.get("/api/service-a/slow", headers).await.unwrap();
        assert_eq!(503, response.status().as_u16());
    }

    #[tokio::test]
    async fn get_returns_transport_errors() {
        // Nothing listens on the discard port
        let client =
            HttpClientInstrumented::new("http://127.0.0.1:9", "vu-0", Arc::new(Reporter::noop()))
                .unwrap();

        assert!(client.get("/api/service-a/hello", HeaderMap::new()).await.is_err());
    }
}
