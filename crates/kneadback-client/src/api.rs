use crate::error::{ClientError, Result};
use crate::sink::FeedbackSink;
use kneadback_core::{FeedbackId, FeedbackInput, FeedbackRecord, HealthStatus, Insights};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("kneadback/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Blocking client for the ingestion service.
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base: with_trailing_slash(base_url),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    pub fn create_record(&self, input: &FeedbackInput) -> Result<FeedbackRecord> {
        let url = self.endpoint("api/feedback")?;
        debug!(%url, "posting feedback");
        let response = self.http.post(url).json(input).send()?;
        decode(response)
    }

    pub fn list_records(&self, limit: Option<i64>) -> Result<Vec<FeedbackRecord>> {
        let mut url = self.endpoint("api/feedback")?;
        if let Some(limit) = limit {
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        }
        decode(self.http.get(url).send()?)
    }

    pub fn get_record(&self, id: FeedbackId) -> Result<FeedbackRecord> {
        let url = self.endpoint(&format!("api/feedback/{id}"))?;
        decode(self.http.get(url).send()?)
    }

    pub fn insights(&self) -> Result<Insights> {
        decode(self.http.get(self.endpoint("api/insights")?).send()?)
    }

    /// A 503 carrying a health body is returned as an unhealthy status rather
    /// than an error.
    pub fn health(&self) -> Result<HealthStatus> {
        let response = self.http.get(self.endpoint("api/health")?).send()?;
        let status = response.status();
        let body = response.text()?;
        match serde_json::from_str::<HealthStatus>(&body) {
            Ok(health) => Ok(health),
            Err(_) if !status.is_success() => Err(status_error(status.as_u16(), &body)),
            Err(err) => Err(ClientError::Decode(err.to_string())),
        }
    }
}

impl FeedbackSink for ApiClient {
    fn deliver(&self, input: &FeedbackInput) -> Result<FeedbackRecord> {
        self.create_record(input)
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text()?;
    if !status.is_success() {
        return Err(status_error(status.as_u16(), &body));
    }
    serde_json::from_str(&body).map_err(|err| ClientError::Decode(err.to_string()))
}

fn status_error(status: u16, body: &str) -> ClientError {
    ClientError::Status {
        status,
        body: body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::ApiClient;
    use kneadback_core::FeedbackId;
    use std::time::Duration;
    use url::Url;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(Url::parse(base).expect("url"), Duration::from_secs(1)).expect("client")
    }

    #[test]
    fn endpoints_join_onto_base() {
        let api = client("http://127.0.0.1:8000");
        assert_eq!(
            api.endpoint("api/feedback").unwrap().as_str(),
            "http://127.0.0.1:8000/api/feedback"
        );
    }

    #[test]
    fn endpoints_keep_base_path_prefix() {
        let api = client("https://example.com/kneadback");
        assert_eq!(
            api.endpoint("api/health").unwrap().as_str(),
            "https://example.com/kneadback/api/health"
        );
    }

    #[test]
    fn record_endpoint_uses_id_segment() {
        let api = client("http://127.0.0.1:8000/");
        assert_eq!(
            api.endpoint(&format!("api/feedback/{}", FeedbackId(42)))
                .unwrap()
                .as_str(),
            "http://127.0.0.1:8000/api/feedback/42"
        );
    }

    #[test]
    fn unreachable_server_is_a_transport_error() {
        let api = client("http://127.0.0.1:1");
        let err = api.insights().unwrap_err();
        assert!(err.is_transport(), "unexpected error: {err}");
    }
}
