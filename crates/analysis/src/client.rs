use std::time::Duration;

use fields::Field;
use foundation::FieldId;
use tracing::{debug, info, warn};

use crate::request::AnalysisRequest;
use crate::response::AnalysisResponse;

pub const ANALYZE_PATH: &str = "/api/analyze-field";
pub const RECENT_PATH: &str = "/api/recent-analysis";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
/// Satellite processing routinely takes minutes.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AnalysisConfig {
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), ANALYZE_PATH)
    }

    pub fn recent_endpoint(&self, field_id: &FieldId) -> String {
        format!(
            "{}{}/{}",
            self.base_url.trim_end_matches('/'),
            RECENT_PATH,
            field_id
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    MissingBoundary(FieldId),
    InvalidBoundary(String),
    Transport(String),
    Backend { status: u16, detail: String },
    Decode(String),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::MissingBoundary(id) => {
                write!(f, "field {id} has no boundary; draw one before analysing")
            }
            AnalysisError::InvalidBoundary(msg) => write!(f, "stored boundary is invalid: {msg}"),
            AnalysisError::Transport(msg) => write!(f, "analysis request failed: {msg}"),
            AnalysisError::Backend { status, detail } => {
                write!(f, "analysis backend returned HTTP {status}: {detail}")
            }
            AnalysisError::Decode(msg) => write!(f, "unreadable analysis response: {msg}"),
        }
    }
}

impl std::error::Error for AnalysisError {}

/// Pulls the backend's `detail` message out of an error body, falling back to
/// the raw text.
pub fn backend_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match v.get("detail") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        })
        .unwrap_or_else(|| body.trim().to_string())
}

pub struct AnalysisClient {
    config: AnalysisConfig,
    http: reqwest::Client,
}

impl AnalysisClient {
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Builds the request for `field` and posts it.
    pub async fn analyze(&self, field: &Field) -> Result<AnalysisResponse, AnalysisError> {
        let request = AnalysisRequest::for_field(field)?;
        self.send(&request).await
    }

    pub async fn send(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, AnalysisError> {
        let url = self.config.endpoint();
        info!(field = %request.field_id, %url, "requesting field analysis");

        let resp = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        read_response(resp).await
    }

    /// Latest stored analysis for a field. `None` when the backend has none.
    pub async fn recent(
        &self,
        field_id: &FieldId,
    ) -> Result<Option<AnalysisResponse>, AnalysisError> {
        let url = self.config.recent_endpoint(field_id);
        debug!(field = %field_id, %url, "fetching recent analysis");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            info!(field = %field_id, "no stored analysis");
            return Ok(None);
        }
        read_response(resp).await.map(Some)
    }
}

async fn read_response(resp: reqwest::Response) -> Result<AnalysisResponse, AnalysisError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| AnalysisError::Transport(e.to_string()))?;

    if !status.is_success() {
        let detail = backend_detail(&body);
        warn!(status = status.as_u16(), %detail, "analysis backend rejected request");
        return Err(AnalysisError::Backend {
            status: status.as_u16(),
            detail,
        });
    }

    debug!(bytes = body.len(), "analysis response received");
    serde_json::from_str(&body).map_err(|e| AnalysisError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{AnalysisClient, AnalysisConfig, AnalysisError, backend_detail};
    use fields::Field;
    use foundation::FieldId;

    fn field() -> Field {
        Field {
            id: FieldId::new("f-1"),
            name: "North plot".to_string(),
            location: "Tenali".to_string(),
            district: "Guntur".to_string(),
            state: "Andhra Pradesh".to_string(),
            area: 1.5,
            area_unit: "acres".to_string(),
            soil_type: "Black".to_string(),
            water_source: "Canal".to_string(),
            crop_type: "Rice".to_string(),
            planting_date: "2024-06-15".to_string(),
            expected_harvest_date: None,
            notes: None,
            coordinates: None,
        }
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = AnalysisConfig {
            base_url: "http://backend:8000/".to_string(),
            ..AnalysisConfig::default()
        };
        assert_eq!(config.endpoint(), "http://backend:8000/api/analyze-field");
        assert_eq!(
            AnalysisConfig::default().endpoint(),
            "http://localhost:8000/api/analyze-field"
        );
    }

    #[test]
    fn extracts_backend_detail() {
        assert_eq!(
            backend_detail(r#"{"detail": "No satellite imagery for this area"}"#),
            "No satellite imagery for this area"
        );
        assert_eq!(backend_detail("Internal Server Error\n"), "Internal Server Error");
        assert_eq!(backend_detail(r#"{"detail": [1, 2]}"#), "[1,2]");
    }

    #[test]
    fn recent_endpoint_includes_field_id() {
        let config = AnalysisConfig {
            base_url: "http://backend:8000/".to_string(),
            ..AnalysisConfig::default()
        };
        assert_eq!(
            config.recent_endpoint(&FieldId::new("f-7")),
            "http://backend:8000/api/recent-analysis/f-7"
        );
    }

    #[tokio::test]
    async fn recent_against_unreachable_backend_is_a_transport_error() {
        let client = AnalysisClient::new(AnalysisConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 5,
        })
        .expect("client");
        let err = client
            .recent(&FieldId::new("f-1"))
            .await
            .expect_err("nothing listens on port 9");
        assert!(matches!(err, AnalysisError::Transport(_)), "{err:?}");
    }

    #[tokio::test]
    async fn missing_boundary_is_refused_before_sending() {
        let client = AnalysisClient::new(AnalysisConfig::default()).expect("client");
        let err = client.analyze(&field()).await.expect_err("no boundary");
        assert_eq!(err, AnalysisError::MissingBoundary(FieldId::new("f-1")));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let client = AnalysisClient::new(AnalysisConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 5,
        })
        .expect("client");
        let mut f = field();
        f.coordinates = Some("[[[80.0,16.0],[80.1,16.0],[80.1,16.1],[80.0,16.0]]]".to_string());
        let err = client.analyze(&f).await.expect_err("nothing listens on port 9");
        assert!(matches!(err, AnalysisError::Transport(_)), "{err:?}");
    }
}
