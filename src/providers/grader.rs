use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::ProviderError;

/// GraderService
///
/// Remote scoring service. The payload and the result are opaque JSON that this
/// backend passes through unchanged.
#[async_trait]
pub trait GraderService: Send + Sync {
    async fn grade(&self, payload: Value) -> Result<Value, ProviderError>;
}

pub type GraderState = Arc<dyn GraderService>;

/// HttpGrader
///
/// POSTs the payload to `<base_url>/grade`.
#[derive(Clone)]
pub struct HttpGrader {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGrader {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl GraderService for HttpGrader {
    async fn grade(&self, payload: Value) -> Result<Value, ProviderError> {
        let response = self
            .http
            .post(format!("{}/grade", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError {
                status: Some(status.as_u16()),
                code: None,
                message: message.chars().take(200).collect(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::transport(format!("grader returned non-JSON body: {e}")))
    }
}

/// MockGrader
///
/// Answers with a fixed result, or fails every call.
#[derive(Clone)]
pub struct MockGrader {
    pub result: Value,
    pub should_fail: bool,
}

impl MockGrader {
    pub fn new(result: Value) -> Self {
        Self {
            result,
            should_fail: false,
        }
    }

    pub fn new_failing() -> Self {
        Self {
            result: Value::Null,
            should_fail: true,
        }
    }
}

#[async_trait]
impl GraderService for MockGrader {
    async fn grade(&self, _payload: Value) -> Result<Value, ProviderError> {
        if self.should_fail {
            return Err(ProviderError {
                status: Some(503),
                code: None,
                message: "Mock grader unavailable".to_string(),
            });
        }
        Ok(self.result.clone())
    }
}
