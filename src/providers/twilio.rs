use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;

use super::ProviderError;

/// MessagingService
///
/// Outbound SMS and voice. Both return the provider's resource id (`sid`).
#[async_trait]
pub trait MessagingService: Send + Sync {
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, ProviderError>;

    /// Places a call that reads `message` aloud to the callee.
    async fn place_call(&self, to: &str, message: &str) -> Result<String, ProviderError>;
}

pub type MessagingState = Arc<dyn MessagingService>;

#[derive(Deserialize)]
struct TwilioResource {
    sid: String,
}

#[derive(Deserialize)]
struct TwilioErrorBody {
    code: Option<i64>,
    message: Option<String>,
}

/// TwilioClient
///
/// REST client for the Twilio Messages and Calls resources: form-encoded bodies,
/// HTTP basic auth with the account SID and auth token. No retries.
#[derive(Clone)]
pub struct TwilioClient {
    http: reqwest::Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioClient {
    pub fn new(api_base: &str, account_sid: &str, auth_token: &str, from_number: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
            from_number: from_number.to_string(),
        }
    }

    fn resource_url(&self, resource: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/{}.json",
            self.api_base, self.account_sid, resource
        )
    }

    async fn create(&self, resource: &str, form: &[(&str, &str)]) -> Result<String, ProviderError> {
        let response = self
            .http
            .post(self.resource_url(resource))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(form)
            .send()
            .await
            .map_err(|e| ProviderError::transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let resource = response
                .json::<TwilioResource>()
                .await
                .map_err(|e| ProviderError::transport(format!("unexpected response: {e}")))?;
            return Ok(resource.sid);
        }

        let body = response.json::<TwilioErrorBody>().await.ok();
        Err(ProviderError {
            status: Some(status.as_u16()),
            code: body.as_ref().and_then(|b| b.code),
            message: body
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.to_string()),
        })
    }
}

#[async_trait]
impl MessagingService for TwilioClient {
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, ProviderError> {
        self.create(
            "Messages",
            &[("To", to), ("From", self.from_number.as_str()), ("Body", body)],
        )
        .await
    }

    async fn place_call(&self, to: &str, message: &str) -> Result<String, ProviderError> {
        let twiml = format!(
            "<Response><Say voice=\"alice\">{}</Say></Response>",
            escape_xml(message)
        );
        self.create(
            "Calls",
            &[("To", to), ("From", self.from_number.as_str()), ("Twiml", twiml.as_str())],
        )
        .await
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// SentMessage
///
/// What the mock was asked to deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum SentMessage {
    Sms { to: String, body: String },
    Call { to: String, message: String },
}

/// MockMessagingService
///
/// Records every request; optionally fails them all with a given provider error code.
#[derive(Clone, Default)]
pub struct MockMessagingService {
    pub fail_with_code: Option<i64>,
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

impl MockMessagingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_with_code(code: i64) -> Self {
        Self {
            fail_with_code: Some(code),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn outcome(&self, record: SentMessage) -> Result<String, ProviderError> {
        if let Some(code) = self.fail_with_code {
            return Err(ProviderError {
                status: Some(400),
                code: Some(code),
                message: "Mock provider failure".to_string(),
            });
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(record);
        }
        Ok(format!("SM{}", uuid::Uuid::new_v4().simple()))
    }
}

#[async_trait]
impl MessagingService for MockMessagingService {
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, ProviderError> {
        self.outcome(SentMessage::Sms {
            to: to.to_string(),
            body: body.to_string(),
        })
    }

    async fn place_call(&self, to: &str, message: &str) -> Result<String, ProviderError> {
        self.outcome(SentMessage::Call {
            to: to.to_string(),
            message: message.to_string(),
        })
    }
}
