//! Vonage SMS adapter: POST /sms/json, status "0" means accepted.

use crate::providers::{MessageProvider, SendOutcome};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const VONAGE_API_BASE: &str = "https://rest.nexmo.com";

/// Vonage SMS client: sends replies through the SMS API and normalizes the
/// per-message status code into a `SendOutcome`.
pub struct VonageSms {
    base_url: String,
    api_key: String,
    api_secret: String,
    from: String,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SmsRequest<'a> {
    api_key: &'a str,
    api_secret: &'a str,
    from: &'a str,
    to: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SmsResponse {
    #[serde(default)]
    messages: Vec<SmsMessageStatus>,
}

/// Per-message status in a Vonage SMS response. Status "0" is success; any
/// other status comes with an error-text.
#[derive(Debug, Deserialize)]
struct SmsMessageStatus {
    status: String,
    #[serde(rename = "message-id")]
    message_id: Option<String>,
    #[serde(rename = "error-text")]
    error_text: Option<String>,
}

impl VonageSms {
    pub fn new(
        base_url: Option<String>,
        api_key: String,
        api_secret: String,
        from: String,
        timeout: Duration,
    ) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| VONAGE_API_BASE.to_string());
        Self {
            base_url,
            api_key,
            api_secret,
            from,
            timeout,
            client: reqwest::Client::new(),
        }
    }
}

/// Normalize a Vonage SMS API response into the common outcome shape.
fn normalize_response(response: SmsResponse) -> SendOutcome {
    let Some(first) = response.messages.into_iter().next() else {
        return SendOutcome::rejected("vonage response contained no messages");
    };
    if first.status == "0" {
        SendOutcome::accepted(first.message_id.unwrap_or_default())
    } else {
        SendOutcome::rejected(format!(
            "status {}: {}",
            first.status,
            first.error_text.unwrap_or_else(|| "unknown error".to_string())
        ))
    }
}

#[async_trait]
impl MessageProvider for VonageSms {
    fn id(&self) -> &str {
        "vonage"
    }

    async fn send(&self, to: &str, text: &str) -> SendOutcome {
        let url = format!("{}/sms/json", self.base_url);
        let body = SmsRequest {
            api_key: &self.api_key,
            api_secret: &self.api_secret,
            from: &self.from,
            to,
            text,
        };
        let res = match self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => return SendOutcome::rejected(format!("sms request failed: {}", e)),
        };
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return SendOutcome::rejected(format!("sms request failed: {} {}", status, body));
        }
        match res.json::<SmsResponse>().await {
            Ok(data) => normalize_response(data),
            Err(e) => SendOutcome::rejected(format!("unparseable sms response: {}", e)),
        }
    }
}
