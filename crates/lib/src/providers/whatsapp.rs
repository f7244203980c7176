//! WhatsApp Cloud API adapter: acceptance is a message id in the response.

use crate::providers::{MessageProvider, SendOutcome};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const GRAPH_API_BASE: &str = "https://graph.facebook.com/v19.0";

/// WhatsApp Cloud client: sends text messages through the Graph API. The
/// sender identity is the phone number id the token is scoped to.
pub struct WhatsAppCloud {
    base_url: String,
    access_token: String,
    phone_number_id: String,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CloudResponse {
    #[serde(default)]
    messages: Vec<CloudMessageId>,
    error: Option<CloudError>,
}

#[derive(Debug, Deserialize)]
struct CloudMessageId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CloudError {
    message: String,
}

impl WhatsAppCloud {
    pub fn new(
        base_url: Option<String>,
        access_token: String,
        phone_number_id: String,
        timeout: Duration,
    ) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| GRAPH_API_BASE.to_string());
        Self {
            base_url,
            access_token,
            phone_number_id,
            timeout,
            client: reqwest::Client::new(),
        }
    }
}

/// Normalize a Cloud API response: a message id means accepted, anything
/// else is a rejection with whatever error text the API gave.
fn normalize_response(response: CloudResponse) -> SendOutcome {
    if let Some(first) = response.messages.into_iter().next() {
        return SendOutcome::accepted(first.id);
    }
    match response.error {
        Some(e) => SendOutcome::rejected(e.message),
        None => SendOutcome::rejected("whatsapp response contained no message id"),
    }
}

#[async_trait]
impl MessageProvider for WhatsAppCloud {
    fn id(&self) -> &str {
        "whatsapp"
    }

    async fn send(&self, to: &str, text: &str) -> SendOutcome {
        let url = format!("{}/{}/messages", self.base_url, self.phone_number_id);
        let body = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": text },
        });
        let res = match self
            .client
            .post(&url)
            .timeout(self.timeout)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => return SendOutcome::rejected(format!("whatsapp request failed: {}", e)),
        };
        // The Cloud API reports errors both via HTTP status and an error
        // object; parse the body either way so the detail is useful.
        match res.json::<CloudResponse>().await {
            Ok(data) => normalize_response(data),
            Err(e) => SendOutcome::rejected(format!("unparseable whatsapp response: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_is_accepted() {
        let response: CloudResponse = serde_json::from_str(
            r#"{"messaging_product":"whatsapp","messages":[{"id":"wamid.ABCD"}]}"#,
        )
        .expect("parse");
        let outcome = normalize_response(response);
        assert!(outcome.accepted);
        assert_eq!(outcome.detail, "wamid.ABCD");
    }

    #[test]
    fn error_object_is_rejected() {
        let response: CloudResponse = serde_json::from_str(
            r#"{"error":{"message":"(#131030) Recipient phone number not in allowed list","code":131030}}"#,
        )
        .expect("parse");
        let outcome = normalize_response(response);
        assert!(!outcome.accepted);
        assert!(outcome.detail.contains("131030"));
    }

    #[test]
    fn empty_response_is_rejected() {
        let response: CloudResponse = serde_json::from_str(r#"{}"#).expect("parse");
        assert!(!normalize_response(response).accepted);
    }
}
