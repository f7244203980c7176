//! Inbound webhook payload extraction.
//!
//! Providers deliver inbound messages with differing content types and
//! field names (Vonage posts form fields, WhatsApp-style hooks post JSON).
//! This module normalizes any recognized shape into one `InboundMessage`.

use thiserror::Error;

/// Sender field aliases, checked in order. `msisdn` is Vonage's form field,
/// `From` the capitalized variant some gateways use, `from` the JSON key.
const SENDER_KEYS: [&str; 3] = ["msisdn", "From", "from"];

/// Text field aliases, checked in order.
const TEXT_KEYS: [&str; 3] = ["text", "Body", "body"];

/// A normalized inbound message: who sent it and what they said.
/// Transient — built per request, never persisted.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub sender: String,
    pub text: String,
}

/// Why a webhook body could not be turned into an `InboundMessage`.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Body parsed but no sender field was present — there is nobody to
    /// address a reply to.
    #[error("no sender field in payload")]
    MissingSender,

    /// Sender present but no text field; the sender can still be told the
    /// input was invalid.
    #[error("no text field in payload (sender {sender})")]
    MissingText { sender: String },

    /// Body was not parseable as any accepted shape.
    #[error("unrecognized payload shape")]
    Malformed,
}

/// Extract a sender/text pair from a webhook body. `content_type` selects
/// the parser; when absent or unrecognized, JSON is tried first, then form
/// encoding. Pure transformation, no side effects.
pub fn extract_inbound(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<InboundMessage, ExtractError> {
    let ct = content_type.unwrap_or("").to_ascii_lowercase();
    let fields = if ct.contains("json") {
        json_fields(body).ok_or(ExtractError::Malformed)?
    } else if ct.contains("x-www-form-urlencoded") {
        form_fields(body).ok_or(ExtractError::Malformed)?
    } else {
        json_fields(body)
            .or_else(|| form_fields(body))
            .ok_or(ExtractError::Malformed)?
    };

    let sender = first_of(&fields, &SENDER_KEYS).ok_or(ExtractError::MissingSender)?;
    let text = first_of(&fields, &TEXT_KEYS).ok_or(ExtractError::MissingText {
        sender: sender.clone(),
    })?;
    Ok(InboundMessage { sender, text })
}

/// First non-empty value among `keys`, in alias order.
fn first_of(fields: &[(String, String)], keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some((_, v)) = fields.iter().find(|(k, _)| k == key) {
            let v = v.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }
    None
}

/// Parse a JSON object body into key/value pairs. String values are taken
/// as-is; numbers are stringified (some gateways send the msisdn as a
/// number). Other value types are skipped.
fn json_fields(body: &[u8]) -> Option<Vec<(String, String)>> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let obj = value.as_object()?;
    let mut fields = Vec::with_capacity(obj.len());
    for (k, v) in obj {
        match v {
            serde_json::Value::String(s) => fields.push((k.clone(), s.clone())),
            serde_json::Value::Number(n) => fields.push((k.clone(), n.to_string())),
            _ => {}
        }
    }
    Some(fields)
}

/// Parse an application/x-www-form-urlencoded body into key/value pairs.
fn form_fields(body: &[u8]) -> Option<Vec<(String, String)>> {
    let body = std::str::from_utf8(body).ok()?;
    let mut fields = Vec::new();
    for pair in body.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (k, v) = match pair.split_once('=') {
            Some((k, v)) => (k, v),
            None => (pair, ""),
        };
        fields.push((decode_component(k)?, decode_component(v)?));
    }
    Some(fields)
}

/// Percent-decode one form component ('+' means space in form encoding).
fn decode_component(s: &str) -> Option<String> {
    let s = s.replace('+', " ");
    urlencoding::decode(&s).ok().map(|c| c.into_owned())
}
