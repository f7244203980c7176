//! Messaging provider adapters (Vonage SMS, WhatsApp Cloud).
//!
//! Providers disagree on how a send is acknowledged (numeric status codes
//! vs. message-id presence); every adapter normalizes its response into one
//! `SendOutcome` so the dispatcher never sees provider-specific shapes.

mod vonage;
mod whatsapp;

pub use vonage::VonageSms;
pub use whatsapp::WhatsAppCloud;

use crate::config::{self, Config, ProviderKind};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Normalized result of one provider send call.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub accepted: bool,
    /// Message id on acceptance, the provider's error text otherwise.
    pub detail: String,
}

impl SendOutcome {
    pub fn accepted(detail: impl Into<String>) -> Self {
        Self {
            accepted: true,
            detail: detail.into(),
        }
    }

    pub fn rejected(detail: impl Into<String>) -> Self {
        Self {
            accepted: false,
            detail: detail.into(),
        }
    }
}

/// Handle to a messaging provider's send capability.
#[async_trait]
pub trait MessageProvider: Send + Sync {
    /// Provider id (e.g. "vonage").
    fn id(&self) -> &str;

    /// Send `text` to `to` from the configured sender identity. Delivery
    /// failure is reported in the outcome, never as a panic or process error.
    async fn send(&self, to: &str, text: &str) -> SendOutcome;
}

/// Build the configured provider adapter. Fails when the selected provider's
/// credentials or sender identity are missing.
pub fn build_provider(config: &Config) -> anyhow::Result<Arc<dyn MessageProvider>> {
    let timeout = Duration::from_millis(config.provider.timeout_ms);
    let from = config
        .provider
        .from_number
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    match config.provider.kind {
        ProviderKind::Vonage => {
            let api_key = config::resolve_vonage_api_key(config)
                .ok_or_else(|| anyhow::anyhow!("vonage api key not configured (provider.vonage.apiKey or VONAGE_API_KEY)"))?;
            let api_secret = config::resolve_vonage_api_secret(config)
                .ok_or_else(|| anyhow::anyhow!("vonage api secret not configured (provider.vonage.apiSecret or VONAGE_API_SECRET)"))?;
            let from = from
                .ok_or_else(|| anyhow::anyhow!("provider.fromNumber not configured"))?
                .to_string();
            Ok(Arc::new(VonageSms::new(None, api_key, api_secret, from, timeout)))
        }
        ProviderKind::Whatsapp => {
            let access_token = config::resolve_whatsapp_access_token(config)
                .ok_or_else(|| anyhow::anyhow!("whatsapp access token not configured (provider.whatsapp.accessToken or WHATSAPP_ACCESS_TOKEN)"))?;
            let phone_number_id = config
                .provider
                .whatsapp
                .phone_number_id
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| anyhow::anyhow!("provider.whatsapp.phoneNumberId not configured"))?
                .to_string();
            Ok(Arc::new(WhatsAppCloud::new(None, access_token, phone_number_id, timeout)))
        }
    }
}
