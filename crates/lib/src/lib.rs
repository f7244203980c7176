//! Ladle core library — inbound report pipeline, storage, provider
//! adapters, and the webhook server used by the CLI.

pub mod auth;
pub mod config;
pub mod inbound;
pub mod pipeline;
pub mod providers;
pub mod reply;
pub mod report;
pub mod server;
pub mod store;
