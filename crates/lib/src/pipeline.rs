//! The inbound report pipeline: authorize → parse → persist.
//!
//! Each stage runs strictly after the previous one and every path ends in
//! a terminal `Outcome`; no stage failure escapes as a process error.

use crate::auth::AuthorizedSenders;
use crate::inbound::InboundMessage;
use crate::reply::Outcome;
use crate::report;
use crate::store::ReportStore;

/// Run one message through the pipeline. At most one report is stored per
/// call (only on the `Recorded` path); there is no retry loop or re-entry
/// here — the store carries its own write policy.
pub async fn run_pipeline(
    senders: &AuthorizedSenders,
    store: &dyn ReportStore,
    msg: &InboundMessage,
) -> Outcome {
    log::info!("pipeline: received message from {}", msg.sender);

    if !senders.is_authorized(&msg.sender) {
        log::warn!("pipeline: unauthorized sender {}", msg.sender);
        return Outcome::Unauthorized;
    }

    let people_fed = match report::parse_people_fed(&msg.text) {
        Ok(n) => n,
        Err(e) => {
            log::info!("pipeline: invalid report from {}: {}", msg.sender, e);
            return Outcome::InvalidInput;
        }
    };

    match store.insert(people_fed).await {
        Ok(report) => {
            log::info!(
                "pipeline: recorded {} people fed at {}",
                report.people_fed,
                report.recorded_at
            );
            Outcome::Recorded(report)
        }
        Err(e) => {
            log::error!("pipeline: storing report failed: {}", e);
            Outcome::StorageFailure
        }
    }
}
