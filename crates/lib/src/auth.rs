//! Sender authorization: membership in a configured set of identities.

use std::collections::HashSet;

/// The set of sender identities allowed to submit reports. Built once at
/// startup from config; immutable afterwards.
#[derive(Debug, Clone)]
pub struct AuthorizedSenders {
    senders: HashSet<String>,
}

impl AuthorizedSenders {
    /// Build from the configured list. Fails when the list is empty: running
    /// an intake endpoint with nobody authorized would silently reject every
    /// report, so startup refuses instead.
    pub fn from_list(senders: &[String]) -> anyhow::Result<Self> {
        let senders: HashSet<String> = senders
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if senders.is_empty() {
            anyhow::bail!(
                "no authorized senders configured (set authorizedSenders in config or LADLE_AUTHORIZED_SENDERS)"
            );
        }
        Ok(Self { senders })
    }

    /// Exact-match membership test (sender trimmed first).
    pub fn is_authorized(&self, sender: &str) -> bool {
        self.senders.contains(sender.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_is_authorized() {
        let senders = AuthorizedSenders::from_list(&["+27601234567".to_string()]).expect("build");
        assert!(senders.is_authorized("+27601234567"));
        assert!(senders.is_authorized(" +27601234567 "));
    }

    #[test]
    fn non_member_is_not_authorized() {
        let senders = AuthorizedSenders::from_list(&["+27601234567".to_string()]).expect("build");
        assert!(!senders.is_authorized("+99990001111"));
        assert!(!senders.is_authorized("27601234567"));
    }

    #[test]
    fn multiple_senders_allowed() {
        let senders = AuthorizedSenders::from_list(&[
            "+27601234567".to_string(),
            "+27609998888".to_string(),
        ])
        .expect("build");
        assert!(senders.is_authorized("+27609998888"));
    }

    #[test]
    fn empty_list_is_rejected() {
        assert!(AuthorizedSenders::from_list(&[]).is_err());
        assert!(AuthorizedSenders::from_list(&["  ".to_string()]).is_err());
    }
}
