use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The oversight level attached to a delegation, ordered from least to most
/// restrictive. The derived `Ord` follows declaration order, so
/// `Autonomous < ExecuteAndReport < MustAskFirst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityTier {
    /// The recipient may act without reporting back.
    Autonomous,
    /// The recipient may act but must report the outcome.
    ExecuteAndReport,
    /// The recipient must obtain approval before acting.
    MustAskFirst,
}

impl AuthorityTier {
    /// Parses a declared tier string. Accepts hyphenated and underscored
    /// spellings, case-insensitively. Returns `None` for anything else.
    pub fn parse_tier(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "autonomous" | "fully-autonomous" => Some(AuthorityTier::Autonomous),
            "execute-and-report" => Some(AuthorityTier::ExecuteAndReport),
            "must-ask-first" => Some(AuthorityTier::MustAskFirst),
            _ => None,
        }
    }

    /// Computes the effective tier for a downstream delegation.
    ///
    /// Tiers encode the process formality the upstream mandate asked for;
    /// the inbound maximum caps what a task may impose further down. An
    /// inbound mandate restrictive enough to need sign-off never reaches
    /// this point: the approval gate fires on the inbound maximum first.
    pub fn narrow(declared: AuthorityTier, inbound: AuthorityTier) -> AuthorityTier {
        declared.min(inbound)
    }
}

impl fmt::Display for AuthorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorityTier::Autonomous => write!(f, "autonomous"),
            AuthorityTier::ExecuteAndReport => write!(f, "execute-and-report"),
            AuthorityTier::MustAskFirst => write!(f, "must-ask-first"),
        }
    }
}

/// A per-hop delegation mandate issued by a delegating agent to a specific
/// recipient. Carried on the envelope it authorizes; may expire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorityClaim {
    /// The agent that issued the claim.
    pub granted_by: String,
    /// The agent the claim is addressed to.
    pub granted_to: String,
    /// The oversight level granted.
    pub tier: AuthorityTier,
    /// When the claim was issued.
    pub granted_at: DateTime<Utc>,
    /// When the claim stops being valid, if ever.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthorityClaim {
    /// Creates a non-expiring claim.
    pub fn new(
        granted_by: impl Into<String>,
        granted_to: impl Into<String>,
        tier: AuthorityTier,
    ) -> Self {
        Self {
            granted_by: granted_by.into(),
            granted_to: granted_to.into(),
            tier,
            granted_at: Utc::now(),
            expires_at: None,
        }
    }

    /// Sets an expiry instant on the claim.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether the claim has expired as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }

    /// Whether the claim is addressed to the given agent.
    pub fn covers(&self, agent_id: &str) -> bool {
        self.granted_to == agent_id
    }
}

/// The highest tier among a set of claims.
///
/// An envelope with no claims defaults to [`AuthorityTier::Autonomous`]:
/// claims are mandate metadata, not an authentication boundary.
pub fn max_claim_tier(claims: &[AuthorityClaim]) -> AuthorityTier {
    claims
        .iter()
        .map(|claim| claim.tier)
        .max()
        .unwrap_or(AuthorityTier::Autonomous)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_tier_ordering_is_by_restrictiveness() {
        assert!(AuthorityTier::Autonomous < AuthorityTier::ExecuteAndReport);
        assert!(AuthorityTier::ExecuteAndReport < AuthorityTier::MustAskFirst);
    }

    #[test]
    fn narrowing_takes_the_lighter_tier() {
        // The effective tier is min(declared, inbound) under the
        // least-to-most-restrictive ordering.
        assert_eq!(
            AuthorityTier::narrow(AuthorityTier::MustAskFirst, AuthorityTier::Autonomous),
            AuthorityTier::Autonomous
        );
        assert_eq!(
            AuthorityTier::narrow(AuthorityTier::Autonomous, AuthorityTier::MustAskFirst),
            AuthorityTier::Autonomous
        );
        assert_eq!(
            AuthorityTier::narrow(
                AuthorityTier::ExecuteAndReport,
                AuthorityTier::ExecuteAndReport
            ),
            AuthorityTier::ExecuteAndReport
        );
    }

    #[test]
    fn test_parse_tier_spellings() {
        assert_eq!(
            AuthorityTier::parse_tier("fully-autonomous"),
            Some(AuthorityTier::Autonomous)
        );
        assert_eq!(
            AuthorityTier::parse_tier("Execute_And_Report"),
            Some(AuthorityTier::ExecuteAndReport)
        );
        assert_eq!(
            AuthorityTier::parse_tier(" must-ask-first "),
            Some(AuthorityTier::MustAskFirst)
        );
        assert_eq!(AuthorityTier::parse_tier("yolo"), None);
    }

    #[test]
    fn test_no_claims_defaults_to_autonomous() {
        assert_eq!(max_claim_tier(&[]), AuthorityTier::Autonomous);
    }

    #[test]
    fn test_max_claim_tier_picks_most_restrictive() {
        let claims = vec![
            AuthorityClaim::new("a", "b", AuthorityTier::Autonomous),
            AuthorityClaim::new("a", "b", AuthorityTier::MustAskFirst),
            AuthorityClaim::new("a", "b", AuthorityTier::ExecuteAndReport),
        ];
        assert_eq!(max_claim_tier(&claims), AuthorityTier::MustAskFirst);
    }

    #[test]
    fn test_claim_expiry() {
        let now = Utc::now();
        let claim = AuthorityClaim::new("orchestrator", "worker", AuthorityTier::Autonomous);
        assert!(!claim.is_expired(now));

        let expired = claim.clone().with_expiry(now - Duration::seconds(1));
        assert!(expired.is_expired(now));

        let live = claim.with_expiry(now + Duration::hours(1));
        assert!(!live.is_expired(now));
    }

    #[test]
    fn test_claim_covers_recipient_only() {
        let claim = AuthorityClaim::new("orchestrator", "worker-1", AuthorityTier::Autonomous);
        assert!(claim.covers("worker-1"));
        assert!(!claim.covers("worker-2"));
    }
}
