use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Access class for an issued credential. Each tier maps to its own key
/// namespace and VLAN tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessTier {
    #[default]
    SelfService,
    Privileged,
}

impl AccessTier {
    /// Namespace segment used in store keys.
    pub fn namespace(self) -> &'static str {
        match self {
            AccessTier::SelfService => "guest",
            AccessTier::Privileged => "corp",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub challenge_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub challenge_id: String,
    pub challenge_answer: String,
    #[serde(default)]
    pub tier: AccessTier,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub accepted: bool,
    pub message: String,
    pub field_errors: BTreeMap<String, String>,
    pub email: String,
    pub valid_for_days: i64,
    pub tier: AccessTier,
    /// False when the credential was stored but the outbound message failed;
    /// resend is an out-of-band concern.
    pub notified: bool,
}

impl RegisterResponse {
    pub fn rejected(email: String, tier: AccessTier, field_errors: BTreeMap<String, String>) -> Self {
        Self {
            accepted: false,
            message: "Registration rejected.".to_string(),
            field_errors,
            email,
            valid_for_days: 0,
            tier,
            notified: false,
        }
    }

    pub fn issued(email: String, valid_for_days: i64, notified: bool) -> Self {
        let message = if notified {
            "Account successfully registered.".to_string()
        } else {
            "Account registered, but the credential email could not be sent. Please contact the front desk.".to_string()
        };
        Self {
            accepted: true,
            message,
            field_errors: BTreeMap::new(),
            email,
            valid_for_days,
            tier: AccessTier::SelfService,
            notified,
        }
    }

    pub fn under_review(email: String, valid_for_days: i64, notified: bool) -> Self {
        let message = if notified {
            "Account is under review.".to_string()
        } else {
            "Account is under review, but the approval request could not be delivered. Please contact the front desk.".to_string()
        };
        Self {
            accepted: true,
            message,
            field_errors: BTreeMap::new(),
            email,
            valid_for_days,
            tier: AccessTier::Privileged,
            notified,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApproveParams {
    /// Single-use approval token from the administrator's mail.
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct ApproveResponse {
    pub accepted: bool,
    pub message: String,
    pub email: String,
    pub notified: bool,
}
