//! Test harness for registration and approval flows.
//!
//! Wires the state machine against in-memory fakes: a TTL-aware store, a
//! single-use challenge verifier, a list-based email verifier, and a
//! recording notifier.

#![allow(dead_code)]

use std::sync::Arc;

use guest_portal::config::{
    Environment, MailConfig, NetworkConfig, PortalConfig, RateLimitConfig, RedisConfig, SmtpConfig,
};
use guest_portal::dtos::{AccessTier, RegisterRequest};
use guest_portal::services::{
    MemoryStore, MockChallengeVerifier, MockNotifier, PassphrasePolicy, RegistrationService,
    RegistrationSettings, StaticEmailVerifier,
};

pub const TTL_DAYS: i64 = 3;
pub const GUEST_VLAN: u16 = 10;
pub const CORP_VLAN: u16 = 20;
pub const BASE_URL: &str = "http://portal.test";

pub struct TestPortal {
    pub store: Arc<MemoryStore>,
    pub challenge: Arc<MockChallengeVerifier>,
    pub notifier: Arc<MockNotifier>,
    pub service: RegistrationService,
}

impl TestPortal {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let challenge = Arc::new(MockChallengeVerifier::new());
        let notifier = Arc::new(MockNotifier::new());

        let service = RegistrationService::new(
            store.clone(),
            Arc::new(StaticEmailVerifier::new()),
            challenge.clone(),
            notifier.clone(),
            PassphrasePolicy::parse("word-word").unwrap(),
            RegistrationSettings {
                credential_ttl_days: TTL_DAYS,
                guest_vlan_id: GUEST_VLAN,
                corp_vlan_id: CORP_VLAN,
                base_url: BASE_URL.to_string(),
            },
        );

        Self {
            store,
            challenge,
            notifier,
            service,
        }
    }

    /// Build a request with a freshly primed, correctly answered challenge.
    pub fn solved_request(&self, email: &str, tier: AccessTier) -> RegisterRequest {
        let id = self.challenge.prime("483920");
        RegisterRequest {
            email: email.to_string(),
            challenge_id: id,
            challenge_answer: "483920".to_string(),
            tier,
        }
    }

    /// Build a request whose challenge answer is wrong.
    pub fn botched_request(&self, email: &str, tier: AccessTier) -> RegisterRequest {
        let id = self.challenge.prime("483920");
        RegisterRequest {
            email: email.to_string(),
            challenge_id: id,
            challenge_answer: "000000".to_string(),
            tier,
        }
    }
}

/// Extract the approval token from a recorded approval link.
pub fn token_from_link(link: &str) -> String {
    link.rsplit_once("id=")
        .expect("approval link carries an id parameter")
        .1
        .to_string()
}

pub fn test_config() -> PortalConfig {
    PortalConfig {
        environment: Environment::Dev,
        service_name: "guest-portal".to_string(),
        service_version: "0.1.0".to_string(),
        log_level: "info".to_string(),
        bind_addr: "127.0.0.1".to_string(),
        port: 8080,
        base_url: BASE_URL.to_string(),
        redis: RedisConfig {
            url: "redis://localhost:6379".to_string(),
        },
        smtp: SmtpConfig {
            host: "smtp.example.com".to_string(),
            user: "portal@example.com".to_string(),
            password: "secret".to_string(),
        },
        mail: MailConfig {
            sender: "portal@example.com".to_string(),
            admin: "it@example.com".to_string(),
        },
        network: NetworkConfig {
            ssid: "Guest".to_string(),
            guest_vlan_id: GUEST_VLAN,
            corp_vlan_id: CORP_VLAN,
        },
        credential_ttl_days: TTL_DAYS,
        passphrase_pattern: "word-word".to_string(),
        challenge_ttl_seconds: 300,
        rate_limit: RateLimitConfig {
            register_attempts: 100,
            register_window_seconds: 60,
        },
    }
}
