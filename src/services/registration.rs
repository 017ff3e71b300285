use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use rand::{rngs::OsRng, RngCore};

use crate::dtos::{AccessTier, ApproveResponse, RegisterRequest, RegisterResponse};
use crate::services::{
    challenge::ChallengeVerifier, error::ServiceError, notifier::Notifier,
    passphrase::PassphrasePolicy, store::CredentialStore, store::StoreError,
    verifier::EmailVerifier,
};

/// Store key layout. Active, pending, and approval namespaces are disjoint;
/// active and pending keys are derivable from (tier, email), approval keys
/// from the token alone.
pub mod keys {
    use crate::dtos::AccessTier;

    pub fn active(tier: AccessTier, email: &str) -> String {
        format!("cred:active:{}:{}", tier.namespace(), email)
    }

    pub fn pending(tier: AccessTier, email: &str) -> String {
        format!("cred:pending:{}:{}", tier.namespace(), email)
    }

    pub fn vlan(email: &str) -> String {
        format!("vlan:{}", email)
    }

    pub fn approval(token: &str) -> String {
        format!("approval:{}", token)
    }
}

/// Immutable policy knobs for the state machine, fixed at construction.
#[derive(Debug, Clone)]
pub struct RegistrationSettings {
    pub credential_ttl_days: i64,
    pub guest_vlan_id: u16,
    pub corp_vlan_id: u16,
    pub base_url: String,
}

/// The registration and approval state machine. All shared state lives in
/// the credential store; concurrent requests coordinate only through it.
#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn CredentialStore>,
    verifier: Arc<dyn EmailVerifier>,
    challenge: Arc<dyn ChallengeVerifier>,
    notifier: Arc<dyn Notifier>,
    policy: PassphrasePolicy,
    settings: RegistrationSettings,
}

/// 256 bits of randomness, hex-encoded. The token is the sole authorization
/// artifact for approval, so it must be unguessable.
fn new_approval_token() -> String {
    let mut buf = [0u8; 32];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

impl RegistrationService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        verifier: Arc<dyn EmailVerifier>,
        challenge: Arc<dyn ChallengeVerifier>,
        notifier: Arc<dyn Notifier>,
        policy: PassphrasePolicy,
        settings: RegistrationSettings,
    ) -> Self {
        Self {
            store,
            verifier,
            challenge,
            notifier,
            policy,
            settings,
        }
    }

    fn credential_ttl(&self) -> Duration {
        Duration::from_secs(self.settings.credential_ttl_days as u64 * 24 * 60 * 60)
    }

    /// Admission pipeline: every check runs and contributes at most one
    /// message per field, so a client can fix all its inputs in one round
    /// trip. The challenge is consumed here even when other fields fail.
    async fn validate(
        &self,
        email: &str,
        challenge_id: &str,
        challenge_answer: &str,
    ) -> Result<BTreeMap<String, String>, ServiceError> {
        let mut field_errors = BTreeMap::new();

        let report = self
            .verifier
            .inspect(email)
            .await
            .map_err(ServiceError::Verifier)?;

        if !report.syntax_valid {
            field_errors.insert(
                "email".to_string(),
                "Invalid email address".to_string(),
            );
        } else {
            if !report.has_mx {
                field_errors.insert(
                    "email".to_string(),
                    "No MX record for domain".to_string(),
                );
            }
            if report.disposable {
                field_errors.insert(
                    "email".to_string(),
                    "No disposable email please".to_string(),
                );
            }
            if report.role_account {
                field_errors.insert(
                    "email".to_string(),
                    "No role email address please".to_string(),
                );
            }
        }

        let solved = self
            .challenge
            .verify(challenge_id, challenge_answer)
            .await
            .map_err(ServiceError::Challenge)?;
        if !solved {
            field_errors.insert(
                "challenge_answer".to_string(),
                "Wrong challenge answer".to_string(),
            );
        }

        Ok(field_errors)
    }

    /// Issue or refresh a credential for the requested tier.
    ///
    /// Re-registration within the TTL window reuses the stored secret and
    /// only re-arms the expiry, so a guest retrying the form keeps the
    /// password already delivered to them. A truly simultaneous first
    /// registration may draw two secrets with only the final write
    /// surviving; that race is benign because the surviving secret is the
    /// one delivered last.
    pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse, ServiceError> {
        let email = req.email.trim().to_lowercase();

        let field_errors = self
            .validate(&email, &req.challenge_id, &req.challenge_answer)
            .await?;
        if !field_errors.is_empty() {
            tracing::info!(email = %email, errors = ?field_errors, "Registration rejected");
            return Ok(RegisterResponse::rejected(email, req.tier, field_errors));
        }

        let credential_key = match req.tier {
            AccessTier::SelfService => keys::active(req.tier, &email),
            AccessTier::Privileged => keys::pending(req.tier, &email),
        };

        // Reuse a live secret instead of rotating it; generate only when
        // none is stored.
        let secret = match self.store.get(&credential_key).await? {
            Some(existing) => existing,
            None => self.policy.generate(),
        };

        let ttl = self.credential_ttl();
        self.store.set_with_ttl(&credential_key, &secret, ttl).await?;

        match req.tier {
            AccessTier::SelfService => {
                // The VLAN tag follows the active credential: guest tag on
                // issuance here, corp tag only once an approval promotes the
                // pending record. A still-pending privileged request must not
                // re-segment a guest who holds an active credential.
                self.store
                    .set_with_ttl(
                        &keys::vlan(&email),
                        &self.settings.guest_vlan_id.to_string(),
                        ttl,
                    )
                    .await?;

                tracing::info!(email = %email, "Credential issued");

                let notified = match self.notifier.send_credential(&email, &secret).await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::error!(email = %email, error = %e, "Credential delivery failed; credential remains stored");
                        false
                    }
                };

                Ok(RegisterResponse::issued(
                    email,
                    self.settings.credential_ttl_days,
                    notified,
                ))
            }
            AccessTier::Privileged => {
                let token = new_approval_token();
                self.store
                    .set_with_ttl(&keys::approval(&token), &email, ttl)
                    .await?;

                tracing::info!(email = %email, "Pending credential stored, approval requested");

                let link = format!("{}/api/v1/approve?id={}", self.settings.base_url, token);
                let notified = match self.notifier.send_approval_request(&email, &link).await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::error!(email = %email, error = %e, "Approval request delivery failed; pending credential remains stored");
                        false
                    }
                };

                Ok(RegisterResponse::under_review(
                    email,
                    self.settings.credential_ttl_days,
                    notified,
                ))
            }
        }
    }

    /// Promote a pending privileged credential to active.
    ///
    /// Ordering is load-bearing: the token resolves first, the rename runs
    /// second, and the approval record is deleted only after the rename
    /// succeeds. A crash between rename and delete leaves a token that
    /// re-resolves to an already-promoted credential; re-running approve is
    /// then safe because the rename fails on the missing pending key and the
    /// caller sees the same generic rejection as for an unknown token.
    pub async fn approve(&self, token: &str) -> Result<ApproveResponse, ServiceError> {
        if token.is_empty() {
            return Err(ServiceError::InvalidApproval);
        }

        let approval_key = keys::approval(token);
        let email = self
            .store
            .get(&approval_key)
            .await?
            .ok_or(ServiceError::InvalidApproval)?;

        let pending_key = keys::pending(AccessTier::Privileged, &email);
        let active_key = keys::active(AccessTier::Privileged, &email);

        match self.store.rename_atomic(&pending_key, &active_key).await {
            Ok(()) => {}
            Err(StoreError::SourceMissing) => {
                // Pending credential lapsed or was already promoted. The
                // approval record is left intact so a retry after a crash
                // behaves the same way.
                tracing::warn!(email = %email, "Approval attempted with no pending credential");
                return Err(ServiceError::InvalidApproval);
            }
            Err(e) => return Err(e.into()),
        }

        // Activation re-segments the guest onto the corporate VLAN.
        self.store
            .set_with_ttl(
                &keys::vlan(&email),
                &self.settings.corp_vlan_id.to_string(),
                self.credential_ttl(),
            )
            .await?;

        self.store.delete(&approval_key).await?;

        let secret = self
            .store
            .get(&active_key)
            .await?
            .ok_or_else(|| {
                ServiceError::Internal(anyhow::anyhow!(
                    "active credential vanished immediately after promotion"
                ))
            })?;

        tracing::info!(email = %email, "Pending credential approved");

        let notified = match self.notifier.send_credential(&email, &secret).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(email = %email, error = %e, "Credential delivery failed after approval; credential remains active");
                false
            }
        };

        let message = if notified {
            "Request approved.".to_string()
        } else {
            "Request approved, but the credential email could not be sent.".to_string()
        };

        Ok(ApproveResponse {
            accepted: true,
            message,
            email,
            notified,
        })
    }
}
