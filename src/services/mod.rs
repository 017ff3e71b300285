pub mod challenge;
pub mod error;
pub mod notifier;
pub mod passphrase;
pub mod registration;
pub mod store;
pub mod verifier;

pub use challenge::{ChallengeVerifier, MockChallengeVerifier, RedisChallengeVerifier};
pub use error::ServiceError;
pub use notifier::{MockNotifier, Notifier, SmtpNotifier};
pub use passphrase::PassphrasePolicy;
pub use registration::{RegistrationService, RegistrationSettings};
pub use store::{CredentialStore, MemoryStore, RedisStore, StoreError};
pub use verifier::{EmailVerifier, LiveEmailVerifier, StaticEmailVerifier};
