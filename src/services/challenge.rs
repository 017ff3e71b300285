use async_trait::async_trait;
use rand::{rngs::OsRng, Rng, RngCore};
use redis::aio::ConnectionManager;

const CHALLENGE_PREFIX: &str = "challenge:";
const ANSWER_LEN: usize = 6;

/// Admission challenge collaborator. `verify` consumes the challenge: a
/// solved id can never be replayed, even with the correct answer.
#[async_trait]
pub trait ChallengeVerifier: Send + Sync {
    async fn issue(&self) -> Result<String, anyhow::Error>;
    async fn verify(&self, id: &str, answer: &str) -> Result<bool, anyhow::Error>;
}

fn new_challenge_id() -> String {
    let mut buf = [0u8; 16];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

fn new_answer() -> String {
    let mut rng = OsRng;
    (0..ANSWER_LEN)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Redis-backed verifier. Single-use enforcement rides on GETDEL, which is
/// atomic on the server: concurrent verifications of the same id see the
/// answer at most once. The rendering layer reads the expected answer from
/// the shared `challenge:{id}` key; drawing it is not this service's concern.
#[derive(Clone)]
pub struct RedisChallengeVerifier {
    manager: ConnectionManager,
    ttl_seconds: u64,
}

impl RedisChallengeVerifier {
    pub fn new(manager: ConnectionManager, ttl_seconds: u64) -> Self {
        Self {
            manager,
            ttl_seconds,
        }
    }
}

#[async_trait]
impl ChallengeVerifier for RedisChallengeVerifier {
    async fn issue(&self) -> Result<String, anyhow::Error> {
        let id = new_challenge_id();
        let answer = new_answer();
        let mut conn = self.manager.clone();

        let _: () = redis::cmd("SET")
            .arg(format!("{}{}", CHALLENGE_PREFIX, id))
            .arg(&answer)
            .arg("EX")
            .arg(self.ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to store challenge: {}", e))?;

        Ok(id)
    }

    async fn verify(&self, id: &str, answer: &str) -> Result<bool, anyhow::Error> {
        if id.is_empty() {
            return Ok(false);
        }

        let mut conn = self.manager.clone();
        let expected: Option<String> = redis::cmd("GETDEL")
            .arg(format!("{}{}", CHALLENGE_PREFIX, id))
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to consume challenge: {}", e))?;

        Ok(expected.is_some_and(|expected| expected == answer))
    }
}

/// In-process verifier for tests. Challenges are primed with a known answer
/// and consumed on first verification, like the Redis implementation.
#[derive(Default)]
pub struct MockChallengeVerifier {
    answers: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

impl MockChallengeVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a challenge with a known answer and return its id.
    pub fn prime(&self, answer: &str) -> String {
        let id = new_challenge_id();
        self.answers
            .lock()
            .expect("mock challenge mutex poisoned")
            .insert(id.clone(), answer.to_string());
        id
    }
}

#[async_trait]
impl ChallengeVerifier for MockChallengeVerifier {
    async fn issue(&self) -> Result<String, anyhow::Error> {
        Ok(self.prime(&new_answer()))
    }

    async fn verify(&self, id: &str, answer: &str) -> Result<bool, anyhow::Error> {
        let expected = self
            .answers
            .lock()
            .map_err(|e| anyhow::anyhow!("mock challenge mutex poisoned: {}", e))?
            .remove(id);
        Ok(expected.is_some_and(|expected| expected == answer))
    }
}
