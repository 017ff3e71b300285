use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::TokioAsyncResolver;
use validator::ValidateEmail;

/// Role-account local parts that must not receive guest credentials.
const ROLE_ACCOUNTS: &[&str] = &[
    "abuse",
    "admin",
    "administrator",
    "billing",
    "contact",
    "help",
    "helpdesk",
    "hostmaster",
    "info",
    "it",
    "mailer-daemon",
    "marketing",
    "noc",
    "noreply",
    "no-reply",
    "office",
    "postmaster",
    "root",
    "sales",
    "security",
    "support",
    "sysadmin",
    "webmaster",
];

/// Known throwaway mail providers. A static snapshot; operators who need a
/// live feed can front this verifier with their own implementation.
const DISPOSABLE_DOMAINS: &[&str] = &[
    "10minutemail.com",
    "33mail.com",
    "anonbox.net",
    "burnermail.io",
    "discard.email",
    "dispostable.com",
    "emailondeck.com",
    "fakeinbox.com",
    "getairmail.com",
    "getnada.com",
    "guerrillamail.com",
    "guerrillamail.net",
    "inboxkitten.com",
    "maildrop.cc",
    "mailinator.com",
    "mailnesia.com",
    "mailsac.com",
    "mintemail.com",
    "mohmal.com",
    "mytemp.email",
    "sharklasers.com",
    "spamgourmet.com",
    "temp-mail.org",
    "tempail.com",
    "tempinbox.com",
    "tempmail.dev",
    "throwawaymail.com",
    "trashmail.com",
    "yopmail.com",
];

/// What the identity verifier learned about an address. Consumed by the
/// registration validation pipeline; each field maps to one field error.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailReport {
    pub syntax_valid: bool,
    pub has_mx: bool,
    pub disposable: bool,
    pub role_account: bool,
}

#[async_trait]
pub trait EmailVerifier: Send + Sync {
    async fn inspect(&self, email: &str) -> Result<EmailReport, anyhow::Error>;
}

/// Verifier backed by live DNS for MX presence plus embedded
/// disposable-domain and role-account lists.
pub struct LiveEmailVerifier {
    resolver: TokioAsyncResolver,
}

impl LiveEmailVerifier {
    pub fn new() -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "No usable system resolver config, falling back to defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self { resolver }
    }
}

impl Default for LiveEmailVerifier {
    fn default() -> Self {
        Self::new()
    }
}

fn split_address(email: &str) -> Option<(&str, &str)> {
    let (local, domain) = email.rsplit_once('@')?;
    if local.is_empty() || domain.is_empty() {
        return None;
    }
    Some((local, domain))
}

fn is_role_account(local: &str) -> bool {
    let local = local.to_lowercase();
    ROLE_ACCOUNTS.contains(&local.as_str())
}

fn is_disposable(domain: &str) -> bool {
    let domain = domain.to_lowercase();
    DISPOSABLE_DOMAINS.contains(&domain.as_str())
}

#[async_trait]
impl EmailVerifier for LiveEmailVerifier {
    async fn inspect(&self, email: &str) -> Result<EmailReport, anyhow::Error> {
        if !email.validate_email() {
            return Ok(EmailReport::default());
        }

        let (local, domain) = match split_address(email) {
            Some(parts) => parts,
            None => return Ok(EmailReport::default()),
        };

        let has_mx = match self.resolver.mx_lookup(domain).await {
            Ok(lookup) => lookup.iter().next().is_some(),
            Err(e) => match e.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => false,
                _ => {
                    // Transient resolver failure is a server fault, not a
                    // judgement on the address.
                    return Err(anyhow::anyhow!("MX lookup for {} failed: {}", domain, e));
                }
            },
        };

        Ok(EmailReport {
            syntax_valid: true,
            has_mx,
            disposable: is_disposable(domain),
            role_account: is_role_account(local),
        })
    }
}

/// Deterministic verifier for tests: no network, same list-based rules, MX
/// presence decided by a configurable set of MX-less domains.
#[derive(Default)]
pub struct StaticEmailVerifier {
    pub mx_less_domains: std::collections::HashSet<String>,
}

impl StaticEmailVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_mx(domain: &str) -> Self {
        let mut mx_less_domains = std::collections::HashSet::new();
        mx_less_domains.insert(domain.to_string());
        Self { mx_less_domains }
    }
}

#[async_trait]
impl EmailVerifier for StaticEmailVerifier {
    async fn inspect(&self, email: &str) -> Result<EmailReport, anyhow::Error> {
        if !email.validate_email() {
            return Ok(EmailReport::default());
        }

        let (local, domain) = match split_address(email) {
            Some(parts) => parts,
            None => return Ok(EmailReport::default()),
        };

        Ok(EmailReport {
            syntax_valid: true,
            has_mx: !self.mx_less_domains.contains(&domain.to_lowercase()),
            disposable: is_disposable(domain),
            role_account: is_role_account(local),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_syntax_reported() {
        let verifier = StaticEmailVerifier::new();
        let report = verifier.inspect("not-an-address").await.unwrap();
        assert!(!report.syntax_valid);
    }

    #[tokio::test]
    async fn clean_address_passes_all_checks() {
        let verifier = StaticEmailVerifier::new();
        let report = verifier.inspect("guest@example.com").await.unwrap();
        assert!(report.syntax_valid);
        assert!(report.has_mx);
        assert!(!report.disposable);
        assert!(!report.role_account);
    }

    #[tokio::test]
    async fn disposable_domain_flagged() {
        let verifier = StaticEmailVerifier::new();
        let report = verifier.inspect("guest@mailinator.com").await.unwrap();
        assert!(report.disposable);
    }

    #[tokio::test]
    async fn role_account_flagged_case_insensitively() {
        let verifier = StaticEmailVerifier::new();
        let report = verifier.inspect("Admin@example.com").await.unwrap();
        assert!(report.role_account);
    }

    #[tokio::test]
    async fn mx_less_domain_flagged() {
        let verifier = StaticEmailVerifier::without_mx("nomx.example.com");
        let report = verifier.inspect("guest@nomx.example.com").await.unwrap();
        assert!(report.syntax_valid);
        assert!(!report.has_mx);
    }
}
