//! Authentication configuration.
//!
//! Configuration values are provided by the application, not hardcoded.

use chrono::Duration;

/// Secret used by development builds when none is configured.
pub const DEV_SECRET: &str = "dev-secret-change-in-production";

/// Bearer token configuration.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HMAC key for HS256 signatures.
    pub secret: String,

    /// Token lifetime.
    ///
    /// Default: 24 hours
    pub ttl: Duration,

    /// Value of the `iss` claim, checked on verification.
    ///
    /// Default: `eventhub`
    pub issuer: String,
}

impl TokenConfig {
    /// Create token configuration with default lifetime and issuer.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::hours(24),
            issuer: "eventhub".to_string(),
        }
    }

    /// Set token lifetime.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set issuer.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self::new(DEV_SECRET)
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordConfig {
    /// Memory cost in KiB.
    ///
    /// Default: 19456 (19 MiB, the OWASP baseline)
    pub memory_kib: u32,

    /// Number of passes.
    ///
    /// Default: 2
    pub iterations: u32,

    /// Degree of parallelism.
    ///
    /// Default: 1
    pub parallelism: u32,
}

impl PasswordConfig {
    /// Cheapest parameters Argon2 accepts. Only for tests.
    #[must_use]
    pub const fn insecure_fast() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }

    /// Set memory cost.
    #[must_use]
    pub const fn with_memory_kib(mut self, memory_kib: u32) -> Self {
        self.memory_kib = memory_kib;
        self
    }

    /// Set number of passes.
    #[must_use]
    pub const fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}
