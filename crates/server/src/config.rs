//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `BASE_URL` - Public URL of the platform (used for auth callbacks)
//! - `ROOT_DOMAIN` - Apex domain tenants are served under (e.g. vitrine-immo.fr)
//! - `AUTH_SIGN_IN_URL` - Hosted sign-in page of the identity provider
//! - `AUTH_JWT_PUBLIC_KEY` or `AUTH_JWT_SECRET` - Session token verification key
//! - `EMAIL_FROM` - Sender address for outbound mail
//! - `EMAIL_API_KEY`, or `SMTP_HOST` + `SMTP_USERNAME` + `SMTP_PASSWORD`
//!
//! ## Optional
//! - `VITRINE_ENV` - `production` switches tenant links to https on the root domain
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 3000)
//! - `PLATFORM_NAME` - Reserved subdomain label (default: vitrine)
//! - `AUTH_ISSUER` - Expected `iss` claim
//! - `EMAIL_API_URL` - Email API base URL (default: <https://api.resend.com>)
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//! - `VITRINE_LOG_JSON` - Emit JSON logs when set

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_EMAIL_API_URL: &str = "https://api.resend.com";
const DEFAULT_PLATFORM_NAME: &str = "vitrine";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Deployment environment. Only affects how tenant links are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("production") => Self::Production,
            _ => Self::Development,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the platform
    pub base_url: String,
    /// Deployment environment
    pub environment: Environment,
    /// Tenant addressing
    pub tenancy: TenancyConfig,
    /// Identity provider configuration
    pub auth: AuthConfig,
    /// Outbound email configuration
    pub email: EmailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// Emit JSON logs instead of text
    pub log_json: bool,
}

/// How tenant subdomains are recognised and linked.
#[derive(Debug, Clone)]
pub struct TenancyConfig {
    /// Apex domain, lowercased (e.g. `vitrine-immo.fr`)
    pub root_domain: String,
    /// Platform name, reserved as a subdomain label
    pub platform_name: String,
}

/// Key used to verify session tokens issued by the identity provider.
#[derive(Clone)]
pub enum JwtKey {
    /// RS256 public key in PEM form.
    RsaPublicPem(String),
    /// HS256 shared secret.
    Hmac(SecretString),
}

impl std::fmt::Debug for JwtKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RsaPublicPem(_) => f.write_str("RsaPublicPem([PUBLIC KEY])"),
            Self::Hmac(_) => f.write_str("Hmac([REDACTED])"),
        }
    }
}

/// Identity provider configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Hosted sign-in page
    pub sign_in_url: String,
    /// Token verification key
    pub jwt_key: JwtKey,
    /// Expected issuer, checked when set
    pub issuer: Option<String>,
}

/// Outbound email configuration.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Email sender address (From header)
    pub from_address: String,
    /// Delivery transport
    pub transport: EmailTransportConfig,
}

/// Email delivery transport.
///
/// Implements `Debug` manually to redact credentials.
#[derive(Clone)]
pub enum EmailTransportConfig {
    /// Transactional email HTTP API (Resend-compatible).
    Api {
        base_url: String,
        api_key: SecretString,
    },
    /// Plain SMTP relay.
    Smtp {
        host: String,
        port: u16,
        username: String,
        password: SecretString,
    },
}

impl std::fmt::Debug for EmailTransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api { base_url, .. } => f
                .debug_struct("Api")
                .field("base_url", base_url)
                .field("api_key", &"[REDACTED]")
                .finish(),
            Self::Smtp {
                host,
                port,
                username,
                ..
            } => f
                .debug_struct("Smtp")
                .field("host", host)
                .field("port", port)
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_required_secret("DATABASE_URL")?;
        let host = get_env_or_default("HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("BASE_URL".to_string(), e.to_string()))?;

        let environment = Environment::from_env_value(get_optional_env("VITRINE_ENV").as_deref());
        let tenancy = TenancyConfig::from_env()?;
        let auth = AuthConfig::from_env()?;
        let email = EmailConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);
        let log_json = get_optional_env("VITRINE_LOG_JSON").is_some();

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            environment,
            tenancy,
            auth,
            email,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            log_json,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Public URL of a tenant site.
    ///
    /// Production links use https on the root domain. Everywhere else the
    /// `*.localhost` wildcard is used so no DNS setup is needed.
    #[must_use]
    pub fn tenant_url(&self, slug: &str) -> String {
        match self.environment {
            Environment::Production => format!("https://{slug}.{}", self.tenancy.root_domain),
            Environment::Development => format!("http://{slug}.localhost:{}", self.port),
        }
    }
}

impl TenancyConfig {
    /// Load `ROOT_DOMAIN` and `PLATFORM_NAME` on their own, for tools that
    /// need tenancy rules without the whole server configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `ROOT_DOMAIN` is missing or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let root_domain = get_required_env("ROOT_DOMAIN")?
            .trim()
            .trim_end_matches('.')
            .to_ascii_lowercase();
        if root_domain.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "ROOT_DOMAIN".to_string(),
                "must not be empty".to_string(),
            ));
        }

        Ok(Self {
            root_domain,
            platform_name: get_env_or_default("PLATFORM_NAME", DEFAULT_PLATFORM_NAME)
                .to_ascii_lowercase(),
        })
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let sign_in_url = get_required_env("AUTH_SIGN_IN_URL")?;
        url::Url::parse(&sign_in_url).map_err(|e| {
            ConfigError::InvalidEnvVar("AUTH_SIGN_IN_URL".to_string(), e.to_string())
        })?;

        let jwt_key = match (
            get_optional_env("AUTH_JWT_PUBLIC_KEY"),
            get_optional_env("AUTH_JWT_SECRET"),
        ) {
            // Env files often carry PEM blocks with escaped newlines
            (Some(pem), None) => JwtKey::RsaPublicPem(pem.replace("\\n", "\n")),
            (None, Some(_)) => JwtKey::Hmac(get_validated_secret("AUTH_JWT_SECRET")?),
            (None, None) => {
                return Err(ConfigError::MissingEnvVar(
                    "AUTH_JWT_PUBLIC_KEY or AUTH_JWT_SECRET".to_string(),
                ));
            }
            (Some(_), Some(_)) => {
                return Err(ConfigError::InvalidEnvVar(
                    "AUTH_JWT_*".to_string(),
                    "Set only one of AUTH_JWT_PUBLIC_KEY and AUTH_JWT_SECRET".to_string(),
                ));
            }
        };

        Ok(Self {
            sign_in_url,
            jwt_key,
            issuer: get_optional_env("AUTH_ISSUER"),
        })
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let from_address = get_required_env("EMAIL_FROM")?;

        let transport = if get_optional_env("EMAIL_API_KEY").is_some() {
            EmailTransportConfig::Api {
                base_url: get_env_or_default("EMAIL_API_URL", DEFAULT_EMAIL_API_URL)
                    .trim_end_matches('/')
                    .to_string(),
                api_key: get_validated_secret("EMAIL_API_KEY")?,
            }
        } else if get_optional_env("SMTP_HOST").is_some() {
            let port = get_env_or_default("SMTP_PORT", "587")
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_string(), e.to_string()))?;
            EmailTransportConfig::Smtp {
                host: get_required_env("SMTP_HOST")?,
                port,
                username: get_required_env("SMTP_USERNAME")?,
                password: get_validated_secret("SMTP_PASSWORD")?,
            }
        } else {
            return Err(ConfigError::MissingEnvVar(
                "EMAIL_API_KEY or SMTP_HOST".to_string(),
            ));
        };

        Ok(Self {
            from_address,
            transport,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
