//! Process configuration, read once at start-up from the environment (and `.env`).

use std::{env, str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow};

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub razorpay: RazorpayConfig,
    pub notifications: NotificationConfig,
    pub session: SessionConfig,
    pub orders: OrderConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub api_url: String,
    pub currency: String,
    pub reconcile_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    Smtp,
    Amqp,
    Log,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub kind: NotifierKind,
    pub smtp: Option<SmtpConfig>,
    pub amqp_url: Option<String>,
    pub amqp_queue: String,
    pub poll_interval: Duration,
    pub batch_size: i64,
    /// How long a claimed entry may stay `PROCESSING` before it is handed out again.
    pub lease: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub provider_url: Option<String>,
    pub admin_tokens: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct OrderConfig {
    /// When false, line prices are re-read from the catalog at order creation.
    pub trust_client_prices: bool,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            trust_client_prices: true,
        }
    }
}

/// Loads the configuration from the environment. `init_env` should run first so that
/// values from `.env` are visible.
pub fn load() -> Result<Config> {
    let backend = match optional("STORAGE").as_deref() {
        None | Some("postgres") => StorageBackend::Postgres,
        Some("memory") => StorageBackend::Memory,
        Some(other) => return Err(anyhow!("STORAGE must be `postgres` or `memory`, got `{other}`")),
    };

    let database_url = match backend {
        StorageBackend::Postgres => required("DATABASE_URL")?,
        StorageBackend::Memory => optional("DATABASE_URL").unwrap_or_default(),
    };

    let kind = match optional("NOTIFIER").as_deref() {
        None | Some("log") => NotifierKind::Log,
        Some("smtp") => NotifierKind::Smtp,
        Some("amqp") => NotifierKind::Amqp,
        Some(other) => {
            return Err(anyhow!("NOTIFIER must be `smtp`, `amqp` or `log`, got `{other}`"));
        }
    };

    let smtp = match kind {
        NotifierKind::Smtp => Some(SmtpConfig {
            host: required("EMAIL_HOST")?,
            port: parsed_or("EMAIL_PORT", 587)?,
            user: required("EMAIL_USER")?,
            password: required("EMAIL_PASSWORD")?,
            from: required("EMAIL_FROM")?,
        }),
        _ => None,
    };

    let amqp_url = match kind {
        NotifierKind::Amqp => Some(required("AMQP_URL")?),
        _ => optional("AMQP_URL"),
    };

    Ok(Config {
        server: ServerConfig {
            host: optional("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parsed_or("SERVER_PORT", 3000)?,
        },
        database: DatabaseConfig {
            backend,
            url: database_url,
            max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 10)?,
        },
        razorpay: RazorpayConfig {
            key_id: required("RAZORPAY_KEY_ID")?,
            key_secret: required("RAZORPAY_KEY_SECRET")?,
            api_url: optional("RAZORPAY_API_URL")
                .unwrap_or_else(|| "https://api.razorpay.com/v1".into()),
            currency: optional("PAYMENT_CURRENCY").unwrap_or_else(|| "INR".into()),
            reconcile_timeout: Duration::from_secs(parsed_or("RECONCILE_TIMEOUT_SECS", 10)?),
        },
        notifications: NotificationConfig {
            kind,
            smtp,
            amqp_url,
            amqp_queue: optional("AMQP_NOTIFICATION_QUEUE")
                .unwrap_or_else(|| "notifications.orders".into()),
            poll_interval: Duration::from_millis(parsed_or("OUTBOX_POLL_INTERVAL_MS", 1000)?),
            batch_size: parsed_or("OUTBOX_BATCH_SIZE", 20)?,
            lease: Duration::from_secs(parsed_or("OUTBOX_LEASE_SECS", 300)?),
        },
        session: SessionConfig {
            provider_url: optional("SESSION_PROVIDER_URL"),
            admin_tokens: optional("ADMIN_API_TOKENS")
                .map(|tokens| split_list(&tokens))
                .unwrap_or_default(),
        },
        orders: OrderConfig {
            trust_client_prices: parsed_or("TRUST_CLIENT_PRICES", true)?,
        },
    })
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn required(key: &str) -> Result<String> {
    optional(key).ok_or_else(|| anyhow!("{key} must be set"))
}

fn parsed_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value `{raw}`")),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}
