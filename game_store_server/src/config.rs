use std::{env, fmt::Display, io::Write, str::FromStr};

use game_store_engine::{
    payments::{
        StripeConfig,
        DEFAULT_SIMULATOR_KEY_ID,
        DEFAULT_SIMULATOR_SECRET,
        DEFAULT_STRIPE_API_URL,
        DEFAULT_WEBHOOK_TOLERANCE_SECS,
    },
    sqlite::db_url,
};
use gs_common::{helpers::normalize_currency, Secret, DEFAULT_CURRENCY_CODE};
use log::*;
use rand::{thread_rng, RngCore};
use serde_json::json;
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_GSS_HOST: &str = "127.0.0.1";
const DEFAULT_GSS_PORT: u16 = 5000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub auth: AuthConfig,
    /// The currency orders are priced in when the client does not name one.
    pub default_currency: String,
    pub payment_provider: PaymentProvider,
    pub simulator: SimulatorConfig,
    pub stripe: StripeSettings,
    /// Overrides the header the webhook endpoint reads signatures from. When unset, the active gateway decides.
    pub webhook_signature_header: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_GSS_HOST.to_string(),
            port: DEFAULT_GSS_PORT,
            database_url: String::default(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            auth: AuthConfig::default(),
            default_currency: DEFAULT_CURRENCY_CODE.to_string(),
            payment_provider: PaymentProvider::default(),
            simulator: SimulatorConfig::default(),
            stripe: StripeSettings::default(),
            webhook_signature_header: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PaymentProvider {
    #[default]
    Simulator,
    Stripe,
}

impl FromStr for PaymentProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simulator" | "razorpay" => Ok(Self::Simulator),
            "stripe" => Ok(Self::Stripe),
            s => Err(format!("Unknown payment provider: {s}")),
        }
    }
}

impl Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simulator => write!(f, "simulator"),
            Self::Stripe => write!(f, "stripe"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SimulatorConfig {
    pub key_id: String,
    pub secret: Secret<String>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self { key_id: DEFAULT_SIMULATOR_KEY_ID.to_string(), secret: Secret::new(DEFAULT_SIMULATOR_SECRET.to_string()) }
    }
}

#[derive(Clone, Debug)]
pub struct StripeSettings {
    pub api_url: String,
    pub secret_key: Secret<String>,
    pub publishable_key: String,
    pub webhook_secret: Secret<String>,
    pub tolerance_secs: i64,
}

impl Default for StripeSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_STRIPE_API_URL.to_string(),
            secret_key: Secret::default(),
            publishable_key: String::default(),
            webhook_secret: Secret::default(),
            tolerance_secs: DEFAULT_WEBHOOK_TOLERANCE_SECS,
        }
    }
}

impl StripeSettings {
    pub fn stripe_config(&self) -> StripeConfig {
        StripeConfig::new(self.secret_key.clone(), self.publishable_key.clone(), self.webhook_secret.clone())
            .with_api_url(self.api_url.clone())
            .with_tolerance(self.tolerance_secs)
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("GSS_HOST").ok().unwrap_or_else(|| DEFAULT_GSS_HOST.into());
        let port = parse_env("GSS_PORT", DEFAULT_GSS_PORT);
        let database_url = db_url();
        let db_max_connections = parse_env("GSS_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let default_currency =
            normalize_currency(env::var("GSS_DEFAULT_CURRENCY").ok().as_deref(), DEFAULT_CURRENCY_CODE);
        let payment_provider = env::var("GSS_PAYMENT_PROVIDER")
            .map_err(|_| info!("🪛️ GSS_PAYMENT_PROVIDER is not set. Using the payment simulator."))
            .and_then(|s| s.parse::<PaymentProvider>().map_err(|e| warn!("🪛️ {e}. Using the payment simulator.")))
            .unwrap_or_default();
        let simulator = SimulatorConfig::from_env_or_defaults();
        let stripe = StripeSettings::from_env_or_defaults(payment_provider == PaymentProvider::Stripe);
        let webhook_signature_header =
            env::var("GSS_WEBHOOK_SIGNATURE_HEADER").ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            host,
            port,
            database_url,
            db_max_connections,
            auth,
            default_currency,
            payment_provider,
            simulator,
            stripe,
            webhook_signature_header,
        }
    }
}

fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + Display + Copy,
    T::Err: Display,
{
    env::var(name)
        .map(|s| {
            s.parse::<T>().unwrap_or_else(|e| {
                error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
                default
            })
        })
        .unwrap_or(default)
}

impl SimulatorConfig {
    pub fn from_env_or_defaults() -> Self {
        let key_id = env::var("GSS_SIMULATOR_KEY_ID").ok().unwrap_or_else(|| DEFAULT_SIMULATOR_KEY_ID.to_string());
        let secret = env::var("GSS_SIMULATOR_SECRET").ok().unwrap_or_else(|| {
            info!("🪛️ GSS_SIMULATOR_SECRET is not set. Simulated callbacks will be signed with the well-known test key.");
            DEFAULT_SIMULATOR_SECRET.to_string()
        });
        Self { key_id, secret: Secret::new(secret) }
    }
}

impl StripeSettings {
    pub fn from_env_or_defaults(required: bool) -> Self {
        let read_secret = |name: &str| {
            let value = env::var(name).ok().unwrap_or_else(|| {
                if required {
                    error!("🪛️ {name} is not set. The Stripe gateway cannot work without it.");
                }
                String::default()
            });
            Secret::new(value)
        };
        let secret_key = read_secret("GSS_STRIPE_SECRET_KEY");
        let webhook_secret = read_secret("GSS_STRIPE_WEBHOOK_SECRET");
        let publishable_key = env::var("GSS_STRIPE_PUBLISHABLE_KEY").ok().unwrap_or_default();
        let api_url = env::var("GSS_STRIPE_API_URL").ok().unwrap_or_else(|| DEFAULT_STRIPE_API_URL.to_string());
        let tolerance_secs = parse_env("GSS_WEBHOOK_TOLERANCE_SECS", DEFAULT_WEBHOOK_TOLERANCE_SECS);
        Self { api_url, secret_key, publishable_key, webhook_secret, tolerance_secs }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
/// Access tokens are issued by the external auth service. The server only needs the shared HS256 secret to verify
/// them.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. No token issued by \
             the auth service will be accepted. 🚨️🚨️🚨️"
        );
        let mut bytes = [0u8; 32];
        thread_rng().fill_bytes(&mut bytes);
        let secret = bytes.iter().map(|b| format!("{b:02x}")).collect::<String>();
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "jwt_secret": secret }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production instance, \
                         you are doing it wrong! Set the GSS_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret. ");
            },
        }
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("GSS_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [GSS_JWT_SECRET]")))?;
        if secret.trim().is_empty() {
            return Err(ServerError::ConfigurationError("GSS_JWT_SECRET is empty".to_string()));
        }
        Ok(Self::new(secret))
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// The part of the server configuration that route handlers need. Holds no secrets.
#[derive(Clone, Debug, Default)]
pub struct ServerOptions {
    pub payment_provider: PaymentProvider,
    pub webhook_signature_header: Option<String>,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            payment_provider: config.payment_provider,
            webhook_signature_header: config.webhook_signature_header.clone(),
        }
    }

    /// The header webhook signatures are read from: the configured override, or else the gateway's own header.
    pub fn signature_header<'a>(&'a self, gateway_header: &'a str) -> &'a str {
        self.webhook_signature_header.as_deref().unwrap_or(gateway_header)
    }
}
