use std::fmt::{self, Display, Formatter};

use log::*;
use mpg_common::Secret;
use serde::{Deserialize, Serialize};

pub const SANDBOX_BASE_URL: &str = "https://cybqa.pesapal.com/pesapalv3";
pub const LIVE_BASE_URL: &str = "https://pay.pesapal.com/v3";

const DEFAULT_CALLBACK_URL: &str = "https://makao.properties/visits/payment-complete";

/// Which PesaPal deployment the client talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Sandbox,
    Live,
}

impl Environment {
    pub fn base_url(self) -> &'static str {
        match self {
            Environment::Sandbox => SANDBOX_BASE_URL,
            Environment::Live => LIVE_BASE_URL,
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Sandbox => write!(f, "sandbox"),
            Environment::Live => write!(f, "live"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PesapalConfig {
    /// OAuth consumer key from the PesaPal merchant dashboard.
    pub consumer_key: String,
    pub consumer_secret: Secret<String>,
    /// Registered IPN id, sent as `notification_id` with every order.
    pub ipn_id: String,
    /// Where the gateway sends the payer after the hosted payment page.
    pub callback_url: String,
    pub environment: Environment,
    /// Overrides the environment's canonical base URL.
    pub base_url: Option<String>,
    /// Secondary base URL, tried when the primary keeps dropping connections.
    pub fallback_url: Option<String>,
}

impl PesapalConfig {
    pub fn new_from_env_or_default() -> Self {
        let consumer_key = std::env::var("MPG_PESAPAL_CONSUMER_KEY").unwrap_or_else(|_| {
            warn!("MPG_PESAPAL_CONSUMER_KEY not set. The client will not be able to authenticate.");
            String::default()
        });
        let consumer_secret = Secret::from_env("MPG_PESAPAL_CONSUMER_SECRET");
        if !consumer_secret.is_set() {
            warn!("MPG_PESAPAL_CONSUMER_SECRET not set. The client will not be able to authenticate.");
        }
        let ipn_id = std::env::var("MPG_PESAPAL_IPN_ID").unwrap_or_else(|_| {
            warn!("MPG_PESAPAL_IPN_ID not set. The gateway will reject order submissions.");
            String::default()
        });
        let callback_url = std::env::var("MPG_PESAPAL_CALLBACK_URL").unwrap_or_else(|_| {
            warn!("MPG_PESAPAL_CALLBACK_URL not set, using {DEFAULT_CALLBACK_URL}");
            DEFAULT_CALLBACK_URL.to_string()
        });
        let environment = match std::env::var("MPG_PESAPAL_ENVIRONMENT") {
            Ok(value) => match value.to_lowercase().as_str() {
                "live" | "production" => Environment::Live,
                "sandbox" => Environment::Sandbox,
                other => {
                    warn!("MPG_PESAPAL_ENVIRONMENT has unknown value '{other}', using sandbox");
                    Environment::Sandbox
                },
            },
            Err(_) => Environment::Sandbox,
        };
        let base_url = std::env::var("MPG_PESAPAL_BASE_URL").ok();
        let fallback_url = std::env::var("MPG_PESAPAL_FALLBACK_URL").ok();
        Self { consumer_key, consumer_secret, ipn_id, callback_url, environment, base_url, fallback_url }
    }

    /// The base URL tried first: an explicit override, or the environment's canonical host.
    pub fn primary_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| self.environment.base_url().to_string())
    }

    /// True when both credentials are present. Checks nothing over the network.
    pub fn is_configured(&self) -> bool {
        !self.consumer_key.trim().is_empty() && self.consumer_secret.is_set()
    }

    pub fn status(&self) -> ConfigStatus {
        ConfigStatus {
            consumer_key: !self.consumer_key.trim().is_empty(),
            consumer_secret: self.consumer_secret.is_set(),
            ipn_id: !self.ipn_id.trim().is_empty(),
            callback_url: !self.callback_url.trim().is_empty(),
            environment: self.environment,
        }
    }
}

/// Reports which configuration values are present, never the values themselves.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConfigStatus {
    pub consumer_key: bool,
    pub consumer_secret: bool,
    pub ipn_id: bool,
    pub callback_url: bool,
    pub environment: Environment,
}

impl ConfigStatus {
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.consumer_key {
            missing.push("consumer key");
        }
        if !self.consumer_secret {
            missing.push("consumer secret");
        }
        if !self.ipn_id {
            missing.push("IPN id");
        }
        if !self.callback_url {
            missing.push("callback URL");
        }
        missing
    }
}

impl Display for ConfigStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let missing = self.missing();
        if missing.is_empty() {
            write!(f, "PesaPal {} environment, fully configured", self.environment)
        } else {
            write!(f, "PesaPal {} environment, missing: {}", self.environment, missing.join(", "))
        }
    }
}
