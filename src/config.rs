use crate::error::GatewayError;
use anyhow::Result;
use reqwest::Url;
use std::{env, fmt};

/// Configuration for one run, loaded and validated at startup
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Base URL of the gateway's web interface, always ending with `/`
    pub base_url: Url,

    /// Login credentials for the web interface
    pub credentials: Credentials,
}

#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl GatewayConfig {
    pub const USERNAME_VAR: &str = "GATEWAY_USERNAME";
    pub const PASSWORD_VAR: &str = "GATEWAY_PASSWORD";
    pub const URL_VAR: &str = "GATEWAY_URL";
    pub const DEFAULT_URL: &str = "http://192.168.0.1/";

    /// Load the configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load the configuration through `lookup`, which returns `None` for unset variables
    ///
    /// An empty value is a valid credential; only absence is rejected.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let credentials = Credentials::from_lookup(&lookup)?;
        let base_url = base_url(
            lookup(Self::URL_VAR)
                .as_deref()
                .unwrap_or(Self::DEFAULT_URL),
        )?;

        Ok(Self {
            base_url,
            credentials,
        })
    }
}

impl Credentials {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let username = lookup(GatewayConfig::USERNAME_VAR)
            .ok_or(GatewayError::MissingEnv(GatewayConfig::USERNAME_VAR))?;
        let password = lookup(GatewayConfig::PASSWORD_VAR)
            .ok_or(GatewayError::MissingEnv(GatewayConfig::PASSWORD_VAR))?;

        Ok(Self { username, password })
    }
}

// endpoint paths are relative, so the base must end with "/" for Url::join to keep its path
fn base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|e| GatewayError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(GatewayError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "not a base url".to_string(),
        }
        .into());
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
