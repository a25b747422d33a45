use crate::{error::GatewayError, status::UserbarStatus};
use anyhow::{Context, Result};
use log::debug;
#[cfg(any(test, feature = "mock"))]
use mockall::automock;
use reqwest::{
    StatusCode, Url,
    blocking::{Client, RequestBuilder},
    cookie::{CookieStore, Jar},
    header::{ACCEPT, CONTENT_TYPE, HeaderName, USER_AGENT},
};
use serde::Serialize;
use std::{sync::Arc, time::Duration};

/// Operations offered by the gateway's web interface
///
/// Every call after `login` relies on the session cookies the gateway set during
/// login, so implementations must keep one cookie jar for their whole lifetime.
#[cfg_attr(any(test, feature = "mock"), automock)]
pub trait GatewayApi {
    /// Submit the credentials and return the HTTP status of the login response
    fn login(&self, username: &str, password: &str) -> Result<StatusCode>;

    /// Query whether MoCA is currently enabled
    fn moca_enabled(&self) -> Result<bool>;

    /// Ask the gateway to enable MoCA and return the HTTP status of the response
    fn enable_moca(&self, username: &str) -> Result<StatusCode>;
}

#[derive(Serialize)]
struct LoginForm<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct MocaConfig<'a> {
    moca_enable: &'a str,
    #[serde(rename = "thisUser")]
    this_user: &'a str,
}

#[derive(Serialize)]
struct ConfigForm {
    #[serde(rename = "configInfo")]
    config_info: String,
}

/// Blocking HTTP client holding the gateway session
pub struct GatewayClient {
    client: Client,
    cookies: Arc<Jar>,
    base_url: Url,
}

impl GatewayClient {
    const USER_AGENT: &str = "MoCA_Probe/0.1";
    const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
    const STATUS_ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";
    const CSRF_TOKEN: &str = "csrfp_token";

    // API endpoint constants, relative to the base url
    const LOGIN_ENDPOINT: &str = "check.php";
    const STATUS_ENDPOINT: &str = "actionHandler/ajaxSet_userbar.php";
    const MOCA_CONFIG_ENDPOINT: &str = "actionHandler/ajaxSet_moca_config.php";

    pub fn new(base_url: Url) -> Result<Self> {
        let cookies = Arc::new(Jar::default());

        let client = Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            .timeout(None::<Duration>)
            .build()
            .context("failed to create gateway HTTP client")?;

        Ok(Self {
            client,
            cookies,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Value of the `csrfp_token` cookie the gateway set for the base url
    pub fn csrf_token(&self) -> Result<String> {
        self.cookies
            .cookies(&self.base_url)
            .and_then(|header| {
                header
                    .to_str()
                    .ok()
                    .and_then(|cookies| find_cookie(cookies, Self::CSRF_TOKEN))
                    .map(str::to_string)
            })
            .filter(|token| !token.is_empty())
            .ok_or_else(|| GatewayError::MissingCsrfToken.into())
    }

    fn build_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("failed to build url for {path}"))
    }

    fn post(&self, url: &Url) -> RequestBuilder {
        debug!("POST {url}");

        self.client
            .post(url.clone())
            .header(USER_AGENT, Self::USER_AGENT)
            .header(CONTENT_TYPE, Self::FORM_CONTENT_TYPE)
    }

    /// POST request that echoes the CSRF cookie back as a header
    fn post_with_csrf_token(&self, url: &Url) -> Result<RequestBuilder> {
        let token = self.csrf_token()?;

        Ok(self
            .post(url)
            .header(HeaderName::from_static(Self::CSRF_TOKEN), token))
    }
}

impl GatewayApi for GatewayClient {
    fn login(&self, username: &str, password: &str) -> Result<StatusCode> {
        let url = self.build_url(Self::LOGIN_ENDPOINT)?;
        let body = serde_urlencoded::to_string(LoginForm { username, password })
            .context("failed to encode login form")?;

        let res = self
            .post(&url)
            .body(body)
            .send()
            .with_context(|| format!("failed to send POST request to {url}"))?;

        Ok(res.status())
    }

    fn moca_enabled(&self) -> Result<bool> {
        let url = self.build_url(Self::STATUS_ENDPOINT)?;

        let body = self
            .post_with_csrf_token(&url)?
            .header(ACCEPT, Self::STATUS_ACCEPT)
            .send()
            .with_context(|| format!("failed to send POST request to {url}"))?
            .text()
            .context("failed to read status response body")?;

        Ok(UserbarStatus::decode(&body)?.moca_enabled())
    }

    fn enable_moca(&self, username: &str) -> Result<StatusCode> {
        let url = self.build_url(Self::MOCA_CONFIG_ENDPOINT)?;
        let body = moca_config_form(username)?;

        let res = self
            .post_with_csrf_token(&url)?
            .header(ACCEPT, "*/*")
            .body(body)
            .send()
            .with_context(|| format!("failed to send POST request to {url}"))?;

        Ok(res.status())
    }
}

/// Form body enabling MoCA: a JSON document carried in the `configInfo` field
pub fn moca_config_form(username: &str) -> Result<String> {
    let config_info = serde_json::to_string(&MocaConfig {
        moca_enable: "true",
        this_user: username,
    })
    .context("failed to serialize MoCA config")?;

    serde_urlencoded::to_string(ConfigForm { config_info })
        .context("failed to encode MoCA config form")
}

/// Find a cookie value in a `Cookie` header value (`a=1; b=2`)
fn find_cookie<'a>(cookies: &'a str, name: &str) -> Option<&'a str> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
