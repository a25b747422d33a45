use crate::{config::Credentials, error::GatewayError, gateway_client::GatewayApi};
use anyhow::Result;
use log::info;
use reqwest::StatusCode;
use std::fmt;

/// How a completed run ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// MoCA was already on; nothing was sent to the config endpoint
    AlreadyEnabled,
    /// The gateway accepted the enable request
    Enabled,
    /// The gateway answered the enable request with a non-200 status
    EnableRejected(StatusCode),
}

impl Outcome {
    /// Process exit code for this outcome
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Enabled | Outcome::EnableRejected(_) => 0,
            Outcome::AlreadyEnabled => 2,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::AlreadyEnabled => write!(f, "MoCA is already enabled"),
            Outcome::Enabled => write!(f, "successfully enabled MoCA"),
            Outcome::EnableRejected(status) => {
                write!(f, "failed to enable MoCA: gateway returned {status}")
            }
        }
    }
}

/// Log in, check the MoCA state and enable it when it is off
pub fn run(gateway: &impl GatewayApi, credentials: &Credentials) -> Result<Outcome> {
    info!("acquiring authorization tokens...");

    let status = gateway.login(&credentials.username, &credentials.password)?;
    if status != StatusCode::OK {
        return Err(GatewayError::AuthorizationFailed(status).into());
    }

    info!("querying MoCA status...");

    if gateway.moca_enabled()? {
        return Ok(Outcome::AlreadyEnabled);
    }

    info!("attempting to enable MoCA...");

    let status = gateway.enable_moca(&credentials.username)?;
    if status == StatusCode::OK {
        Ok(Outcome::Enabled)
    } else {
        Ok(Outcome::EnableRejected(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway_client::MockGatewayApi;
    use anyhow::anyhow;
    use mockall::predicate::eq;

    fn credentials() -> Credentials {
        Credentials {
            username: "alice".to_string(),
            password: "secret".to_string(),
        }
    }

    fn logged_in() -> MockGatewayApi {
        let mut gateway = MockGatewayApi::new();
        gateway
            .expect_login()
            .with(eq("alice"), eq("secret"))
            .times(1)
            .returning(|_, _| Ok(StatusCode::OK));
        gateway
    }

    #[test]
    fn enables_when_disabled() {
        let mut gateway = logged_in();
        gateway.expect_moca_enabled().times(1).returning(|| Ok(false));
        gateway
            .expect_enable_moca()
            .with(eq("alice"))
            .times(1)
            .returning(|_| Ok(StatusCode::OK));

        let outcome = run(&gateway, &credentials()).unwrap();
        assert_eq!(outcome, Outcome::Enabled);
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn rejected_enable_is_soft_failure() {
        let mut gateway = logged_in();
        gateway.expect_moca_enabled().returning(|| Ok(false));
        gateway
            .expect_enable_moca()
            .returning(|_| Ok(StatusCode::INTERNAL_SERVER_ERROR));

        let outcome = run(&gateway, &credentials()).unwrap();
        assert_eq!(
            outcome,
            Outcome::EnableRejected(StatusCode::INTERNAL_SERVER_ERROR)
        );
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn already_enabled_skips_enable() {
        let mut gateway = logged_in();
        gateway.expect_moca_enabled().returning(|| Ok(true));
        gateway.expect_enable_moca().never();

        let outcome = run(&gateway, &credentials()).unwrap();
        assert_eq!(outcome, Outcome::AlreadyEnabled);
        assert_ne!(outcome.exit_code(), 0);
    }

    #[test]
    fn failed_login_halts_flow() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::INTERNAL_SERVER_ERROR] {
            let mut gateway = MockGatewayApi::new();
            gateway.expect_login().returning(move |_, _| Ok(status));
            gateway.expect_moca_enabled().never();
            gateway.expect_enable_moca().never();

            let err = run(&gateway, &credentials()).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<GatewayError>(),
                Some(GatewayError::AuthorizationFailed(s)) if *s == status
            ));
        }
    }

    #[test]
    fn status_error_halts_flow() {
        let mut gateway = logged_in();
        gateway
            .expect_moca_enabled()
            .returning(|| Err(GatewayError::MissingCsrfToken.into()));
        gateway.expect_enable_moca().never();

        let err = run(&gateway, &credentials()).unwrap_err();
        assert!(err.to_string().contains("csrfp_token"));
    }

    #[test]
    fn transport_error_on_enable_is_fatal() {
        let mut gateway = logged_in();
        gateway.expect_moca_enabled().returning(|| Ok(false));
        gateway
            .expect_enable_moca()
            .returning(|_| Err(anyhow!("connection refused")));

        assert!(run(&gateway, &credentials()).is_err());
    }

    #[test]
    fn outcomes_are_described() {
        assert_eq!(Outcome::AlreadyEnabled.to_string(), "MoCA is already enabled");
        assert_eq!(Outcome::Enabled.to_string(), "successfully enabled MoCA");
        assert_eq!(
            Outcome::EnableRejected(StatusCode::FORBIDDEN).to_string(),
            "failed to enable MoCA: gateway returned 403 Forbidden"
        );
    }
}
