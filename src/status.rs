use crate::error::GatewayError;
use serde::Deserialize;
use serde_json::Value;

/// Response of `actionHandler/ajaxSet_userbar.php`
///
/// Only `mainStatus` is of interest; the gateway reports the MoCA state as the
/// string `"true"` or `"false"` at index 2.
#[derive(Debug, Deserialize)]
pub struct UserbarStatus {
    #[serde(rename = "mainStatus")]
    main_status: Vec<Value>,
}

impl UserbarStatus {
    const MOCA_INDEX: usize = 2;

    /// Decode a raw response body, validating the shape of `mainStatus`
    pub fn decode(body: &str) -> Result<Self, GatewayError> {
        let status: Self = serde_json::from_str(body)
            .map_err(|e| GatewayError::MalformedStatus(format!("failed to parse body: {e}")))?;

        if status.main_status.len() <= Self::MOCA_INDEX {
            return Err(GatewayError::MalformedStatus(format!(
                "mainStatus has {} entries, expected at least {}",
                status.main_status.len(),
                Self::MOCA_INDEX + 1
            )));
        }

        Ok(status)
    }

    pub fn moca_enabled(&self) -> bool {
        self.main_status
            .get(Self::MOCA_INDEX)
            .and_then(Value::as_str)
            .is_some_and(|v| v == "true")
    }
}
