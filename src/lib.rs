pub mod config;
pub mod error;
pub mod flow;
pub mod gateway_client;
pub mod status;

pub use config::{Credentials, GatewayConfig};
pub use error::GatewayError;
pub use flow::Outcome;
pub use gateway_client::{GatewayApi, GatewayClient};
