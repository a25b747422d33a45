use anyhow::Result;
use env_logger::{Builder, Env, Target};
use gateway_moca::{GatewayClient, GatewayConfig, Outcome, flow};
use log::{error, info, warn};
use std::io::Write;

fn main() {
    log_panics::init();
    init_logger();

    info!("module version: {}", env!("CARGO_PKG_VERSION"));

    match run() {
        Ok(outcome) => {
            match outcome {
                Outcome::Enabled => info!("{outcome}"),
                Outcome::EnableRejected(_) => warn!("{outcome}"),
                Outcome::AlreadyEnabled => error!("{outcome}"),
            }
            std::process::exit(outcome.exit_code());
        }
        Err(e) => {
            error!("application error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<Outcome> {
    let config = GatewayConfig::load()?;
    let gateway = GatewayClient::new(config.base_url)?;

    flow::run(&gateway, &config.credentials)
}

fn init_logger() {
    let mut builder = if cfg!(debug_assertions) {
        Builder::from_env(Env::default().default_filter_or("debug"))
    } else {
        Builder::from_env(Env::default().default_filter_or("info"))
    };

    builder.format(|f, record| match record.level() {
        log::Level::Error => {
            eprintln!("{}", record.args());
            Ok(())
        }
        _ => {
            writeln!(f, "{}", record.args())
        }
    });

    builder.target(Target::Stdout).init();
}
