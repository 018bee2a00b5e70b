//! # Realm Bootstrap
//!
//! Provisions a realm, application client, user and password on an
//! identity provider and exits non-zero when any step fails.

mod cli;
mod output;

use clap::Parser;
use std::sync::Arc;

use realm_bootstrap::{
    wait_until_ready, BootstrapResult, LogLevel, LoggingConfig, Orchestrator,
    ReqwestHttpTransport, TracingEventSink,
};

use crate::cli::Cli;

/// Exit code when the run could not start.
const EXIT_SETUP_FAILED: i32 = 1;

fn main() {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        },
        format: cli.log_format,
        ..Default::default()
    };
    if let Err(e) = logging.init() {
        output::warning(&format!("Failed to initialize logging: {}", e));
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            output::error(&format!("Failed to start runtime: {}", e));
            std::process::exit(EXIT_SETUP_FAILED);
        }
    };

    let code = match runtime.block_on(run(&cli)) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(code = e.error_code(), error = %e, "provisioning could not start");
            output::error(&e.to_string());
            EXIT_SETUP_FAILED
        }
    };
    std::process::exit(code);
}

async fn run(cli: &Cli) -> BootstrapResult<i32> {
    let config = cli.config_builder().build()?;
    let plan = cli.plan()?;
    let transport = Arc::new(ReqwestHttpTransport::with_config(&config.transport)?);

    tracing::info!(
        url = %config.base_url,
        realm = %plan.realm.realm,
        verify_tls = config.transport.verify_tls,
        "starting provisioning"
    );

    if !cli.skip_wait {
        wait_until_ready(transport.as_ref(), &config.base_url, &cli.readiness()).await?;
    }

    let orchestrator =
        Orchestrator::from_config(&config, transport)?.with_event_sink(Arc::new(TracingEventSink));
    let report = orchestrator.run(&plan).await;

    if cli.json {
        if let Err(e) = output::json(&report) {
            output::error(&format!("Failed to encode report: {}", e));
        }
    } else {
        output::summary(&report);
    }

    Ok(report.exit_code())
}
