use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Args;
use ignition::{init_logging, CapturedError, HttpTransport, Ignition, IgnitionConfig, ReportTransport};

const TEST_CLASS: &str = "ignition::TestException";
const TEST_MESSAGE: &str = "This is an exception to test if the integration with Flare works.";

#[derive(Args)]
pub struct TestArgs {
    /// Configuration file (toml, yaml or json)
    #[arg(long, short)]
    config: Option<PathBuf>,
}

impl TestArgs {
    pub async fn run(&self) -> anyhow::Result<()> {
        let config = IgnitionConfig::load(self.config.as_deref()).context("Failed to load configuration")?;
        init_logging(&config.logging, None)?;

        let Some(key) = config.flare.key.clone().filter(|k| !k.is_empty()) else {
            bail!("No Flare API key is set. Set `flare.key` or IGNITION__FLARE__KEY.");
        };
        println!("✅ Flare key specified");

        let transport = HttpTransport::new(&config.flare.base_url, key)?;
        let ignition = Ignition::from_config(config)?;
        ignition.boot();

        let report = ignition.flare().report(&CapturedError::new(TEST_CLASS, TEST_MESSAGE));
        // delivered below so that a rejection is shown instead of only logged
        ignition.flare().reset();

        transport.send(&report).await.with_context(|| {
            format!("Could not send the test report to {}", transport.endpoint())
        })?;

        println!("We tried to send an exception to Flare. Please check if it arrived!");
        println!("Tracking uuid: {}", report.tracking_uuid);
        Ok(())
    }
}
