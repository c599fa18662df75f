use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use ignition::solutions::providers::ProviderContext;
use ignition::{CapturedError, IgnitionConfig, KnownNames, NameRegistry, SolutionProviderRepository};

#[derive(Args)]
pub struct SolutionsArgs {
    /// Error class, e.g. `RouteNotFoundException`
    #[arg(long)]
    class: String,
    #[arg(long)]
    message: Option<String>,
    /// Known route name, may be repeated
    #[arg(long = "route")]
    routes: Vec<String>,
    /// Known view name, may be repeated
    #[arg(long = "view")]
    views: Vec<String>,
    /// Configuration file (toml, yaml or json)
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Print the solutions as JSON
    #[arg(long)]
    json: bool,
}

impl SolutionsArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        let config = IgnitionConfig::load(self.config.as_deref()).context("Failed to load configuration")?;

        let known_names = KnownNames::default()
            .routes(Arc::new(NameRegistry::from_names(self.routes.iter().cloned())))
            .views(Arc::new(NameRegistry::from_names(self.views.iter().cloned())));
        let context = ProviderContext {
            known_names,
            ranker: config.ignition.ranker(),
            stage: config.flare.stage.clone(),
        };
        let repository = SolutionProviderRepository::from_config(&config.ignition, &context)?;

        let error = match &self.message {
            Some(message) => CapturedError::new(self.class.as_str(), message.as_str()),
            None => CapturedError::without_message(self.class.as_str()),
        };
        let solutions = repository.solutions_for(&error);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&solutions)?);
            return Ok(());
        }

        if solutions.is_empty() {
            println!("No solutions found for {}", error.short_class());
            return Ok(());
        }

        for solution in &solutions {
            println!("{}", solution.title);
            if !solution.description.is_empty() {
                println!("  {}", solution.description);
            }
            for link in &solution.links {
                println!("  {}: {}", link.title, link.url);
            }
        }
        Ok(())
    }
}
