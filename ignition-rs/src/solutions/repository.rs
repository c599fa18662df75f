use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use metrics::counter;

use super::providers::{self, ProviderContext};
use super::{Solution, SolutionProvider};
use crate::captured::CapturedError;
use crate::config::SolutionsConfig;
use crate::error::{IgnitionError, Result};

/// Ordered collection of solution providers
#[derive(Clone, Default)]
pub struct SolutionProviderRepository {
    providers: Vec<Arc<dyn SolutionProvider>>,
}

impl fmt::Debug for SolutionProviderRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolutionProviderRepository")
            .field("providers", &self.names())
            .finish()
    }
}

impl SolutionProviderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the configured built-in providers, in configuration order
    ///
    /// Identifiers listed in `ignored_solution_providers` are skipped. An
    /// identifier without a built-in implementation is a wiring error.
    pub fn from_config(config: &SolutionsConfig, context: &ProviderContext) -> Result<Self> {
        let mut repository = Self::new();

        for name in &config.solution_providers {
            if config.ignored_solution_providers.contains(name) {
                tracing::debug!(provider = %name, "Skipping ignored solution provider");
                continue;
            }

            let provider = providers::builtin(name, context)
                .ok_or_else(|| IgnitionError::UnknownSolutionProvider(name.clone()))?;
            repository.register(provider);
        }

        tracing::debug!(providers = ?repository.names(), "Solution providers registered");
        Ok(repository)
    }

    /// Appends a provider; it is asked after every provider registered before it
    pub fn register(&mut self, provider: Arc<dyn SolutionProvider>) -> &mut Self {
        self.providers.push(provider);
        self
    }

    pub fn register_many<I>(&mut self, providers: I) -> &mut Self
    where
        I: IntoIterator<Item = Arc<dyn SolutionProvider>>,
    {
        self.providers.extend(providers);
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Collects the solutions for an error
    ///
    /// Solutions the error carries come first, then those of every provider
    /// that can solve it, in registration order. A provider that panics is
    /// treated as having nothing to offer.
    pub fn solutions_for(&self, error: &CapturedError) -> Vec<Solution> {
        let mut solutions = error.solutions.clone();

        for provider in &self.providers {
            let name = provider.name();

            let can_solve = match catch_unwind(AssertUnwindSafe(|| provider.can_solve(error))) {
                Ok(can_solve) => can_solve,
                Err(_) => {
                    tracing::warn!(provider = %name, class = %error.class, "Solution provider panicked in can_solve");
                    false
                }
            };
            if !can_solve {
                continue;
            }

            match catch_unwind(AssertUnwindSafe(|| provider.solutions(error))) {
                Ok(found) => {
                    counter!("ignition.solutions.matched", found.len() as u64);
                    solutions.extend(found);
                }
                Err(_) => {
                    tracing::warn!(provider = %name, class = %error.class, "Solution provider panicked in solutions");
                }
            }
        }

        solutions
    }
}
