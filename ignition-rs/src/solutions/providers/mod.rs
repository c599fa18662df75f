//! Built-in solution providers.
//!
//! | identifier | recognizes |
//! |---|---|
//! | `missing_mix_manifest` | a missing Mix manifest |
//! | `missing_vite_manifest` | a missing Vite manifest |
//! | `missing_app_key` | an unset encryption key |
//! | `route_not_defined` | a typo in a route name |
//! | `view_not_found` | a typo in a view name |
//! | `undefined_view_variable` | a typo in a variable passed to a view |
//! | `unknown_validation_rule` | a typo in a validation rule |
//! | `table_not_found` | a query on a table that does not exist |
//! | `missing_column` | a query on a column that does not exist |

use std::sync::Arc;

use super::{KnownNames, Solution, SolutionProvider};
use crate::similarity::NameSimilarityRanker;

mod app_key;
mod database;
mod manifest;
mod route;
mod validation;
mod view;

pub use app_key::MissingAppKeySolutionProvider;
pub use database::{MissingColumnSolutionProvider, TableNotFoundSolutionProvider};
pub use manifest::{MissingMixManifestSolutionProvider, MissingViteManifestSolutionProvider};
pub use route::RouteNotDefinedSolutionProvider;
pub use validation::UnknownValidationSolutionProvider;
pub use view::{UndefinedViewVariableSolutionProvider, ViewNotFoundSolutionProvider};

/// Every built-in provider identifier, in default registration order
pub const BUILTIN_PROVIDERS: &[&str] = &[
    MissingMixManifestSolutionProvider::NAME,
    MissingViteManifestSolutionProvider::NAME,
    MissingAppKeySolutionProvider::NAME,
    RouteNotDefinedSolutionProvider::NAME,
    ViewNotFoundSolutionProvider::NAME,
    UndefinedViewVariableSolutionProvider::NAME,
    UnknownValidationSolutionProvider::NAME,
    TableNotFoundSolutionProvider::NAME,
    MissingColumnSolutionProvider::NAME,
];

/// What the built-in providers need from the host
#[derive(Debug, Clone)]
pub struct ProviderContext {
    pub known_names: KnownNames,
    pub ranker: NameSimilarityRanker,
    /// Deployment stage, e.g. `local` or `production`
    pub stage: String,
}

impl Default for ProviderContext {
    fn default() -> Self {
        Self {
            known_names: KnownNames::default(),
            ranker: NameSimilarityRanker::default(),
            stage: "local".to_string(),
        }
    }
}

/// Instantiates the built-in provider with the given identifier
pub fn builtin(name: &str, context: &ProviderContext) -> Option<Arc<dyn SolutionProvider>> {
    let ranker = context.ranker;
    let names = &context.known_names;

    let provider: Arc<dyn SolutionProvider> = match name {
        MissingMixManifestSolutionProvider::NAME => Arc::new(MissingMixManifestSolutionProvider),
        MissingViteManifestSolutionProvider::NAME => {
            Arc::new(MissingViteManifestSolutionProvider::new(context.stage.clone()))
        }
        MissingAppKeySolutionProvider::NAME => Arc::new(MissingAppKeySolutionProvider),
        RouteNotDefinedSolutionProvider::NAME => {
            Arc::new(RouteNotDefinedSolutionProvider::new(Arc::clone(&names.routes), ranker))
        }
        ViewNotFoundSolutionProvider::NAME => {
            Arc::new(ViewNotFoundSolutionProvider::new(Arc::clone(&names.views), ranker))
        }
        UndefinedViewVariableSolutionProvider::NAME => Arc::new(UndefinedViewVariableSolutionProvider::new(ranker)),
        UnknownValidationSolutionProvider::NAME => {
            Arc::new(UnknownValidationSolutionProvider::new(Arc::clone(&names.validation_rules), ranker))
        }
        TableNotFoundSolutionProvider::NAME => Arc::new(TableNotFoundSolutionProvider),
        MissingColumnSolutionProvider::NAME => Arc::new(MissingColumnSolutionProvider),
        _ => return None,
    };

    Some(provider)
}

/// Formats the "did you mean" suggestion shared by the typo providers
pub(crate) fn did_you_mean(suggestion: &str) -> String {
    format!("Did you mean `{}`?", suggestion)
}

/// Solution hinting at pending migrations, shared by the database providers
pub(crate) fn migrations_solution(title: &str) -> Solution {
    Solution::new(title)
        .description("You might have forgotten to run your database migrations.")
        .link("Database: Running Migrations docs", "https://laravel.com/docs/master/migrations#running-migrations")
}
