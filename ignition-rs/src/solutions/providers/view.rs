use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use super::did_you_mean;
use crate::captured::CapturedError;
use crate::similarity::NameSimilarityRanker;
use crate::solutions::{NameCatalog, Solution, SolutionProvider};

static VIEW_NOT_FOUND: Lazy<Regex> = Lazy::new(|| Regex::new(r"View \[(.*)\] not found").unwrap());
static UNDEFINED_VARIABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Undefined variable:? \$?(\w+)").unwrap());

/// Suggests the closest known view for a view that could not be found
pub struct ViewNotFoundSolutionProvider {
    views: Arc<dyn NameCatalog>,
    ranker: NameSimilarityRanker,
}

impl ViewNotFoundSolutionProvider {
    pub const NAME: &'static str = "view_not_found";

    pub fn new(views: Arc<dyn NameCatalog>, ranker: NameSimilarityRanker) -> Self {
        Self { views, ranker }
    }

    fn missing_view(error: &CapturedError) -> Option<&str> {
        VIEW_NOT_FOUND
            .captures(error.message())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

impl SolutionProvider for ViewNotFoundSolutionProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn can_solve(&self, error: &CapturedError) -> bool {
        (error.is("InvalidArgumentException") || error.is("ViewNotFoundException"))
            && Self::missing_view(error).is_some()
    }

    fn solutions(&self, error: &CapturedError) -> Vec<Solution> {
        let Some(missing) = Self::missing_view(error) else {
            return Vec::new();
        };

        let description = match self.ranker.best_match(missing, self.views.names()) {
            Some(suggested) => did_you_mean(&suggested),
            None => "Are you sure the view exists?".to_string(),
        };

        vec![Solution::new(format!("{} was not found.", missing)).description(description)]
    }
}

/// Suggests a variable passed to the view when a template uses an undefined one
///
/// The variables handed to the view are read from the `view_data` object in
/// the error context.
pub struct UndefinedViewVariableSolutionProvider {
    ranker: NameSimilarityRanker,
}

impl UndefinedViewVariableSolutionProvider {
    pub const NAME: &'static str = "undefined_view_variable";

    pub fn new(ranker: NameSimilarityRanker) -> Self {
        Self { ranker }
    }

    fn undefined_variable(error: &CapturedError) -> Option<&str> {
        UNDEFINED_VARIABLE
            .captures(error.message())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    fn view_variables(error: &CapturedError) -> Option<Vec<String>> {
        error
            .context
            .get("view_data")
            .and_then(|data| data.as_object())
            .map(|data| data.keys().cloned().collect())
    }
}

impl SolutionProvider for UndefinedViewVariableSolutionProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn can_solve(&self, error: &CapturedError) -> bool {
        Self::undefined_variable(error).is_some() && Self::view_variables(error).is_some()
    }

    fn solutions(&self, error: &CapturedError) -> Vec<Solution> {
        let (Some(variable), Some(passed)) = (Self::undefined_variable(error), Self::view_variables(error)) else {
            return Vec::new();
        };

        let solution = match self.ranker.best_match(variable, passed) {
            Some(suggested) => Solution::new(format!("Possible typo `${}`", variable))
                .description(format!("Did you mean `${}`?", suggested)),
            None => Solution::new(format!("`${}` is undefined", variable))
                .description(format!("Make sure to pass `${}` to the view.", variable)),
        };

        vec![solution]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solutions::NameRegistry;
    use serde_json::json;

    #[test]
    fn test_view_not_found_suggests_close_view() {
        let views = Arc::new(NameRegistry::from_names(["welcome", "users.index"]));
        let provider = ViewNotFoundSolutionProvider::new(views, NameSimilarityRanker::default());
        let error = CapturedError::new("InvalidArgumentException", "View [welcom] not found.");

        assert!(provider.can_solve(&error));
        let solution = &provider.solutions(&error)[0];
        assert_eq!(solution.title, "welcom was not found.");
        assert_eq!(solution.description, "Did you mean `welcome`?");
    }

    #[test]
    fn test_view_not_found_without_candidate() {
        let provider = ViewNotFoundSolutionProvider::new(Arc::new(NameRegistry::new()), NameSimilarityRanker::default());
        let error = CapturedError::new("InvalidArgumentException", "View [admin.reports] not found.");

        assert_eq!(provider.solutions(&error)[0].description, "Are you sure the view exists?");
        assert!(!provider.can_solve(&CapturedError::new("RuntimeException", "View [admin.reports] not found.")));
    }

    #[test]
    fn test_undefined_variable_typo() {
        let provider = UndefinedViewVariableSolutionProvider::new(NameSimilarityRanker::default());
        let error = CapturedError::new("ErrorException", "Undefined variable $usrs")
            .context("view_data", json!({ "users": [], "title": "Users" }));

        assert!(provider.can_solve(&error));
        let solution = &provider.solutions(&error)[0];
        assert_eq!(solution.title, "Possible typo `$usrs`");
        assert_eq!(solution.description, "Did you mean `$users`?");
    }

    #[test]
    fn test_undefined_variable_not_passed() {
        let provider = UndefinedViewVariableSolutionProvider::new(NameSimilarityRanker::default());
        let error = CapturedError::new("ErrorException", "Undefined variable: invoice")
            .context("view_data", json!({ "title": "Invoices" }));

        let solution = &provider.solutions(&error)[0];
        assert_eq!(solution.title, "`$invoice` is undefined");
        assert_eq!(solution.description, "Make sure to pass `$invoice` to the view.");
    }

    #[test]
    fn test_undefined_variable_needs_view_data() {
        let provider = UndefinedViewVariableSolutionProvider::new(NameSimilarityRanker::default());
        assert!(!provider.can_solve(&CapturedError::new("ErrorException", "Undefined variable $user")));
    }
}
