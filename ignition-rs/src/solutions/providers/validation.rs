use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use super::did_you_mean;
use crate::captured::CapturedError;
use crate::similarity::NameSimilarityRanker;
use crate::solutions::{NameCatalog, Solution, SolutionProvider};

static UNKNOWN_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Method \[validate(\w+)\] does not exist").unwrap());

/// Suggests the closest validation rule for a rule that does not exist
pub struct UnknownValidationSolutionProvider {
    rules: Arc<dyn NameCatalog>,
    ranker: NameSimilarityRanker,
}

impl UnknownValidationSolutionProvider {
    pub const NAME: &'static str = "unknown_validation_rule";

    pub fn new(rules: Arc<dyn NameCatalog>, ranker: NameSimilarityRanker) -> Self {
        Self { rules, ranker }
    }

    /// The rule name as written by the user, e.g. `required_iff` for `validateRequiredIff`
    fn unknown_rule(error: &CapturedError) -> Option<String> {
        UNKNOWN_RULE
            .captures(error.message())
            .and_then(|caps| caps.get(1))
            .map(|m| snake_case(m.as_str()))
    }
}

impl SolutionProvider for UnknownValidationSolutionProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn can_solve(&self, error: &CapturedError) -> bool {
        error.is("BadMethodCallException") && UNKNOWN_RULE.is_match(error.message())
    }

    fn solutions(&self, error: &CapturedError) -> Vec<Solution> {
        let Some(rule) = Self::unknown_rule(error) else {
            return Vec::new();
        };

        let description = match self.ranker.best_match(&rule, self.rules.names()) {
            Some(suggested) => did_you_mean(&suggested),
            None => format!("`{}` is not a valid rule name.", rule),
        };

        vec![Solution::new("Invalid validation rule")
            .description(description)
            .link("Available validation rules", "https://laravel.com/docs/master/validation#available-validation-rules")]
    }
}

/// Converts `StudlyCase` to `snake_case`
fn snake_case(studly: &str) -> String {
    let mut snake = String::with_capacity(studly.len() + 4);
    for (i, c) in studly.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                snake.push('_');
            }
            snake.extend(c.to_lowercase());
        } else {
            snake.push(c);
        }
    }
    snake
}
