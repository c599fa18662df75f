use crate::captured::CapturedError;
use crate::solutions::{Solution, SolutionProvider};

/// Explains how to generate a missing application encryption key
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingAppKeySolutionProvider;

impl MissingAppKeySolutionProvider {
    pub const NAME: &'static str = "missing_app_key";
}

impl SolutionProvider for MissingAppKeySolutionProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn can_solve(&self, error: &CapturedError) -> bool {
        error.message() == "No application encryption key has been specified."
    }

    fn solutions(&self, _error: &CapturedError) -> Vec<Solution> {
        vec![Solution::new("Your app key is missing")
            .description("Generate your application encryption key using `php artisan key:generate`.")
            .link("Application key docs", "https://laravel.com/docs/master/installation#application-key")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_exact_message_only() {
        let provider = MissingAppKeySolutionProvider;
        assert!(provider.can_solve(&CapturedError::new("RuntimeException", "No application encryption key has been specified.")));
        assert!(!provider.can_solve(&CapturedError::new("RuntimeException", "")));
        assert!(!provider.can_solve(&CapturedError::without_message("RuntimeException")));
    }
}
