use crate::captured::CapturedError;
use crate::solutions::{Solution, SolutionProvider};

/// Suggests building front-end assets when the Mix manifest is missing
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingMixManifestSolutionProvider;

impl MissingMixManifestSolutionProvider {
    pub const NAME: &'static str = "missing_mix_manifest";
}

impl SolutionProvider for MissingMixManifestSolutionProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn can_solve(&self, error: &CapturedError) -> bool {
        error.message().contains("Mix manifest not found")
    }

    fn solutions(&self, _error: &CapturedError) -> Vec<Solution> {
        vec![Solution::new("Missing Mix Manifest File")
            .description("Did you forget to run `npm install && npm run dev`?")]
    }
}

/// Suggests building front-end assets when the Vite manifest is missing
#[derive(Debug, Clone)]
pub struct MissingViteManifestSolutionProvider {
    stage: String,
}

impl MissingViteManifestSolutionProvider {
    pub const NAME: &'static str = "missing_vite_manifest";

    pub fn new<S: Into<String>>(stage: S) -> Self {
        Self { stage: stage.into() }
    }
}

impl SolutionProvider for MissingViteManifestSolutionProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn can_solve(&self, error: &CapturedError) -> bool {
        error.message().starts_with("Vite manifest not found")
    }

    fn solutions(&self, _error: &CapturedError) -> Vec<Solution> {
        let description = if self.stage == "local" {
            "Did you forget to run `npm install && npm run dev`?"
        } else {
            "Did you forget to run `npm ci && npm run build` in your deployment script?"
        };

        vec![Solution::new("Missing Vite Manifest File")
            .description(description)
            .link("Asset bundling with Vite", "https://laravel.com/docs/master/vite#running-vite")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_manifest_message_variants() {
        let provider = MissingMixManifestSolutionProvider;
        assert!(provider.can_solve(&CapturedError::new("Exception", "Mix manifest not found.")));
        assert!(provider.can_solve(&CapturedError::new("Exception", "Mix manifest not found at: /public/mix-manifest.json")));
        assert!(!provider.can_solve(&CapturedError::new("Exception", "Vite manifest not found at: /build/manifest.json")));
        assert!(!provider.can_solve(&CapturedError::without_message("Exception")));
    }

    #[test]
    fn test_vite_manifest_depends_on_stage() {
        let error = CapturedError::new("ViteManifestNotFoundException", "Vite manifest not found at: /public/build/manifest.json");

        let local = MissingViteManifestSolutionProvider::new("local");
        assert!(local.can_solve(&error));
        assert!(local.solutions(&error)[0].description.contains("npm run dev"));

        let production = MissingViteManifestSolutionProvider::new("production");
        assert!(production.solutions(&error)[0].description.contains("npm run build"));
    }
}
