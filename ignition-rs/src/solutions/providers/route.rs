use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use super::did_you_mean;
use crate::captured::CapturedError;
use crate::similarity::NameSimilarityRanker;
use crate::solutions::{NameCatalog, Solution, SolutionProvider};

static ROUTE_NOT_DEFINED: Lazy<Regex> = Lazy::new(|| Regex::new(r"Route \[(.*)\] not defined").unwrap());

/// Suggests the closest registered route name for a missing route
pub struct RouteNotDefinedSolutionProvider {
    routes: Arc<dyn NameCatalog>,
    ranker: NameSimilarityRanker,
}

impl RouteNotDefinedSolutionProvider {
    pub const NAME: &'static str = "route_not_defined";

    pub fn new(routes: Arc<dyn NameCatalog>, ranker: NameSimilarityRanker) -> Self {
        Self { routes, ranker }
    }

    fn missing_route(error: &CapturedError) -> Option<&str> {
        ROUTE_NOT_DEFINED
            .captures(error.message())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

impl SolutionProvider for RouteNotDefinedSolutionProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn can_solve(&self, error: &CapturedError) -> bool {
        error.is("RouteNotFoundException") && Self::missing_route(error).is_some()
    }

    fn solutions(&self, error: &CapturedError) -> Vec<Solution> {
        let Some(missing) = Self::missing_route(error) else {
            return Vec::new();
        };

        let description = match self.ranker.best_match(missing, self.routes.names()) {
            Some(suggested) => did_you_mean(&suggested),
            None => "Are you sure that the route is defined".to_string(),
        };

        vec![Solution::new(format!("{} was not defined.", missing)).description(description)]
    }
}
