//! # Solutions
//!
//! Human readable fixes for common errors. A [`SolutionProvider`] recognizes
//! one error pattern; the [`SolutionProviderRepository`] asks every
//! registered provider in order and collects what they propose.

use serde::{Deserialize, Serialize};

use crate::captured::CapturedError;

mod catalog;
pub mod providers;
mod repository;

pub use catalog::{KnownNames, NameCatalog, NameRegistry};
pub use repository::SolutionProviderRepository;

/// A titled link to documentation about a solution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationLink {
    pub title: String,
    pub url: String,
}

/// A suggested fix for an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub links: Vec<DocumentationLink>,
}

impl Solution {
    /// Creates a solution with a title and no description
    pub fn new<S: Into<String>>(title: S) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            links: Vec::new(),
        }
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    pub fn link<T: Into<String>, U: Into<String>>(mut self, title: T, url: U) -> Self {
        self.links.push(DocumentationLink {
            title: title.into(),
            url: url.into(),
        });
        self
    }
}

/// Recognizes an error pattern and proposes fixes for it
///
/// Implementations must be cheap and must not perform I/O. `solutions` is
/// only called after `can_solve` returned true for the same error.
pub trait SolutionProvider: Send + Sync {
    /// Identifier used in configuration
    fn name(&self) -> &'static str;

    fn can_solve(&self, error: &CapturedError) -> bool;

    fn solutions(&self, error: &CapturedError) -> Vec<Solution>;
}
