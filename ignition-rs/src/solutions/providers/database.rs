use super::migrations_solution;
use crate::captured::CapturedError;
use crate::solutions::{Solution, SolutionProvider};

/// Points at pending migrations when a query hits a missing table
#[derive(Debug, Clone, Copy, Default)]
pub struct TableNotFoundSolutionProvider;

impl TableNotFoundSolutionProvider {
    pub const NAME: &'static str = "table_not_found";
}

impl SolutionProvider for TableNotFoundSolutionProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn can_solve(&self, error: &CapturedError) -> bool {
        error.message().contains("Base table or view not found")
    }

    fn solutions(&self, _error: &CapturedError) -> Vec<Solution> {
        vec![migrations_solution("A table was not found")]
    }
}

/// Points at pending migrations when a query hits a missing column
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingColumnSolutionProvider;

impl MissingColumnSolutionProvider {
    pub const NAME: &'static str = "missing_column";
}

impl SolutionProvider for MissingColumnSolutionProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn can_solve(&self, error: &CapturedError) -> bool {
        error.message().contains("Unknown column")
    }

    fn solutions(&self, _error: &CapturedError) -> Vec<Solution> {
        vec![migrations_solution("A column was not found")]
    }
}
