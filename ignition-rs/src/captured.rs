//! # Captured Errors
//!
//! The error value that solution providers inspect and reports are built
//! from. Hosts either construct one directly (class name plus message) or
//! capture any [`std::error::Error`].

use std::error::Error as StdError;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::solutions::Solution;

/// A single frame of a captured stack trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    pub file: Option<String>,
    pub line_number: Option<u32>,
    pub method: String,
    /// Whether the frame belongs to the application rather than a dependency
    pub application_frame: bool,
}

/// Captures the current stack, marking frames under `application_path`
pub fn capture_stacktrace(application_path: Option<&Path>) -> Vec<StackFrame> {
    let backtrace = backtrace::Backtrace::new();
    let mut frames = Vec::new();

    for frame in backtrace.frames() {
        for symbol in frame.symbols() {
            let method = match symbol.name() {
                Some(name) => name.to_string(),
                None => continue,
            };

            // frames of the capture machinery itself
            if method.starts_with("backtrace::") || method.contains("capture_stacktrace") {
                continue;
            }

            let file = symbol.filename().map(|f| f.display().to_string());
            let application_frame = match (application_path, symbol.filename()) {
                (Some(root), Some(file)) => file.starts_with(root),
                _ => false,
            };

            frames.push(StackFrame {
                file,
                line_number: symbol.lineno(),
                method,
                application_frame,
            });
        }
    }

    frames
}

/// An error captured for reporting
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CapturedError {
    /// Fully qualified type name, e.g. `routing::RouteNotFoundException`
    pub class: String,
    pub message: Option<String>,
    pub code: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    /// Extra data attached by the host (view data, request data, ...)
    #[serde(default)]
    pub context: Map<String, Value>,
    pub previous: Option<Box<CapturedError>>,
    /// Solutions the error carries itself
    #[serde(default)]
    pub solutions: Vec<Solution>,
    #[serde(default)]
    pub stacktrace: Vec<StackFrame>,
}

impl CapturedError {
    /// Creates a captured error with a class name and message
    pub fn new<C: Into<String>, M: Into<String>>(class: C, message: M) -> Self {
        Self {
            class: class.into(),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Creates a captured error that has no message at all
    pub fn without_message<C: Into<String>>(class: C) -> Self {
        Self {
            class: class.into(),
            ..Default::default()
        }
    }

    /// Captures a Rust error, following its `source()` chain
    pub fn from_error<E: StdError + 'static>(error: &E) -> Self {
        let mut captured = Self::new(std::any::type_name::<E>(), error.to_string());
        captured.previous = error.source().map(|source| Box::new(Self::from_source(source)));
        captured
    }

    fn from_source(error: &(dyn StdError + 'static)) -> Self {
        let mut captured = Self::new("std::error::Error", error.to_string());
        captured.previous = error.source().map(|source| Box::new(Self::from_source(source)));
        captured
    }

    pub fn code<S: Into<String>>(mut self, code: S) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn location<F: Into<String>>(mut self, file: F, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// Adds context information to the error
    pub fn context<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Serialize,
    {
        if let Ok(value) = serde_json::to_value(value) {
            self.context.insert(key.into(), value);
        }
        self
    }

    pub fn previous(mut self, previous: CapturedError) -> Self {
        self.previous = Some(Box::new(previous));
        self
    }

    /// Attaches a solution the error already knows about
    pub fn with_solution(mut self, solution: Solution) -> Self {
        self.solutions.push(solution);
        self
    }

    pub fn with_stacktrace(mut self, stacktrace: Vec<StackFrame>) -> Self {
        self.stacktrace = stacktrace;
        self
    }

    /// The message, or an empty string when there is none
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }

    /// The unqualified class name (`Foo` for `a::b::Foo`, `A\B\Foo` or `a::Foo<b::Bar>`)
    pub fn short_class(&self) -> &str {
        short_name(&self.class)
    }

    /// Whether the unqualified class name equals `class`
    pub fn is(&self, class: &str) -> bool {
        self.short_class() == short_name(class)
    }
}

fn short_name(class: &str) -> &str {
    let class = class.split('<').next().unwrap_or(class);
    let class = class.rsplit("::").next().unwrap_or(class);
    class.rsplit('\\').next().unwrap_or(class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct RouteNotFoundException {
        source: std::io::Error,
    }

    impl fmt::Display for RouteNotFoundException {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Route [home] not defined.")
        }
    }

    impl StdError for RouteNotFoundException {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.source)
        }
    }

    #[test]
    fn test_short_class() {
        assert_eq!(CapturedError::new("a::b::Foo", "x").short_class(), "Foo");
        assert_eq!(CapturedError::new("Symfony\\Routing\\RouteNotFoundException", "x").short_class(), "RouteNotFoundException");
        assert_eq!(CapturedError::new("Plain", "x").short_class(), "Plain");
        assert_eq!(CapturedError::new("a::Wrap<b::Inner>", "x").short_class(), "Wrap");
        assert!(CapturedError::new("app::Wrap<std::io::Error>", "x").is("Wrap"));
        assert!(CapturedError::new("routing::RouteNotFoundException", "x").is("RouteNotFoundException"));
        assert!(CapturedError::new("RouteNotFoundException", "x").is("other::RouteNotFoundException"));
    }

    #[test]
    fn test_from_error_keeps_type_and_chain() {
        let err = RouteNotFoundException {
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "routes.toml missing"),
        };

        let captured = CapturedError::from_error(&err);
        assert!(captured.is("RouteNotFoundException"));
        assert_eq!(captured.message(), "Route [home] not defined.");
        assert_eq!(captured.previous.as_ref().unwrap().message(), "routes.toml missing");
    }

    #[derive(Debug)]
    struct Wrapped<E>(E);

    impl<E: fmt::Display> fmt::Display for Wrapped<E> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "wrapped: {}", self.0)
        }
    }

    impl<E: StdError> StdError for Wrapped<E> {}

    #[test]
    fn test_from_generic_error_drops_type_arguments() {
        let err = Wrapped(std::io::Error::new(std::io::ErrorKind::Other, "disk"));

        let captured = CapturedError::from_error(&err);
        assert_eq!(captured.short_class(), "Wrapped");
        assert!(captured.is("Wrapped"));
    }

    #[test]
    fn test_missing_message_reads_as_empty() {
        let captured = CapturedError::without_message("Exception");
        assert_eq!(captured.message, None);
        assert_eq!(captured.message(), "");
    }

    #[test]
    fn test_context_builder() {
        let captured = CapturedError::new("ErrorException", "Undefined variable $usr")
            .context("view_data", serde_json::json!({ "user": 1 }))
            .location("resources/views/welcome.blade.php", 3);

        assert_eq!(captured.context["view_data"]["user"], 1);
        assert_eq!(captured.line, Some(3));
    }

    #[test]
    fn test_capture_stacktrace_marks_nothing_without_root() {
        let frames = capture_stacktrace(None);
        assert!(frames.iter().all(|f| !f.application_frame));
    }
}
