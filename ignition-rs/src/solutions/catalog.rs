use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// A source of currently valid names of one kind (routes, views, ...)
///
/// Providers read it every time they rank candidates, so names registered
/// after wiring are taken into account.
pub trait NameCatalog: Send + Sync {
    fn names(&self) -> Vec<String>;
}

impl<F> NameCatalog for F
where
    F: Fn() -> Vec<String> + Send + Sync,
{
    fn names(&self) -> Vec<String> {
        self()
    }
}

/// A growable, shareable list of names in registration order
#[derive(Debug, Default)]
pub struct NameRegistry {
    names: RwLock<Vec<String>>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: RwLock::new(names.into_iter().map(Into::into).collect()),
        }
    }

    /// Registers a name; duplicates are ignored
    pub fn register<S: Into<String>>(&self, name: S) {
        let name = name.into();
        let mut names = self.names.write().unwrap_or_else(PoisonError::into_inner);
        if !names.contains(&name) {
            names.push(name);
        }
    }

    pub fn clear(&self) {
        self.names.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl NameCatalog for NameRegistry {
    fn names(&self) -> Vec<String> {
        self.names.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// The name catalogs the built-in providers rank against
#[derive(Clone)]
pub struct KnownNames {
    pub routes: Arc<dyn NameCatalog>,
    pub views: Arc<dyn NameCatalog>,
    pub validation_rules: Arc<dyn NameCatalog>,
}

impl Default for KnownNames {
    fn default() -> Self {
        Self {
            routes: Arc::new(NameRegistry::new()),
            views: Arc::new(NameRegistry::new()),
            validation_rules: Arc::new(NameRegistry::from_names(DEFAULT_VALIDATION_RULES.iter().copied())),
        }
    }
}

impl fmt::Debug for KnownNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnownNames")
            .field("routes", &self.routes.names().len())
            .field("views", &self.views.names().len())
            .field("validation_rules", &self.validation_rules.names().len())
            .finish()
    }
}

impl KnownNames {
    pub fn routes(mut self, routes: Arc<dyn NameCatalog>) -> Self {
        self.routes = routes;
        self
    }

    pub fn views(mut self, views: Arc<dyn NameCatalog>) -> Self {
        self.views = views;
        self
    }

    pub fn validation_rules(mut self, rules: Arc<dyn NameCatalog>) -> Self {
        self.validation_rules = rules;
        self
    }
}

/// Validation rules every host understands
const DEFAULT_VALIDATION_RULES: &[&str] = &[
    "accepted", "active_url", "after", "after_or_equal", "alpha", "alpha_dash", "alpha_num", "array",
    "before", "before_or_equal", "between", "boolean", "confirmed", "date", "date_equals", "date_format",
    "different", "digits", "digits_between", "dimensions", "distinct", "email", "ends_with", "exists",
    "file", "filled", "gt", "gte", "image", "in", "in_array", "integer", "ip", "ipv4", "ipv6", "json",
    "lt", "lte", "max", "mimes", "mimetypes", "min", "not_in", "not_regex", "nullable", "numeric",
    "present", "regex", "required", "required_if", "required_unless", "required_with",
    "required_with_all", "required_without", "required_without_all", "same", "size", "starts_with",
    "string", "timezone", "unique", "url", "uuid",
];
