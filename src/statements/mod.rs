//! Named statement templates and placeholder binding.

mod format;
mod scanner;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::types::{BoundStatement, NamedArgs};

/// How bound parameters appear in formatted query text.
///
/// Fixed when the store (and thus the connector) is constructed and immutable
/// thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// Emit this marker verbatim for every placeholder, e.g. `"?"` for
    /// backends with ordered positional binding.
    Positional(String),
    /// Leave `:name` markers in place for backends that bind by name. The
    /// ordered value list is still produced in marker order.
    Named,
}

impl PlaceholderStyle {
    /// The `?` positional style used by `SQLite` and friends.
    #[must_use]
    pub fn question_mark() -> Self {
        Self::Positional("?".to_string())
    }
}

/// A named, parameterized statement registered before use.
///
/// Records are produced by an external parser; any serde-supported format
/// works. Statement text carries `:name` markers:
/// ```rust
/// use sql_dispatch::prelude::*;
///
/// let template = StatementTemplate::new(
///     "insert_user",
///     "INSERT INTO users (name) VALUES (:name)",
///     ["name"],
/// );
/// # let _ = template;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementTemplate {
    /// Unique key the statement is executed under.
    pub name: String,
    /// Statement text with `:name` markers.
    pub raw_text: String,
    /// Parameter names the template declares, in order. Advisory metadata
    /// from the parser; binding is driven by the markers in `raw_text`.
    #[serde(default)]
    pub placeholders: Vec<String>,
}

impl StatementTemplate {
    pub fn new<N, T, P, S>(name: N, raw_text: T, placeholders: P) -> Self
    where
        N: Into<String>,
        T: Into<String>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            raw_text: raw_text.into(),
            placeholders: placeholders.into_iter().map(Into::into).collect(),
        }
    }
}

/// Registry of statement templates plus the placeholder style used to bind
/// them.
#[derive(Debug)]
pub struct StatementStore {
    templates: HashMap<String, StatementTemplate>,
    style: PlaceholderStyle,
}

impl StatementStore {
    #[must_use]
    pub fn new(style: PlaceholderStyle) -> Self {
        Self {
            templates: HashMap::new(),
            style,
        }
    }

    #[must_use]
    pub fn style(&self) -> &PlaceholderStyle {
        &self.style
    }

    /// Register one template.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateStatement`] if the name is taken;
    /// the first registration is retained.
    pub fn load(&mut self, template: StatementTemplate) -> Result<(), DispatchError> {
        if self.templates.contains_key(&template.name) {
            return Err(DispatchError::DuplicateStatement(template.name));
        }
        self.templates.insert(template.name.clone(), template);
        Ok(())
    }

    /// Register a batch of templates, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateStatement`] for the first name
    /// collision; templates loaded before it remain registered.
    pub fn load_all(
        &mut self,
        templates: impl IntoIterator<Item = StatementTemplate>,
    ) -> Result<(), DispatchError> {
        for template in templates {
            self.load(template)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StatementTemplate> {
        self.templates.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Resolve a statement name and argument map into query text plus the
    /// ordered bound values. Deterministic for a given `(template, args)`
    /// pair.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnknownStatement`] for unregistered names;
    /// [`DispatchError::MissingArgument`] when the template references an
    /// argument absent from `args`. Supplied arguments the template never
    /// references are ignored.
    pub fn format(&self, name: &str, args: &NamedArgs) -> Result<BoundStatement, DispatchError> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| DispatchError::UnknownStatement(name.to_string()))?;
        format::bind_statement(template, &self.style, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_load_keeps_first_registration() {
        let mut store = StatementStore::new(PlaceholderStyle::question_mark());
        store
            .load(StatementTemplate::new("q", "SELECT 1", Vec::<String>::new()))
            .unwrap();
        let err = store
            .load(StatementTemplate::new("q", "SELECT 2", Vec::<String>::new()))
            .unwrap_err();
        assert!(matches!(err, DispatchError::DuplicateStatement(name) if name == "q"));
        assert_eq!(store.get("q").unwrap().raw_text, "SELECT 1");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn format_rejects_unknown_names() {
        let store = StatementStore::new(PlaceholderStyle::question_mark());
        let err = store.format("missing", &NamedArgs::new()).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownStatement(name) if name == "missing"));
    }
}
