//! Guarded operations.
//!
//! Each guarded operation declares the rule that must allow before it runs.
//! The registry maps operation names to those declarations.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::model::Rule;

/// A named operation with its declared rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardedOperation {
    /// The operation name.
    pub name: String,

    /// What the operation does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The rule guarding the operation.
    pub rule: Rule,
}

impl GuardedOperation {
    /// Declare an operation.
    pub fn new(name: impl Into<String>, rule: Rule) -> Self {
        Self {
            name: name.into(),
            description: None,
            rule,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Registry of guarded operations.
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    operations: Arc<DashMap<String, GuardedOperation>>,
}

impl OperationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation, returning the declaration it replaced.
    pub fn register(&self, operation: GuardedOperation) -> Option<GuardedOperation> {
        self.operations.insert(operation.name.clone(), operation)
    }

    /// Get an operation's declaration.
    pub fn get(&self, name: &str) -> Option<GuardedOperation> {
        self.operations.get(name).map(|op| op.value().clone())
    }

    /// Get the rule guarding an operation.
    pub fn rule_for(&self, name: &str) -> Option<Rule> {
        self.operations.get(name).map(|op| op.rule.clone())
    }

    /// Remove an operation.
    pub fn remove(&self, name: &str) -> Option<GuardedOperation> {
        self.operations.remove(name).map(|(_, op)| op)
    }

    /// List registered operation names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.operations.iter().map(|op| op.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of registered operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if no operations are registered.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let registry = OperationRegistry::new();
        assert!(registry.is_empty());

        registry.register(
            GuardedOperation::new("delete-user", Rule::permission("user.delete"))
                .with_description("Remove a user account"),
        );
        registry.register(GuardedOperation::new("health", Rule::bypass()));

        assert_eq!(registry.names(), vec!["delete-user", "health"]);
        assert_eq!(registry.rule_for("health"), Some(Rule::Bypass));
        assert_eq!(
            registry.get("delete-user").and_then(|op| op.description),
            Some("Remove a user account".to_string())
        );
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_register_replaces() {
        let registry = OperationRegistry::new();
        registry.register(GuardedOperation::new("op", Rule::logged_in()));
        let replaced = registry.register(GuardedOperation::new("op", Rule::role("admin")));

        assert_eq!(replaced.map(|op| op.rule), Some(Rule::logged_in()));
        assert_eq!(registry.len(), 1);
        assert!(registry.remove("op").is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_operations_from_toml() {
        let table: toml::Value = toml::from_str(
            r#"
            [[operations]]
            name = "comment"
            rule = { all = [{ check = "is_logged_in" }, { check = "is_not_banned", service = "comment" }] }
            "#,
        )
        .unwrap();

        let operations: Vec<GuardedOperation> = table
            .get("operations")
            .cloned()
            .unwrap()
            .try_into()
            .unwrap();

        assert_eq!(operations.len(), 1);
        assert_eq!(
            operations[0].rule,
            Rule::all([Rule::logged_in(), Rule::not_banned("comment")])
        );
    }
}
