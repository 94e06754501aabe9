//! Test identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one benchmark across runs: a package, class, method triple.
///
/// The fields are opaque labels to the engines; any format constraints belong
/// to whatever consumes the emitted records. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestDefinition {
    /// Package (or crate/module path) the test belongs to.
    pub package: String,
    /// Class or suite grouping within the package.
    pub class: String,
    /// The individual test's name.
    pub method: String,
}

impl TestDefinition {
    /// Build a definition from its three label parts.
    pub fn new(
        package: impl Into<String>,
        class: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        TestDefinition {
            package: package.into(),
            class: class.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for TestDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.package, self.class, self.method)
    }
}
