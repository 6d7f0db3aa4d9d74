//! Additional assertions for [`spectral`]

use serde_json::Value;
use spectral::{AssertionFailure, Spec};

/// Assertions on rendered documents
pub trait DocumentAssertions {
    fn has_value_at(&mut self, path: &str, expected: &Value);
    fn has_no_value_at(&mut self, path: &str);
}

impl<'s> DocumentAssertions for Spec<'s, Value> {
    /// Asserts that the subject document contains the expected value at
    /// the given path.
    ///
    /// ```rust
    /// let document = json!({"spec": {"storageClassName": "standard"}});
    /// assert_that(&document).has_value_at("spec.storageClassName", &json!("standard"));
    /// ```
    fn has_value_at(&mut self, path: &str, expected: &Value) {
        let actual = super::chart::search(path, self.subject);
        if actual != *expected {
            AssertionFailure::from_spec(self)
                .with_expected(format!("<{}> at [{}]", expected, path))
                .with_actual(format!("<{}>", actual))
                .fail();
        }
    }

    /// Asserts that the subject document contains nothing at the given
    /// path.
    ///
    /// ```rust
    /// let document = json!({"spec": {}});
    /// assert_that(&document).has_no_value_at("spec.storageClassName");
    /// ```
    fn has_no_value_at(&mut self, path: &str) {
        let actual = super::chart::search(path, self.subject);
        if !actual.is_null() {
            AssertionFailure::from_spec(self)
                .with_expected(format!("nothing at [{}]", path))
                .with_actual(format!("<{}>", actual))
                .fail();
        }
    }
}
