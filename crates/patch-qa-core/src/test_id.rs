//! Test identities
//!
//! A (class, method) pair identifying one test case independent of
//! parameterization. Repeated parameterized invocations of the same method
//! collapse onto a single identity.

use serde::{Deserialize, Serialize};

/// Identity of a single test case
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestIdentity {
    /// Simple class name (no package prefix)
    pub class: String,
    /// Method name with any parameterization suffix stripped
    pub method: String,
}

impl TestIdentity {
    /// Create an identity from already-normalized parts
    #[must_use]
    pub fn new(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            method: method.into(),
        }
    }

    /// Build an identity from raw surefire `classname`/`name` attributes
    ///
    /// The class name keeps only the last segment of the dotted
    /// fully-qualified name; the method name is cut at the first `[` or `{`
    /// so parameterized invocations normalize to one method.
    #[must_use]
    pub fn from_report(classname: &str, name: &str) -> Self {
        let class = classname.rsplit('.').next().unwrap_or(classname);
        Self::new(class, strip_parameter_suffix(name))
    }

    /// Parse a persisted `ClassName#methodName` token
    ///
    /// Returns `None` for malformed fragments (no `#`, empty class or
    /// method); callers drop those rather than fail.
    #[must_use]
    pub fn parse_token(token: &str) -> Option<Self> {
        let token = token.trim();
        let (class, method) = token.split_once('#')?;
        if class.is_empty() || method.is_empty() {
            return None;
        }
        Some(Self::new(class, method))
    }

    /// Render the persisted `ClassName#methodName` token
    #[must_use]
    pub fn token(&self) -> String {
        format!("{}#{}", self.class, self.method)
    }
}

impl std::fmt::Display for TestIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.class, self.method)
    }
}

/// Cut a surefire test name at the first parameterization marker
fn strip_parameter_suffix(name: &str) -> &str {
    let brace = name.find('{').unwrap_or(name.len());
    let bracket = name.find('[').unwrap_or(name.len());
    &name[..brace.min(bracket)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_report_strips_package() {
        let id = TestIdentity::from_report("com.acme.service.FooTest", "bar");
        assert_eq!(id.class, "FooTest");
        assert_eq!(id.method, "bar");
    }

    #[test]
    fn test_from_report_no_package() {
        let id = TestIdentity::from_report("FooTest", "bar");
        assert_eq!(id.class, "FooTest");
    }

    #[test]
    fn test_bracket_suffix_stripped() {
        let id = TestIdentity::from_report("FooTest", "bar[1]");
        assert_eq!(id.method, "bar");
    }

    #[test]
    fn test_brace_suffix_stripped() {
        let id = TestIdentity::from_report("FooTest", "bar{arg=7}");
        assert_eq!(id.method, "bar");
    }

    #[test]
    fn test_parameterized_invocations_collapse() {
        let ids: std::collections::BTreeSet<TestIdentity> = (0..5)
            .map(|i| TestIdentity::from_report("a.b.FooTest", &format!("bar[{i}]")))
            .collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids.iter().next().expect("one identity").method, "bar");
    }

    #[test]
    fn test_token_round_trip() {
        let id = TestIdentity::new("FooTest", "bar");
        let parsed = TestIdentity::parse_token(&id.token()).expect("valid token");
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_token_rejects_missing_hash() {
        assert!(TestIdentity::parse_token("FooTestBar").is_none());
    }

    #[test]
    fn test_parse_token_rejects_empty_parts() {
        assert!(TestIdentity::parse_token("#bar").is_none());
        assert!(TestIdentity::parse_token("FooTest#").is_none());
        assert!(TestIdentity::parse_token("").is_none());
    }

    #[test]
    fn test_parse_token_trims_whitespace() {
        let id = TestIdentity::parse_token("  FooTest#bar  ").expect("valid token");
        assert_eq!(id, TestIdentity::new("FooTest", "bar"));
    }

    #[test]
    fn test_display_matches_token() {
        let id = TestIdentity::new("FooTest", "bar");
        assert_eq!(id.to_string(), id.token());
    }

    proptest! {
        #[test]
        fn prop_well_formed_tokens_round_trip(
            class in "[A-Z][A-Za-z0-9]{0,20}",
            method in "[a-z][A-Za-z0-9]{0,20}",
        ) {
            let id = TestIdentity::new(class, method);
            let parsed = TestIdentity::parse_token(&id.token());
            prop_assert_eq!(parsed, Some(id));
        }

        #[test]
        fn prop_suffix_stripping_never_panics(name in ".{0,40}") {
            let _ = TestIdentity::from_report("a.FooTest", &name);
        }
    }
}
