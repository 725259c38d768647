use bon::Builder;
use serde::{Deserialize, Serialize};

/// Switches of the compiler. Everything per request lives in [`crate::RequestContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerConfig {
    /// Thread change events of every write step into a `meta` column.
    #[builder(default = false)]
    pub events: bool,

    /// Report deprecated input forms as diagnostics.
    #[builder(default = true)]
    pub deprecation_warnings: bool,

    /// Check relationship cardinalities after writes.
    #[builder(default = true)]
    pub validate_cardinality: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_keys_take_defaults() {
        let config: CompilerConfig = serde_json::from_str(r#"{ "events": true }"#).unwrap();

        assert_eq!(
            CompilerConfig {
                events: true,
                deprecation_warnings: true,
                validate_cardinality: true,
            },
            config
        );
    }
}
