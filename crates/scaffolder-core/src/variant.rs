//! Variant descriptors
//!
//! A [`VariantDescriptor`] bundles everything that differs between the
//! offchain and onchain projects: where the subtree lives in the template,
//! which literals get renamed, whether a deployment manifest is synthesized,
//! and which external steps run. The pipeline selects one descriptor up front
//! and never branches on the variant again.

use crate::request::Variant;
use crate::runtime::check::Tool;
use crate::runtime::orchestrator::OrchestrationStep;
use crate::templates::deploy::ManifestSettings;
use crate::templates::rewriter::PlaceholderRule;

/// Token in a rule's replacement that expands to the project name
pub const NAME_TOKEN: &str = "{name}";

/// A placeholder rule before the project name is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    pub file: &'static str,
    pub find: &'static str,
    pub replace: &'static str,
}

impl RuleSpec {
    pub fn resolve(&self, project_name: &str) -> PlaceholderRule {
        PlaceholderRule {
            file: self.file.into(),
            find: self.find.to_string(),
            replace: self.replace.replace(NAME_TOKEN, project_name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VariantDescriptor {
    pub variant: Variant,
    /// Directory inside the template whose contents become the project root
    pub template_subpath: &'static str,
    pub placeholder_rules: Vec<RuleSpec>,
    pub orchestration_steps: Vec<OrchestrationStep>,
    /// Present only for variants that ship a deployment manifest
    pub manifest: Option<ManifestSettings>,
    pub required_tools: Vec<Tool>,
}

impl VariantDescriptor {
    pub fn rules_for(&self, project_name: &str) -> Vec<PlaceholderRule> {
        self.placeholder_rules
            .iter()
            .map(|spec| spec.resolve(project_name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_rule_spec_expands_name_token() {
        let spec = RuleSpec {
            file: "scripts/setup_bot.sh",
            find: "bot_identity",
            replace: "{name}_identity",
        };
        let rule = spec.resolve("mybot123");

        assert_eq!(rule.file, PathBuf::from("scripts/setup_bot.sh"));
        assert_eq!(rule.find, "bot_identity");
        assert_eq!(rule.replace, "mybot123_identity");
    }

    #[test]
    fn test_rule_spec_without_token_is_literal() {
        let spec = RuleSpec {
            file: "Cargo.toml",
            find: "edition = \"2018\"",
            replace: "edition = \"2021\"",
        };
        assert_eq!(spec.resolve("anything").replace, "edition = \"2021\"");
    }
}
