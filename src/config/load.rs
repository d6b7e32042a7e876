use super::validate::{validate_rules, validate_templates};
use super::{ConfigError, Rule, RulesFile, TemplatesFile, Variation};
use std::collections::BTreeMap;
use std::path::Path;

/// The immutable, process-wide dialogue configuration. Hot reload is the
/// caller loading a fresh value and swapping it wholesale between turns.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueConfig {
    pub rules: Vec<Rule>,
    pub templates: BTreeMap<String, Vec<Variation>>,
}

impl DialogueConfig {
    pub fn from_files(rules: RulesFile, templates: TemplatesFile) -> Result<Self, ConfigError> {
        validate_rules(&rules)?;
        validate_templates(&templates)?;
        Ok(Self {
            rules: rules.rules,
            templates: templates.templates,
        })
    }
}

pub fn load_dialogue_config(
    rules_path: &Path,
    templates_path: &Path,
) -> Result<DialogueConfig, ConfigError> {
    let rules = RulesFile::from_path(rules_path)?;
    let templates = TemplatesFile::from_path(templates_path)?;
    DialogueConfig::from_files(rules, templates)
}
