//! Rule selection configuration.
//!
//! [`RuleSelection`] is the `rule_config` surface consumed from the external
//! configuration layer: which rules run and at what severity. It is applied
//! to a [`RuleRegistry`] before a scan begins; referencing a rule id the
//! registry does not know is a fatal configuration error.

use crate::error::{Error, Result};
use crate::registry::RuleRegistry;
use crate::report::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which rules run, and at what severity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSelection {
    /// Rules to enable. `None` means all registered rules.
    #[serde(default)]
    pub enabled: Option<Vec<String>>,
    /// Rules to disable; applied after `enabled`.
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Per-rule severity overrides.
    #[serde(default)]
    pub severity_overrides: BTreeMap<String, Severity>,
}

impl RuleSelection {
    /// A selection that runs every registered rule unchanged.
    pub fn all() -> Self {
        Self::default()
    }

    /// Load a selection from a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::SelectionParse(e.to_string()))
    }

    /// Apply this selection to a registry.
    ///
    /// Every referenced rule id must exist; unknown ids abort before any
    /// candidate is processed.
    pub fn apply(&self, registry: &mut RuleRegistry) -> Result<()> {
        if let Some(enabled) = &self.enabled {
            for id in enabled {
                if !registry.contains(id) {
                    return Err(Error::UnknownRule { id: id.clone() });
                }
            }
            let all_ids: Vec<String> = registry.ids().map(String::from).collect();
            for id in all_ids {
                if enabled.iter().any(|e| e == &id) {
                    registry.enable(&id)?;
                } else {
                    registry.disable(&id)?;
                }
            }
        }

        for id in &self.disabled {
            registry.disable(id)?;
        }

        for (id, severity) in &self.severity_overrides {
            registry.override_severity(id, *severity)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::CandidateKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_yaml() {
        let selection = RuleSelection::from_yaml(
            "enabled:\n  - require-task-name\n  - require-hosts\ndisabled:\n  - require-hosts\nseverity_overrides:\n  require-task-name: error\n",
        )
        .unwrap();
        assert_eq!(selection.enabled.as_ref().unwrap().len(), 2);
        assert_eq!(
            selection.severity_overrides.get("require-task-name"),
            Some(&Severity::Error)
        );
    }

    #[test]
    fn test_apply_narrows_registry() {
        let mut registry = RuleRegistry::with_builtin_rules().unwrap();
        let selection = RuleSelection {
            enabled: Some(vec!["require-task-name".to_string()]),
            disabled: Vec::new(),
            severity_overrides: BTreeMap::from([(
                "require-task-name".to_string(),
                Severity::Error,
            )]),
        };
        selection.apply(&mut registry).unwrap();

        let active = registry.rules_for(CandidateKind::RoleTasks);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id(), "require-task-name");
        assert_eq!(active[0].severity(), Severity::Error);
    }

    #[test]
    fn test_unknown_id_is_fatal() {
        let mut registry = RuleRegistry::with_builtin_rules().unwrap();
        let selection = RuleSelection {
            enabled: None,
            disabled: vec!["no-such-rule".to_string()],
            severity_overrides: BTreeMap::new(),
        };
        assert!(matches!(
            selection.apply(&mut registry),
            Err(Error::UnknownRule { .. })
        ));
    }

    #[test]
    fn test_malformed_yaml_is_fatal() {
        assert!(matches!(
            RuleSelection::from_yaml("enabled: {broken"),
            Err(Error::SelectionParse(_))
        ));
    }
}
