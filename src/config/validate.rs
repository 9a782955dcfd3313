// src/config/validate.rs

use indexmap::IndexMap;

use crate::config::model::{ConfigFile, RawConfigFile, TargetConfig};
use crate::dag::{TargetDef, TargetGraph};
use crate::errors::{Result, RundagError};
use crate::outputs::OutputPatterns;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = RundagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.env, raw.target))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_targets(cfg)?;
    validate_target_names(cfg)?;
    validate_self_references(cfg)?;
    validate_produces(cfg)?;
    // Unknown references and cycles.
    target_graph(&cfg.target)?.validate()?;
    validate_default_target(cfg)?;
    Ok(())
}

/// Build the target graph described by `[target.*]` sections, in document
/// order. Does not check references; call [`TargetGraph::validate`] for that.
pub(crate) fn target_graph(targets: &IndexMap<String, TargetConfig>) -> Result<TargetGraph> {
    let mut graph = TargetGraph::new();
    for (name, target) in targets {
        graph.add(target_def(name, target))?;
    }
    Ok(graph)
}

pub(crate) fn target_def(name: &str, target: &TargetConfig) -> TargetDef {
    let def = TargetDef::new(name)
        .with_deps(target.after.iter().cloned())
        .with_before(target.before.iter().cloned());
    match &target.description {
        Some(description) => def.with_description(description.as_str()),
        None => def,
    }
}

fn ensure_has_targets(cfg: &RawConfigFile) -> Result<()> {
    if cfg.target.is_empty() {
        return Err(RundagError::ConfigError(
            "config must contain at least one [target.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_target_names(cfg: &RawConfigFile) -> Result<()> {
    for name in cfg.target.keys() {
        if name.trim().is_empty() {
            return Err(RundagError::ConfigError(
                "target names must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_self_references(cfg: &RawConfigFile) -> Result<()> {
    for (name, target) in cfg.target.iter() {
        if target.after.iter().any(|d| d == name) {
            return Err(RundagError::ConfigError(format!(
                "target '{name}' cannot depend on itself in `after`"
            )));
        }
        if target.before.iter().any(|d| d == name) {
            return Err(RundagError::ConfigError(format!(
                "target '{name}' cannot order itself in `before`"
            )));
        }
    }
    Ok(())
}

fn validate_produces(cfg: &RawConfigFile) -> Result<()> {
    for (name, target) in cfg.target.iter() {
        OutputPatterns::new(&target.produces).map_err(|e| {
            RundagError::ConfigError(format!("target '{name}' has invalid `produces`: {e:#}"))
        })?;
    }
    Ok(())
}

fn validate_default_target(cfg: &RawConfigFile) -> Result<()> {
    if let Some(default) = &cfg.config.default_target
        && !cfg.target.contains_key(default)
    {
        return Err(RundagError::ConfigError(format!(
            "[config].default_target names unknown target '{default}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::parse_str;

    fn check(text: &str) -> Result<ConfigFile> {
        ConfigFile::try_from(parse_str(text).unwrap())
    }

    #[test]
    fn empty_config_is_rejected() {
        assert!(matches!(check(""), Err(RundagError::ConfigError(_))));
    }

    #[test]
    fn self_dependency_is_a_config_error() {
        let err = check("[target.A]\nafter = [\"A\"]\n").unwrap_err();
        assert!(err.to_string().contains("cannot depend on itself"));
    }

    #[test]
    fn unknown_reference_is_reported_with_both_names() {
        let err = check("[target.A]\nbefore = [\"B\"]\n").unwrap_err();
        match err {
            RundagError::UnknownDependency { target, dependency } => {
                assert_eq!(target, "A");
                assert_eq!(dependency, "B");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cycles_are_rejected_at_load() {
        let err = check(
            r#"
            [target.A]
            after = ["B"]
            [target.B]
            after = ["A"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, RundagError::CyclicDependency(_)));
    }

    #[test]
    fn default_target_must_exist() {
        let err = check("[config]\ndefault_target = \"Nope\"\n[target.A]\n").unwrap_err();
        assert!(matches!(err, RundagError::ConfigError(_)));

        let ok = check("[config]\ndefault_target = \"A\"\n[target.A]\n").unwrap();
        assert_eq!(ok.config.default_target.as_deref(), Some("A"));
    }

    #[test]
    fn bad_produces_glob_is_rejected() {
        let err = check("[target.A]\nproduces = [\"out/[\"]\n").unwrap_err();
        assert!(err.to_string().contains("produces"));
    }
}
