//! TOML parser for tags.toml.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::TagsConfigError;

/// Parsed tags configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagsConfig {
    /// Every declared path plus its ancestors, sorted by path.
    entries: Vec<TagEntry>,
    /// Named requirement presets, sorted by name.
    requirements: BTreeMap<String, RequirementDef>,
}

/// A single tag path with computed properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    /// Full dot-separated path (e.g. "State.Combat.Attacking")
    pub path: String,
    /// Number of segments (1 = top level)
    pub depth: usize,
    /// Parent path (None for top-level tags)
    pub parent: Option<String>,
}

/// How a requirement combines its required tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModeDef {
    #[default]
    RequireAll,
    RequireAny,
    RequireNone,
}

/// A per-tag condition inside a requirement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionDef {
    pub tag: String,
    #[serde(default)]
    pub exact: bool,
    #[serde(default)]
    pub inverted: bool,
}

/// A named requirement preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementDef {
    pub mode: ModeDef,
    pub required: Vec<String>,
    pub blocked: Vec<String>,
    pub conditions: Vec<ConditionDef>,
    pub exact_required: bool,
    pub exact_blocked: bool,
    pub ignore_if_empty: bool,
}

impl RequirementDef {
    /// Every tag path the requirement mentions.
    pub fn referenced_paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.required
            .iter()
            .chain(&self.blocked)
            .map(String::as_str)
            .chain(self.conditions.iter().map(|c| c.tag.as_str()))
    }
}

/// Raw TOML structure.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTagsConfig {
    #[serde(default)]
    tags: RawTags,
    #[serde(default)]
    requirements: BTreeMap<String, RawRequirement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTags {
    /// List of dot-separated paths
    #[serde(default)]
    paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRequirement {
    /// "require_all" (default), "require_any" or "require_none"
    mode: Option<String>,
    #[serde(default)]
    required: Vec<String>,
    #[serde(default)]
    blocked: Vec<String>,
    #[serde(default)]
    conditions: Vec<ConditionDef>,
    #[serde(default)]
    exact_required: bool,
    #[serde(default)]
    exact_blocked: bool,
    ignore_if_empty: Option<bool>,
}

impl TagsConfig {
    /// Parse from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TagsConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| TagsConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content)?;
        tracing::debug!(
            path = %path.display(),
            tags = config.len(),
            requirements = config.requirements.len(),
            "loaded tags config"
        );
        Ok(config)
    }

    /// Parse from a TOML string.
    pub fn parse(content: &str) -> Result<Self, TagsConfigError> {
        let raw: RawTagsConfig = toml::from_str(content)?;

        let requirements = raw
            .requirements
            .into_iter()
            .map(|(name, raw)| Ok((name.clone(), Self::convert_requirement(&name, raw)?)))
            .collect::<Result<BTreeMap<_, _>, TagsConfigError>>()?;

        // Tags used by requirements join the declared tree.
        let mut paths = raw.tags.paths;
        for def in requirements.values() {
            paths.extend(def.referenced_paths().map(str::to_owned));
        }
        let entries = Self::expand_paths(&paths)?;

        Ok(Self {
            entries,
            requirements,
        })
    }

    /// Get all entries.
    pub fn entries(&self) -> impl Iterator<Item = &TagEntry> {
        self.entries.iter()
    }

    /// All paths, ancestors included, sorted.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.path.as_str())
    }

    /// Get entry count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn requirements(&self) -> &BTreeMap<String, RequirementDef> {
        &self.requirements
    }

    pub fn requirement(&self, name: &str) -> Option<&RequirementDef> {
        self.requirements.get(name)
    }

    fn convert_requirement(name: &str, raw: RawRequirement) -> Result<RequirementDef, TagsConfigError> {
        let mode = match raw.mode.as_deref() {
            None | Some("require_all") => ModeDef::RequireAll,
            Some("require_any") => ModeDef::RequireAny,
            Some("require_none") => ModeDef::RequireNone,
            Some(other) => {
                return Err(TagsConfigError::Validation(format!(
                    "requirement '{}': invalid mode '{}': expected 'require_all', 'require_any' or 'require_none'",
                    name, other
                )));
            }
        };

        let def = RequirementDef {
            mode,
            required: raw.required,
            blocked: raw.blocked,
            conditions: raw.conditions,
            exact_required: raw.exact_required,
            exact_blocked: raw.exact_blocked,
            ignore_if_empty: raw.ignore_if_empty.unwrap_or(true),
        };
        for path in def.referenced_paths() {
            validate_path(path)
                .map_err(|msg| TagsConfigError::Validation(format!("requirement '{}': {}", name, msg)))?;
        }
        Ok(def)
    }

    /// Expand paths to include all parent nodes.
    ///
    /// e.g., "A.B.C" expands to ["A", "A.B", "A.B.C"]
    fn expand_paths(paths: &[String]) -> Result<Vec<TagEntry>, TagsConfigError> {
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut entries: Vec<TagEntry> = Vec::new();

        for path in paths {
            validate_path(path).map_err(TagsConfigError::Validation)?;

            let segments: Vec<&str> = path.split('.').collect();
            for depth in 1..=segments.len() {
                let ancestor = segments[..depth].join(".");
                if seen.insert(ancestor.to_ascii_lowercase()) {
                    entries.push(TagEntry {
                        path: ancestor,
                        depth,
                        parent: (depth > 1).then(|| segments[..depth - 1].join(".")),
                    });
                }
            }
        }

        // Sort by path for deterministic output
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(entries)
    }
}

impl FromStr for TagsConfig {
    type Err = TagsConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Check that `path` is a dotted list of identifiers.
fn validate_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("empty path not allowed".into());
    }
    if path.starts_with('.') || path.ends_with('.') {
        return Err(format!("invalid path '{}': cannot start or end with '.'", path));
    }
    if path.contains("..") {
        return Err(format!("invalid path '{}': contains '..'", path));
    }

    for segment in path.split('.') {
        let mut chars = segment.chars();
        if let Some(first) = chars.next()
            && !first.is_alphabetic()
            && first != '_'
        {
            return Err(format!(
                "invalid path '{}': segment '{}' must start with letter or underscore",
                path, segment
            ));
        }
        if let Some(bad) = chars.find(|c| !c.is_alphanumeric() && *c != '_') {
            return Err(format!(
                "invalid path '{}': segment '{}' contains invalid character '{}'",
                path, segment, bad
            ));
        }
    }
    Ok(())
}
