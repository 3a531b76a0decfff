//! Repository configuration.
//!
//! Stored as TOML at `.megit/config.toml`. A missing file means defaults;
//! unknown keys are rejected.
//!
//! ```toml
//! [core]
//! default_branch = "main"
//!
//! [merge]
//! ours_label = "HEAD"
//! theirs_label = "MERGE_HEAD"
//! ```

use std::fs;
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::Path;

use megit_merge::ConflictLabels;
use megit_refs::validate_branch_name;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{RepoError, RepoResult};

/// File name of the config inside the metadata directory.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    pub core: CoreConfig,
    pub merge: MergeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Branch `HEAD` points at after `init`.
    pub default_branch: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_branch: "main".into(),
        }
    }
}

/// Labels written after conflict markers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    pub ours_label: String,
    pub theirs_label: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        let labels = ConflictLabels::default();
        Self {
            ours_label: labels.ours,
            theirs_label: labels.theirs,
        }
    }
}

impl RepoConfig {
    /// Load from `metadata_dir`, falling back to defaults if there is no file.
    pub fn load(metadata_dir: &Path) -> RepoResult<Self> {
        let path = metadata_dir.join(CONFIG_FILE);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        let config: Self = toml::from_str(&contents).map_err(|e| RepoError::Config {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        config.validate(&path)?;
        Ok(config)
    }

    /// Write to `metadata_dir` atomically.
    pub fn save(&self, metadata_dir: &Path) -> RepoResult<()> {
        let path = metadata_dir.join(CONFIG_FILE);
        self.validate(&path)?;
        let contents = toml::to_string_pretty(self).map_err(|e| RepoError::Config {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let mut tmp = NamedTempFile::new_in(metadata_dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    fn validate(&self, path: &Path) -> RepoResult<()> {
        validate_branch_name(&self.core.default_branch).map_err(|e| RepoError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        for label in [&self.merge.ours_label, &self.merge.theirs_label] {
            if label.contains('\n') {
                return Err(RepoError::Config {
                    path: path.to_path_buf(),
                    reason: format!("merge label {label:?} spans lines"),
                });
            }
        }
        Ok(())
    }

    pub fn conflict_labels(&self) -> ConflictLabels {
        ConflictLabels::new(&self.merge.ours_label, &self.merge.theirs_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = RepoConfig::load(dir.path()).unwrap();
        assert_eq!(config, RepoConfig::default());
        assert_eq!(config.core.default_branch, "main");
        assert_eq!(config.conflict_labels(), ConflictLabels::default());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut config = RepoConfig::default();
        config.core.default_branch = "trunk".into();
        config.merge.theirs_label = "incoming".into();
        config.save(dir.path()).unwrap();

        let loaded = RepoConfig::load(dir.path()).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.conflict_labels().theirs, "incoming");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[merge]\nours_label = \"mine\"\n").unwrap();
        let config = RepoConfig::load(dir.path()).unwrap();
        assert_eq!(config.core.default_branch, "main");
        assert_eq!(config.merge.ours_label, "mine");
        assert_eq!(config.merge.theirs_label, "MERGE_HEAD");
    }

    #[test]
    fn unknown_keys_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[core]\ncolour = true\n").unwrap();
        let err = RepoConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, RepoError::Config { .. }));
    }

    #[test]
    fn invalid_default_branch_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[core]\ndefault_branch = \"a..b\"\n").unwrap();
        assert!(RepoConfig::load(dir.path()).is_err());
    }
}
