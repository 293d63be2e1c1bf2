//! On-disk design archive.

use crate::types::{DesignState, SCHEMA_VERSION};
use crate::{DesignError, DesignResult};
use std::fs;
use std::path::PathBuf;

const RECORD_FILE: &str = "design.json";

/// Directory of named design records, one subdirectory per name.
#[derive(Clone, Debug)]
pub struct DesignArchive {
    root_dir: PathBuf,
}

impl DesignArchive {
    pub fn new(root_dir: PathBuf) -> DesignResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    fn record_path(&self, name: &str) -> DesignResult<PathBuf> {
        let valid = !name.trim().is_empty()
            && !name.contains(['/', '\\'])
            && name != "."
            && name != "..";
        if !valid {
            return Err(DesignError::InvalidName {
                name: name.to_string(),
            });
        }
        Ok(self.root_dir.join(name).join(RECORD_FILE))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.record_path(name).is_ok_and(|p| p.exists())
    }

    pub fn save(&self, name: &str, state: &DesignState) -> DesignResult<PathBuf> {
        let path = self.record_path(name)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    pub fn load(&self, name: &str) -> DesignResult<DesignState> {
        let path = self.record_path(name)?;
        if !path.exists() {
            return Err(DesignError::MissingReference {
                name: name.to_string(),
            });
        }

        let content = fs::read_to_string(path)?;
        // Check the version before committing to the full layout.
        let raw: serde_json::Value = serde_json::from_str(&content)?;
        let found = raw
            .get("schema_version")
            .and_then(|v| v.as_u64())
            .map_or(0, |v| u32::try_from(v).unwrap_or(u32::MAX));
        if found != SCHEMA_VERSION {
            return Err(DesignError::SchemaMismatch {
                found,
                expected: SCHEMA_VERSION,
            });
        }
        Ok(serde_json::from_value(raw)?)
    }

    pub fn list(&self) -> DesignResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().join(RECORD_FILE).exists() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn delete(&self, name: &str) -> DesignResult<()> {
        let path = self.record_path(name)?;
        if let Some(dir) = path.parent()
            && dir.exists()
        {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}
