// Sat Oct 17 2026 - Alex

use crate::pattern::Pattern;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_SECTION: &str = ".text";

fn default_section() -> String {
    DEFAULT_SECTION.to_string()
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SignatureSpec {
    pub signature: String,
    #[serde(default)]
    pub nth_match: usize,
    #[serde(default)]
    pub padding: i64,
    #[serde(default)]
    pub dereferences: usize,
    #[serde(default = "default_section")]
    pub section: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StringSearchSpec {
    pub string: String,
    #[serde(default)]
    pub reference_instance: usize,
    #[serde(default)]
    pub padding: i64,
    #[serde(default)]
    pub dereferences: usize,
    #[serde(default = "default_section")]
    pub section: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConVarSpec {
    pub convar: String,
    #[serde(default)]
    pub server_bound: bool,
    #[serde(default)]
    pub padding: i64,
    #[serde(default)]
    pub dereferences: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExportSpec {
    pub export: String,
    #[serde(default)]
    pub padding: i64,
    #[serde(default)]
    pub dereferences: usize,
}

/// Everything to resolve inside one module. Entries are resolved in table
/// order: signatures, string searches, convars, exports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleSpec {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub signatures: IndexMap<String, SignatureSpec>,
    #[serde(rename = "string-search", default, skip_serializing_if = "IndexMap::is_empty")]
    pub string_search: IndexMap<String, StringSearchSpec>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub convars: IndexMap<String, ConVarSpec>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub exports: IndexMap<String, ExportSpec>,
}

impl ModuleSpec {
    pub fn entry_count(&self) -> usize {
        self.signatures.len() + self.string_search.len() + self.convars.len() + self.exports.len()
    }

    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.signatures
            .keys()
            .chain(self.string_search.keys())
            .chain(self.convars.keys())
            .chain(self.exports.keys())
            .map(String::as_str)
    }

    /// Drops any entry with this name from every table, so that a re-added
    /// entry never exists under two kinds at once.
    pub fn remove_entry(&mut self, name: &str) {
        self.signatures.shift_remove(name);
        self.string_search.shift_remove(name);
        self.convars.shift_remove(name);
        self.exports.shift_remove(name);
    }
}

/// Scan configuration keyed by module path, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanConfig {
    pub modules: IndexMap<String, ModuleSpec>,
}

impl ScanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    /// Loads the file if it exists, otherwise starts from an empty config.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = self.to_json()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(path, contents)?;
        Ok(())
    }

    pub fn module_mut(&mut self, path: &str) -> &mut ModuleSpec {
        self.modules.entry(path.to_string()).or_default()
    }

    pub fn entry_count(&self) -> usize {
        self.modules.values().map(ModuleSpec::entry_count).sum()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.modules.is_empty() {
            return Err(ConfigError::Invalid("no modules configured".to_string()));
        }

        for (module, spec) in &self.modules {
            if module.trim().is_empty() {
                return Err(ConfigError::Invalid("empty module path".to_string()));
            }

            if spec.entry_names().any(|name| name.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!("{}: empty entry name", module)));
            }

            for (entry, signature) in &spec.signatures {
                Pattern::parse(&signature.signature)
                    .map_err(|e| ConfigError::Invalid(format!("{}: {}: {}", module, entry, e)))?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "C:\\Game\\bin\\client.dll": {
            "signatures": {
                "dwEntityList": { "signature": "BB ? ? ? ? 83 FF 01", "nth-match": 0, "padding": 1, "dereferences": 1 },
                "dwLocalPlayer": { "signature": "8D 34 85 ? ? ? ?", "padding": 3 }
            },
            "string-search": {
                "dwViewRender": { "string": "C_BaseViewModel", "reference-instance": 0, "padding": 0, "dereferences": 0 }
            },
            "convars": {
                "cl_cmdrate": { "convar": "cl_cmdrate", "server-bound": true, "padding": 0, "dereferences": 0 }
            }
        },
        "C:\\Game\\bin\\engine.dll": {
            "exports": {
                "CreateInterface": { "export": "CreateInterface" }
            }
        }
    }"#;

    #[test]
    fn test_parse_sample() {
        let config = ScanConfig::from_json(SAMPLE).unwrap();
        let modules: Vec<_> = config.modules.keys().cloned().collect();
        assert_eq!(modules, vec!["C:\\Game\\bin\\client.dll", "C:\\Game\\bin\\engine.dll"]);

        let client = &config.modules["C:\\Game\\bin\\client.dll"];
        let local = &client.signatures["dwLocalPlayer"];
        assert_eq!(local.padding, 3);
        assert_eq!(local.nth_match, 0);
        assert_eq!(local.section, ".text");
        assert!(client.convars["cl_cmdrate"].server_bound);
        assert_eq!(client.entry_count(), 4);
        assert_eq!(config.entry_count(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_load_preserves_order() {
        let mut config = ScanConfig::new();
        for module in ["z.dll", "a.dll", "m.dll"] {
            let spec = config.module_mut(module);
            for entry in ["zeta", "alpha", "mu"] {
                spec.exports.insert(
                    entry.to_string(),
                    ExportSpec { export: entry.to_string(), padding: -2, dereferences: 1 },
                );
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        config.save(&path).unwrap();

        let loaded = ScanConfig::load(&path).unwrap();
        assert_eq!(loaded, config);

        let modules: Vec<_> = loaded.modules.keys().map(String::as_str).collect();
        assert_eq!(modules, vec!["z.dll", "a.dll", "m.dll"]);
        let entries: Vec<_> = loaded.modules["m.dll"].entry_names().collect();
        assert_eq!(entries, vec!["zeta", "alpha", "mu"]);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScanConfig::load_or_default(dir.path().join("missing.json")).unwrap();
        assert!(config.modules.is_empty());
        assert!(matches!(ScanConfig::load(dir.path().join("missing.json")), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        assert!(matches!(ScanConfig::new().validate(), Err(ConfigError::Invalid(_))));

        let mut config = ScanConfig::new();
        config.module_mut("client.dll").signatures.insert(
            "broken".to_string(),
            SignatureSpec {
                signature: "8B QQ".to_string(),
                nth_match: 0,
                padding: 0,
                dereferences: 0,
                section: default_section(),
            },
        );

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("client.dll"));
        assert!(err.contains("broken"));
    }

    #[test]
    fn test_remove_entry_across_tables() {
        let mut config = ScanConfig::from_json(SAMPLE).unwrap();
        let client = config.module_mut("C:\\Game\\bin\\client.dll");
        client.remove_entry("cl_cmdrate");
        client.remove_entry("dwEntityList");

        let names: Vec<_> = client.entry_names().collect();
        assert_eq!(names, vec!["dwLocalPlayer", "dwViewRender"]);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(ScanConfig::from_json("{ not json"), Err(ConfigError::Json(_))));
    }
}
