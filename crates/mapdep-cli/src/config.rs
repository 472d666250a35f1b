/// Workload configuration loaded from a TOML file.
///
/// The recognized keys mirror the pipeline the tool slots into:
/// PowerDesigner documents go in, an external extractor drops RETW
/// files into a versioned folder, and this tool derives run plans and
/// dependency views from them. `publisher` and `devops` sections belong
/// to downstream collaborators; they are accepted as opaque tables so a
/// shared config file round-trips without complaint.
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::CliError;

/// The complete workload configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigData {
    /// Identifies the workload; names the folder under the
    /// intermediate root.
    pub title: String,
    /// Base directory for all intermediate outputs.
    pub folder_intermediate_root: PathBuf,
    #[serde(default)]
    pub power_designer: PowerDesignerConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    /// Publisher settings; opaque to this tool.
    #[serde(default)]
    pub publisher: toml::Table,
    /// DevOps settings; opaque to this tool.
    #[serde(default)]
    pub devops: toml::Table,
}

/// Source PowerDesigner documents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PowerDesignerConfig {
    /// Folder holding the PowerDesigner documents.
    pub folder: PathBuf,
    /// The document file names; their stems name the extracted RETW
    /// files.
    pub files: Vec<PathBuf>,
}

/// Settings of the external extractor whose output this tool consumes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Subfolder of a version folder where RETW extracts land.
    pub folder: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            folder: "RETW".to_owned(),
        }
    }
}

/// Settings of the downstream DDL generator; carried for the shared
/// config file, not consumed by this tool.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub folder: String,
    pub templates_platform: Option<String>,
    pub created_ddls_json: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            folder: "Generator".to_owned(),
            templates_platform: None,
            created_ddls_json: "ddls.json".to_owned(),
        }
    }
}

impl ConfigData {
    /// Loads and parses the configuration file.
    ///
    /// # Errors
    ///
    /// [`CliError::ConfigRead`] when the file cannot be read,
    /// [`CliError::ConfigParse`] when it is not valid TOML or misses a
    /// required key.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|e| CliError::ConfigRead {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| CliError::ConfigParse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }

    /// The workload's folder under the intermediate root; version
    /// folders live directly beneath it.
    pub fn workload_root(&self) -> PathBuf {
        self.folder_intermediate_root.join(&self.title)
    }

    /// Resolves the RETW files expected inside `version_root`: one per
    /// configured PowerDesigner document, named after its stem.
    pub fn retw_files(&self, version_root: &Path) -> Vec<PathBuf> {
        let extract_dir = version_root.join(&self.extractor.folder);
        self.power_designer
            .files
            .iter()
            .filter_map(|file| file.file_stem())
            .map(|stem| {
                let mut name = stem.to_os_string();
                name.push(".json");
                extract_dir.join(name)
            })
            .collect()
    }
}
