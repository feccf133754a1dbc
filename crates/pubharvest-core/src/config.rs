use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Root application configuration, loaded from `~/.config/pubharvest/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub organization: OrganizationConfig,
    pub sources: SourcesConfig,
    pub export: ExportConfig,
}

/// Affiliation terms sent to each catalog. PubMed and CrossRef match
/// affiliations differently, so each gets its own spelling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationConfig {
    pub pubmed_affiliation: String,
    pub crossref_affiliation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub pubmed_base_url: String,
    pub crossref_base_url: String,
    pub doi_base_url: String,
    pub max_results: u32,
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polite_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_path: String,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            pubmed_affiliation: "ibet".to_string(),
            crossref_affiliation: "iBET".to_string(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            pubmed_base_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
            crossref_base_url: "https://api.crossref.org".to_string(),
            doi_base_url: "https://doi.org".to_string(),
            max_results: 1000,
            timeout_secs: 30,
            polite_email: None,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: "output.txt".to_string(),
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/pubharvest/config.toml`
    pub fn config_path() -> PathBuf {
        // Allow override via env var
        if let Ok(path) = std::env::var("PUBHARVEST_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("pubharvest")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let sources = &self.sources;
        for (key, url) in [
            ("sources.pubmed_base_url", &sources.pubmed_base_url),
            ("sources.crossref_base_url", &sources.crossref_base_url),
            ("sources.doi_base_url", &sources.doi_base_url),
        ] {
            if url.trim().is_empty() {
                return Err(CoreError::ConfigError(format!("{key} must not be empty")));
            }
        }
        if sources.max_results == 0 {
            return Err(CoreError::ConfigError(
                "sources.max_results must be at least 1".to_string(),
            ));
        }
        if sources.timeout_secs == 0 {
            return Err(CoreError::ConfigError(
                "sources.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.export.output_path.trim().is_empty() {
            return Err(CoreError::ConfigError(
                "export.output_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Path the harvested records are written to.
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.export.output_path)
    }
}
