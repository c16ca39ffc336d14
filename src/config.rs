use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ast::types::Operator;
use crate::tailor::{SqlServerTailor, Tailor};

/// Target engines this build can tailor for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    SqlServer,
}

/// Spelling modulo constructs are normalized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuloStyle {
    /// `a % b`
    #[default]
    Percent,
    /// `a MOD b`
    Keyword,
}

impl ModuloStyle {
    pub fn operator(self) -> Operator {
        match self {
            ModuloStyle::Percent => Operator::Mod,
            ModuloStyle::Keyword => Operator::AccessMod,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TailorConfig {
    pub dialect: Dialect,
    pub modulo: ModuloStyle,
}

impl TailorConfig {
    pub fn get_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sqltailor")
            .join("config.toml")
    }

    /// Load from the default location; defaults when no file exists.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Rule engine for the configured dialect.
    pub fn tailor(&self) -> Box<dyn Tailor> {
        match self.dialect {
            Dialect::SqlServer => Box::new(SqlServerTailor::with_mod_operator(
                self.modulo.operator(),
            )),
        }
    }
}
