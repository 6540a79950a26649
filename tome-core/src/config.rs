use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::NodeKind;

pub const DEFAULT_API_URL: &str = "https://api.notion.com/v1";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No root page id configured (set NOTION_ROOT_PAGE_ID or pass --root)")]
    MissingRootId,
    #[error("No Notion API token configured (set NOTION_API_KEY)")]
    MissingToken,
}

/// Settings as they come out of files, environment and flags. Everything is
/// optional here; [`Config::export_config`] and [`Config::notion_config`]
/// check what an export actually needs.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub export: ExportSettings,
    pub notion: NotionSettings,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ExportSettings {
    pub root_page_id: Option<String>,
    /// Treat the root id as a database instead of a page.
    pub database: bool,
    pub output: String,
    pub download_images: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            root_page_id: None,
            database: false,
            output: "./root_page".to_string(),
            download_images: true,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct NotionSettings {
    pub token: Option<String>,
    pub api_url: String,
    pub version: String,
}

impl Default for NotionSettings {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            version: DEFAULT_NOTION_VERSION.to_string(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Config {
    pub fn export_config(&self) -> Result<ExportConfig, ConfigError> {
        let root_id = non_empty(&self.export.root_page_id).ok_or(ConfigError::MissingRootId)?;
        let root_kind = if self.export.database {
            NodeKind::Container
        } else {
            NodeKind::Page
        };

        Ok(ExportConfig {
            root_id,
            root_kind,
            output_dir: PathBuf::from(&self.export.output),
            download_images: self.export.download_images,
        })
    }

    pub fn notion_config(&self) -> Result<NotionConfig, ConfigError> {
        let token = non_empty(&self.notion.token).ok_or(ConfigError::MissingToken)?;

        Ok(NotionConfig {
            token,
            api_url: self.notion.api_url.clone(),
            version: self.notion.version.clone(),
        })
    }
}

/// What to export and where. Built once at startup and handed to the
/// exporter; nothing changes it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub root_id: String,
    pub root_kind: NodeKind,
    pub output_dir: PathBuf,
    pub download_images: bool,
}

impl ExportConfig {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(root_id: S, output_dir: P) -> Self {
        Self {
            root_id: root_id.into(),
            root_kind: NodeKind::Page,
            output_dir: output_dir.into(),
            download_images: true,
        }
    }

    pub fn root_kind(mut self, kind: NodeKind) -> Self {
        self.root_kind = kind;
        self
    }

    pub fn download_images(mut self, enabled: bool) -> Self {
        self.download_images = enabled;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionConfig {
    pub token: String,
    pub api_url: String,
    pub version: String,
}
