// ==========================================
// 订单导入服务 - 导入配置
// ==========================================
// 来源: TOML 文件（默认 <config_dir>/order-intake/importer.toml）
// 校验: 目录路径格式 → 缺失目录自动创建 → 替换对照表存在性
// 校验失败全部收集后统一写入 startup 日志，不提前返回
// 产出: ProcessingConfig，运行期间只读，经 Arc 共享
// ==========================================

use crate::config::path_rules::PathRules;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

/// 配置目录下的应用子目录
pub const APP_CONFIG_DIR: &str = "order-intake";
/// 配置文件名
pub const SETTINGS_FILE_NAME: &str = "importer.toml";

// ==========================================
// ConfigError - 配置错误
// ==========================================
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("目录路径格式无效 ({name}): {path}")]
    InvalidPath { name: &'static str, path: String },

    #[error("目录创建失败 ({name}): {path}: {source}")]
    CreateDirectory {
        name: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("缺少配置项: {0}")]
    MissingSetting(&'static str),

    #[error("替换对照表不存在: {0}")]
    MissingSubstitutionSheet(String),

    #[error("配置文件读取失败: {path}: {source}")]
    SettingsRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件格式错误: {path}: {source}")]
    SettingsParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("路径规则编译失败: {0}")]
    PathRule(#[from] regex::Error),
}

// ==========================================
// PollSettings - 事件处理节奏
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSettings {
    /// 每个文件处理后的等待时间（毫秒）
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// 待处理事件队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_debounce_ms() -> u64 {
    2_000
}

fn default_queue_capacity() -> usize {
    256
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

// ==========================================
// ImporterSettings - 配置文件内容
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImporterSettings {
    pub database_path: String,
    pub data_directory: String,
    #[serde(default)]
    pub secondary_data_directory: Option<String>,
    pub processed_directory: String,
    pub error_directory: String,
    pub log_directory: String,
    #[serde(default)]
    pub substitution_sheet: Option<String>,
    #[serde(default)]
    pub mirror_to_console: bool,
    #[serde(default)]
    pub poll: PollSettings,
}

impl ImporterSettings {
    /// 默认配置文件路径
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_CONFIG_DIR).join(SETTINGS_FILE_NAME))
    }

    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::SettingsParse {
            path: origin.to_string(),
            source,
        })
    }

    /// 读取配置文件
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::SettingsRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// 校验配置并生成运行期配置
    ///
    /// # 参数
    /// - use_secondary: 是否启用副目录（仅伙伴 A 使用）
    ///
    /// # 返回
    /// - Ok(ProcessingConfig)
    /// - Err(Vec<ConfigError>): 全部校验失败项（已写入 startup 日志）
    pub fn validate(&self, use_secondary: bool) -> Result<ProcessingConfig, Vec<ConfigError>> {
        let rules = PathRules::compile().map_err(|e| {
            let err = ConfigError::from(e);
            error!(target: "startup", "{}", err);
            vec![err]
        })?;

        let mut errors = Vec::new();

        let data_directory = prepare_directory(&rules, "data_directory", &self.data_directory, &mut errors);
        let secondary_data_directory = if use_secondary {
            match &self.secondary_data_directory {
                Some(path) => prepare_directory(&rules, "secondary_data_directory", path, &mut errors),
                None => {
                    errors.push(ConfigError::MissingSetting("secondary_data_directory"));
                    None
                }
            }
        } else {
            None
        };
        let processed_directory =
            prepare_directory(&rules, "processed_directory", &self.processed_directory, &mut errors);
        let error_directory = prepare_directory(&rules, "error_directory", &self.error_directory, &mut errors);
        let log_directory = prepare_directory(&rules, "log_directory", &self.log_directory, &mut errors);

        let substitution_sheet = self.substitution_sheet.as_ref().map(PathBuf::from);
        if let Some(sheet) = &substitution_sheet {
            if !sheet.is_file() {
                errors.push(ConfigError::MissingSubstitutionSheet(sheet.display().to_string()));
            }
        }

        if self.database_path.trim().is_empty() {
            errors.push(ConfigError::MissingSetting("database_path"));
        }

        match (data_directory, processed_directory, error_directory, log_directory) {
            (Some(data), Some(processed), Some(error_dir), Some(log)) if errors.is_empty() => {
                Ok(ProcessingConfig {
                    database_path: self.database_path.clone(),
                    data_directory: data,
                    secondary_data_directory,
                    processed_directory: processed,
                    error_directory: error_dir,
                    log_directory: log,
                    substitution_sheet,
                    mirror_to_console: self.mirror_to_console,
                    debounce: Duration::from_millis(self.poll.debounce_ms),
                    queue_capacity: self.poll.queue_capacity.max(1),
                })
            }
            _ => {
                for err in &errors {
                    error!(target: "startup", "{}", err);
                }
                Err(errors)
            }
        }
    }
}

/// 校验格式并在缺失时创建目录
fn prepare_directory(
    rules: &PathRules,
    name: &'static str,
    path: &str,
    errors: &mut Vec<ConfigError>,
) -> Option<PathBuf> {
    let trimmed = path.trim();
    if !rules.is_valid_directory(trimmed) {
        errors.push(ConfigError::InvalidPath {
            name,
            path: path.to_string(),
        });
        return None;
    }

    let dir = PathBuf::from(trimmed);
    if !dir.is_dir() {
        if let Err(source) = fs::create_dir_all(&dir) {
            errors.push(ConfigError::CreateDirectory {
                name,
                path: trimmed.to_string(),
                source,
            });
            return None;
        }
        info!(target: "startup", "已创建目录 ({}): {}", name, dir.display());
    }
    Some(dir)
}

// ==========================================
// ProcessingConfig - 运行期配置（只读）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingConfig {
    pub database_path: String,
    pub data_directory: PathBuf,
    pub secondary_data_directory: Option<PathBuf>,
    pub processed_directory: PathBuf,
    pub error_directory: PathBuf,
    pub log_directory: PathBuf,
    pub substitution_sheet: Option<PathBuf>,
    pub mirror_to_console: bool,
    pub debounce: Duration,
    pub queue_capacity: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings_in(root: &Path) -> ImporterSettings {
        ImporterSettings {
            database_path: root.join("orders.db").display().to_string(),
            data_directory: root.join("inbox").display().to_string(),
            secondary_data_directory: Some(root.join("firmed").display().to_string()),
            processed_directory: root.join("processed").display().to_string(),
            error_directory: root.join("error").display().to_string(),
            log_directory: root.join("logs").display().to_string(),
            substitution_sheet: None,
            mirror_to_console: false,
            poll: PollSettings::default(),
        }
    }

    #[test]
    fn test_parse_toml_with_defaults() {
        let content = r#"
            database_path = "/var/lib/order-intake/orders.db"
            data_directory = "/srv/inbox"
            processed_directory = "/srv/processed"
            error_directory = "/srv/error"
            log_directory = "/var/log/order-intake"
        "#;
        let settings = ImporterSettings::from_toml_str(content, "inline").unwrap();
        assert_eq!(settings.poll.debounce_ms, 2_000);
        assert!(settings.secondary_data_directory.is_none());
        assert!(!settings.mirror_to_console);
    }

    #[test]
    fn test_validate_creates_missing_directories() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_in(tmp.path());

        let config = settings.validate(true).unwrap();
        assert!(config.data_directory.is_dir());
        assert!(config.secondary_data_directory.as_ref().unwrap().is_dir());
        assert!(config.processed_directory.is_dir());
        assert_eq!(config.debounce, Duration::from_millis(2_000));
    }

    #[test]
    fn test_secondary_ignored_when_disabled() {
        let tmp = TempDir::new().unwrap();
        let mut settings = settings_in(tmp.path());
        settings.secondary_data_directory = None;

        let config = settings.validate(false).unwrap();
        assert!(config.secondary_data_directory.is_none());
    }

    #[test]
    fn test_all_failures_collected() {
        let tmp = TempDir::new().unwrap();
        let mut settings = settings_in(tmp.path());
        settings.data_directory = "relative/inbox".to_string();
        settings.error_directory = String::new();
        settings.substitution_sheet = Some(tmp.path().join("missing.xlsx").display().to_string());

        let errors = settings.validate(false).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], ConfigError::InvalidPath { name: "data_directory", .. }));
        assert!(matches!(errors[1], ConfigError::InvalidPath { name: "error_directory", .. }));
        assert!(matches!(errors[2], ConfigError::MissingSubstitutionSheet(_)));
    }
}
