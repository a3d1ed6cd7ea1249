// ==========================================
// 订单导入服务 - 配置层
// ==========================================
// 职责: 读取导入配置，校验目录并生成运行期配置
// 存储: TOML 配置文件
// ==========================================

pub mod path_rules;
pub mod settings;

// 重导出核心配置类型
pub use path_rules::PathRules;
pub use settings::{ConfigError, ImporterSettings, PollSettings, ProcessingConfig};
