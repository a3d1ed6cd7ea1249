// ==========================================
// 订单导入服务 - 命令行入口
// ==========================================
// 用法: order-intake --format <a|b|c> [--config <path>] [--init-schema] [--console]
// 运行至 Ctrl-C；停止时不中断正在处理的文件
// ==========================================

use anyhow::{bail, Context, Result};
use clap::Parser;
use order_intake::config::ImporterSettings;
use order_intake::db;
use order_intake::dispatch::{DropFolderDispatcher, HandlerRegistry, PartnerFormat};
use order_intake::logging::{self, LogSettings};
use order_intake::repository::{SqliteStoreProvider, StoreProvider};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "order-intake")]
#[command(about = "监控投递目录，导入伙伴订单/发票电子表格", version)]
struct Cli {
    /// 伙伴格式
    #[arg(short, long, value_enum)]
    format: PartnerFormat,

    /// 配置文件路径（默认 <config_dir>/order-intake/importer.toml）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 启动前创建缺失的数据表
    #[arg(long)]
    init_schema: bool,

    /// 同时输出日志到控制台
    #[arg(long)]
    console: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(settings_path) = cli.config.clone().or_else(ImporterSettings::default_path) else {
        bail!("无法确定配置文件路径，请使用 --config 指定");
    };
    let settings = ImporterSettings::load(&settings_path)
        .with_context(|| format!("加载配置失败: {}", settings_path.display()))?;

    let startup_directory = std::env::current_dir().context("无法获取工作目录")?;
    logging::init(LogSettings {
        log_directory: PathBuf::from(settings.log_directory.trim()),
        startup_directory,
        mirror_to_console: settings.mirror_to_console || cli.console,
    })
    .context("日志初始化失败")?;

    info!(target: "processing", "==================================================");
    info!(target: "processing", "{} v{} - 伙伴格式 {:?}", order_intake::APP_NAME, order_intake::VERSION, cli.format);
    info!(target: "processing", "==================================================");

    let config = match settings.validate(cli.format.uses_secondary_directory()) {
        Ok(config) => Arc::new(config),
        Err(errors) => {
            error!(target: "startup", "配置校验失败 ({} 项)，目录监控未启动", errors.len());
            bail!("配置校验失败，详见启动错误日志");
        }
    };

    if cli.init_schema {
        let conn = db::open_sqlite_connection(&config.database_path)
            .with_context(|| format!("无法打开数据库: {}", config.database_path))?;
        db::init_schema(&conn).context("建表失败")?;
        info!(target: "processing", "数据表已就绪: {}", config.database_path);
    }

    let registry = HandlerRegistry::for_format(cli.format, &config);
    let stores: Arc<dyn StoreProvider> = Arc::new(SqliteStoreProvider::new(config.database_path.clone()));
    let mut dispatcher = DropFolderDispatcher::new(config, registry, stores);

    dispatcher.start().await.context("目录监控启动失败")?;

    tokio::signal::ctrl_c().await.context("等待退出信号失败")?;
    info!(target: "processing", "收到退出信号，停止目录监控");
    dispatcher.stop();
    dispatcher.join().await;

    Ok(())
}
