// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 三个日志流按 target 区分，各写入按日期命名的追加文件:
// - processing → <日志目录>/ImportLog-MMDDYYYY.txt
// - pricing    → <日志目录>/PricingLog-MMDDYYYY.txt
// - startup    → <启动目录>/UnconfiguredErrorLog-MMDDYYYY.txt
// 可选控制台输出，支持环境变量配置日志级别
// ==========================================

use chrono::Local;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter, Layer};

pub const PROCESSING_TARGET: &str = "processing";
pub const PRICING_TARGET: &str = "pricing";
pub const STARTUP_TARGET: &str = "startup";

pub const PROCESSING_LOG_NAME: &str = "ImportLog";
pub const PRICING_LOG_NAME: &str = "PricingLog";
pub const STARTUP_LOG_NAME: &str = "UnconfiguredErrorLog";

/// 日志初始化参数
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// processing / pricing 日志目录
    pub log_directory: PathBuf,
    /// startup 日志目录（日志目录本身可能无效，使用进程工作目录）
    pub startup_directory: PathBuf,
    /// 同时输出到控制台
    pub mirror_to_console: bool,
}

// ==========================================
// DatedFileWriter - 按日期命名的追加文件
// ==========================================
// 每次写入时取当前日期，跨零点自动切换文件；打开失败时丢弃该条日志
#[derive(Debug, Clone)]
pub struct DatedFileWriter {
    directory: PathBuf,
    stream: &'static str,
}

impl DatedFileWriter {
    pub fn new(directory: impl Into<PathBuf>, stream: &'static str) -> Self {
        Self {
            directory: directory.into(),
            stream,
        }
    }

    /// 当前日期对应的日志文件路径
    pub fn current_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}-{}.txt", self.stream, Local::now().format("%m%d%Y")))
    }
}

impl<'a> MakeWriter<'a> for DatedFileWriter {
    type Writer = Box<dyn io::Write + 'a>;

    fn make_writer(&'a self) -> Self::Writer {
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.current_path())
        {
            Ok(file) => Box::new(file),
            Err(_) => Box::new(io::sink()),
        }
    }
}

fn stream_layer<S>(
    directory: &Path,
    stream: &'static str,
    target: &'static str,
) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    fmt::layer()
        .with_writer(DatedFileWriter::new(directory, stream))
        .with_ansi(false)
        .with_target(false)
        .with_filter(filter_fn(move |meta: &tracing::Metadata<'_>| meta.target() == target))
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 控制台日志级别过滤器（默认: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=order_intake=trace
///
/// # 示例
/// ```no_run
/// use order_intake::logging::{self, LogSettings};
/// logging::init(LogSettings {
///     log_directory: "/var/log/order-intake".into(),
///     startup_directory: ".".into(),
///     mirror_to_console: true,
/// })
/// .ok();
/// ```
pub fn init(settings: LogSettings) -> Result<(), TryInitError> {
    let console = settings.mirror_to_console.then(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_line_number(true)
            .with_filter(filter)
    });

    tracing_subscriber::registry()
        .with(stream_layer(&settings.log_directory, PROCESSING_LOG_NAME, PROCESSING_TARGET))
        .with(stream_layer(&settings.log_directory, PRICING_LOG_NAME, PRICING_TARGET))
        .with(stream_layer(&settings.startup_directory, STARTUP_LOG_NAME, STARTUP_TARGET))
        .with(console)
        .try_init()
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
