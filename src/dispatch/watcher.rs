// ==========================================
// 订单导入服务 - 投递目录监控与分派
// ==========================================
// 流程:
// 1. 启动时先处理目录中已有文件（副目录优先，各目录按创建时间倒序）
// 2. 再为每个目录启用文件创建通知，事件进入有界队列
// 3. 单个工作任务依次取出事件；全系统同一时刻只处理一个文件
// 4. 每个文件处理结束（成功或失败）后等待固定间隔再处理下一个
// 停止: 释放目录监控并跳过队列中剩余事件；正在处理的文件不中断
// ==========================================

use crate::config::settings::ProcessingConfig;
use crate::dispatch::file_mover::relocate;
use crate::dispatch::handler::{display_name, DropHandler, FileReport, HandlerRegistry};
use crate::importer::file_parser::is_spreadsheet_name;
use crate::repository::import_store::StoreProvider;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

/// 文件来源目录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropSource {
    Primary,
    Secondary,
}

#[derive(Debug, Clone)]
struct DropEvent {
    path: PathBuf,
    source: DropSource,
}

/// 单文件处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// 已处理；移动失败时 destination 为 None
    Processed {
        report: FileReport,
        destination: Option<PathBuf>,
    },
    /// 整个文件失败；移动失败时 destination 为 None
    Failed {
        error: String,
        destination: Option<PathBuf>,
    },
    /// 文件已不存在，或属于需要保留的文件
    Skipped,
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("目录监控创建失败: {0}")]
    Watch(#[from] notify::Error),

    #[error("分派器已在运行")]
    AlreadyStarted,
}

struct Shared {
    config: Arc<ProcessingConfig>,
    registry: HandlerRegistry,
    stores: Arc<dyn StoreProvider>,
    /// 单文件互斥
    gate: Mutex<()>,
    stopped: AtomicBool,
}

impl Shared {
    fn handler_for(&self, source: DropSource) -> Option<Arc<dyn DropHandler>> {
        match source {
            DropSource::Primary => Some(Arc::clone(&self.registry.primary)),
            DropSource::Secondary => self.registry.secondary.clone(),
        }
    }

    /// 需要监控的目录，副目录在前
    fn directories(&self) -> Vec<(PathBuf, DropSource)> {
        let mut dirs = Vec::with_capacity(2);
        if let (Some(dir), Some(_)) = (&self.config.secondary_data_directory, &self.registry.secondary) {
            dirs.push((dir.clone(), DropSource::Secondary));
        }
        dirs.push((self.config.data_directory.clone(), DropSource::Primary));
        dirs
    }
}

// ==========================================
// DropFolderDispatcher
// ==========================================
pub struct DropFolderDispatcher {
    shared: Arc<Shared>,
    watchers: Vec<RecommendedWatcher>,
    worker: Option<JoinHandle<()>>,
}

impl DropFolderDispatcher {
    pub fn new(
        config: Arc<ProcessingConfig>,
        registry: HandlerRegistry,
        stores: Arc<dyn StoreProvider>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                registry,
                stores,
                gate: Mutex::new(()),
                stopped: AtomicBool::new(false),
            }),
            watchers: Vec::new(),
            worker: None,
        }
    }

    /// 处理已有文件后启用目录监控
    pub async fn start(&mut self) -> Result<(), DispatchError> {
        if self.worker.is_some() {
            return Err(DispatchError::AlreadyStarted);
        }
        self.shared.stopped.store(false, Ordering::SeqCst);

        let drained = self.drain_existing().await;
        info!(target: "processing", "启动时处理已有文件 {} 个", drained);

        let (tx, rx) = mpsc::channel::<DropEvent>(self.shared.config.queue_capacity);
        let mut watchers = Vec::new();
        for (dir, source) in self.shared.directories() {
            let tx = tx.clone();
            let mut watcher = notify::recommended_watcher(
                move |res: Result<notify::Event, notify::Error>| match res {
                    Ok(event) if event.kind.is_create() => {
                        for path in event.paths {
                            if is_spreadsheet_name(&path) {
                                let _ = tx.blocking_send(DropEvent { path, source });
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!(target: "processing", "目录监控事件错误: {}", e),
                },
            )?;
            watcher.watch(&dir, RecursiveMode::NonRecursive)?;
            info!(target: "processing", "开始监控目录 {:?}: {}", source, dir.display());
            watchers.push(watcher);
        }
        drop(tx);

        self.watchers = watchers;
        let shared = Arc::clone(&self.shared);
        self.worker = Some(tokio::spawn(run_worker(shared, rx)));
        Ok(())
    }

    /// 停止接收新事件；正在处理的文件继续完成
    pub fn stop(&mut self) {
        self.shared.stopped.store(true, Ordering::SeqCst);
        self.watchers.clear();
        info!(target: "processing", "目录监控已停止");
    }

    /// 等待工作任务退出（需先 stop）
    pub async fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                error!(target: "processing", "工作任务异常退出: {}", e);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some() && !self.shared.stopped.load(Ordering::SeqCst)
    }

    /// 依次处理各目录中已有的文件
    ///
    /// # 返回
    /// - 处理的文件数（含失败）
    pub async fn drain_existing(&self) -> usize {
        let mut count = 0;
        for (dir, source) in self.shared.directories() {
            for path in existing_files_newest_first(&dir) {
                match process_serialized(&self.shared, path, source).await {
                    FileOutcome::Skipped => {}
                    _ => count += 1,
                }
            }
        }
        count
    }

    /// 处理单个投递文件（与监控事件共享单文件互斥）
    pub async fn process_dropped_file(&self, path: &Path, source: DropSource) -> FileOutcome {
        process_serialized(&self.shared, path.to_path_buf(), source).await
    }
}

impl Drop for DropFolderDispatcher {
    fn drop(&mut self) {
        self.shared.stopped.store(true, Ordering::SeqCst);
    }
}

async fn run_worker(shared: Arc<Shared>, mut rx: mpsc::Receiver<DropEvent>) {
    while let Some(event) = rx.recv().await {
        if shared.stopped.load(Ordering::SeqCst) {
            debug!(target: "processing", "已停止，忽略事件: {}", event.path.display());
            continue;
        }
        process_serialized(&shared, event.path, event.source).await;
    }
}

/// 持有互斥锁处理一个文件，结束后等待固定间隔
async fn process_serialized(shared: &Arc<Shared>, path: PathBuf, source: DropSource) -> FileOutcome {
    let _guard = shared.gate.lock().await;

    let Some(handler) = shared.handler_for(source) else {
        warn!(target: "processing", "来源 {:?} 未配置处理器: {}", source, path.display());
        return FileOutcome::Skipped;
    };

    let task_shared = Arc::clone(shared);
    let outcome = match tokio::task::spawn_blocking(move || process_file(&task_shared, handler.as_ref(), &path)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(target: "processing", "文件处理任务异常: {}", e);
            FileOutcome::Failed {
                error: e.to_string(),
                destination: None,
            }
        }
    };

    if !shared.config.debounce.is_zero() {
        tokio::time::sleep(shared.config.debounce).await;
    }
    outcome
}

/// 单文件完整流程（阻塞）
fn process_file(shared: &Shared, handler: &dyn DropHandler, path: &Path) -> FileOutcome {
    let file_name = display_name(path);
    let run_id = Uuid::new_v4();
    let span = info_span!(target: "processing", "file_cycle", %run_id, file = %file_name);
    let _enter = span.enter();

    if !path.is_file() {
        debug!(target: "processing", "文件已不存在，跳过: {}", path.display());
        return FileOutcome::Skipped;
    }
    if handler.should_skip(path) {
        info!(target: "processing", "忽略文件并保留原位: {}", path.display());
        return FileOutcome::Skipped;
    }

    info!(target: "processing", "发现文件 {}，由 {} 处理", path.display(), handler.name());

    // 存储会话在本次处理结束时释放
    let result = shared
        .stores
        .open()
        .and_then(|store| handler.process(path, store.as_ref()));

    match result {
        Ok(report) => {
            if report.has_failures() {
                warn!(
                    target: "processing",
                    "文件 {} 中 {} 个订单保存失败 ({:?})，文件仍移至已处理目录",
                    file_name,
                    report.failed.len(),
                    report.failed
                );
            }
            let destination = match relocate(path, &shared.config.processed_directory) {
                Ok(dest) => {
                    info!(target: "processing", "文件 {} 处理完成，已移至 {}", file_name, dest.display());
                    Some(dest)
                }
                Err(e) => {
                    error!(target: "processing", "文件 {} 处理完成但移动失败: {}", file_name, e);
                    None
                }
            };
            FileOutcome::Processed { report, destination }
        }
        Err(e) => {
            error!(target: "processing", "文件 {} 解析失败，错误信息如下", file_name);
            error!(target: "processing", "{}", error_chain(&e));

            let destination = match relocate(path, &shared.config.error_directory) {
                Ok(dest) => {
                    info!(target: "processing", "已将 {} 移至 {}", file_name, dest.display());
                    Some(dest)
                }
                Err(move_err) => {
                    error!(
                        target: "processing",
                        "处理失败后移动 {} 到错误目录失败: {}",
                        file_name,
                        move_err
                    );
                    None
                }
            };
            FileOutcome::Failed {
                error: e.to_string(),
                destination,
            }
        }
    }
}

/// 错误及其完整来源链
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(&format!("\n  原因: {}", cause));
        source = cause.source();
    }
    message
}

/// 目录中匹配 *.xl* 的文件，按创建时间倒序
fn existing_files_newest_first(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!(target: "processing", "读取目录失败 {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<(SystemTime, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_spreadsheet_name(path))
        .map(|path| {
            let stamp = fs::metadata(&path)
                .and_then(|m| m.created().or_else(|_| m.modified()))
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (stamp, path)
        })
        .collect();

    files.sort_by(|a, b| b.0.cmp(&a.0));
    files.into_iter().map(|(_, path)| path).collect()
}
