// ==========================================
// 集成测试 - 投递目录分派
// ==========================================
// 覆盖范围: DropFolderDispatcher 单文件流程（成功/失败归档、
//           同名防覆盖、启动清理已有文件、对照表保留、部分保存失败）
//           + 监控事件处理、单文件互斥、处理间隔
// ==========================================


use order_intake::dispatch::{
    DispatchError, DropFolderDispatcher, DropHandler, DropSource, FileOutcome, FileReport, HandlerRegistry,
    PartnerFormat,
};
use order_intake::importer::ImportResult;
use order_intake::repository::error::{RepositoryError, RepositoryResult};
use order_intake::repository::reference_store::{CatalogColumns, ReferenceStore};
use order_intake::repository::{ImportStore, OrderTables, RecordRow, RecordStore, SqliteStoreProvider, StoreProvider};
use rusqlite::types::Value;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use test_helpers::{
    count_rows, create_test_db, write_partner_a_file, write_partner_c_file, write_substitution_sheet, PartnerARow,
    PartnerCRow, SubstitutionEntry, TestDirs,
};

// ==========================================
// 测试辅助函数
// ==========================================

fn dispatcher_for(format: PartnerFormat, dirs: &TestDirs) -> DropFolderDispatcher {
    let registry = HandlerRegistry::for_format(format, &dirs.config);
    let stores: Arc<dyn StoreProvider> = Arc::new(SqliteStoreProvider::new(dirs.config.database_path.clone()));
    DropFolderDispatcher::new(Arc::new(dirs.config.clone()), registry, stores)
}

fn single_order_rows(po: f64) -> Vec<PartnerARow> {
    vec![PartnerARow::new(po, 1.0, "ACMEPARTBOLT", 2.0, 3.0, 1.0)]
}

/// 目录参照全部未命中；PO 200 的表头插入失败
struct RejectingStore;

impl ReferenceStore for RejectingStore {
    fn part_identifier(&self, _columns: &CatalogColumns, _item: &str) -> RepositoryResult<i64> {
        Ok(0)
    }

    fn part_unit_cost(&self, _columns: &CatalogColumns, _item: &str) -> RepositoryResult<f64> {
        Ok(0.0)
    }
}

impl RecordStore for RejectingStore {
    fn exists(&self, _tables: &OrderTables, _key: &Value) -> RepositoryResult<bool> {
        Ok(false)
    }

    fn delete(&self, _tables: &OrderTables, _key: &Value) -> RepositoryResult<()> {
        Ok(())
    }

    fn delete_by_key_prefix(&self, _tables: &OrderTables, _prefix: &str) -> RepositoryResult<usize> {
        Ok(0)
    }

    fn insert(&self, _table: &'static str, record: &RecordRow) -> RepositoryResult<()> {
        match record.get("po_number") {
            Some(Value::Integer(200)) => Err(RepositoryError::DatabaseQueryError("disk I/O error".to_string())),
            _ => Ok(()),
        }
    }
}

struct RejectingProvider;

impl StoreProvider for RejectingProvider {
    fn open(&self) -> ImportResult<Box<dyn ImportStore>> {
        Ok(Box::new(RejectingStore))
    }
}

/// 记录同时处理中的文件数及处理顺序，不解析文件内容
struct RecordingHandler {
    hold: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl RecordingHandler {
    fn new(hold: Duration) -> Self {
        Self {
            hold,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl DropHandler for RecordingHandler {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn process(&self, file: &Path, _store: &dyn ImportStore) -> ImportResult<FileReport> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        std::thread::sleep(self.hold);

        let report = FileReport::new(file);
        self.seen.lock().unwrap().push(report.file_name.clone());
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(report)
    }
}

fn recording_dispatcher(dirs: &TestDirs, handler: &Arc<RecordingHandler>) -> DropFolderDispatcher {
    let handler: Arc<dyn DropHandler> = handler.clone();
    let registry = HandlerRegistry::new(handler, None);
    let stores: Arc<dyn StoreProvider> = Arc::new(SqliteStoreProvider::new(dirs.config.database_path.clone()));
    DropFolderDispatcher::new(Arc::new(dirs.config.clone()), registry, stores)
}

async fn wait_for(path: &Path, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if path.exists() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    path.exists()
}

// ==========================================
// 单文件流程
// ==========================================

#[tokio::test]
async fn test_processed_file_moves_to_processed_directory() {
    let (_db_dir, db_path) = create_test_db().unwrap();
    let dirs = TestDirs::new(&db_path).unwrap();
    let dispatcher = dispatcher_for(PartnerFormat::A, &dirs);

    let file = dirs.inbox("forecast.xlsx");
    write_partner_a_file(&file, &single_order_rows(100.0)).unwrap();

    let outcome = dispatcher.process_dropped_file(&file, DropSource::Primary).await;

    match outcome {
        FileOutcome::Processed { report, destination } => {
            assert_eq!(report.saved, vec!["100".to_string()]);
            assert_eq!(destination, Some(dirs.processed("forecast.xlsx")));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(!file.exists());
    assert_eq!(count_rows(&db_path, "partner_a_orders", "po_number = 100"), 1);
}

#[tokio::test]
async fn test_unreadable_file_moves_to_error_directory() {
    let (_db_dir, db_path) = create_test_db().unwrap();
    let dirs = TestDirs::new(&db_path).unwrap();
    let dispatcher = dispatcher_for(PartnerFormat::B, &dirs);

    let file = dirs.inbox("garbage.xlsx");
    fs::write(&file, b"this is not a workbook").unwrap();

    let outcome = dispatcher.process_dropped_file(&file, DropSource::Primary).await;

    match outcome {
        FileOutcome::Failed { destination, .. } => {
            assert_eq!(destination, Some(dirs.errored("garbage.xlsx")));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(!file.exists());
    assert_eq!(count_rows(&db_path, "partner_b_orders", ""), 0);
}

#[tokio::test]
async fn test_same_name_drops_are_not_overwritten() {
    let (_db_dir, db_path) = create_test_db().unwrap();
    let dirs = TestDirs::new(&db_path).unwrap();
    let dispatcher = dispatcher_for(PartnerFormat::A, &dirs);

    let file = dirs.inbox("weekly.xlsx");
    write_partner_a_file(&file, &single_order_rows(100.0)).unwrap();
    dispatcher.process_dropped_file(&file, DropSource::Primary).await;

    write_partner_a_file(&file, &single_order_rows(110.0)).unwrap();
    let outcome = dispatcher.process_dropped_file(&file, DropSource::Primary).await;

    match outcome {
        FileOutcome::Processed { destination, .. } => {
            assert_eq!(destination, Some(dirs.processed("weekly (1).xlsx")));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(dirs.processed("weekly.xlsx").exists());
}

#[tokio::test]
async fn test_missing_file_is_skipped() {
    let (_db_dir, db_path) = create_test_db().unwrap();
    let dirs = TestDirs::new(&db_path).unwrap();
    let dispatcher = dispatcher_for(PartnerFormat::B, &dirs);

    let outcome = dispatcher
        .process_dropped_file(&dirs.inbox("vanished.xlsx"), DropSource::Primary)
        .await;
    assert_eq!(outcome, FileOutcome::Skipped);
}

#[tokio::test]
async fn test_substitution_sheet_left_in_place() {
    let (_db_dir, db_path) = create_test_db().unwrap();
    let mut dirs = TestDirs::new(&db_path).unwrap();

    let sheet = dirs.inbox("Substitutions.xlsx");
    write_substitution_sheet(
        &sheet,
        &[SubstitutionEntry {
            source: "PACK01",
            kit: "KIT01",
            kit_multiplier: 2.0,
            crossbars: "XBAR01",
            crossbars_multiplier: 1.0,
        }],
    )
    .unwrap();
    dirs.config.substitution_sheet = Some(sheet.clone());
    let dispatcher = dispatcher_for(PartnerFormat::C, &dirs);

    let invoice = dirs.inbox("invoice.xlsx");
    write_partner_c_file(&invoice, &[PartnerCRow::open("7001", "1", "SCREW", 1.0, 0.5)]).unwrap();

    let drained = dispatcher.drain_existing().await;

    assert_eq!(drained, 1);
    assert!(sheet.exists());
    assert!(dirs.processed("invoice.xlsx").exists());
    assert!(!dirs.processed("Substitutions.xlsx").exists());
}

#[tokio::test]
async fn test_partial_save_failure_still_archives_file() {
    let (_db_dir, db_path) = create_test_db().unwrap();
    let dirs = TestDirs::new(&db_path).unwrap();
    let registry = HandlerRegistry::for_format(PartnerFormat::A, &dirs.config);
    let dispatcher = DropFolderDispatcher::new(Arc::new(dirs.config.clone()), registry, Arc::new(RejectingProvider));

    let file = dirs.config.secondary_data_directory.clone().unwrap().join("firmed.xlsx");
    write_partner_a_file(
        &file,
        &[
            PartnerARow::new(100.0, 1.0, "ACMEPARTBOLT", 1.0, 1.0, 1.0),
            PartnerARow::new(200.0, 1.0, "ACMEPARTBOLT", 1.0, 1.0, 1.0),
            PartnerARow::new(300.0, 1.0, "ACMEPARTBOLT", 1.0, 1.0, 1.0),
        ],
    )
    .unwrap();

    let outcome = dispatcher.process_dropped_file(&file, DropSource::Secondary).await;

    match outcome {
        FileOutcome::Processed { report, destination } => {
            assert_eq!(report.saved, vec!["100".to_string(), "300".to_string()]);
            assert_eq!(report.failed, vec!["200".to_string()]);
            assert_eq!(destination, Some(dirs.processed("firmed.xlsx")));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

// ==========================================
// 启动 / 停止
// ==========================================

#[tokio::test]
async fn test_start_drains_both_directories() {
    let (_db_dir, db_path) = create_test_db().unwrap();
    let dirs = TestDirs::new(&db_path).unwrap();
    let mut dispatcher = dispatcher_for(PartnerFormat::A, &dirs);

    write_partner_a_file(&dirs.inbox("forecast.xlsx"), &single_order_rows(100.0)).unwrap();
    let secondary = dirs.config.secondary_data_directory.clone().unwrap();
    write_partner_a_file(&secondary.join("firmed.xlsx"), &single_order_rows(300.0)).unwrap();
    fs::write(dirs.inbox("readme.txt"), "ignored").unwrap();

    dispatcher.start().await.unwrap();
    assert!(dispatcher.is_running());
    assert!(matches!(dispatcher.start().await, Err(DispatchError::AlreadyStarted)));

    assert!(dirs.processed("forecast.xlsx").exists());
    assert!(dirs.processed("firmed.xlsx").exists());
    assert!(dirs.inbox("readme.txt").exists());
    assert_eq!(count_rows(&db_path, "partner_a_orders", ""), 2);

    dispatcher.stop();
    assert!(!dispatcher.is_running());
    dispatcher.join().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_file_created_after_start_is_processed() {
    let (_db_dir, db_path) = create_test_db().unwrap();
    let dirs = TestDirs::new(&db_path).unwrap();
    let handler = Arc::new(RecordingHandler::new(Duration::ZERO));
    let mut dispatcher = recording_dispatcher(&dirs, &handler);

    dispatcher.start().await.unwrap();
    assert!(handler.seen().is_empty());

    fs::write(dirs.inbox("notes.txt"), "ignored").unwrap();
    fs::write(dirs.inbox("live.xlsx"), b"dropped after start").unwrap();

    assert!(wait_for(&dirs.processed("live.xlsx"), Duration::from_secs(10)).await);
    assert_eq!(handler.seen(), vec!["live.xlsx".to_string()]);
    assert!(dirs.inbox("notes.txt").exists());

    dispatcher.stop();
    dispatcher.join().await;
}

// ==========================================
// 单文件互斥 / 处理间隔
// ==========================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_drops_are_processed_one_at_a_time() {
    let (_db_dir, db_path) = create_test_db().unwrap();
    let dirs = TestDirs::new(&db_path).unwrap();
    let handler = Arc::new(RecordingHandler::new(Duration::from_millis(50)));
    let dispatcher = recording_dispatcher(&dirs, &handler);

    let files: Vec<_> = (0..4).map(|idx| dirs.inbox(&format!("drop-{}.xlsx", idx))).collect();
    for file in &files {
        fs::write(file, b"payload").unwrap();
    }

    let outcomes = tokio::join!(
        dispatcher.process_dropped_file(&files[0], DropSource::Primary),
        dispatcher.process_dropped_file(&files[1], DropSource::Primary),
        dispatcher.process_dropped_file(&files[2], DropSource::Primary),
        dispatcher.process_dropped_file(&files[3], DropSource::Primary),
    );
    for outcome in [outcomes.0, outcomes.1, outcomes.2, outcomes.3] {
        assert!(matches!(outcome, FileOutcome::Processed { .. }));
    }

    assert_eq!(handler.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(handler.seen().len(), 4);
    for idx in 0..4 {
        assert!(dirs.processed(&format!("drop-{}.xlsx", idx)).exists());
    }
}

#[tokio::test]
async fn test_each_file_is_followed_by_debounce() {
    let (_db_dir, db_path) = create_test_db().unwrap();
    let mut dirs = TestDirs::new(&db_path).unwrap();
    dirs.config.debounce = Duration::from_millis(150);
    let handler = Arc::new(RecordingHandler::new(Duration::ZERO));
    let dispatcher = recording_dispatcher(&dirs, &handler);

    let first = dirs.inbox("first.xlsx");
    let second = dirs.inbox("second.xlsx");
    fs::write(&first, b"one").unwrap();
    fs::write(&second, b"two").unwrap();

    let started = Instant::now();
    dispatcher.process_dropped_file(&first, DropSource::Primary).await;
    dispatcher.process_dropped_file(&second, DropSource::Primary).await;

    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(handler.seen(), vec!["first.xlsx".to_string(), "second.xlsx".to_string()]);
}
