// ==========================================
// 订单导入服务 - SQLite 存储实现
// ==========================================
// 红线: 仓储不含业务逻辑，只负责数据访问
// 连接按文件打开，SqliteStore 释放即关闭
// ==========================================

use crate::db::open_sqlite_connection;
use crate::importer::error::ImportResult;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::import_store::{ImportStore, StoreProvider};
use crate::repository::record_store::{OrderTables, RecordRow, RecordStore};
use crate::repository::reference_store::{CatalogColumns, ReferenceStore, CATALOG_TABLE};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard};

// ==========================================
// SqliteStore
// ==========================================
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// 打开数据库文件
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    /// 从已有连接创建
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::InternalError(format!("连接锁获取失败: {}", e)))
    }
}

impl ReferenceStore for SqliteStore {
    fn part_identifier(&self, columns: &CatalogColumns, item_number: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1 LIMIT 1",
            columns.id_column, CATALOG_TABLE, columns.part_column
        );
        let id: Option<Option<i64>> = conn
            .query_row(&sql, params![item_number], |row| row.get(0))
            .optional()?;
        Ok(id.flatten().unwrap_or(0))
    }

    fn part_unit_cost(&self, columns: &CatalogColumns, item_number: &str) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1 LIMIT 1",
            columns.cost_column, CATALOG_TABLE, columns.part_column
        );
        let cost: Option<Option<f64>> = conn
            .query_row(&sql, params![item_number], |row| row.get(0))
            .optional()?;
        Ok(cost.flatten().unwrap_or(0.0))
    }
}

impl RecordStore for SqliteStore {
    fn exists(&self, tables: &OrderTables, key: &Value) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT 1 FROM {} WHERE {} = ?1 LIMIT 1",
            tables.header, tables.key_column
        );
        let found: Option<i64> = conn.query_row(&sql, [key], |row| row.get(0)).optional()?;
        Ok(found.is_some())
    }

    fn delete(&self, tables: &OrderTables, key: &Value) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            &format!("DELETE FROM {} WHERE {} = ?1", tables.detail, tables.key_column),
            [key],
        )?;
        conn.execute(
            &format!("DELETE FROM {} WHERE {} = ?1", tables.header, tables.key_column),
            [key],
        )?;
        Ok(())
    }

    fn delete_by_key_prefix(&self, tables: &OrderTables, prefix: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let pattern = format!("{}%", prefix);
        conn.execute(
            &format!(
                "DELETE FROM {} WHERE CAST({} AS TEXT) LIKE ?1",
                tables.detail, tables.key_column
            ),
            params![pattern],
        )?;
        let removed = conn.execute(
            &format!(
                "DELETE FROM {} WHERE CAST({} AS TEXT) LIKE ?1",
                tables.header, tables.key_column
            ),
            params![pattern],
        )?;
        Ok(removed)
    }

    fn insert(&self, table: &'static str, record: &RecordRow) -> RepositoryResult<()> {
        if record.columns.is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: table.to_string(),
                message: "插入记录不含任何列".to_string(),
            });
        }

        let names: Vec<&str> = record.columns.iter().map(|(name, _)| *name).collect();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            names.join(", "),
            placeholders.join(", ")
        );

        let conn = self.get_conn()?;
        conn.execute(&sql, params_from_iter(record.columns.iter().map(|(_, value)| value)))?;
        Ok(())
    }
}

// ==========================================
// SqliteStoreProvider - 每个文件打开一个新连接
// ==========================================
pub struct SqliteStoreProvider {
    db_path: String,
}

impl SqliteStoreProvider {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl StoreProvider for SqliteStoreProvider {
    fn open(&self) -> ImportResult<Box<dyn ImportStore>> {
        let store = SqliteStore::open(&self.db_path)?;
        Ok(Box::new(store))
    }
}
