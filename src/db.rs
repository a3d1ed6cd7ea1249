// ==========================================
// 订单导入服务 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 提供建表脚本（仅在表不存在时创建，不做迁移）
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS part_numbers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    partner_a_part_number TEXT,
    partner_a_catalog_id INTEGER,
    partner_a_price REAL,
    partner_b_part_number TEXT,
    partner_b_catalog_id INTEGER,
    partner_b_price REAL,
    partner_c_part_number TEXT,
    partner_c_catalog_id INTEGER,
    partner_c_price REAL
);

CREATE INDEX IF NOT EXISTS idx_part_numbers_a ON part_numbers(partner_a_part_number);
CREATE INDEX IF NOT EXISTS idx_part_numbers_b ON part_numbers(partner_b_part_number);
CREATE INDEX IF NOT EXISTS idx_part_numbers_c ON part_numbers(partner_c_part_number);

CREATE TABLE IF NOT EXISTS partner_a_orders (
    po_number INTEGER PRIMARY KEY,
    po_date TEXT,
    revision INTEGER NOT NULL DEFAULT 0,
    total_cost REAL NOT NULL DEFAULT 0,
    total_catalog_cost REAL NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS partner_a_order_details (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    po_number INTEGER NOT NULL REFERENCES partner_a_orders(po_number),
    line_number INTEGER,
    part_number TEXT,
    quantity_ordered REAL,
    catalog_id INTEGER,
    po_price REAL,
    due_by_date TEXT
);

CREATE TABLE IF NOT EXISTS partner_b_orders (
    po_number TEXT PRIMARY KEY,
    po_date TEXT,
    sales_order_number TEXT,
    revision INTEGER NOT NULL DEFAULT 0,
    total_cost REAL NOT NULL DEFAULT 0,
    total_catalog_cost REAL NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS partner_b_order_details (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    po_number TEXT NOT NULL REFERENCES partner_b_orders(po_number),
    line_number INTEGER,
    part_number TEXT,
    quantity_ordered INTEGER,
    catalog_id INTEGER,
    po_price REAL,
    due_by_date TEXT
);

CREATE TABLE IF NOT EXISTS partner_c_orders (
    po_number INTEGER PRIMARY KEY,
    sales_order_number TEXT,
    revision INTEGER NOT NULL DEFAULT 0,
    status TEXT,
    total_order_dollars REAL NOT NULL DEFAULT 0,
    total_catalog_cost REAL NOT NULL DEFAULT 0,
    date_entered TEXT,
    due_by_date TEXT,
    route_code TEXT
);

CREATE TABLE IF NOT EXISTS partner_c_order_details (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    po_number INTEGER NOT NULL REFERENCES partner_c_orders(po_number),
    line_number TEXT,
    part_number TEXT,
    status TEXT,
    quantity_ordered INTEGER,
    unit_price REAL,
    catalog_id INTEGER
);
"#;

/// 创建目录表与三组 表头/明细 表（已存在则跳过）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name LIKE 'partner_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 6);
    }
}
