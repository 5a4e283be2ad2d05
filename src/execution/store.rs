use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::execution::types::{Transaction, TransactionStatus};

/// Sqlite sink for executed opportunities. The scan core never reads from
/// here; this is where chosen opportunities live out their status lifecycle.
pub struct TransactionStore {
    conn: Connection,
}

impl TransactionStore {
    pub fn new(db_path: &str) -> Result<Self> {
        Self::from_connection(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product_name TEXT NOT NULL,
                source_platform TEXT NOT NULL,
                target_platform TEXT NOT NULL,
                source_price REAL NOT NULL,
                target_price REAL NOT NULL,
                amount_usd REAL NOT NULL,
                expected_profit REAL NOT NULL,
                roi_percentage REAL NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_status ON transactions(status);
            CREATE INDEX IF NOT EXISTS idx_transactions_created_at ON transactions(created_at);
            "#,
        )?;

        Ok(Self { conn })
    }

    /// Insert a new transaction, returning its row id.
    pub fn insert(&self, tx: &Transaction) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO transactions (product_name, source_platform, target_platform,
                 source_price, target_price, amount_usd, expected_profit, roi_percentage,
                 status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                tx.product_name,
                tx.source_platform,
                tx.target_platform,
                tx.source_price,
                tx.target_price,
                tx.amount_usd,
                tx.expected_profit,
                tx.roi_percentage,
                tx.status.as_str(),
                tx.created_at.to_rfc3339(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Advance a transaction along its lifecycle. Rejects anything that is
    /// not the immediate next status.
    pub fn advance_status(&self, id: i64, next: TransactionStatus) -> Result<()> {
        let current_str: String = self.conn.query_row(
            "SELECT status FROM transactions WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        let current = TransactionStatus::parse(&current_str)
            .ok_or_else(|| anyhow::anyhow!("transaction {} has unknown status '{}'", id, current_str))?;

        if !current.can_advance_to(next) {
            anyhow::bail!(
                "transaction {}: illegal status transition {} -> {}",
                id,
                current.as_str(),
                next.as_str()
            );
        }

        self.conn.execute(
            "UPDATE transactions SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![next.as_str(), Utc::now().to_rfc3339(), id],
        )?;
        Ok(())
    }

    pub fn get_by_status(&self, status: TransactionStatus) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, product_name, source_platform, target_platform, source_price,
                    target_price, amount_usd, expected_profit, roi_percentage, status,
                    created_at, updated_at
             FROM transactions
             WHERE status = ?1
             ORDER BY created_at",
        )?;

        let rows = stmt.query_map(params![status.as_str()], |row| {
            let status_str: String = row.get(9)?;
            let created_at_str: String = row.get(10)?;
            let updated_at_str: Option<String> = row.get(11)?;

            Ok(Transaction {
                id: Some(row.get(0)?),
                product_name: row.get(1)?,
                source_platform: row.get(2)?,
                target_platform: row.get(3)?,
                source_price: row.get(4)?,
                target_price: row.get(5)?,
                amount_usd: row.get(6)?,
                expected_profit: row.get(7)?,
                roi_percentage: row.get(8)?,
                status: TransactionStatus::parse(&status_str).unwrap_or(TransactionStatus::Pending),
                created_at: parse_timestamp(&created_at_str),
                updated_at: updated_at_str.as_deref().map(parse_timestamp),
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(|e| e.into())
    }

    pub fn count_today(&self) -> Result<usize> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let count: usize = self.conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE DATE(created_at) = ?1",
            params![today],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Total USD committed today, for reconciling the budget ledger after a
    /// restart.
    pub fn spent_today(&self) -> Result<f64> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let spent: Option<f64> = self.conn.query_row(
            "SELECT SUM(amount_usd) FROM transactions WHERE DATE(created_at) = ?1",
            params![today],
            |row| row.get(0),
        )?;
        Ok(spent.unwrap_or(0.0))
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
