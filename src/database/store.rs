//! Backend seam between the repositories and the two ways of reaching the
//! database: a local SQLite file through the sqlx pool, or a hosted libSQL
//! (Turso) database over HTTP through the `libsql` client.
//!
//! Everything above this module speaks `SqlValue` and `Row`; nothing else in
//! the crate needs to know which backend is in use.

use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Sqlite, SqlitePool};
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::database::manager::DatabaseError;

/// One SQL value, bound as a parameter or read back from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    pub fn bind<'q>(self, query: Query<'q, Sqlite, SqliteArguments<'q>>) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match self {
            SqlValue::Null => query.bind(None::<i64>),
            SqlValue::Integer(v) => query.bind(v),
            SqlValue::Real(v) => query.bind(v),
            SqlValue::Text(v) => query.bind(v),
            SqlValue::Blob(v) => query.bind(v),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "NULL",
            SqlValue::Integer(_) => "INTEGER",
            SqlValue::Real(_) => "REAL",
            SqlValue::Text(_) => "TEXT",
            SqlValue::Blob(_) => "BLOB",
        }
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Blob(v)
    }
}

impl From<libsql::Value> for SqlValue {
    fn from(v: libsql::Value) -> Self {
        match v {
            libsql::Value::Null => SqlValue::Null,
            libsql::Value::Integer(v) => SqlValue::Integer(v),
            libsql::Value::Real(v) => SqlValue::Real(v),
            libsql::Value::Text(v) => SqlValue::Text(v),
            libsql::Value::Blob(v) => SqlValue::Blob(v),
        }
    }
}

impl From<SqlValue> for libsql::Value {
    fn from(v: SqlValue) -> Self {
        match v {
            SqlValue::Null => libsql::Value::Null,
            SqlValue::Integer(v) => libsql::Value::Integer(v),
            SqlValue::Real(v) => libsql::Value::Real(v),
            SqlValue::Text(v) => libsql::Value::Text(v),
            SqlValue::Blob(v) => libsql::Value::Blob(v),
        }
    }
}

/// A result row with columns addressed by name.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    pub fn value(&self, column: &str) -> Result<&SqlValue, DatabaseError> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
            .ok_or_else(|| DatabaseError::ColumnNotFound(column.to_string()))
    }

    pub fn integer(&self, column: &str) -> Result<i64, DatabaseError> {
        match self.value(column)? {
            SqlValue::Integer(v) => Ok(*v),
            other => Err(decode_error(column, "INTEGER", other)),
        }
    }

    pub fn text(&self, column: &str) -> Result<String, DatabaseError> {
        match self.value(column)? {
            SqlValue::Text(v) => Ok(v.clone()),
            other => Err(decode_error(column, "TEXT", other)),
        }
    }

    /// Text, or `None` for NULL
    pub fn optional_text(&self, column: &str) -> Result<Option<String>, DatabaseError> {
        match self.value(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Text(v) => Ok(Some(v.clone())),
            other => Err(decode_error(column, "TEXT", other)),
        }
    }

    pub fn blob(&self, column: &str) -> Result<Vec<u8>, DatabaseError> {
        match self.value(column)? {
            SqlValue::Blob(v) => Ok(v.clone()),
            other => Err(decode_error(column, "BLOB", other)),
        }
    }
}

fn decode_error(column: &str, expected: &'static str, found: &SqlValue) -> DatabaseError {
    DatabaseError::Decode {
        column: column.to_string(),
        expected,
        found: found.kind(),
    }
}

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Executed {
    pub rows_affected: u64,
    pub last_insert_id: i64,
}

/// Shared handle to the database. Cloning is cheap.
#[derive(Clone)]
pub enum Store {
    /// Local file or in-memory SQLite through the sqlx pool
    Sqlite(SqlitePool),
    /// Hosted libSQL reached over HTTP; one connection per operation
    Remote(Arc<libsql::Database>),
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Store::Sqlite(pool) => f.debug_tuple("Store::Sqlite").field(pool).finish(),
            Store::Remote(_) => f.write_str("Store::Remote"),
        }
    }
}

impl Store {
    pub fn backend(&self) -> &'static str {
        match self {
            Store::Sqlite(_) => "sqlite",
            Store::Remote(_) => "libsql",
        }
    }

    pub async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<Executed, DatabaseError> {
        match self {
            Store::Sqlite(pool) => {
                let result = sqlx_query(sql, params).execute(pool).await?;
                Ok(Executed {
                    rows_affected: result.rows_affected(),
                    last_insert_id: result.last_insert_rowid(),
                })
            }
            Store::Remote(db) => libsql_execute(&db.connect()?, sql, params).await,
        }
    }

    pub async fn fetch_all(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>, DatabaseError> {
        match self {
            Store::Sqlite(pool) => {
                let rows = sqlx_query(sql, params).fetch_all(pool).await?;
                from_sqlite_rows(&rows)
            }
            Store::Remote(db) => libsql_fetch(&db.connect()?, sql, params).await,
        }
    }

    pub async fn fetch_optional(&self, sql: &str, params: Vec<SqlValue>) -> Result<Option<Row>, DatabaseError> {
        Ok(self.fetch_all(sql, params).await?.into_iter().next())
    }

    /// Start a transaction; it rolls back unless `commit` is called.
    pub async fn begin(&self) -> Result<StoreTransaction, DatabaseError> {
        match self {
            Store::Sqlite(pool) => Ok(StoreTransaction::Sqlite(pool.begin().await?)),
            Store::Remote(db) => {
                let conn = db.connect()?;
                Ok(StoreTransaction::Remote(conn.transaction().await?))
            }
        }
    }

    pub async fn close(&self) {
        match self {
            Store::Sqlite(pool) => {
                pool.close().await;
                info!("Closed database pool");
            }
            // Remote connections are per operation; nothing is held open
            Store::Remote(_) => info!("Released remote database handle"),
        }
    }
}

pub enum StoreTransaction {
    Sqlite(sqlx::Transaction<'static, Sqlite>),
    Remote(libsql::Transaction),
}

impl StoreTransaction {
    pub async fn execute(&mut self, sql: &str, params: Vec<SqlValue>) -> Result<Executed, DatabaseError> {
        match self {
            StoreTransaction::Sqlite(tx) => {
                let result = sqlx_query(sql, params).execute(&mut **tx).await?;
                Ok(Executed {
                    rows_affected: result.rows_affected(),
                    last_insert_id: result.last_insert_rowid(),
                })
            }
            StoreTransaction::Remote(tx) => libsql_execute(tx, sql, params).await,
        }
    }

    pub async fn fetch_all(&mut self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>, DatabaseError> {
        match self {
            StoreTransaction::Sqlite(tx) => {
                let rows = sqlx_query(sql, params).fetch_all(&mut **tx).await?;
                from_sqlite_rows(&rows)
            }
            StoreTransaction::Remote(tx) => libsql_fetch(tx, sql, params).await,
        }
    }

    pub async fn commit(self) -> Result<(), DatabaseError> {
        match self {
            StoreTransaction::Sqlite(tx) => tx.commit().await?,
            StoreTransaction::Remote(tx) => tx.commit().await?,
        }
        Ok(())
    }
}

fn sqlx_query(sql: &str, params: Vec<SqlValue>) -> Query<'_, Sqlite, SqliteArguments<'_>> {
    params.into_iter().fold(sqlx::query(sql), |query, value| value.bind(query))
}

fn from_sqlite_rows(rows: &[SqliteRow]) -> Result<Vec<Row>, DatabaseError> {
    use sqlx::{Column, Row as _};

    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    let columns: Arc<[String]> = first
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect::<Vec<_>>()
        .into();

    rows.iter()
        .map(|row| -> Result<Row, DatabaseError> {
            let values = (0..columns.len())
                .map(|i| sqlite_value(row, i))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Row::new(columns.clone(), values))
        })
        .collect()
}

// The storage class of the value itself, not the declared column type
fn sqlite_value(row: &SqliteRow, index: usize) -> Result<SqlValue, sqlx::Error> {
    use sqlx::{Row as _, TypeInfo, ValueRef};

    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let value = match raw.type_info().name() {
        "INTEGER" | "BOOLEAN" => SqlValue::Integer(row.try_get_unchecked(index)?),
        "REAL" => SqlValue::Real(row.try_get_unchecked(index)?),
        "BLOB" => SqlValue::Blob(row.try_get_unchecked(index)?),
        _ => SqlValue::Text(row.try_get_unchecked(index)?),
    };
    Ok(value)
}

fn libsql_params(params: Vec<SqlValue>) -> impl libsql::params::IntoParams {
    libsql::params_from_iter(params.into_iter().map(libsql::Value::from))
}

async fn libsql_execute(
    conn: &libsql::Connection,
    sql: &str,
    params: Vec<SqlValue>,
) -> Result<Executed, DatabaseError> {
    let rows_affected = conn.execute(sql, libsql_params(params)).await?;
    Ok(Executed {
        rows_affected,
        last_insert_id: conn.last_insert_rowid(),
    })
}

async fn libsql_fetch(conn: &libsql::Connection, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>, DatabaseError> {
    let mut rows = conn.query(sql, libsql_params(params)).await?;
    let columns: Arc<[String]> = (0..rows.column_count())
        .map(|i| rows.column_name(i).unwrap_or_default().to_string())
        .collect::<Vec<_>>()
        .into();

    let mut out = Vec::new();
    while let Some(row) = rows.next().await? {
        let values = (0..columns.len() as i32)
            .map(|i| row.get_value(i).map(SqlValue::from))
            .collect::<Result<Vec<_>, _>>()?;
        out.push(Row::new(columns.clone(), values));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::database::{DatabaseCredentials, DatabaseManager};

    async fn memory_store() -> Store {
        DatabaseManager::connect(
            &DatabaseCredentials::new(":memory:", None),
            &AppConfig::development().database,
        )
        .await
        .unwrap()
        .store()
        .clone()
    }

    #[tokio::test]
    async fn rows_carry_runtime_storage_classes() {
        let store = memory_store().await;
        let row = store
            .fetch_optional(
                "SELECT ? AS t, ? AS i, ? AS b, NULL AS n, 1.5 AS r",
                vec!["text".into(), 7i64.into(), vec![1u8, 2].into()],
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(row.text("t").unwrap(), "text");
        assert_eq!(row.integer("i").unwrap(), 7);
        assert_eq!(row.blob("b").unwrap(), vec![1, 2]);
        assert_eq!(row.optional_text("n").unwrap(), None);
        assert_eq!(row.value("r").unwrap(), &SqlValue::Real(1.5));
        assert!(matches!(row.integer("t"), Err(DatabaseError::Decode { .. })));
        assert!(matches!(row.value("missing"), Err(DatabaseError::ColumnNotFound(_))));
    }

    #[tokio::test]
    async fn transaction_rolls_back_when_dropped() {
        let store = memory_store().await;
        store.execute("CREATE TABLE t (v INTEGER)", vec![]).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.execute("INSERT INTO t (v) VALUES (?)", vec![1i64.into()]).await.unwrap();
        drop(tx);

        let mut tx = store.begin().await.unwrap();
        let inserted = tx.execute("INSERT INTO t (v) VALUES (?)", vec![2i64.into()]).await.unwrap();
        assert_eq!(inserted.rows_affected, 1);
        tx.commit().await.unwrap();

        let rows = store.fetch_all("SELECT v FROM t", vec![]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].integer("v").unwrap(), 2);
    }
}
