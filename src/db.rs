use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::error::FetchError;
use crate::roster::CLASS_DATA_PATH;
use crate::store::{lookup, KeyValueStore};

/// Postgres-backed key-value store: one JSONB document per path.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str) -> Result<Self, FetchError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl KeyValueStore for PgStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, FetchError> {
        fetch_value(&self.pool, path).await
    }
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Loads a small roster so the dashboard can be tried without a live store.
pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let class_data = json!({
        "1B": ["Ali Bin Ahmad", "Nur Aisyah Binti Kamal"],
        "1C": ["Tan Mei Ling", "Muthu A/L Rajan"],
        "2G": ["Siti Aminah Binti Yusof"],
        "6B": ["Lim Wei Jie", "Farah Nabila"],
    });

    put_value(pool, CLASS_DATA_PATH, &class_data).await?;
    Ok(())
}

pub async fn put_value(pool: &PgPool, path: &str, value: &Value) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO roster_store.kv_entries (path, value)
        VALUES ($1, $2)
        ON CONFLICT (path) DO UPDATE
        SET value = EXCLUDED.value, updated_at = now()
        "#,
    )
    .bind(path.trim_matches('/'))
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Reads the document stored at `path`, or the matching subtree of the
/// nearest stored ancestor.
pub async fn fetch_value(pool: &PgPool, path: &str) -> Result<Option<Value>, FetchError> {
    let path = path.trim_matches('/');
    let rows = sqlx::query(
        r#"
        SELECT path, value
        FROM roster_store.kv_entries
        WHERE $1 = path OR starts_with($1, path || '/')
        ORDER BY length(path) DESC
        LIMIT 1
        "#,
    )
    .bind(path)
    .fetch_optional(pool)
    .await?;

    let Some(row) = rows else {
        return Ok(None);
    };

    let stored_path: String = row.get("path");
    let value: Value = row.get("value");
    let Some(remainder) = ancestor_remainder(path, &stored_path) else {
        return Ok(None);
    };

    Ok(lookup(&value, remainder)
        .filter(|found| !found.is_null())
        .cloned())
}

/// The part of `path` below `stored`, or `None` when `stored` is not `path`
/// itself or one of its whole-segment ancestors.
fn ancestor_remainder<'a>(path: &'a str, stored: &str) -> Option<&'a str> {
    if path == stored {
        return Some("");
    }
    path.strip_prefix(stored)?.strip_prefix('/')
}
