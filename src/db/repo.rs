use crate::model::NewContentItem;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{info, instrument};

pub type Pool = SqlitePool;

/// Open a pool for `database_url`.
///
/// In-memory databases are private to a connection, so they get a single
/// connection that never expires; otherwise concurrent queries would land on
/// fresh, empty databases.
pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url)?;
    let in_memory = is_memory_url(&normalized);
    let options = SqliteConnectOptions::from_str(&normalized)
        .with_context(|| format!("invalid database url {}", normalized))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(if in_memory {
            SqliteJournalMode::Memory
        } else {
            SqliteJournalMode::Wal
        });

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(8)
    };
    let pool = pool_options.connect_with(options).await?;
    info!(url = %normalized, in_memory, "database pool ready");
    Ok(pool)
}

fn is_memory_url(url: &str) -> bool {
    url.starts_with("sqlite::memory") || url.contains("mode=memory")
}

/// Expand `~/` in a file-backed URL and create the database's directory.
fn prepare_sqlite_url(url: &str) -> Result<String> {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return Ok(url.to_string());
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);
    let (path_part, query_part) = path_with_query
        .split_once('?')
        .map_or((path_with_query, None), |(p, q)| (p, Some(q)));
    if path_part.is_empty() {
        return Ok(url.to_string());
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
    }

    Ok(match query_part {
        Some(q) => format!("sqlite://{}?{}", expanded_path, q),
        None => format!("sqlite://{}", expanded_path),
    })
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn insert_category(pool: &Pool, name: &str) -> Result<i64> {
    let id: i64 =
        sqlx::query_scalar("INSERT INTO categories (name, created_at) VALUES (?, ?) RETURNING id")
            .bind(name)
            .bind(Utc::now().timestamp_millis())
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to insert category {}", name))?;
    Ok(id)
}

/// Find a category id by name, inserting the category when missing. The flag
/// is `true` only when a row was inserted.
#[instrument(skip_all)]
pub async fn get_or_create_category(pool: &Pool, name: &str) -> Result<(i64, bool)> {
    if let Some(id) = sqlx::query_scalar::<_, i64>("SELECT id FROM categories WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?
    {
        return Ok((id, false));
    }
    Ok((insert_category(pool, name).await?, true))
}

#[instrument(skip_all)]
pub async fn insert_item(pool: &Pool, item: &NewContentItem) -> Result<i64> {
    let tags = serde_json::to_string(&item.tags)?;
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO content_items (title, slug, category_id, tags, views, is_editors_choice, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&item.title)
    .bind(&item.slug)
    .bind(item.category_id)
    .bind(tags)
    .bind(item.views)
    .bind(item.is_editors_choice)
    .bind(item.created_at.timestamp_millis())
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert item {}", item.title))?;
    Ok(id)
}

#[instrument(skip_all)]
pub async fn upsert_setting(pool: &Pool, key: &str, value: &str) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO site_settings (key, value) VALUES (?, ?) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value RETURNING id",
    )
    .bind(key)
    .bind(value)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

#[instrument(skip_all)]
pub async fn insert_subscriber(pool: &Pool, email: &str) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO subscribers (email, created_at) VALUES (?, ?)")
        .bind(email)
        .bind(Utc::now().timestamp_millis())
        .execute(pool)
        .await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn delete_category(pool: &Pool, id: i64) -> Result<bool> {
    let res = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() > 0)
}
