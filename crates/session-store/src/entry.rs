//! Raw key/value access to the session table.

use sqlx::SqlitePool;

use crate::Result;

/// Create or overwrite an entry.
pub async fn set_entry<'e, E>(executor: E, key: &str, value: &str) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO session_entries (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = datetime('now')
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(executor)
    .await?;

    Ok(())
}

/// Get an entry's value.
pub async fn get_entry(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value = sqlx::query_scalar::<_, String>(
        r#"
        SELECT value
        FROM session_entries
        WHERE key = ?
        "#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(value)
}

/// Remove an entry if present.
pub async fn delete_entry<'e, E>(executor: E, key: &str) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        DELETE FROM session_entries
        WHERE key = ?
        "#,
    )
    .bind(key)
    .execute(executor)
    .await?;

    Ok(())
}

/// Remove every entry.
pub async fn clear_all(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM session_entries
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
