//! Image queries.

use sqlx::SqliteConnection;

use crate::entities::{ImageMetaRow, ImageRow};
use crate::HopitalResult;

pub async fn insert(
    conn: &mut SqliteConnection,
    name: &str,
    content_type: &str,
    data: &[u8],
    maladie_id: i64,
) -> HopitalResult<i64> {
    let result = sqlx::query(
        "INSERT INTO images (name, content_type, data, maladie_id) VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(content_type)
    .bind(data)
    .bind(maladie_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> HopitalResult<Option<ImageRow>> {
    let row = sqlx::query_as::<_, ImageRow>(
        "SELECT id, name, content_type, data, maladie_id FROM images WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

pub async fn find_meta_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> HopitalResult<Option<ImageMetaRow>> {
    let row = sqlx::query_as::<_, ImageMetaRow>(
        "SELECT id, name, content_type, length(data) AS size, maladie_id FROM images WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

/// Metadata of every image attached to a maladie, without the bytes.
pub async fn list_by_maladie(
    conn: &mut SqliteConnection,
    maladie_id: i64,
) -> HopitalResult<Vec<ImageMetaRow>> {
    let rows = sqlx::query_as::<_, ImageMetaRow>(
        r#"
        SELECT id, name, content_type, length(data) AS size, maladie_id
        FROM images
        WHERE maladie_id = ?
        ORDER BY id
        "#,
    )
    .bind(maladie_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> HopitalResult<bool> {
    let result = sqlx::query("DELETE FROM images WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn exists(conn: &mut SqliteConnection, id: i64) -> HopitalResult<bool> {
    let found = sqlx::query_scalar::<_, i64>("SELECT EXISTS(SELECT 1 FROM images WHERE id = ?)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(found != 0)
}
