//! Repository-related utilities.
//!
//! Element collections (symptoms, treatments) share the same shape on both
//! patients and maladies: a child table keyed by `(owner_id, value)`. These
//! helpers read and replace such sets. Table and column names are always
//! compile-time constants from [`ValueSet`], never user input.

use sqlx::SqliteConnection;
use std::collections::BTreeSet;

use crate::HopitalResult;

/// A set-valued child table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValueSet {
    pub table: &'static str,
    pub owner: &'static str,
    pub value: &'static str,
}

pub(crate) const PATIENT_SYMPTOMES: ValueSet = ValueSet {
    table: "patient_symptomes",
    owner: "patient_id",
    value: "symptome",
};

pub(crate) const PATIENT_TRAITEMENTS: ValueSet = ValueSet {
    table: "patient_traitements",
    owner: "patient_id",
    value: "traitement",
};

pub(crate) const MALADIE_SYMPTOMES: ValueSet = ValueSet {
    table: "maladie_symptomes",
    owner: "maladie_id",
    value: "symptome",
};

pub(crate) const MALADIE_TRAITEMENTS: ValueSet = ValueSet {
    table: "maladie_traitements",
    owner: "maladie_id",
    value: "traitement",
};

/// Loads every value of `set` owned by `owner_id`.
pub(crate) async fn load_values(
    conn: &mut SqliteConnection,
    set: ValueSet,
    owner_id: i64,
) -> HopitalResult<BTreeSet<String>> {
    let sql = format!(
        "SELECT {value} FROM {table} WHERE {owner} = ?",
        value = set.value,
        table = set.table,
        owner = set.owner,
    );
    let values: Vec<String> = sqlx::query_scalar(&sql)
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(values.into_iter().collect())
}

/// Replaces the values of `set` owned by `owner_id` with `values`.
pub(crate) async fn replace_values(
    conn: &mut SqliteConnection,
    set: ValueSet,
    owner_id: i64,
    values: &BTreeSet<String>,
) -> HopitalResult<()> {
    let delete = format!(
        "DELETE FROM {table} WHERE {owner} = ?",
        table = set.table,
        owner = set.owner
    );
    sqlx::query(&delete)
        .bind(owner_id)
        .execute(&mut *conn)
        .await?;

    let insert = format!(
        "INSERT INTO {table} ({owner}, {value}) VALUES (?, ?)",
        table = set.table,
        owner = set.owner,
        value = set.value,
    );
    for value in values {
        sqlx::query(&insert)
            .bind(owner_id)
            .bind(value)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Builds a `LIKE` pattern matching `needle` anywhere in the column.
///
/// Wildcards in the needle are escaped with `\`; statements using the pattern
/// must declare `ESCAPE '\'`.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
