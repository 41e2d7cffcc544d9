//! Maladie queries.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use std::collections::{BTreeMap, BTreeSet};

use super::helpers::{load_values, replace_values, MALADIE_SYMPTOMES, MALADIE_TRAITEMENTS};
use crate::entities::{Maladie, MaladieDraft, MaladieRow, PatientRow};
use crate::HopitalResult;

const SELECT_MALADIE: &str = "SELECT id, nom, type FROM maladies";

pub async fn hydrate(conn: &mut SqliteConnection, row: MaladieRow) -> HopitalResult<Maladie> {
    let symptomes = load_values(conn, MALADIE_SYMPTOMES, row.id).await?;
    let traitements = load_values(conn, MALADIE_TRAITEMENTS, row.id).await?;
    Ok(Maladie {
        id: row.id,
        nom: row.nom,
        kind: row.kind,
        symptomes,
        traitements,
    })
}

pub async fn hydrate_all(
    conn: &mut SqliteConnection,
    rows: Vec<MaladieRow>,
) -> HopitalResult<Vec<Maladie>> {
    let mut maladies = Vec::with_capacity(rows.len());
    for row in rows {
        maladies.push(hydrate(conn, row).await?);
    }
    Ok(maladies)
}

pub async fn find_all(conn: &mut SqliteConnection) -> HopitalResult<Vec<MaladieRow>> {
    let rows = sqlx::query_as::<_, MaladieRow>(&format!("{SELECT_MALADIE} ORDER BY id"))
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> HopitalResult<Option<MaladieRow>> {
    let row = sqlx::query_as::<_, MaladieRow>(&format!("{SELECT_MALADIE} WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

/// Returns the subset of `ids` that exist.
pub async fn existing_ids(
    conn: &mut SqliteConnection,
    ids: &BTreeSet<i64>,
) -> HopitalResult<BTreeSet<i64>> {
    if ids.is_empty() {
        return Ok(BTreeSet::new());
    }

    let mut builder: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new("SELECT id FROM maladies WHERE id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let found: Vec<i64> = builder
        .build_query_scalar()
        .fetch_all(&mut *conn)
        .await?;
    Ok(found.into_iter().collect())
}

/// First maladie (lowest id) with exactly this name.
pub async fn find_by_nom(conn: &mut SqliteConnection, nom: &str) -> HopitalResult<Option<MaladieRow>> {
    let row = sqlx::query_as::<_, MaladieRow>(&format!(
        "{SELECT_MALADIE} WHERE nom = ? ORDER BY id LIMIT 1"
    ))
    .bind(nom)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

pub async fn find_by_type(conn: &mut SqliteConnection, kind: &str) -> HopitalResult<Vec<MaladieRow>> {
    let rows = sqlx::query_as::<_, MaladieRow>(&format!(
        "{SELECT_MALADIE} WHERE type = ? ORDER BY id"
    ))
    .bind(kind)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

pub async fn find_by_type_and_nom(
    conn: &mut SqliteConnection,
    kind: &str,
    nom: &str,
) -> HopitalResult<Vec<MaladieRow>> {
    let rows = sqlx::query_as::<_, MaladieRow>(&format!(
        "{SELECT_MALADIE} WHERE type = ? AND nom = ? ORDER BY id"
    ))
    .bind(kind)
    .bind(nom)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Maladies associated with a patient, ordered by id.
pub async fn find_by_patient(
    conn: &mut SqliteConnection,
    patient_id: i64,
) -> HopitalResult<Vec<MaladieRow>> {
    let rows = sqlx::query_as::<_, MaladieRow>(
        r#"
        SELECT m.id, m.nom, m.type
        FROM maladies m
        JOIN patient_maladie pm ON pm.maladie_id = m.id
        WHERE pm.patient_id = ?
        ORDER BY m.id
        "#,
    )
    .bind(patient_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Patients associated with a maladie, ordered by id.
pub async fn patients_of(
    conn: &mut SqliteConnection,
    maladie_id: i64,
) -> HopitalResult<Vec<PatientRow>> {
    let rows = sqlx::query_as::<_, PatientRow>(
        r#"
        SELECT p.id, p.nom, p.prenom, p.num_urgence, p.telephone, p.email,
               p.groupe_sanguin, p.stade
        FROM patients p
        JOIN patient_maladie pm ON pm.patient_id = p.id
        WHERE pm.maladie_id = ?
        ORDER BY p.id
        "#,
    )
    .bind(maladie_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

pub async fn insert(conn: &mut SqliteConnection, draft: &MaladieDraft) -> HopitalResult<i64> {
    let result = sqlx::query("INSERT INTO maladies (nom, type) VALUES (?, ?)")
        .bind(&draft.nom)
        .bind(&draft.kind)
        .execute(&mut *conn)
        .await?;

    let id = result.last_insert_rowid();
    replace_values(conn, MALADIE_SYMPTOMES, id, &draft.symptomes).await?;
    replace_values(conn, MALADIE_TRAITEMENTS, id, &draft.traitements).await?;
    Ok(id)
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    draft: &MaladieDraft,
) -> HopitalResult<bool> {
    let result = sqlx::query("UPDATE maladies SET nom = ?, type = ? WHERE id = ?")
        .bind(&draft.nom)
        .bind(&draft.kind)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    replace_values(conn, MALADIE_SYMPTOMES, id, &draft.symptomes).await?;
    replace_values(conn, MALADIE_TRAITEMENTS, id, &draft.traitements).await?;
    Ok(true)
}

/// Removes every patient association of a maladie.
pub async fn detach_patients(conn: &mut SqliteConnection, maladie_id: i64) -> HopitalResult<u64> {
    let result = sqlx::query("DELETE FROM patient_maladie WHERE maladie_id = ?")
        .bind(maladie_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Deletes the maladie; collections, associations and images cascade.
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> HopitalResult<bool> {
    let result = sqlx::query("DELETE FROM maladies WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ============================================================================
// STATISTICS
// ============================================================================

pub async fn count(conn: &mut SqliteConnection) -> HopitalResult<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM maladies")
        .fetch_one(&mut *conn)
        .await?;
    Ok(n)
}

/// Maladies per type; untyped maladies are grouped under `""`.
pub async fn count_by_type(conn: &mut SqliteConnection) -> HopitalResult<BTreeMap<String, i64>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT COALESCE(type, '') AS kind, COUNT(*) FROM maladies GROUP BY kind",
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().collect())
}

/// Maladies with at least one recorded treatment.
pub async fn count_with_traitements(conn: &mut SqliteConnection) -> HopitalResult<i64> {
    let n = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(DISTINCT maladie_id) FROM maladie_traitements",
    )
    .fetch_one(&mut *conn)
    .await?;
    Ok(n)
}

/// Maladies with at least one recorded symptom.
pub async fn count_with_symptomes(conn: &mut SqliteConnection) -> HopitalResult<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT maladie_id) FROM maladie_symptomes")
        .fetch_one(&mut *conn)
        .await?;
    Ok(n)
}

pub async fn count_unique_symptomes(conn: &mut SqliteConnection) -> HopitalResult<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT symptome) FROM maladie_symptomes")
        .fetch_one(&mut *conn)
        .await?;
    Ok(n)
}

pub async fn count_unique_traitements(conn: &mut SqliteConnection) -> HopitalResult<i64> {
    let n = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(DISTINCT traitement) FROM maladie_traitements",
    )
    .fetch_one(&mut *conn)
    .await?;
    Ok(n)
}

/// Patients per maladie name, for maladies with at least one patient.
///
/// Maladies sharing a name are summed under that name.
pub async fn count_patients_per_maladie(
    conn: &mut SqliteConnection,
) -> HopitalResult<BTreeMap<String, i64>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT m.nom, COUNT(pm.patient_id)
        FROM maladies m
        JOIN patient_maladie pm ON pm.maladie_id = m.id
        GROUP BY m.nom
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().collect())
}

/// Maladies with at least one image.
pub async fn count_with_images(conn: &mut SqliteConnection) -> HopitalResult<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT maladie_id) FROM images")
        .fetch_one(&mut *conn)
        .await?;
    Ok(n)
}
