//! Patient queries.
//!
//! Every function takes a `&mut SqliteConnection` so callers decide whether it
//! runs on a pooled connection or inside a transaction.

use api_shared::StadePatient;
use sqlx::SqliteConnection;
use std::collections::{BTreeMap, BTreeSet};

use super::helpers::{
    contains_pattern, load_values, replace_values, PATIENT_SYMPTOMES, PATIENT_TRAITEMENTS,
};
use super::maladies;
use crate::entities::{MaladieRef, Patient, PatientDraft, PatientRow};
use crate::HopitalResult;

const SELECT_PATIENT: &str = "SELECT id, nom, prenom, num_urgence, telephone, email, \
     groupe_sanguin, stade FROM patients";

// ============================================================================
// LOADING
// ============================================================================

/// Completes a row with its collections and associated maladies.
pub async fn hydrate(conn: &mut SqliteConnection, row: PatientRow) -> HopitalResult<Patient> {
    let symptomes = load_values(conn, PATIENT_SYMPTOMES, row.id).await?;
    let traitements = load_values(conn, PATIENT_TRAITEMENTS, row.id).await?;
    let maladies = maladies::find_by_patient(conn, row.id)
        .await?
        .into_iter()
        .map(MaladieRef::from)
        .collect();
    Patient::from_row(row, symptomes, traitements, maladies)
}

/// Like [`hydrate`] but leaves the maladie list empty.
pub async fn hydrate_without_maladies(
    conn: &mut SqliteConnection,
    row: PatientRow,
) -> HopitalResult<Patient> {
    let symptomes = load_values(conn, PATIENT_SYMPTOMES, row.id).await?;
    let traitements = load_values(conn, PATIENT_TRAITEMENTS, row.id).await?;
    Patient::from_row(row, symptomes, traitements, Vec::new())
}

pub async fn hydrate_all(
    conn: &mut SqliteConnection,
    rows: Vec<PatientRow>,
) -> HopitalResult<Vec<Patient>> {
    let mut patients = Vec::with_capacity(rows.len());
    for row in rows {
        patients.push(hydrate(conn, row).await?);
    }
    Ok(patients)
}

// ============================================================================
// LOOKUPS
// ============================================================================

pub async fn find_all(conn: &mut SqliteConnection) -> HopitalResult<Vec<PatientRow>> {
    let rows = sqlx::query_as::<_, PatientRow>(&format!("{SELECT_PATIENT} ORDER BY id"))
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> HopitalResult<Option<PatientRow>> {
    let row = sqlx::query_as::<_, PatientRow>(&format!("{SELECT_PATIENT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

/// Exact match on `nom`.
pub async fn find_by_nom(conn: &mut SqliteConnection, nom: &str) -> HopitalResult<Vec<PatientRow>> {
    let rows = sqlx::query_as::<_, PatientRow>(&format!(
        "{SELECT_PATIENT} WHERE nom = ? ORDER BY id"
    ))
    .bind(nom)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

pub async fn find_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> HopitalResult<Option<PatientRow>> {
    let row = sqlx::query_as::<_, PatientRow>(&format!("{SELECT_PATIENT} WHERE email = ?"))
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

pub async fn find_by_telephone(
    conn: &mut SqliteConnection,
    telephone: i64,
) -> HopitalResult<Option<PatientRow>> {
    let row = sqlx::query_as::<_, PatientRow>(&format!("{SELECT_PATIENT} WHERE telephone = ?"))
        .bind(telephone)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

pub async fn find_all_by_stade(
    conn: &mut SqliteConnection,
    stade: StadePatient,
) -> HopitalResult<Vec<PatientRow>> {
    let rows = sqlx::query_as::<_, PatientRow>(&format!(
        "{SELECT_PATIENT} WHERE stade = ? ORDER BY id"
    ))
    .bind(stade.as_str())
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Patients following at least one treatment containing `traitement`.
pub async fn find_by_traitement_containing(
    conn: &mut SqliteConnection,
    traitement: &str,
) -> HopitalResult<Vec<PatientRow>> {
    let rows = sqlx::query_as::<_, PatientRow>(&format!(
        r#"{SELECT_PATIENT} p
        WHERE EXISTS (
            SELECT 1 FROM patient_traitements t
            WHERE t.patient_id = p.id AND t.traitement LIKE ? ESCAPE '\'
        )
        ORDER BY p.id"#
    ))
    .bind(contains_pattern(traitement))
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Combined search; any criterion left as `None` is ignored.
///
/// `nom` and `traitement` are substring matches, `stade` is exact.
pub async fn filter(
    conn: &mut SqliteConnection,
    nom: Option<&str>,
    stade: Option<StadePatient>,
    traitement: Option<&str>,
) -> HopitalResult<Vec<PatientRow>> {
    let nom_pattern = nom.map(contains_pattern);
    let stade = stade.map(|s| s.as_str());
    let traitement_pattern = traitement.map(contains_pattern);

    let rows = sqlx::query_as::<_, PatientRow>(&format!(
        r#"{SELECT_PATIENT} p
        WHERE (? IS NULL OR p.nom LIKE ? ESCAPE '\')
          AND (? IS NULL OR p.stade = ?)
          AND (? IS NULL OR EXISTS (
                SELECT 1 FROM patient_traitements t
                WHERE t.patient_id = p.id AND t.traitement LIKE ? ESCAPE '\'
              ))
        ORDER BY p.id"#
    ))
    .bind(&nom_pattern)
    .bind(&nom_pattern)
    .bind(stade)
    .bind(stade)
    .bind(&traitement_pattern)
    .bind(&traitement_pattern)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

// ============================================================================
// WRITES
// ============================================================================

/// Inserts the patient row and its collections; returns the new id.
///
/// The maladie set is written separately with [`replace_maladies`] once the
/// caller has checked the ids exist.
pub async fn insert(conn: &mut SqliteConnection, draft: &PatientDraft) -> HopitalResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO patients (nom, prenom, num_urgence, telephone, email, groupe_sanguin, stade)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&draft.nom)
    .bind(&draft.prenom)
    .bind(draft.num_urgence)
    .bind(draft.telephone)
    .bind(&draft.email)
    .bind(&draft.groupe_sanguin)
    .bind(draft.stade.map(|s| s.as_str()))
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    replace_values(conn, PATIENT_SYMPTOMES, id, &draft.symptomes).await?;
    replace_values(conn, PATIENT_TRAITEMENTS, id, &draft.traitements).await?;
    Ok(id)
}

/// Overwrites the patient row and its collections. Returns `false` if absent.
pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    draft: &PatientDraft,
) -> HopitalResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE patients
        SET nom = ?, prenom = ?, num_urgence = ?, telephone = ?, email = ?,
            groupe_sanguin = ?, stade = ?
        WHERE id = ?
        "#,
    )
    .bind(&draft.nom)
    .bind(&draft.prenom)
    .bind(draft.num_urgence)
    .bind(draft.telephone)
    .bind(&draft.email)
    .bind(&draft.groupe_sanguin)
    .bind(draft.stade.map(|s| s.as_str()))
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    replace_values(conn, PATIENT_SYMPTOMES, id, &draft.symptomes).await?;
    replace_values(conn, PATIENT_TRAITEMENTS, id, &draft.traitements).await?;
    Ok(true)
}

/// Replaces the patient's maladie associations with exactly `maladie_ids`.
pub async fn replace_maladies(
    conn: &mut SqliteConnection,
    patient_id: i64,
    maladie_ids: &BTreeSet<i64>,
) -> HopitalResult<()> {
    clear_maladies(conn, patient_id).await?;
    for maladie_id in maladie_ids {
        sqlx::query("INSERT INTO patient_maladie (patient_id, maladie_id) VALUES (?, ?)")
            .bind(patient_id)
            .bind(maladie_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn clear_maladies(conn: &mut SqliteConnection, patient_id: i64) -> HopitalResult<()> {
    sqlx::query("DELETE FROM patient_maladie WHERE patient_id = ?")
        .bind(patient_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Deletes the patient; collections and associations cascade.
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> HopitalResult<bool> {
    let result = sqlx::query("DELETE FROM patients WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ============================================================================
// STATISTICS
// ============================================================================

pub async fn count(conn: &mut SqliteConnection) -> HopitalResult<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM patients")
        .fetch_one(&mut *conn)
        .await?;
    Ok(n)
}

/// Number of distinct non-null stages in use.
pub async fn count_distinct_stades(conn: &mut SqliteConnection) -> HopitalResult<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT stade) FROM patients")
        .fetch_one(&mut *conn)
        .await?;
    Ok(n)
}

/// Patients per stage; patients without a stage are not counted.
pub async fn count_by_stade_grouped(
    conn: &mut SqliteConnection,
) -> HopitalResult<BTreeMap<String, i64>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT stade, COUNT(*) FROM patients WHERE stade IS NOT NULL GROUP BY stade",
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().collect())
}

pub async fn count_by_stade(conn: &mut SqliteConnection, stade: StadePatient) -> HopitalResult<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM patients WHERE stade = ?")
        .bind(stade.as_str())
        .fetch_one(&mut *conn)
        .await?;
    Ok(n)
}

pub async fn count_with_symptomes(conn: &mut SqliteConnection) -> HopitalResult<i64> {
    let n = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(DISTINCT patient_id) FROM patient_symptomes",
    )
    .fetch_one(&mut *conn)
    .await?;
    Ok(n)
}

pub async fn count_with_traitements(conn: &mut SqliteConnection) -> HopitalResult<i64> {
    let n = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(DISTINCT patient_id) FROM patient_traitements",
    )
    .fetch_one(&mut *conn)
    .await?;
    Ok(n)
}
