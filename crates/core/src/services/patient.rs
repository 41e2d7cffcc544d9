use api_shared::{MaladieDto, PatientCreateUpdateDto, PatientDto, PatientStats, StadePatient};
use serde_json::{Map, Value};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use super::ensure_maladies_exist;
use crate::dossier::Dossier;
use crate::entities::{Patient, PatientDraft, PatientRow};
use crate::patch::patch_patient;
use crate::repositories::{maladies, patients};
use crate::{Database, HopitalError, HopitalResult};

/// Patient records, their collections and their maladie associations.
#[derive(Debug, Clone)]
pub struct PatientService {
    db: Database,
}

impl PatientService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get_all_patients(&self) -> HopitalResult<Vec<PatientDto>> {
        let mut conn = self.db.pool().acquire().await?;
        let rows = patients::find_all(&mut conn).await?;
        to_dtos(&mut conn, rows).await
    }

    pub async fn get_patient_by_id(&self, id: i64) -> HopitalResult<Option<PatientDto>> {
        let mut conn = self.db.pool().acquire().await?;
        load(&mut conn, id)
            .await
            .map(|p| p.as_ref().map(PatientDto::from))
    }

    /// Creates a patient with its collections and maladie associations.
    ///
    /// # Errors
    ///
    /// - `HopitalError::InvalidField`/`InvalidInput` if the body is invalid
    /// - `HopitalError::MissingMaladies` if any `maladieIds` entry is unknown
    /// - `HopitalError::Conflict` if the email or telephone is already used
    pub async fn create_patient(&self, dto: &PatientCreateUpdateDto) -> HopitalResult<PatientDto> {
        let draft = PatientDraft::from_dto(dto)?;

        let mut tx = self.db.pool().begin().await?;
        ensure_maladies_exist(&mut tx, &draft.maladie_ids).await?;
        let id = patients::insert(&mut tx, &draft).await?;
        patients::replace_maladies(&mut tx, id, &draft.maladie_ids).await?;
        let patient = require(&mut tx, id).await?;
        tx.commit().await?;

        info!(patient_id = id, "Created patient");
        Ok(PatientDto::from(&patient))
    }

    /// Replaces every field, collection and association of a patient.
    ///
    /// Returns `Ok(None)` if the patient does not exist.
    pub async fn update_patient(
        &self,
        id: i64,
        dto: &PatientCreateUpdateDto,
    ) -> HopitalResult<Option<PatientDto>> {
        let draft = PatientDraft::from_dto(dto)?;
        self.write(id, &draft).await
    }

    /// Applies a JSON object of field updates to an existing patient.
    ///
    /// Returns `Ok(None)` if the patient does not exist.
    pub async fn partial_update_patient(
        &self,
        id: i64,
        updates: &Map<String, Value>,
    ) -> HopitalResult<Option<PatientDto>> {
        let mut tx = self.db.pool().begin().await?;
        let Some(current) = load(&mut tx, id).await? else {
            return Ok(None);
        };
        let draft = patch_patient(&current, updates)?;
        debug!(patient_id = id, keys = updates.len(), "Patching patient");

        let updated = write_in(&mut tx, id, &draft).await?;
        tx.commit().await?;
        Ok(updated.as_ref().map(PatientDto::from))
    }

    async fn write(&self, id: i64, draft: &PatientDraft) -> HopitalResult<Option<PatientDto>> {
        let mut tx = self.db.pool().begin().await?;
        let updated = write_in(&mut tx, id, draft).await?;
        tx.commit().await?;
        Ok(updated.as_ref().map(PatientDto::from))
    }

    /// Deletes a patient. Its maladies are kept.
    pub async fn delete_patient(&self, id: i64) -> HopitalResult<()> {
        let mut tx = self.db.pool().begin().await?;
        patients::clear_maladies(&mut tx, id).await?;
        if !patients::delete(&mut tx, id).await? {
            return Err(HopitalError::not_found("patient", id));
        }
        tx.commit().await?;

        info!(patient_id = id, "Deleted patient");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------------

    pub async fn find_by_nom(&self, nom: &str) -> HopitalResult<Vec<PatientDto>> {
        let mut conn = self.db.pool().acquire().await?;
        let rows = patients::find_by_nom(&mut conn, nom.trim()).await?;
        to_dtos(&mut conn, rows).await
    }

    pub async fn find_by_email(&self, email: &str) -> HopitalResult<Option<PatientDto>> {
        let mut conn = self.db.pool().acquire().await?;
        let row = patients::find_by_email(&mut conn, email.trim()).await?;
        to_dto(&mut conn, row).await
    }

    pub async fn find_by_telephone(&self, telephone: i64) -> HopitalResult<Option<PatientDto>> {
        let mut conn = self.db.pool().acquire().await?;
        let row = patients::find_by_telephone(&mut conn, telephone).await?;
        to_dto(&mut conn, row).await
    }

    pub async fn find_by_stade(&self, stade: StadePatient) -> HopitalResult<Vec<PatientDto>> {
        let mut conn = self.db.pool().acquire().await?;
        let rows = patients::find_all_by_stade(&mut conn, stade).await?;
        to_dtos(&mut conn, rows).await
    }

    /// Patients with at least one treatment containing `traitement`.
    pub async fn find_by_traitement(&self, traitement: &str) -> HopitalResult<Vec<PatientDto>> {
        let mut conn = self.db.pool().acquire().await?;
        let rows = patients::find_by_traitement_containing(&mut conn, traitement).await?;
        to_dtos(&mut conn, rows).await
    }

    /// Combined filter. Blank text criteria count as absent.
    pub async fn find_by_nom_and_stade_and_traitement(
        &self,
        nom: Option<&str>,
        stade: Option<StadePatient>,
        traitement: Option<&str>,
    ) -> HopitalResult<Vec<PatientDto>> {
        let nom = nom.map(str::trim).filter(|s| !s.is_empty());
        let traitement = traitement.map(str::trim).filter(|s| !s.is_empty());

        let mut conn = self.db.pool().acquire().await?;
        let rows = patients::filter(&mut conn, nom, stade, traitement).await?;
        to_dtos(&mut conn, rows).await
    }

    // ------------------------------------------------------------------------
    // Associations and reports
    // ------------------------------------------------------------------------

    /// Maladies of a patient, or `None` if the patient does not exist.
    pub async fn get_maladies_by_patient_id(&self, id: i64) -> HopitalResult<Option<Vec<MaladieDto>>> {
        let mut conn = self.db.pool().acquire().await?;
        if patients::find_by_id(&mut conn, id).await?.is_none() {
            return Ok(None);
        }
        let rows = maladies::find_by_patient(&mut conn, id).await?;
        let list = maladies::hydrate_all(&mut conn, rows).await?;
        Ok(Some(list.iter().map(MaladieDto::from).collect()))
    }

    /// Printable medical record, or `None` if the patient does not exist.
    pub async fn dossier(&self, id: i64) -> HopitalResult<Option<String>> {
        let mut conn = self.db.pool().acquire().await?;
        let patient = load(&mut conn, id).await?;
        Ok(patient.map(|p| Dossier(&p).to_string()))
    }

    pub async fn get_patient_stats(&self) -> HopitalResult<PatientStats> {
        let mut conn = self.db.pool().acquire().await?;
        Ok(PatientStats {
            total_patients: patients::count(&mut conn).await?,
            distinct_stades_count: patients::count_distinct_stades(&mut conn).await?,
            patients_by_stade: patients::count_by_stade_grouped(&mut conn).await?,
            critical_patients_count: patients::count_by_stade(&mut conn, StadePatient::CRITICAL)
                .await?,
            patients_with_symptoms_recorded: patients::count_with_symptomes(&mut conn).await?,
            patients_under_treatment: patients::count_with_traitements(&mut conn).await?,
        })
    }
}

async fn load(conn: &mut SqliteConnection, id: i64) -> HopitalResult<Option<Patient>> {
    match patients::find_by_id(conn, id).await? {
        Some(row) => patients::hydrate(conn, row).await.map(Some),
        None => Ok(None),
    }
}

async fn require(conn: &mut SqliteConnection, id: i64) -> HopitalResult<Patient> {
    load(conn, id)
        .await?
        .ok_or_else(|| HopitalError::not_found("patient", id))
}

/// Full replacement inside an open transaction.
async fn write_in(
    conn: &mut SqliteConnection,
    id: i64,
    draft: &PatientDraft,
) -> HopitalResult<Option<Patient>> {
    if patients::find_by_id(conn, id).await?.is_none() {
        return Ok(None);
    }
    ensure_maladies_exist(conn, &draft.maladie_ids).await?;
    patients::update(conn, id, draft).await?;
    patients::replace_maladies(conn, id, &draft.maladie_ids).await?;

    info!(patient_id = id, "Updated patient");
    require(conn, id).await.map(Some)
}

async fn to_dto(
    conn: &mut SqliteConnection,
    row: Option<PatientRow>,
) -> HopitalResult<Option<PatientDto>> {
    match row {
        Some(row) => {
            let patient = patients::hydrate(conn, row).await?;
            Ok(Some(PatientDto::from(&patient)))
        }
        None => Ok(None),
    }
}

async fn to_dtos(conn: &mut SqliteConnection, rows: Vec<PatientRow>) -> HopitalResult<Vec<PatientDto>> {
    let list = patients::hydrate_all(conn, rows).await?;
    Ok(list.iter().map(PatientDto::from).collect())
}
