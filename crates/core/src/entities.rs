//! Persisted records and their aggregates.
//!
//! `*Row` types are flat table rows read with `sqlx::FromRow`. The aggregate
//! types (`Patient`, `Maladie`, `Image`) add the element collections and the
//! association side loaded by the repositories. `*Draft` types are validated
//! inputs ready to be written.

use api_shared::StadePatient;
use sqlx::FromRow;
use std::collections::BTreeSet;

use crate::{HopitalError, HopitalResult};

#[derive(Debug, Clone, FromRow)]
pub struct PatientRow {
    pub id: i64,
    pub nom: String,
    pub prenom: String,
    pub num_urgence: Option<i64>,
    pub telephone: Option<i64>,
    pub email: Option<String>,
    pub groupe_sanguin: Option<String>,
    pub stade: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct MaladieRow {
    pub id: i64,
    pub nom: String,
    #[sqlx(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ImageRow {
    pub id: i64,
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub maladie_id: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct ImageMetaRow {
    pub id: i64,
    pub name: String,
    pub content_type: String,
    pub size: i64,
    pub maladie_id: i64,
}

/// A maladie as seen from a patient: enough to list and print it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaladieRef {
    pub id: i64,
    pub nom: String,
    pub kind: Option<String>,
}

impl From<MaladieRow> for MaladieRef {
    fn from(row: MaladieRow) -> Self {
        MaladieRef {
            id: row.id,
            nom: row.nom,
            kind: row.kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patient {
    pub id: i64,
    pub nom: String,
    pub prenom: String,
    pub num_urgence: Option<i64>,
    pub telephone: Option<i64>,
    pub email: Option<String>,
    pub groupe_sanguin: Option<String>,
    pub stade: Option<StadePatient>,
    pub symptomes: BTreeSet<String>,
    pub traitements: BTreeSet<String>,
    /// Associated maladies ordered by id. Empty when not loaded.
    pub maladies: Vec<MaladieRef>,
}

impl Patient {
    pub(crate) fn from_row(
        row: PatientRow,
        symptomes: BTreeSet<String>,
        traitements: BTreeSet<String>,
        maladies: Vec<MaladieRef>,
    ) -> HopitalResult<Self> {
        let stade = row
            .stade
            .as_deref()
            .map(str::parse::<StadePatient>)
            .transpose()
            .map_err(|e| HopitalError::InvalidData(format!("patient {}: {e}", row.id)))?;

        Ok(Self {
            id: row.id,
            nom: row.nom,
            prenom: row.prenom,
            num_urgence: row.num_urgence,
            telephone: row.telephone,
            email: row.email,
            groupe_sanguin: row.groupe_sanguin,
            stade,
            symptomes,
            traitements,
            maladies,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maladie {
    pub id: i64,
    pub nom: String,
    pub kind: Option<String>,
    pub symptomes: BTreeSet<String>,
    pub traitements: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub struct Image {
    pub id: i64,
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub maladie_id: i64,
}

impl From<ImageRow> for Image {
    fn from(row: ImageRow) -> Self {
        Image {
            id: row.id,
            name: row.name,
            content_type: row.content_type,
            data: row.data,
            maladie_id: row.maladie_id,
        }
    }
}

/// Validated patient fields, collections and maladie set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientDraft {
    pub nom: String,
    pub prenom: String,
    pub num_urgence: Option<i64>,
    pub telephone: Option<i64>,
    pub email: Option<String>,
    pub groupe_sanguin: Option<String>,
    pub stade: Option<StadePatient>,
    pub symptomes: BTreeSet<String>,
    pub traitements: BTreeSet<String>,
    pub maladie_ids: BTreeSet<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaladieDraft {
    pub nom: String,
    pub kind: Option<String>,
    pub symptomes: BTreeSet<String>,
    pub traitements: BTreeSet<String>,
}

/// An uploaded file before it is attached to a maladie.
#[derive(Debug, Clone, Default)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}
