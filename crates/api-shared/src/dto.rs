//! Transfer objects exchanged over the REST API.
//!
//! These types are the JSON contract of the service. Persisted records never
//! cross the API boundary directly: the core crate maps them into these shapes,
//! leaving out back-references so that a patient never embeds full maladies
//! that would in turn embed the patient again.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Disease progression stage recorded against a patient.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
pub enum StadePatient {
    #[serde(rename = "STADE_I")]
    StadeI,
    #[serde(rename = "STADE_II")]
    StadeII,
    #[serde(rename = "STADE_III")]
    StadeIII,
    #[serde(rename = "STADE_IV")]
    StadeIV,
}

impl StadePatient {
    pub const ALL: [StadePatient; 4] = [
        StadePatient::StadeI,
        StadePatient::StadeII,
        StadePatient::StadeIII,
        StadePatient::StadeIV,
    ];

    /// The stage counted as critical in patient statistics.
    pub const CRITICAL: StadePatient = StadePatient::StadeIV;

    /// Stored and serialised name of the stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            StadePatient::StadeI => "STADE_I",
            StadePatient::StadeII => "STADE_II",
            StadePatient::StadeIII => "STADE_III",
            StadePatient::StadeIV => "STADE_IV",
        }
    }
}

impl fmt::Display for StadePatient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a [`StadePatient`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown patient stage: {0}")]
pub struct UnknownStade(pub String);

impl FromStr for StadePatient {
    type Err = UnknownStade;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StadePatient::ALL
            .into_iter()
            .find(|stade| stade.as_str() == s)
            .ok_or_else(|| UnknownStade(s.to_string()))
    }
}

/// Identifier and name of a maladie, as embedded in a patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MaladieSummaryDto {
    pub id: i64,
    pub nom: String,
}

/// Full maladie representation. Also used as the create/update body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MaladieDto {
    /// Ignored on create and update; the path or database decides the id.
    #[serde(default)]
    pub id: Option<i64>,
    pub nom: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub symptomes: Vec<String>,
    #[serde(default)]
    pub traitements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientDto {
    pub id: i64,
    pub nom: String,
    pub prenom: String,
    pub num_urgence: Option<i64>,
    pub telephone: Option<i64>,
    pub email: Option<String>,
    pub groupe_sanguin: Option<String>,
    pub stade: Option<StadePatient>,
    pub symptomes_manifester: Vec<String>,
    pub traitement_suivie: Vec<String>,
    /// Empty when the patient is listed from a maladie.
    pub maladies_affectees: Vec<MaladieSummaryDto>,
}

/// Body of `POST /patients` and `PUT /patients/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientCreateUpdateDto {
    pub nom: String,
    pub prenom: String,
    #[serde(default)]
    pub num_urgence: Option<i64>,
    #[serde(default)]
    pub telephone: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub groupe_sanguin: Option<String>,
    #[serde(default)]
    pub stade: Option<StadePatient>,
    #[serde(default)]
    pub symptomes_manifester: Vec<String>,
    #[serde(default)]
    pub traitement_suivie: Vec<String>,
    #[serde(default)]
    pub maladie_ids: Vec<i64>,
}

/// Image metadata; the bytes are only served by `GET /images/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfoDto {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: i64,
    pub maladie_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientStats {
    pub total_patients: i64,
    pub distinct_stades_count: i64,
    pub patients_by_stade: BTreeMap<String, i64>,
    pub critical_patients_count: i64,
    pub patients_with_symptoms_recorded: i64,
    pub patients_under_treatment: i64,
}

/// Maladie statistics. Keys are the published French labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MaladieStats {
    #[serde(rename = "total de maladies")]
    pub total: i64,
    /// Maladies without a type are counted under the empty key.
    #[serde(rename = "maladies par type")]
    pub by_type: BTreeMap<String, i64>,
    #[serde(rename = "Nombres de traitement disponible")]
    pub with_traitements: i64,
    #[serde(rename = "Compte de symptomes manifester")]
    pub unique_symptomes: i64,
    #[serde(rename = "Compte de traitements")]
    pub unique_traitements: i64,
    #[serde(rename = "patients par maladie")]
    pub patients_per_maladie: BTreeMap<String, i64>,
    #[serde(rename = "maladies avec des images")]
    pub with_images: i64,
}
