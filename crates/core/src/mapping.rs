//! Conversions between persisted aggregates and transfer objects.
//!
//! Outgoing conversions never embed back-references: a patient carries only
//! `{id, nom}` summaries of its maladies, and a maladie carries neither its
//! patients nor its images. Incoming conversions validate and normalise the
//! request body into a draft ready to be written.

use api_shared::{
    ImageInfoDto, MaladieDto, MaladieSummaryDto, PatientCreateUpdateDto, PatientDto,
};
use hopital_types::{optional_bounded, NonEmptyText};
use std::collections::BTreeSet;

use crate::constants::{
    COLLECTION_ITEM_MAX_LEN, GROUPE_SANGUIN_MAX_LEN, MALADIE_NOM_MAX_LEN, MALADIE_TYPE_MAX_LEN,
    PERSON_TEXT_MAX_LEN,
};
use crate::entities::{ImageMetaRow, Maladie, MaladieDraft, MaladieRef, Patient, PatientDraft};
use crate::validation::validate_email;
use crate::{HopitalError, HopitalResult};

impl From<&MaladieRef> for MaladieSummaryDto {
    fn from(m: &MaladieRef) -> Self {
        MaladieSummaryDto {
            id: m.id,
            nom: m.nom.clone(),
        }
    }
}

impl From<&Patient> for PatientDto {
    fn from(p: &Patient) -> Self {
        PatientDto {
            id: p.id,
            nom: p.nom.clone(),
            prenom: p.prenom.clone(),
            num_urgence: p.num_urgence,
            telephone: p.telephone,
            email: p.email.clone(),
            groupe_sanguin: p.groupe_sanguin.clone(),
            stade: p.stade,
            symptomes_manifester: p.symptomes.iter().cloned().collect(),
            traitement_suivie: p.traitements.iter().cloned().collect(),
            maladies_affectees: p.maladies.iter().map(MaladieSummaryDto::from).collect(),
        }
    }
}

/// Patient as listed from one of its maladies: no nested maladies.
pub fn patient_dto_without_maladies(p: &Patient) -> PatientDto {
    PatientDto {
        maladies_affectees: Vec::new(),
        ..PatientDto::from(p)
    }
}

impl From<&Maladie> for MaladieDto {
    fn from(m: &Maladie) -> Self {
        MaladieDto {
            id: Some(m.id),
            nom: m.nom.clone(),
            kind: m.kind.clone(),
            symptomes: m.symptomes.iter().cloned().collect(),
            traitements: m.traitements.iter().cloned().collect(),
        }
    }
}

impl From<&Patient> for PatientCreateUpdateDto {
    fn from(p: &Patient) -> Self {
        PatientCreateUpdateDto {
            nom: p.nom.clone(),
            prenom: p.prenom.clone(),
            num_urgence: p.num_urgence,
            telephone: p.telephone,
            email: p.email.clone(),
            groupe_sanguin: p.groupe_sanguin.clone(),
            stade: p.stade,
            symptomes_manifester: p.symptomes.iter().cloned().collect(),
            traitement_suivie: p.traitements.iter().cloned().collect(),
            maladie_ids: p.maladies.iter().map(|m| m.id).collect(),
        }
    }
}

impl From<ImageMetaRow> for ImageInfoDto {
    fn from(row: ImageMetaRow) -> Self {
        ImageInfoDto {
            id: row.id,
            name: row.name,
            content_type: row.content_type,
            size: row.size,
            maladie_id: row.maladie_id,
        }
    }
}

impl PatientDraft {
    /// Validates a create/update body.
    ///
    /// Names are trimmed and required; blank optional text becomes `None`;
    /// collections drop blank entries and duplicates.
    pub fn from_dto(dto: &PatientCreateUpdateDto) -> HopitalResult<Self> {
        let nom = NonEmptyText::bounded(&dto.nom, PERSON_TEXT_MAX_LEN)
            .map_err(HopitalError::field("nom"))?;
        let prenom = NonEmptyText::bounded(&dto.prenom, PERSON_TEXT_MAX_LEN)
            .map_err(HopitalError::field("prenom"))?;

        let email = optional_bounded(dto.email.as_deref(), PERSON_TEXT_MAX_LEN)
            .map_err(HopitalError::field("email"))?;
        if let Some(email) = &email {
            validate_email(email)?;
        }

        let groupe_sanguin = optional_bounded(dto.groupe_sanguin.as_deref(), GROUPE_SANGUIN_MAX_LEN)
            .map_err(HopitalError::field("groupeSanguin"))?
            .map(|g| g.to_ascii_uppercase());

        Ok(PatientDraft {
            nom: nom.into_inner(),
            prenom: prenom.into_inner(),
            num_urgence: dto.num_urgence,
            telephone: dto.telephone,
            email,
            groupe_sanguin,
            stade: dto.stade,
            symptomes: collection(&dto.symptomes_manifester, "symptomesManifester")?,
            traitements: collection(&dto.traitement_suivie, "traitementSuivie")?,
            maladie_ids: dto.maladie_ids.iter().copied().collect(),
        })
    }
}

impl MaladieDraft {
    /// Validates a maladie body. Any `id` it carries is ignored.
    pub fn from_dto(dto: &MaladieDto) -> HopitalResult<Self> {
        let nom = NonEmptyText::bounded(&dto.nom, MALADIE_NOM_MAX_LEN)
            .map_err(HopitalError::field("nom"))?;
        let kind = optional_bounded(dto.kind.as_deref(), MALADIE_TYPE_MAX_LEN)
            .map_err(HopitalError::field("type"))?;

        Ok(MaladieDraft {
            nom: nom.into_inner(),
            kind,
            symptomes: collection(&dto.symptomes, "symptomes")?,
            traitements: collection(&dto.traitements, "traitements")?,
        })
    }
}

fn collection(items: &[String], field: &'static str) -> HopitalResult<BTreeSet<String>> {
    let mut set = BTreeSet::new();
    for item in items {
        if let Some(value) =
            optional_bounded(Some(item.as_str()), COLLECTION_ITEM_MAX_LEN).map_err(HopitalError::field(field))?
        {
            set.insert(value);
        }
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_shared::StadePatient;

    fn patient() -> Patient {
        Patient {
            id: 7,
            nom: "Durand".into(),
            prenom: "Alice".into(),
            num_urgence: Some(112),
            telephone: Some(601020304),
            email: Some("alice@example.fr".into()),
            groupe_sanguin: Some("AB+".into()),
            stade: Some(StadePatient::StadeII),
            symptomes: ["toux".to_string(), "fievre".to_string()].into(),
            traitements: ["repos".to_string()].into(),
            maladies: vec![MaladieRef {
                id: 3,
                nom: "Grippe".into(),
                kind: Some("virale".into()),
            }],
        }
    }

    #[test]
    fn patient_dto_embeds_maladie_summaries_only() {
        let dto = PatientDto::from(&patient());

        assert_eq!(dto.id, 7);
        assert_eq!(dto.symptomes_manifester, vec!["fievre", "toux"]);
        assert_eq!(
            dto.maladies_affectees,
            vec![MaladieSummaryDto {
                id: 3,
                nom: "Grippe".into()
            }]
        );

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["maladiesAffectees"][0], serde_json::json!({"id": 3, "nom": "Grippe"}));
        assert_eq!(json["groupeSanguin"], "AB+");
    }

    #[test]
    fn patient_listed_from_maladie_has_no_nested_maladies() {
        let dto = patient_dto_without_maladies(&patient());
        assert!(dto.maladies_affectees.is_empty());
        assert_eq!(dto.nom, "Durand");
    }

    #[test]
    fn patient_draft_trims_and_deduplicates() {
        let dto = PatientCreateUpdateDto {
            nom: "  Martin ".into(),
            prenom: "Paul".into(),
            email: Some("   ".into()),
            groupe_sanguin: Some("o-".into()),
            symptomes_manifester: vec!["toux".into(), " toux ".into(), "".into()],
            maladie_ids: vec![2, 1, 2],
            ..Default::default()
        };

        let draft = PatientDraft::from_dto(&dto).unwrap();
        assert_eq!(draft.nom, "Martin");
        assert_eq!(draft.email, None);
        assert_eq!(draft.groupe_sanguin.as_deref(), Some("O-"));
        assert_eq!(draft.symptomes, BTreeSet::from(["toux".to_string()]));
        assert_eq!(draft.maladie_ids, BTreeSet::from([1, 2]));
    }

    #[test]
    fn patient_draft_rejects_blank_names_and_long_blood_groups() {
        let blank = PatientCreateUpdateDto {
            nom: " ".into(),
            prenom: "Paul".into(),
            ..Default::default()
        };
        assert!(matches!(
            PatientDraft::from_dto(&blank),
            Err(HopitalError::InvalidField { field: "nom", .. })
        ));

        let long_group = PatientCreateUpdateDto {
            nom: "Martin".into(),
            prenom: "Paul".into(),
            groupe_sanguin: Some("ABO+".into()),
            ..Default::default()
        };
        assert!(matches!(
            PatientDraft::from_dto(&long_group),
            Err(HopitalError::InvalidField {
                field: "groupeSanguin",
                ..
            })
        ));
    }

    #[test]
    fn maladie_draft_ignores_client_id_and_blank_type() {
        let dto = MaladieDto {
            id: Some(99),
            nom: "Asthme".into(),
            kind: Some("".into()),
            symptomes: vec!["dyspnee".into()],
            traitements: vec![],
        };

        let draft = MaladieDraft::from_dto(&dto).unwrap();
        assert_eq!(draft.nom, "Asthme");
        assert_eq!(draft.kind, None);
        assert_eq!(draft.symptomes.len(), 1);
    }

    #[test]
    fn maladie_name_is_bounded() {
        let dto = MaladieDto {
            id: None,
            nom: "x".repeat(MALADIE_NOM_MAX_LEN + 1),
            kind: None,
            symptomes: vec![],
            traitements: vec![],
        };
        assert!(MaladieDraft::from_dto(&dto).is_err());
    }

    #[test]
    fn image_info_serialises_type_and_maladie_id() {
        let info = ImageInfoDto::from(ImageMetaRow {
            id: 1,
            name: "irm.png".into(),
            content_type: "image/png".into(),
            size: 42,
            maladie_id: 3,
        });
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "image/png");
        assert_eq!(json["maladieId"], 3);
    }
}
