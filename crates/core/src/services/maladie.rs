use api_shared::{MaladieDto, MaladieStats, PatientDto};
use serde_json::{Map, Value};
use sqlx::SqliteConnection;
use tracing::info;

use crate::entities::{Maladie, MaladieDraft, MaladieRow};
use crate::mapping::patient_dto_without_maladies;
use crate::patch::patch_maladie;
use crate::repositories::{maladies, patients};
use crate::{Database, HopitalError, HopitalResult};

/// Maladie records and the maladie side of patient associations.
#[derive(Debug, Clone)]
pub struct MaladieService {
    db: Database,
}

impl MaladieService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get_all_maladies(&self) -> HopitalResult<Vec<MaladieDto>> {
        let mut conn = self.db.pool().acquire().await?;
        let rows = maladies::find_all(&mut conn).await?;
        to_dtos(&mut conn, rows).await
    }

    pub async fn get_maladie_by_id(&self, id: i64) -> HopitalResult<Option<MaladieDto>> {
        let mut conn = self.db.pool().acquire().await?;
        let maladie = load(&mut conn, id).await?;
        Ok(maladie.as_ref().map(MaladieDto::from))
    }

    pub async fn create_maladie(&self, dto: &MaladieDto) -> HopitalResult<MaladieDto> {
        let draft = MaladieDraft::from_dto(dto)?;

        let mut tx = self.db.pool().begin().await?;
        let id = maladies::insert(&mut tx, &draft).await?;
        let maladie = load(&mut tx, id)
            .await?
            .ok_or_else(|| HopitalError::not_found("maladie", id))?;
        tx.commit().await?;

        info!(maladie_id = id, nom = %maladie.nom, "Created maladie");
        Ok(MaladieDto::from(&maladie))
    }

    /// Replaces name, type and collections. Returns `Ok(None)` if absent.
    pub async fn update_maladie(&self, id: i64, dto: &MaladieDto) -> HopitalResult<Option<MaladieDto>> {
        let draft = MaladieDraft::from_dto(dto)?;

        let mut tx = self.db.pool().begin().await?;
        let updated = write_in(&mut tx, id, &draft).await?;
        tx.commit().await?;
        Ok(updated.as_ref().map(MaladieDto::from))
    }

    /// Applies `nom`, `type`, `symptomes` and `traitements` from `updates`.
    pub async fn patch_maladie(
        &self,
        id: i64,
        updates: &Map<String, Value>,
    ) -> HopitalResult<Option<MaladieDto>> {
        let mut tx = self.db.pool().begin().await?;
        let Some(current) = load(&mut tx, id).await? else {
            return Ok(None);
        };
        let draft = patch_maladie(&current, updates)?;
        let updated = write_in(&mut tx, id, &draft).await?;
        tx.commit().await?;
        Ok(updated.as_ref().map(MaladieDto::from))
    }

    /// Deletes a maladie.
    ///
    /// Associated patients are kept and lose the association; images of the
    /// maladie are deleted with it.
    pub async fn delete_maladie(&self, id: i64) -> HopitalResult<()> {
        let mut tx = self.db.pool().begin().await?;
        let detached = maladies::detach_patients(&mut tx, id).await?;
        if !maladies::delete(&mut tx, id).await? {
            return Err(HopitalError::not_found("maladie", id));
        }
        tx.commit().await?;

        info!(maladie_id = id, detached, "Deleted maladie");
        Ok(())
    }

    /// First maladie (by id) with exactly this name.
    pub async fn get_maladie_by_name(&self, nom: &str) -> HopitalResult<Option<MaladieDto>> {
        let mut conn = self.db.pool().acquire().await?;
        match maladies::find_by_nom(&mut conn, nom.trim()).await? {
            Some(row) => {
                let maladie = maladies::hydrate(&mut conn, row).await?;
                Ok(Some(MaladieDto::from(&maladie)))
            }
            None => Ok(None),
        }
    }

    pub async fn get_maladies_by_type(&self, kind: &str) -> HopitalResult<Vec<MaladieDto>> {
        let mut conn = self.db.pool().acquire().await?;
        let rows = maladies::find_by_type(&mut conn, kind.trim()).await?;
        to_dtos(&mut conn, rows).await
    }

    /// First maladie matching both type and name.
    pub async fn get_maladie_by_type_and_name(
        &self,
        kind: &str,
        nom: &str,
    ) -> HopitalResult<Option<MaladieDto>> {
        let mut conn = self.db.pool().acquire().await?;
        let rows = maladies::find_by_type_and_nom(&mut conn, kind.trim(), nom.trim()).await?;
        match rows.into_iter().next() {
            Some(row) => {
                let maladie = maladies::hydrate(&mut conn, row).await?;
                Ok(Some(MaladieDto::from(&maladie)))
            }
            None => Ok(None),
        }
    }

    /// Patients of a maladie, without their own maladie lists.
    ///
    /// Returns `Ok(None)` if the maladie does not exist.
    pub async fn get_patients_by_maladie_id(&self, id: i64) -> HopitalResult<Option<Vec<PatientDto>>> {
        let mut conn = self.db.pool().acquire().await?;
        if maladies::find_by_id(&mut conn, id).await?.is_none() {
            return Ok(None);
        }

        let rows = maladies::patients_of(&mut conn, id).await?;
        let mut list = Vec::with_capacity(rows.len());
        for row in rows {
            let patient = patients::hydrate_without_maladies(&mut conn, row).await?;
            list.push(patient_dto_without_maladies(&patient));
        }
        Ok(Some(list))
    }

    pub async fn get_maladies_stats(&self) -> HopitalResult<MaladieStats> {
        let mut conn = self.db.pool().acquire().await?;
        Ok(MaladieStats {
            total: maladies::count(&mut conn).await?,
            by_type: maladies::count_by_type(&mut conn).await?,
            with_traitements: maladies::count_with_traitements(&mut conn).await?,
            unique_symptomes: maladies::count_unique_symptomes(&mut conn).await?,
            unique_traitements: maladies::count_unique_traitements(&mut conn).await?,
            patients_per_maladie: maladies::count_patients_per_maladie(&mut conn).await?,
            with_images: maladies::count_with_images(&mut conn).await?,
        })
    }

    /// Maladies with at least one recorded symptom.
    pub async fn count_with_symptomes(&self) -> HopitalResult<i64> {
        let mut conn = self.db.pool().acquire().await?;
        maladies::count_with_symptomes(&mut conn).await
    }
}

async fn load(conn: &mut SqliteConnection, id: i64) -> HopitalResult<Option<Maladie>> {
    match maladies::find_by_id(conn, id).await? {
        Some(row) => maladies::hydrate(conn, row).await.map(Some),
        None => Ok(None),
    }
}

async fn write_in(
    conn: &mut SqliteConnection,
    id: i64,
    draft: &MaladieDraft,
) -> HopitalResult<Option<Maladie>> {
    if !maladies::update(conn, id, draft).await? {
        return Ok(None);
    }
    info!(maladie_id = id, "Updated maladie");
    load(conn, id).await
}

async fn to_dtos(conn: &mut SqliteConnection, rows: Vec<MaladieRow>) -> HopitalResult<Vec<MaladieDto>> {
    let list = maladies::hydrate_all(conn, rows).await?;
    Ok(list.iter().map(MaladieDto::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ImageUpload;
    use crate::services::{ImageService, PatientService};
    use crate::CoreConfig;
    use api_shared::PatientCreateUpdateDto;
    use serde_json::json;
    use std::sync::Arc;

    struct Fixture {
        maladies: MaladieService,
        patients: PatientService,
        images: ImageService,
    }

    async fn fixture() -> Fixture {
        let db = Database::open_in_memory().await.unwrap();
        Fixture {
            maladies: MaladieService::new(db.clone()),
            patients: PatientService::new(db.clone()),
            images: ImageService::new(db, Arc::new(CoreConfig::default())),
        }
    }

    fn dto(nom: &str, kind: Option<&str>) -> MaladieDto {
        MaladieDto {
            id: None,
            nom: nom.into(),
            kind: kind.map(Into::into),
            symptomes: vec![],
            traitements: vec![],
        }
    }

    async fn patient_with(f: &Fixture, nom: &str, maladie_ids: Vec<i64>) -> i64 {
        f.patients
            .create_patient(&PatientCreateUpdateDto {
                nom: nom.into(),
                prenom: "Test".into(),
                maladie_ids,
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn create_ignores_client_id_and_update_replaces() {
        let f = fixture().await;
        let created = f
            .maladies
            .create_maladie(&MaladieDto {
                id: Some(500),
                symptomes: vec!["fievre".into()],
                ..dto("Grippe", Some("virale"))
            })
            .await
            .unwrap();
        let id = created.id.unwrap();
        assert_ne!(id, 500);

        let updated = f
            .maladies
            .update_maladie(id, &dto("Grippe A", None))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.nom, "Grippe A");
        assert_eq!(updated.kind, None);
        assert!(updated.symptomes.is_empty());

        assert!(f.maladies.update_maladie(999, &dto("X", None)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_detaches_patients_and_cascades_images() {
        let f = fixture().await;
        let grippe = f.maladies.create_maladie(&dto("Grippe", None)).await.unwrap().id.unwrap();
        let patient = patient_with(&f, "Dupont", vec![grippe]).await;
        let image = f
            .images
            .store(
                ImageUpload {
                    file_name: Some("radio.png".into()),
                    content_type: Some("image/png".into()),
                    data: vec![1, 2, 3],
                },
                grippe,
            )
            .await
            .unwrap();

        f.maladies.delete_maladie(grippe).await.unwrap();

        let p = f.patients.get_patient_by_id(patient).await.unwrap().unwrap();
        assert!(p.maladies_affectees.is_empty());
        assert!(f.images.get_image(image.id).await.unwrap().is_none());
        assert!(matches!(
            f.maladies.delete_maladie(grippe).await,
            Err(HopitalError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn lookups_by_name_and_type() {
        let f = fixture().await;
        f.maladies.create_maladie(&dto("Grippe", Some("virale"))).await.unwrap();
        f.maladies.create_maladie(&dto("Covid", Some("virale"))).await.unwrap();
        f.maladies.create_maladie(&dto("Diabete", Some("chronique"))).await.unwrap();

        assert_eq!(f.maladies.get_maladies_by_type("virale").await.unwrap().len(), 2);
        assert_eq!(
            f.maladies.get_maladie_by_name("Covid").await.unwrap().unwrap().nom,
            "Covid"
        );
        assert!(f.maladies.get_maladie_by_name("Peste").await.unwrap().is_none());
        assert!(f
            .maladies
            .get_maladie_by_type_and_name("chronique", "Grippe")
            .await
            .unwrap()
            .is_none());
        assert!(f
            .maladies
            .get_maladie_by_type_and_name("chronique", "Diabete")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn patients_listed_without_nested_maladies() {
        let f = fixture().await;
        let grippe = f.maladies.create_maladie(&dto("Grippe", None)).await.unwrap().id.unwrap();
        patient_with(&f, "Dupont", vec![grippe]).await;

        let list = f.maladies.get_patients_by_maladie_id(grippe).await.unwrap().unwrap();
        assert_eq!(list.len(), 1);
        assert!(list[0].maladies_affectees.is_empty());
        assert!(f.maladies.get_patients_by_maladie_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn patch_changes_named_fields_only() {
        let f = fixture().await;
        let id = f
            .maladies
            .create_maladie(&MaladieDto {
                traitements: vec!["insuline".into()],
                ..dto("Diabete", None)
            })
            .await
            .unwrap()
            .id
            .unwrap();

        let updates = json!({"type": "chronique", "nom": "Diabete type 1"});
        let patched = f
            .maladies
            .patch_maladie(id, updates.as_object().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(patched.nom, "Diabete type 1");
        assert_eq!(patched.kind.as_deref(), Some("chronique"));
        assert_eq!(patched.traitements, vec!["insuline"]);

        let bad = json!({"nom": null});
        assert!(f.maladies.patch_maladie(id, bad.as_object().unwrap()).await.is_err());
    }

    #[tokio::test]
    async fn stats_cover_types_patients_and_images() {
        let f = fixture().await;
        let grippe = f
            .maladies
            .create_maladie(&MaladieDto {
                symptomes: vec!["fievre".into(), "toux".into()],
                traitements: vec!["repos".into()],
                ..dto("Grippe", Some("virale"))
            })
            .await
            .unwrap()
            .id
            .unwrap();
        f.maladies
            .create_maladie(&MaladieDto {
                symptomes: vec!["fievre".into()],
                traitements: vec!["repos".into(), "antiviral".into()],
                ..dto("Covid", Some("virale"))
            })
            .await
            .unwrap();
        f.maladies.create_maladie(&dto("Inconnue", None)).await.unwrap();

        patient_with(&f, "A", vec![grippe]).await;
        patient_with(&f, "B", vec![grippe]).await;
        f.images
            .store(
                ImageUpload {
                    file_name: Some("g.png".into()),
                    content_type: None,
                    data: vec![0],
                },
                grippe,
            )
            .await
            .unwrap();

        let stats = f.maladies.get_maladies_stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_type.get("virale"), Some(&2));
        assert_eq!(stats.by_type.get(""), Some(&1));
        assert_eq!(stats.with_traitements, 2);
        assert_eq!(stats.unique_symptomes, 2);
        assert_eq!(stats.unique_traitements, 2);
        assert_eq!(stats.patients_per_maladie.get("Grippe"), Some(&2));
        assert_eq!(stats.patients_per_maladie.len(), 1);
        assert_eq!(stats.with_images, 1);
        assert_eq!(f.maladies.count_with_symptomes().await.unwrap(), 2);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["total de maladies"], 3);
    }
}
