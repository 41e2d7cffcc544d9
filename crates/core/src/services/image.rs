use api_shared::ImageInfoDto;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::CoreConfig;
use crate::entities::{Image, ImageUpload};
use crate::repositories::{images, maladies};
use crate::validation::{normalize_content_type, sanitize_file_name};
use crate::{Database, HopitalError, HopitalResult};

/// Images attached to maladies, stored as blobs.
#[derive(Debug, Clone)]
pub struct ImageService {
    db: Database,
    cfg: Arc<CoreConfig>,
}

impl ImageService {
    pub fn new(db: Database, cfg: Arc<CoreConfig>) -> Self {
        Self { db, cfg }
    }

    /// Stores an upload against a maladie.
    ///
    /// # Errors
    ///
    /// - `HopitalError::NotFound` if the maladie does not exist
    /// - `HopitalError::InvalidInput` if the file is empty, unnamed or larger
    ///   than the configured limit
    /// - `HopitalError::Conflict` if an image with the same name exists
    pub async fn store(&self, upload: ImageUpload, maladie_id: i64) -> HopitalResult<ImageInfoDto> {
        if upload.data.is_empty() {
            return Err(HopitalError::InvalidInput("uploaded file is empty".into()));
        }
        let limit = self.cfg.max_image_bytes();
        if upload.data.len() > limit {
            warn!(size = upload.data.len(), limit, "Rejected oversized image");
            return Err(HopitalError::InvalidInput(format!(
                "uploaded file exceeds the {limit} byte limit"
            )));
        }

        let name = sanitize_file_name(upload.file_name.as_deref())?;
        let content_type = normalize_content_type(upload.content_type.as_deref());

        let mut tx = self.db.pool().begin().await?;
        if maladies::find_by_id(&mut tx, maladie_id).await?.is_none() {
            return Err(HopitalError::not_found("maladie", maladie_id));
        }
        let id = images::insert(&mut tx, &name, &content_type, &upload.data, maladie_id).await?;
        let meta = images::find_meta_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| HopitalError::not_found("image", id))?;
        tx.commit().await?;

        info!(image_id = id, maladie_id, name = %name, "Stored image");
        Ok(ImageInfoDto::from(meta))
    }

    pub async fn get_image(&self, id: i64) -> HopitalResult<Option<Image>> {
        let mut conn = self.db.pool().acquire().await?;
        let row = images::find_by_id(&mut conn, id).await?;
        Ok(row.map(Image::from))
    }

    pub async fn delete_image(&self, id: i64) -> HopitalResult<()> {
        let mut conn = self.db.pool().acquire().await?;
        if !images::delete(&mut conn, id).await? {
            return Err(HopitalError::not_found("image", id));
        }
        info!(image_id = id, "Deleted image");
        Ok(())
    }

    /// Metadata of a maladie's images, or `None` if the maladie does not exist.
    pub async fn list_images_for_maladie(
        &self,
        maladie_id: i64,
    ) -> HopitalResult<Option<Vec<ImageInfoDto>>> {
        let mut conn = self.db.pool().acquire().await?;
        if maladies::find_by_id(&mut conn, maladie_id).await?.is_none() {
            return Ok(None);
        }
        let rows = images::list_by_maladie(&mut conn, maladie_id).await?;
        Ok(Some(rows.into_iter().map(ImageInfoDto::from).collect()))
    }
}
