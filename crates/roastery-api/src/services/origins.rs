use chrono::Utc;
use roastery_core::{Origin, Page};
use uuid::Uuid;

use super::{not_found, require_non_blank, CatalogService};
use crate::error::AppError;
use crate::operation::{track, OperationMeta};

const LIST_ORIGINS: OperationMeta = OperationMeta::query("origins.list");
const GET_ORIGIN: OperationMeta = OperationMeta::query("origins.get");
const CREATE_ORIGIN: OperationMeta = OperationMeta::command("origins.create");
const UPDATE_ORIGIN: OperationMeta = OperationMeta::command("origins.update");
const DELETE_ORIGIN: OperationMeta = OperationMeta::command("origins.delete");

/// Writable fields of an origin
#[derive(Debug, Clone)]
pub struct OriginInput {
    pub country: String,
    pub region: Option<String>,
    pub farm: Option<String>,
    pub altitude_m: Option<i32>,
}

impl OriginInput {
    fn apply(self, origin: &mut Origin) {
        origin.country = self.country;
        origin.region = self.region;
        origin.farm = self.farm;
        origin.altitude_m = self.altitude_m;
    }
}

impl CatalogService {
    pub async fn list_origins(&self, page: Page) -> Result<Vec<Origin>, AppError> {
        track(LIST_ORIGINS, async {
            Ok(self.catalog.origins.list(page).await?)
        })
        .await
    }

    pub async fn get_origin(&self, id: Uuid) -> Result<Origin, AppError> {
        track(GET_ORIGIN, async {
            self.catalog
                .origins
                .get(id)
                .await?
                .ok_or_else(|| not_found("origin", id))
        })
        .await
    }

    pub async fn create_origin(&self, input: OriginInput) -> Result<Origin, AppError> {
        track(CREATE_ORIGIN, async {
            require_non_blank("country", &input.country)?;

            let mut origin = Origin::new(String::new());
            input.apply(&mut origin);
            self.catalog.origins.insert(&origin).await?;

            tracing::info!(origin_id = %origin.id, country = %origin.country, "Origin created");
            Ok(origin)
        })
        .await
    }

    pub async fn update_origin(&self, id: Uuid, input: OriginInput) -> Result<Origin, AppError> {
        track(UPDATE_ORIGIN, async {
            require_non_blank("country", &input.country)?;

            let mut origin = self
                .catalog
                .origins
                .get(id)
                .await?
                .ok_or_else(|| not_found("origin", id))?;

            input.apply(&mut origin);
            origin.updated_at = Utc::now();
            self.catalog.origins.update(&origin).await?;
            Ok(origin)
        })
        .await
    }

    /// Delete an origin no bean refers to
    pub async fn delete_origin(&self, id: Uuid) -> Result<(), AppError> {
        track(DELETE_ORIGIN, async {
            if self.catalog.beans.any_with_origin(id).await? {
                return Err(AppError::Conflict(format!(
                    "origin {id} is still referenced by beans"
                )));
            }

            if !self.catalog.origins.delete(id).await? {
                return Err(not_found("origin", id));
            }

            tracing::info!(origin_id = %id, "Origin deleted");
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::service;
    use super::*;
    use crate::services::BeanInput;
    use roastery_core::RoastLevel;

    fn ethiopia() -> OriginInput {
        OriginInput {
            country: "Ethiopia".to_string(),
            region: Some("Yirgacheffe".to_string()),
            farm: None,
            altitude_m: Some(1900),
        }
    }

    #[tokio::test]
    async fn test_origin_crud() {
        let catalog = service();

        let origin = catalog.create_origin(ethiopia()).await.unwrap();
        assert_eq!(catalog.get_origin(origin.id).await.unwrap().country, "Ethiopia");

        let updated = catalog
            .update_origin(
                origin.id,
                OriginInput {
                    farm: Some("Konga".to_string()),
                    ..ethiopia()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.farm.as_deref(), Some("Konga"));

        catalog.delete_origin(origin.id).await.unwrap();
        assert!(matches!(
            catalog.get_origin(origin.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            catalog.delete_origin(origin.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_country_rejected() {
        let catalog = service();
        let result = catalog
            .create_origin(OriginInput {
                country: "  ".to_string(),
                ..ethiopia()
            })
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_referenced_origin_cannot_be_deleted() {
        let catalog = service();
        let origin = catalog.create_origin(ethiopia()).await.unwrap();

        catalog
            .create_bean(BeanInput {
                name: "Kochere".to_string(),
                roaster: "Acme".to_string(),
                origin_id: Some(origin.id),
                roast_level: RoastLevel::Light,
                process: None,
                tasting_notes: None,
                tag_ids: vec![],
            })
            .await
            .unwrap();

        assert!(matches!(
            catalog.delete_origin(origin.id).await,
            Err(AppError::Conflict(_))
        ));
    }
}
