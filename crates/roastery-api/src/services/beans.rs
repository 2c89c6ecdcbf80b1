use chrono::Utc;
use roastery_core::{Bean, Page, Review, RoastLevel};
use uuid::Uuid;

use super::{not_found, require_non_blank, CatalogService};
use crate::error::AppError;
use crate::operation::{track, OperationMeta};

const LIST_BEANS: OperationMeta = OperationMeta::query("beans.list");
const GET_BEAN: OperationMeta = OperationMeta::query("beans.get");
const LIST_BEAN_REVIEWS: OperationMeta = OperationMeta::query("beans.reviews").measured();
const CREATE_BEAN: OperationMeta = OperationMeta::command("beans.create");
const UPDATE_BEAN: OperationMeta = OperationMeta::command("beans.update");
const DELETE_BEAN: OperationMeta = OperationMeta::command("beans.delete");

/// Writable fields of a bean
#[derive(Debug, Clone)]
pub struct BeanInput {
    pub name: String,
    pub roaster: String,
    pub origin_id: Option<Uuid>,
    pub roast_level: RoastLevel,
    pub process: Option<String>,
    pub tasting_notes: Option<String>,
    pub tag_ids: Vec<Uuid>,
}

impl BeanInput {
    fn apply(self, bean: &mut Bean) {
        bean.name = self.name;
        bean.roaster = self.roaster;
        bean.origin_id = self.origin_id;
        bean.roast_level = self.roast_level;
        bean.process = self.process;
        bean.tasting_notes = self.tasting_notes;
        bean.tag_ids = self.tag_ids;
    }
}

impl CatalogService {
    pub async fn list_beans(&self, page: Page) -> Result<Vec<Bean>, AppError> {
        track(LIST_BEANS, async { Ok(self.catalog.beans.list(page).await?) }).await
    }

    pub async fn get_bean(&self, id: Uuid) -> Result<Bean, AppError> {
        track(GET_BEAN, async {
            self.catalog
                .beans
                .get(id)
                .await?
                .ok_or_else(|| not_found("bean", id))
        })
        .await
    }

    /// Reviews of an existing bean
    pub async fn list_bean_reviews(&self, bean_id: Uuid, page: Page) -> Result<Vec<Review>, AppError> {
        track(LIST_BEAN_REVIEWS, async {
            self.require_bean(bean_id).await?;
            Ok(self.catalog.reviews.list_for_bean(bean_id, page).await?)
        })
        .await
    }

    pub async fn create_bean(&self, input: BeanInput) -> Result<Bean, AppError> {
        track(CREATE_BEAN, async {
            self.check_bean_input(&input).await?;

            let mut bean = Bean::new(String::new(), String::new(), input.roast_level);
            input.apply(&mut bean);
            self.catalog.beans.insert(&bean).await?;

            tracing::info!(bean_id = %bean.id, name = %bean.name, "Bean created");
            Ok(bean)
        })
        .await
    }

    pub async fn update_bean(&self, id: Uuid, input: BeanInput) -> Result<Bean, AppError> {
        track(UPDATE_BEAN, async {
            let mut bean = self.require_bean(id).await?;
            self.check_bean_input(&input).await?;

            input.apply(&mut bean);
            bean.updated_at = Utc::now();
            self.catalog.beans.update(&bean).await?;
            Ok(bean)
        })
        .await
    }

    /// Delete a bean together with its reviews and list memberships
    pub async fn delete_bean(&self, id: Uuid) -> Result<(), AppError> {
        track(DELETE_BEAN, async {
            self.require_bean(id).await?;

            let reviews = self.catalog.reviews.delete_for_bean(id).await?;
            self.catalog.lists.remove_bean_everywhere(id).await?;
            self.catalog.beans.delete(id).await?;

            tracing::info!(bean_id = %id, reviews_removed = reviews, "Bean deleted");
            Ok(())
        })
        .await
    }

    pub(super) async fn require_bean(&self, id: Uuid) -> Result<Bean, AppError> {
        self.catalog
            .beans
            .get(id)
            .await?
            .ok_or_else(|| not_found("bean", id))
    }

    /// Origin and tags must exist
    async fn check_bean_input(&self, input: &BeanInput) -> Result<(), AppError> {
        require_non_blank("name", &input.name)?;
        require_non_blank("roaster", &input.roaster)?;

        if let Some(origin_id) = input.origin_id {
            if self.catalog.origins.get(origin_id).await?.is_none() {
                return Err(AppError::BadRequest(format!("origin {origin_id} does not exist")));
            }
        }

        for tag_id in &input.tag_ids {
            if self.catalog.tags.get(*tag_id).await?.is_none() {
                return Err(AppError::BadRequest(format!("tag {tag_id} does not exist")));
            }
        }

        Ok(())
    }
}
