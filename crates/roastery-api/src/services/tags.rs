use chrono::Utc;
use roastery_core::{Page, Tag};
use uuid::Uuid;

use super::{not_found, require_non_blank, CatalogService};
use crate::error::AppError;
use crate::operation::{track, OperationMeta};

const LIST_TAGS: OperationMeta = OperationMeta::query("tags.list");
const GET_TAG: OperationMeta = OperationMeta::query("tags.get");
const CREATE_TAG: OperationMeta = OperationMeta::command("tags.create");
const UPDATE_TAG: OperationMeta = OperationMeta::command("tags.update");
const DELETE_TAG: OperationMeta = OperationMeta::command("tags.delete");

impl CatalogService {
    pub async fn list_tags(&self, page: Page) -> Result<Vec<Tag>, AppError> {
        track(LIST_TAGS, async { Ok(self.catalog.tags.list(page).await?) }).await
    }

    pub async fn get_tag(&self, id: Uuid) -> Result<Tag, AppError> {
        track(GET_TAG, async {
            self.catalog
                .tags
                .get(id)
                .await?
                .ok_or_else(|| not_found("tag", id))
        })
        .await
    }

    /// Create a tag; names are unique ignoring case
    pub async fn create_tag(&self, name: String) -> Result<Tag, AppError> {
        track(CREATE_TAG, async {
            let name = name.trim().to_string();
            require_non_blank("name", &name)?;
            self.ensure_tag_name_free(&name, None).await?;

            let tag = Tag::new(name);
            self.catalog.tags.insert(&tag).await?;
            Ok(tag)
        })
        .await
    }

    pub async fn update_tag(&self, id: Uuid, name: String) -> Result<Tag, AppError> {
        track(UPDATE_TAG, async {
            let name = name.trim().to_string();
            require_non_blank("name", &name)?;

            let mut tag = self
                .catalog
                .tags
                .get(id)
                .await?
                .ok_or_else(|| not_found("tag", id))?;

            self.ensure_tag_name_free(&name, Some(id)).await?;

            tag.name = name;
            tag.updated_at = Utc::now();
            self.catalog.tags.update(&tag).await?;
            Ok(tag)
        })
        .await
    }

    /// Delete a tag and detach it from every bean
    pub async fn delete_tag(&self, id: Uuid) -> Result<(), AppError> {
        track(DELETE_TAG, async {
            if self.catalog.tags.get(id).await?.is_none() {
                return Err(not_found("tag", id));
            }

            self.catalog.beans.remove_tag(id).await?;
            self.catalog.tags.delete(id).await?;
            Ok(())
        })
        .await
    }

    async fn ensure_tag_name_free(&self, name: &str, except: Option<Uuid>) -> Result<(), AppError> {
        match self.catalog.tags.find_by_name(name).await? {
            Some(existing) if Some(existing.id) != except => {
                Err(AppError::Conflict(format!("tag '{name}' already exists")))
            }
            _ => Ok(()),
        }
    }
}
