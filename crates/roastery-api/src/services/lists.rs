use chrono::Utc;
use roastery_core::{Page, UserList};
use uuid::Uuid;

use super::{not_found, require_non_blank, CatalogService};
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::operation::{track, OperationMeta};

const LIST_LISTS: OperationMeta = OperationMeta::query("lists.list");
const GET_LIST: OperationMeta = OperationMeta::query("lists.get");
const CREATE_LIST: OperationMeta = OperationMeta::command("lists.create");
const UPDATE_LIST: OperationMeta = OperationMeta::command("lists.update");
const DELETE_LIST: OperationMeta = OperationMeta::command("lists.delete");
const ADD_LIST_BEAN: OperationMeta = OperationMeta::command("lists.add_bean");
const REMOVE_LIST_BEAN: OperationMeta = OperationMeta::command("lists.remove_bean");

/// Writable fields of a user list
#[derive(Debug, Clone)]
pub struct ListInput {
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
}

impl CatalogService {
    /// Lists owned by the caller
    pub async fn list_user_lists(
        &self,
        owner: &AuthenticatedUser,
        page: Page,
    ) -> Result<Vec<UserList>, AppError> {
        track(LIST_LISTS, async {
            Ok(self.catalog.lists.list_for_user(owner.user_id, page).await?)
        })
        .await
    }

    /// A list visible to the viewer
    ///
    /// Private lists are reported as not found to anyone but their owner.
    pub async fn get_list(
        &self,
        viewer: Option<&AuthenticatedUser>,
        id: Uuid,
    ) -> Result<UserList, AppError> {
        track(GET_LIST, async {
            let list = self.require_list(id).await?;
            let visible = list.is_public
                || viewer.is_some_and(|v| v.user_id == list.user_id || v.is_admin());

            if !visible {
                return Err(not_found("list", id));
            }
            Ok(list)
        })
        .await
    }

    pub async fn create_list(
        &self,
        owner: &AuthenticatedUser,
        input: ListInput,
    ) -> Result<UserList, AppError> {
        track(CREATE_LIST, async {
            require_non_blank("name", &input.name)?;

            let mut list = UserList::new(owner.user_id, input.name);
            list.description = input.description;
            list.is_public = input.is_public;
            self.catalog.lists.insert(&list).await?;
            Ok(list)
        })
        .await
    }

    pub async fn update_list(
        &self,
        owner: &AuthenticatedUser,
        id: Uuid,
        input: ListInput,
    ) -> Result<UserList, AppError> {
        track(UPDATE_LIST, async {
            require_non_blank("name", &input.name)?;

            let mut list = self.owned_list(owner, id).await?;
            list.name = input.name;
            list.description = input.description;
            list.is_public = input.is_public;
            list.updated_at = Utc::now();
            self.catalog.lists.update(&list).await?;
            Ok(list)
        })
        .await
    }

    pub async fn delete_list(&self, owner: &AuthenticatedUser, id: Uuid) -> Result<(), AppError> {
        track(DELETE_LIST, async {
            self.owned_list(owner, id).await?;
            self.catalog.lists.delete(id).await?;
            Ok(())
        })
        .await
    }

    /// Add a bean to a list; adding a bean already present changes nothing
    pub async fn add_bean_to_list(
        &self,
        owner: &AuthenticatedUser,
        list_id: Uuid,
        bean_id: Uuid,
    ) -> Result<UserList, AppError> {
        track(ADD_LIST_BEAN, async {
            let mut list = self.owned_list(owner, list_id).await?;
            self.require_bean(bean_id).await?;

            if list.add_bean(bean_id) {
                self.catalog.lists.update(&list).await?;
            }
            Ok(list)
        })
        .await
    }

    pub async fn remove_bean_from_list(
        &self,
        owner: &AuthenticatedUser,
        list_id: Uuid,
        bean_id: Uuid,
    ) -> Result<UserList, AppError> {
        track(REMOVE_LIST_BEAN, async {
            let mut list = self.owned_list(owner, list_id).await?;

            if list.remove_bean(bean_id) {
                self.catalog.lists.update(&list).await?;
            }
            Ok(list)
        })
        .await
    }

    async fn require_list(&self, id: Uuid) -> Result<UserList, AppError> {
        self.catalog
            .lists
            .get(id)
            .await?
            .ok_or_else(|| not_found("list", id))
    }

    async fn owned_list(&self, owner: &AuthenticatedUser, id: Uuid) -> Result<UserList, AppError> {
        let list = self.require_list(id).await?;
        if list.user_id != owner.user_id {
            return Err(AppError::Forbidden(
                "only the owner can modify this list".to_string(),
            ));
        }
        Ok(list)
    }
}
