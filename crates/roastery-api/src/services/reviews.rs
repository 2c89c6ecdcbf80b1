use chrono::Utc;
use roastery_core::Review;
use uuid::Uuid;

use super::{not_found, CatalogService};
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::operation::{track, OperationMeta};

const GET_REVIEW: OperationMeta = OperationMeta::query("reviews.get");
const CREATE_REVIEW: OperationMeta = OperationMeta::command("reviews.create");
const UPDATE_REVIEW: OperationMeta = OperationMeta::command("reviews.update");
const DELETE_REVIEW: OperationMeta = OperationMeta::command("reviews.delete");

/// New review of a bean
#[derive(Debug, Clone)]
pub struct ReviewInput {
    pub bean_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
    pub brew_method: Option<String>,
}

/// Editable fields of a review
#[derive(Debug, Clone)]
pub struct ReviewUpdate {
    pub rating: u8,
    pub comment: Option<String>,
    pub brew_method: Option<String>,
}

fn check_rating(rating: u8) -> Result<(), AppError> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::BadRequest(format!(
            "rating must be between 1 and 5, got {rating}"
        )));
    }
    Ok(())
}

impl CatalogService {
    pub async fn get_review(&self, id: Uuid) -> Result<Review, AppError> {
        track(GET_REVIEW, async { self.require_review(id).await }).await
    }

    /// Review an existing bean as the calling user
    pub async fn create_review(
        &self,
        author: &AuthenticatedUser,
        input: ReviewInput,
    ) -> Result<Review, AppError> {
        track(CREATE_REVIEW, async {
            check_rating(input.rating)?;
            self.require_bean(input.bean_id).await.map_err(|e| match e {
                AppError::NotFound(_) => {
                    AppError::BadRequest(format!("bean {} does not exist", input.bean_id))
                }
                other => other,
            })?;

            let mut review = Review::new(input.bean_id, author.user_id, input.rating);
            review.comment = input.comment;
            review.brew_method = input.brew_method;
            self.catalog.reviews.insert(&review).await?;

            tracing::info!(
                review_id = %review.id,
                bean_id = %review.bean_id,
                user_id = %author.user_id,
                "Review created"
            );
            Ok(review)
        })
        .await
    }

    /// Edit a review; only its author or an admin may
    pub async fn update_review(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
        update: ReviewUpdate,
    ) -> Result<Review, AppError> {
        track(UPDATE_REVIEW, async {
            check_rating(update.rating)?;

            let mut review = self.require_review(id).await?;
            if !actor.can_modify(review.user_id) {
                return Err(AppError::Forbidden(
                    "only the author can edit this review".to_string(),
                ));
            }

            review.rating = update.rating;
            review.comment = update.comment;
            review.brew_method = update.brew_method;
            review.updated_at = Utc::now();
            self.catalog.reviews.update(&review).await?;
            Ok(review)
        })
        .await
    }

    pub async fn delete_review(&self, actor: &AuthenticatedUser, id: Uuid) -> Result<(), AppError> {
        track(DELETE_REVIEW, async {
            let review = self.require_review(id).await?;
            if !actor.can_modify(review.user_id) {
                return Err(AppError::Forbidden(
                    "only the author can delete this review".to_string(),
                ));
            }

            self.catalog.reviews.delete(id).await?;
            Ok(())
        })
        .await
    }

    async fn require_review(&self, id: Uuid) -> Result<Review, AppError> {
        self.catalog
            .reviews
            .get(id)
            .await?
            .ok_or_else(|| not_found("review", id))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{actor, service};
    use super::*;
    use crate::services::BeanInput;
    use roastery_core::{Page, RoastLevel, UserRole};

    async fn seeded() -> (CatalogService, Uuid) {
        let catalog = service();
        let bean = catalog
            .create_bean(BeanInput {
                name: "Kenya AA".to_string(),
                roaster: "Acme".to_string(),
                origin_id: None,
                roast_level: RoastLevel::Light,
                process: None,
                tasting_notes: None,
                tag_ids: vec![],
            })
            .await
            .unwrap();
        (catalog, bean.id)
    }

    fn input(bean_id: Uuid, rating: u8) -> ReviewInput {
        ReviewInput {
            bean_id,
            rating,
            comment: Some("bright".to_string()),
            brew_method: Some("V60".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_reviews() {
        let (catalog, bean_id) = seeded().await;
        let user = actor(UserRole::User);

        let review = catalog.create_review(&user, input(bean_id, 5)).await.unwrap();
        assert_eq!(review.user_id, user.user_id);

        let reviews = catalog
            .list_bean_reviews(bean_id, Page::default())
            .await
            .unwrap();
        assert_eq!(reviews.len(), 1);
    }

    #[tokio::test]
    async fn test_rating_bounds() {
        let (catalog, bean_id) = seeded().await;
        let user = actor(UserRole::User);

        for rating in [0, 6] {
            let result = catalog.create_review(&user, input(bean_id, rating)).await;
            assert!(matches!(result, Err(AppError::BadRequest(_))));
        }
    }

    #[tokio::test]
    async fn test_review_requires_existing_bean() {
        let (catalog, _) = seeded().await;
        let result = catalog
            .create_review(&actor(UserRole::User), input(Uuid::new_v4(), 3))
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_only_author_or_admin_edits() {
        let (catalog, bean_id) = seeded().await;
        let author = actor(UserRole::User);
        let other = actor(UserRole::Brewer);
        let admin = actor(UserRole::Admin);

        let review = catalog.create_review(&author, input(bean_id, 3)).await.unwrap();
        let update = ReviewUpdate {
            rating: 4,
            comment: None,
            brew_method: None,
        };

        let denied = catalog.update_review(&other, review.id, update.clone()).await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        let edited = catalog.update_review(&author, review.id, update).await.unwrap();
        assert_eq!(edited.rating, 4);

        assert!(matches!(
            catalog.delete_review(&other, review.id).await,
            Err(AppError::Forbidden(_))
        ));
        catalog.delete_review(&admin, review.id).await.unwrap();
        assert!(matches!(
            catalog.get_review(review.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
