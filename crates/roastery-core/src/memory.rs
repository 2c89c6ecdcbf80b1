//! In-memory storage
//!
//! Used for development and tests. Each call takes the lock once, so a single
//! call is atomic but sequences of calls are not.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Bean, Entity, Page, Review, Tag, User, UserList};
use crate::store::{
    BeanRepository, Repository, ReviewRepository, TagRepository, UserListRepository, UserStore,
};
use crate::{CoreError, Result};

/// In-memory credential store
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| same_email(&u.email, email)).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| u.username == username))
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| same_email(&u.email, email)))
    }

    async fn insert(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.username == user.username) {
            return Err(CoreError::Conflict("username already exists".to_string()));
        }
        if users.values().any(|u| same_email(&u.email, &user.email)) {
            return Err(CoreError::Conflict("email already exists".to_string()));
        }
        if users.contains_key(&user.id) {
            return Err(CoreError::Conflict(format!("user {} already exists", user.id)));
        }

        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(CoreError::NotFound(format!("user {}", user.id))),
        }
    }
}

/// In-memory repository for any catalog entity
pub struct InMemoryRepository<T> {
    items: RwLock<HashMap<Uuid, T>>,
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }

    async fn filtered(&self, page: Page, keep: impl Fn(&T) -> bool) -> Vec<T> {
        let items = self.items.read().await;
        let mut matching: Vec<T> = items.values().filter(|item| keep(item)).cloned().collect();
        matching.sort_by_key(|item| (item.created_at(), item.id()));
        matching
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .collect()
    }
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    async fn list(&self, page: Page) -> Result<Vec<T>> {
        Ok(self.filtered(page, |_| true).await)
    }

    async fn get(&self, id: Uuid) -> Result<Option<T>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn insert(&self, item: &T) -> Result<()> {
        let mut items = self.items.write().await;
        if items.contains_key(&item.id()) {
            return Err(CoreError::Conflict(format!("{} {} already exists", T::KIND, item.id())));
        }
        items.insert(item.id(), item.clone());
        Ok(())
    }

    async fn update(&self, item: &T) -> Result<()> {
        let mut items = self.items.write().await;
        match items.get_mut(&item.id()) {
            Some(existing) => {
                *existing = item.clone();
                Ok(())
            }
            None => Err(CoreError::NotFound(format!("{} {}", T::KIND, item.id()))),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.items.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl BeanRepository for InMemoryRepository<Bean> {
    async fn any_with_origin(&self, origin_id: Uuid) -> Result<bool> {
        let items = self.items.read().await;
        Ok(items.values().any(|b| b.origin_id == Some(origin_id)))
    }

    async fn remove_tag(&self, tag_id: Uuid) -> Result<()> {
        let mut items = self.items.write().await;
        for bean in items.values_mut() {
            bean.tag_ids.retain(|id| *id != tag_id);
        }
        Ok(())
    }
}

#[async_trait]
impl TagRepository for InMemoryRepository<Tag> {
    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let items = self.items.read().await;
        let name = name.to_lowercase();
        Ok(items.values().find(|t| t.name.to_lowercase() == name).cloned())
    }
}

#[async_trait]
impl ReviewRepository for InMemoryRepository<Review> {
    async fn list_for_bean(&self, bean_id: Uuid, page: Page) -> Result<Vec<Review>> {
        Ok(self.filtered(page, |r| r.bean_id == bean_id).await)
    }

    async fn delete_for_bean(&self, bean_id: Uuid) -> Result<u64> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|_, r| r.bean_id != bean_id);
        Ok((before - items.len()) as u64)
    }
}

#[async_trait]
impl UserListRepository for InMemoryRepository<UserList> {
    async fn list_for_user(&self, user_id: Uuid, page: Page) -> Result<Vec<UserList>> {
        Ok(self.filtered(page, |l| l.user_id == user_id).await)
    }

    async fn remove_bean_everywhere(&self, bean_id: Uuid) -> Result<()> {
        let mut items = self.items.write().await;
        for list in items.values_mut() {
            list.remove_bean(bean_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bean, RoastLevel};

    fn user(username: &str, email: &str) -> User {
        User::new(
            username.to_string(),
            email.to_string(),
            "hash".to_string(),
            "salt".to_string(),
            None,
            None,
        )
    }

    #[test]
    fn test_insert_and_find_user() {
        tokio_test::block_on(async {
            let store = InMemoryUserStore::new();
            let alice = user("alice", "Alice@X.com");
            store.insert(&alice).await.unwrap();

            let found = store.find_by_username("alice").await.unwrap().unwrap();
            assert_eq!(found.id, alice.id);

            let found = store.find_by_email("alice@x.com").await.unwrap().unwrap();
            assert_eq!(found.id, alice.id);

            assert!(store.find_by_id(alice.id).await.unwrap().is_some());
            assert!(store.find_by_username("ALICE").await.unwrap().is_none());
            assert_eq!(store.len().await, 1);
        });
    }

    #[test]
    fn test_email_checks_are_case_insensitive() {
        tokio_test::block_on(async {
            let store = InMemoryUserStore::new();
            store.insert(&user("alice", "alice@x.com")).await.unwrap();

            assert!(store.email_exists("ALICE@X.COM").await.unwrap());
            assert!(store.username_exists("alice").await.unwrap());
            assert!(!store.username_exists("bob").await.unwrap());

            let result = store.insert(&user("alice2", "Alice@x.com")).await;
            assert!(matches!(result, Err(CoreError::Conflict(_))));

            let result = store.insert(&user("alice", "other@x.com")).await;
            assert!(matches!(result, Err(CoreError::Conflict(_))));
            assert_eq!(store.len().await, 1);
        });
    }

    #[test]
    fn test_update_unknown_user_fails() {
        tokio_test::block_on(async {
            let store = InMemoryUserStore::new();
            let result = store.update(&user("ghost", "ghost@x.com")).await;
            assert!(matches!(result, Err(CoreError::NotFound(_))));
        });
    }

    #[tokio::test]
    async fn test_repository_crud() {
        let repo = InMemoryRepository::<Bean>::new();
        let mut bean = Bean::new("Yirgacheffe".to_string(), "Acme".to_string(), RoastLevel::Light);

        repo.insert(&bean).await.unwrap();
        assert!(repo.insert(&bean).await.is_err());

        bean.tasting_notes = Some("jasmine, lemon".to_string());
        repo.update(&bean).await.unwrap();

        let stored = repo.get(bean.id).await.unwrap().unwrap();
        assert_eq!(stored.tasting_notes.as_deref(), Some("jasmine, lemon"));

        assert!(repo.delete(bean.id).await.unwrap());
        assert!(!repo.delete(bean.id).await.unwrap());
        assert!(matches!(repo.update(&bean).await, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_repository_pagination() {
        let repo = InMemoryRepository::<Bean>::new();
        for i in 0..5 {
            let mut bean = Bean::new(format!("Bean {i}"), "Acme".to_string(), RoastLevel::Medium);
            bean.created_at += chrono::Duration::seconds(i);
            repo.insert(&bean).await.unwrap();
        }

        let first = repo.list(Page::new(Some(1), Some(2))).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].name, "Bean 0");

        let last = repo.list(Page::new(Some(3), Some(2))).await.unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].name, "Bean 4");
    }

    #[tokio::test]
    async fn test_review_filter_by_bean() {
        let repo = InMemoryRepository::<Review>::new();
        let bean_a = Uuid::new_v4();
        let bean_b = Uuid::new_v4();
        let user = Uuid::new_v4();

        repo.insert(&Review::new(bean_a, user, 5)).await.unwrap();
        repo.insert(&Review::new(bean_a, user, 3)).await.unwrap();
        repo.insert(&Review::new(bean_b, user, 4)).await.unwrap();

        let reviews = repo.list_for_bean(bean_a, Page::default()).await.unwrap();
        assert_eq!(reviews.len(), 2);
        assert!(reviews.iter().all(|r| r.bean_id == bean_a));
    }

    #[tokio::test]
    async fn test_delete_reviews_for_bean() {
        let repo = InMemoryRepository::<Review>::new();
        let bean = Uuid::new_v4();
        let user = Uuid::new_v4();

        repo.insert(&Review::new(bean, user, 5)).await.unwrap();
        repo.insert(&Review::new(bean, user, 2)).await.unwrap();
        repo.insert(&Review::new(Uuid::new_v4(), user, 4)).await.unwrap();

        assert_eq!(repo.delete_for_bean(bean).await.unwrap(), 2);
        assert_eq!(repo.list(Page::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bean_origin_and_tag_references() {
        let repo = InMemoryRepository::<Bean>::new();
        let origin = Uuid::new_v4();
        let tag = Uuid::new_v4();

        let mut bean = Bean::new("Gesha".to_string(), "Acme".to_string(), RoastLevel::Light);
        bean.origin_id = Some(origin);
        bean.tag_ids = vec![tag, Uuid::new_v4()];
        repo.insert(&bean).await.unwrap();

        assert!(repo.any_with_origin(origin).await.unwrap());
        assert!(!repo.any_with_origin(Uuid::new_v4()).await.unwrap());

        repo.remove_tag(tag).await.unwrap();
        let stored = repo.get(bean.id).await.unwrap().unwrap();
        assert_eq!(stored.tag_ids.len(), 1);
        assert!(!stored.tag_ids.contains(&tag));
    }

    #[tokio::test]
    async fn test_tag_lookup_is_case_insensitive() {
        let repo = InMemoryRepository::<Tag>::new();
        repo.insert(&Tag::new("Fruity".to_string())).await.unwrap();

        assert!(repo.find_by_name("fruity").await.unwrap().is_some());
        assert!(repo.find_by_name("FRUITY").await.unwrap().is_some());
        assert!(repo.find_by_name("nutty").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lists_filter_by_user() {
        let repo = InMemoryRepository::<UserList>::new();
        let owner = Uuid::new_v4();

        repo.insert(&UserList::new(owner, "Mine".to_string())).await.unwrap();
        repo.insert(&UserList::new(Uuid::new_v4(), "Theirs".to_string()))
            .await
            .unwrap();

        let lists = repo.list_for_user(owner, Page::default()).await.unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].name, "Mine");
    }
}
