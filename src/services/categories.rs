//! Category service

use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Category, CategoryPayload, CategoryWithBooks},
    repository::CategoriesStore,
};

#[derive(Clone)]
pub struct CategoriesService {
    store: Arc<dyn CategoriesStore>,
}

impl CategoriesService {
    pub fn new(store: Arc<dyn CategoriesStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> AppResult<Vec<Category>> {
        self.store.list().await
    }

    pub async fn get(&self, id: i32) -> AppResult<Category> {
        self.store.get(id).await
    }

    pub async fn get_with_books(&self, id: i32) -> AppResult<CategoryWithBooks> {
        self.store.get_with_books(id).await
    }

    pub async fn create(&self, payload: CategoryPayload) -> AppResult<Category> {
        let changes = payload.into_changes()?;
        self.store.create(&changes).await
    }

    pub async fn update(&self, id: i32, payload: CategoryPayload) -> AppResult<Category> {
        self.store.get(id).await?;
        let changes = payload.into_changes()?;
        self.store.update(id, &changes).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.store.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, repository::categories::MockCategoriesStore};
    use chrono::Utc;

    #[tokio::test]
    async fn test_create_stores_validated_fields() {
        let mut store = MockCategoriesStore::new();
        store
            .expect_create()
            .withf(|changes| changes.name == "Poetry" && changes.description.is_none())
            .times(1)
            .returning(|changes| {
                Ok(Category {
                    id: 1,
                    name: changes.name.clone(),
                    description: None,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                })
            });
        let service = CategoriesService::new(Arc::new(store));

        let created = service
            .create(CategoryPayload {
                name: Some("Poetry".into()),
                description: None,
            })
            .await
            .unwrap();
        assert_eq!(created.id, 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_category() {
        let mut store = MockCategoriesStore::new();
        store
            .expect_delete()
            .returning(|id| Err(AppError::NotFound(format!("Category {} not found", id))));
        let service = CategoriesService::new(Arc::new(store));

        let err = service.delete(9).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
