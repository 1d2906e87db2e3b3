//! Author service

use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Author, AuthorPayload, AuthorWithBooks},
    repository::AuthorsStore,
};

#[derive(Clone)]
pub struct AuthorsService {
    store: Arc<dyn AuthorsStore>,
}

impl AuthorsService {
    pub fn new(store: Arc<dyn AuthorsStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> AppResult<Vec<Author>> {
        self.store.list().await
    }

    pub async fn get(&self, id: i32) -> AppResult<Author> {
        self.store.get(id).await
    }

    pub async fn get_with_books(&self, id: i32) -> AppResult<AuthorWithBooks> {
        self.store.get_with_books(id).await
    }

    pub async fn create(&self, payload: AuthorPayload) -> AppResult<Author> {
        let changes = payload.into_changes()?;
        self.store.create(&changes).await
    }

    /// Unknown ids fail before the payload is looked at
    pub async fn update(&self, id: i32, payload: AuthorPayload) -> AppResult<Author> {
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
    use crate::{error::AppError, repository::authors::MockAuthorsStore};
    use chrono::Utc;

    fn author(id: i32, name: &str) -> Author {
        Author {
            id,
            name: name.to_string(),
            birthdate: None,
            nationality: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_invalid_create_never_reaches_store() {
        let mut store = MockAuthorsStore::new();
        store.expect_create().times(0);
        let service = AuthorsService::new(Arc::new(store));

        let err = service.create(AuthorPayload::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_unknown_author_is_not_found() {
        let mut store = MockAuthorsStore::new();
        store
            .expect_get()
            .returning(|id| Err(AppError::NotFound(format!("Author {} not found", id))));
        store.expect_update().times(0);
        let service = AuthorsService::new(Arc::new(store));

        // Even an invalid payload reports the missing record first
        let err = service.update(42, AuthorPayload::default()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_passes_partial_changes() {
        let mut store = MockAuthorsStore::new();
        store.expect_get().returning(|id| Ok(author(id, "Borges")));
        store
            .expect_update()
            .withf(|id, changes| {
                *id == 7 && changes.name == "J. L. Borges" && changes.nationality.is_none()
            })
            .times(1)
            .returning(|id, changes| Ok(author(id, &changes.name)));
        let service = AuthorsService::new(Arc::new(store));

        let payload = AuthorPayload {
            name: Some("J. L. Borges".into()),
            ..Default::default()
        };
        let updated = service.update(7, payload).await.unwrap();
        assert_eq!(updated.name, "J. L. Borges");
    }
}
