//! Book service: field rules, isbn uniqueness and reference checks ahead
//! of every write.

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult, FieldErrors},
    models::{BookChanges, BookDetails, BookPayload, BookRules},
    repository::BooksStore,
};

#[derive(Clone)]
pub struct BooksService {
    store: Arc<dyn BooksStore>,
    rules: BookRules,
}

impl BooksService {
    pub fn new(store: Arc<dyn BooksStore>, rules: BookRules) -> Self {
        Self { store, rules }
    }

    pub fn rules(&self) -> BookRules {
        self.rules
    }

    pub async fn list(&self) -> AppResult<Vec<BookDetails>> {
        self.store.list().await
    }

    pub async fn get(&self, id: i32) -> AppResult<BookDetails> {
        self.store.get(id).await
    }

    /// Create a book. Listed categories are attached; nothing is detached.
    pub async fn create(&self, payload: BookPayload) -> AppResult<BookDetails> {
        let changes = payload.into_changes(self.rules)?;
        self.check_integrity(&changes, None).await?;
        let id = self.store.create(&changes).await?;
        self.store.get(id).await
    }

    /// Update a book. The category set becomes exactly the submitted list,
    /// or empty when the payload carries no `categories` key.
    ///
    /// Create never detaches while update always reconciles; existing
    /// clients depend on that difference.
    pub async fn update(&self, id: i32, payload: BookPayload) -> AppResult<BookDetails> {
        self.store.get(id).await?;
        let changes = payload.into_changes(self.rules)?;
        self.check_integrity(&changes, Some(id)).await?;
        let sync = self.store.update(id, &changes).await?;
        if !sync.is_noop() {
            tracing::debug!(book_id = id, ?sync, "Book categories reconciled");
        }
        self.store.get(id).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.store.delete(id).await
    }

    async fn check_integrity(&self, changes: &BookChanges, except_id: Option<i32>) -> AppResult<()> {
        if self.store.isbn_taken(&changes.isbn, except_id).await? {
            return Err(AppError::Conflict(FieldErrors::single(
                "isbn",
                "The isbn has already been taken.",
            )));
        }

        let mut errors = FieldErrors::new();
        if !self.store.author_exists(changes.author_id).await? {
            errors.add("author_id", "The selected author id is invalid.");
        }
        if let Some(ref categories) = changes.categories {
            let missing = self.store.missing_categories(categories).await?;
            for id in missing {
                errors.add("categories", format!("The selected category {} is invalid.", id));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Reference(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{Author, Book, Category},
        repository::{books::MockBooksStore, CategorySync},
    };
    use chrono::Utc;
    use mockall::predicate::eq;

    const HTML: BookRules = BookRules {
        price_required: false,
        stock_required: false,
    };

    fn payload(categories: Option<Vec<i32>>) -> BookPayload {
        BookPayload {
            title: Some("Ficciones".into()),
            isbn: Some("978-0-8021-3030-5".into()),
            published_year: Some(1944),
            price: None,
            stock: None,
            author_id: Some(1),
            categories,
        }
    }

    fn details(id: i32, category_ids: &[i32]) -> BookDetails {
        let now = Utc::now();
        BookDetails {
            book: Book {
                id,
                title: "Ficciones".into(),
                isbn: "978-0-8021-3030-5".into(),
                published_year: 1944,
                price: None,
                stock: None,
                author_id: 1,
                created_at: now,
                updated_at: now,
            },
            author: Author {
                id: 1,
                name: "Jorge Luis Borges".into(),
                birthdate: None,
                nationality: Some("Argentine".into()),
                created_at: now,
                updated_at: now,
            },
            categories: category_ids
                .iter()
                .map(|&cid| Category {
                    id: cid,
                    name: format!("Category {}", cid),
                    description: None,
                    created_at: now,
                    updated_at: now,
                })
                .collect(),
        }
    }

    /// Store where every reference resolves and no isbn is taken
    fn permissive_store() -> MockBooksStore {
        let mut store = MockBooksStore::new();
        store.expect_isbn_taken().returning(|_, _| Ok(false));
        store.expect_author_exists().returning(|_| Ok(true));
        store.expect_missing_categories().returning(|_| Ok(vec![]));
        store
    }

    #[tokio::test]
    async fn test_duplicate_isbn_is_rejected_without_insert() {
        let mut store = MockBooksStore::new();
        store.expect_isbn_taken().returning(|_, _| Ok(true));
        store.expect_author_exists().returning(|_| Ok(true));
        store.expect_create().times(0);
        let service = BooksService::new(Arc::new(store), HTML);

        let err = service.create(payload(None)).await.unwrap_err();
        match err {
            AppError::Conflict(errors) => assert!(errors.contains("isbn")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_author_is_rejected() {
        let mut store = MockBooksStore::new();
        store.expect_isbn_taken().returning(|_, _| Ok(false));
        store.expect_author_exists().with(eq(1)).returning(|_| Ok(false));
        store.expect_missing_categories().returning(|_| Ok(vec![]));
        store.expect_create().times(0);
        let service = BooksService::new(Arc::new(store), HTML);

        let err = service.create(payload(None)).await.unwrap_err();
        match err {
            AppError::Reference(errors) => assert!(errors.contains("author_id")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_category_is_rejected() {
        let mut store = MockBooksStore::new();
        store.expect_isbn_taken().returning(|_, _| Ok(false));
        store.expect_author_exists().returning(|_| Ok(true));
        store
            .expect_missing_categories()
            .withf(|ids| ids == &[2, 99][..])
            .returning(|_| Ok(vec![99]));
        store.expect_create().times(0);
        let service = BooksService::new(Arc::new(store), HTML);

        let err = service.create(payload(Some(vec![2, 99]))).await.unwrap_err();
        assert_eq!(
            err.field_errors().unwrap().first("categories"),
            Some("The selected category 99 is invalid.")
        );
    }

    #[tokio::test]
    async fn test_create_attaches_listed_categories() {
        let mut store = permissive_store();
        store
            .expect_create()
            .withf(|changes| changes.categories.as_deref() == Some(&[2, 3][..]))
            .times(1)
            .returning(|_| Ok(10));
        store.expect_get().with(eq(10)).returning(|id| Ok(details(id, &[2, 3])));
        let service = BooksService::new(Arc::new(store), HTML);

        let created = service.create(payload(Some(vec![2, 3]))).await.unwrap();
        assert_eq!(created.categories.len(), 2);
        assert_eq!(created.author.name, "Jorge Luis Borges");
    }

    #[tokio::test]
    async fn test_update_narrows_categories() {
        let mut store = permissive_store();
        store.expect_get().returning(|id| Ok(details(id, &[3])));
        store
            .expect_update()
            .withf(|id, changes| *id == 5 && changes.categories.as_deref() == Some(&[3][..]))
            .times(1)
            .returning(|_, changes| {
                let wanted = changes.categories.clone().unwrap_or_default();
                Ok(CategorySync::plan(&[2, 3], &wanted))
            });
        let service = BooksService::new(Arc::new(store), HTML);

        let updated = service.update(5, payload(Some(vec![3]))).await.unwrap();
        let ids: Vec<i32> = updated.categories.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[tokio::test]
    async fn test_update_without_categories_key_clears_them() {
        let mut store = permissive_store();
        store.expect_get().returning(|id| Ok(details(id, &[])));
        store
            .expect_update()
            .withf(|_, changes| changes.categories.is_none())
            .times(1)
            .returning(|_, _| {
                Ok(CategorySync {
                    attached: vec![],
                    detached: vec![2, 3],
                })
            });
        let service = BooksService::new(Arc::new(store), HTML);

        let updated = service.update(5, payload(None)).await.unwrap();
        assert!(updated.categories.is_empty());
    }

    #[tokio::test]
    async fn test_update_keeping_own_isbn_succeeds() {
        let mut store = MockBooksStore::new();
        store
            .expect_isbn_taken()
            .withf(|isbn, except_id| isbn == "978-0-8021-3030-5" && *except_id == Some(5))
            .times(1)
            .returning(|_, _| Ok(false));
        store.expect_author_exists().returning(|_| Ok(true));
        store.expect_get().returning(|id| Ok(details(id, &[])));
        store
            .expect_update()
            .times(1)
            .returning(|_, _| Ok(CategorySync::default()));
        let service = BooksService::new(Arc::new(store), HTML);

        let updated = service.update(5, payload(None)).await.unwrap();
        assert_eq!(updated.book.isbn, "978-0-8021-3030-5");
    }

    #[tokio::test]
    async fn test_update_unknown_book_has_no_side_effects() {
        let mut store = MockBooksStore::new();
        store
            .expect_get()
            .returning(|id| Err(AppError::NotFound(format!("Book {} not found", id))));
        store.expect_isbn_taken().times(0);
        store.expect_update().times(0);
        let service = BooksService::new(Arc::new(store), HTML);

        let err = service.update(404, payload(None)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_api_rules_require_stock() {
        let mut store = MockBooksStore::new();
        store.expect_create().times(0);
        let rules = BookRules {
            price_required: true,
            stock_required: true,
        };
        let service = BooksService::new(Arc::new(store), rules);

        let err = service.create(payload(None)).await.unwrap_err();
        let errors = err.field_errors().unwrap();
        assert!(errors.contains("stock"));
        assert!(errors.contains("price"));
    }

    #[tokio::test]
    async fn test_delete_delegates_to_store() {
        let mut store = MockBooksStore::new();
        store.expect_delete().with(eq(8)).times(1).returning(|_| Ok(()));
        let service = BooksService::new(Arc::new(store), HTML);

        service.delete(8).await.unwrap();
    }
}
