//! Categories repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::SetClause;
use crate::{
    error::{AppError, AppResult},
    models::{Book, Category, CategoryChanges, CategoryWithBooks},
};

/// Category persistence operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoriesStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Category>>;
    async fn get(&self, id: i32) -> AppResult<Category>;
    async fn get_with_books(&self, id: i32) -> AppResult<CategoryWithBooks>;
    async fn create(&self, changes: &CategoryChanges) -> AppResult<Category>;
    async fn update(&self, id: i32, changes: &CategoryChanges) -> AppResult<Category>;
    /// Deleting a category drops its pivot rows; the books stay
    async fn delete(&self, id: i32) -> AppResult<()>;
}

#[derive(Clone)]
pub struct CategoriesRepository {
    pool: Pool<Postgres>,
}

impl CategoriesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoriesStore for CategoriesRepository {
    async fn list(&self) -> AppResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get(&self, id: i32) -> AppResult<Category> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    async fn get_with_books(&self, id: i32) -> AppResult<CategoryWithBooks> {
        let category = self.get(id).await?;
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT b.*
            FROM books b
            JOIN book_category bc ON bc.book_id = b.id
            WHERE bc.category_id = $1
            ORDER BY b.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(CategoryWithBooks { category, books })
    }

    async fn create(&self, changes: &CategoryChanges) -> AppResult<Category> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(&changes.name)
        .bind(changes.description.clone().flatten())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(category_id = category.id, "Category created");
        Ok(category)
    }

    async fn update(&self, id: i32, changes: &CategoryChanges) -> AppResult<Category> {
        let mut set = SetClause::new();
        set.push("name");
        if changes.description.is_some() {
            set.push("description");
        }

        let query = format!(
            "UPDATE categories SET {} WHERE id = ${} RETURNING *",
            set.sql(),
            set.next_placeholder()
        );

        let mut builder = sqlx::query_as::<_, Category>(&query).bind(&changes.name);
        if let Some(ref description) = changes.description {
            builder = builder.bind(description);
        }

        let category = builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;

        tracing::info!(category_id = id, "Category updated");
        Ok(category)
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM book_category WHERE category_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }

        tx.commit().await?;
        tracing::info!(category_id = id, "Category deleted");
        Ok(())
    }
}
