//! Authors repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{violated_constraint, SetClause};
use crate::{
    error::{AppError, AppResult, FieldErrors},
    models::{Author, AuthorChanges, AuthorWithBooks, Book},
};

/// Author persistence operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorsStore: Send + Sync {
    /// All authors in primary-key order
    async fn list(&self) -> AppResult<Vec<Author>>;
    async fn get(&self, id: i32) -> AppResult<Author>;
    /// Author with their books eagerly loaded
    async fn get_with_books(&self, id: i32) -> AppResult<AuthorWithBooks>;
    async fn create(&self, changes: &AuthorChanges) -> AppResult<Author>;
    async fn update(&self, id: i32, changes: &AuthorChanges) -> AppResult<Author>;
    async fn delete(&self, id: i32) -> AppResult<()>;
}

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorsStore for AuthorsRepository {
    async fn list(&self) -> AppResult<Vec<Author>> {
        let rows = sqlx::query_as::<_, Author>("SELECT * FROM authors ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get(&self, id: i32) -> AppResult<Author> {
        sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    async fn get_with_books(&self, id: i32) -> AppResult<AuthorWithBooks> {
        let author = self.get(id).await?;
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE author_id = $1 ORDER BY id")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(AuthorWithBooks { author, books })
    }

    async fn create(&self, changes: &AuthorChanges) -> AppResult<Author> {
        let author = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (name, birthdate, nationality)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&changes.name)
        .bind(changes.birthdate.flatten())
        .bind(changes.nationality.clone().flatten())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(author_id = author.id, "Author created");
        Ok(author)
    }

    async fn update(&self, id: i32, changes: &AuthorChanges) -> AppResult<Author> {
        let mut set = SetClause::new();
        set.push("name");
        if changes.birthdate.is_some() {
            set.push("birthdate");
        }
        if changes.nationality.is_some() {
            set.push("nationality");
        }

        let query = format!(
            "UPDATE authors SET {} WHERE id = ${} RETURNING *",
            set.sql(),
            set.next_placeholder()
        );

        let mut builder = sqlx::query_as::<_, Author>(&query).bind(&changes.name);
        if let Some(birthdate) = changes.birthdate {
            builder = builder.bind(birthdate);
        }
        if let Some(ref nationality) = changes.nationality {
            builder = builder.bind(nationality);
        }

        let author = builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))?;

        tracing::info!(author_id = id, "Author updated");
        Ok(author)
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                // books.author_id is ON DELETE RESTRICT
                if violated_constraint(&e) == Some("books_author_id_fkey") {
                    AppError::Conflict(FieldErrors::single(
                        "author",
                        "The author still has books and cannot be deleted.",
                    ))
                } else {
                    AppError::Database(e)
                }
            })?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Author {} not found", id)));
        }
        tracing::info!(author_id = id, "Author deleted");
        Ok(())
    }
}
