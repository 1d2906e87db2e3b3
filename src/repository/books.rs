//! Books repository for database operations.
//!
//! Books own the `book_category` pivot: every write that touches it runs in
//! the same transaction as the book row itself.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{postgres::PgRow, FromRow, PgConnection, Pool, Postgres, Row};

use super::{violated_constraint, SetClause};
use crate::{
    error::{AppError, AppResult, FieldErrors},
    models::{Author, Book, BookChanges, BookDetails, Category},
};

/// Pivot rows to add and remove so a book ends up with exactly the wanted
/// categories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySync {
    pub attached: Vec<i32>,
    pub detached: Vec<i32>,
}

impl CategorySync {
    pub fn plan(current: &[i32], wanted: &[i32]) -> Self {
        let mut attached = Vec::new();
        for id in wanted {
            if !current.contains(id) && !attached.contains(id) {
                attached.push(*id);
            }
        }
        let detached = current
            .iter()
            .filter(|id| !wanted.contains(id))
            .copied()
            .collect();
        Self { attached, detached }
    }

    pub fn is_noop(&self) -> bool {
        self.attached.is_empty() && self.detached.is_empty()
    }
}

/// Book persistence operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksStore: Send + Sync {
    /// All books with author and categories, in primary-key order
    async fn list(&self) -> AppResult<Vec<BookDetails>>;
    async fn get(&self, id: i32) -> AppResult<BookDetails>;
    /// Whether another book already uses `isbn`
    async fn isbn_taken(&self, isbn: &str, except_id: Option<i32>) -> AppResult<bool>;
    async fn author_exists(&self, author_id: i32) -> AppResult<bool>;
    /// The ids among `ids` with no category row
    async fn missing_categories(&self, ids: &[i32]) -> AppResult<Vec<i32>>;
    /// Insert the book and attach its categories; returns the new id
    async fn create(&self, changes: &BookChanges) -> AppResult<i32>;
    /// Update the book and reconcile its categories with `changes.categories`
    /// (absent means none)
    async fn update(&self, id: i32, changes: &BookChanges) -> AppResult<CategorySync>;
    /// Detach all categories, then delete the book
    async fn delete(&self, id: i32) -> AppResult<()>;
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

const BOOK_WITH_AUTHOR: &str = r#"
    SELECT b.id, b.title, b.isbn, b.published_year, b.price, b.stock, b.author_id,
           b.created_at, b.updated_at,
           a.name AS author_name, a.birthdate AS author_birthdate,
           a.nationality AS author_nationality,
           a.created_at AS author_created_at, a.updated_at AS author_updated_at
    FROM books b
    JOIN authors a ON a.id = b.author_id
"#;

/// Maps write-time constraint violations onto field errors
fn constraint_error(err: sqlx::Error) -> AppError {
    match violated_constraint(&err) {
        Some("books_isbn_unique") => AppError::Conflict(FieldErrors::single(
            "isbn",
            "The isbn has already been taken.",
        )),
        Some("books_author_id_fkey") => AppError::Reference(FieldErrors::single(
            "author_id",
            "The selected author id is invalid.",
        )),
        Some("book_category_category_id_fkey") => AppError::Reference(FieldErrors::single(
            "categories",
            "The selected categories are invalid.",
        )),
        _ => AppError::Database(err),
    }
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn details_from_row(row: &PgRow) -> Result<BookDetails, sqlx::Error> {
        let book = Book::from_row(row)?;
        let author = Author {
            id: book.author_id,
            name: row.try_get("author_name")?,
            birthdate: row.try_get("author_birthdate")?,
            nationality: row.try_get("author_nationality")?,
            created_at: row.try_get("author_created_at")?,
            updated_at: row.try_get("author_updated_at")?,
        };
        Ok(BookDetails {
            book,
            author,
            categories: Vec::new(),
        })
    }

    /// Load categories for a set of books via the pivot table
    async fn categories_for(&self, book_ids: &[i32]) -> AppResult<HashMap<i32, Vec<Category>>> {
        let rows = sqlx::query(
            r#"
            SELECT bc.book_id, c.id, c.name, c.description, c.created_at, c.updated_at
            FROM book_category bc
            JOIN categories c ON c.id = bc.category_id
            WHERE bc.book_id = ANY($1)
            ORDER BY c.name, c.id
            "#,
        )
        .bind(book_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_book: HashMap<i32, Vec<Category>> = HashMap::new();
        for row in rows {
            let book_id: i32 = row.try_get("book_id")?;
            by_book.entry(book_id).or_default().push(Category::from_row(&row)?);
        }
        Ok(by_book)
    }

    async fn attach(conn: &mut PgConnection, book_id: i32, category_ids: &[i32]) -> AppResult<()> {
        if category_ids.is_empty() {
            return Ok(());
        }
        sqlx::query(
            r#"
            INSERT INTO book_category (book_id, category_id)
            SELECT $1, UNNEST($2::int4[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(book_id)
        .bind(category_ids)
        .execute(conn)
        .await
        .map_err(constraint_error)?;
        Ok(())
    }

    async fn detach(conn: &mut PgConnection, book_id: i32, category_ids: &[i32]) -> AppResult<()> {
        if category_ids.is_empty() {
            return Ok(());
        }
        sqlx::query("DELETE FROM book_category WHERE book_id = $1 AND category_id = ANY($2)")
            .bind(book_id)
            .bind(category_ids)
            .execute(conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl BooksStore for BooksRepository {
    async fn list(&self) -> AppResult<Vec<BookDetails>> {
        let rows = sqlx::query(&format!("{} ORDER BY b.id", BOOK_WITH_AUTHOR))
            .fetch_all(&self.pool)
            .await?;

        let mut books = rows
            .iter()
            .map(Self::details_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let ids: Vec<i32> = books.iter().map(|b| b.book.id).collect();
        let mut categories = self.categories_for(&ids).await?;
        for details in &mut books {
            details.categories = categories.remove(&details.book.id).unwrap_or_default();
        }
        Ok(books)
    }

    async fn get(&self, id: i32) -> AppResult<BookDetails> {
        let row = sqlx::query(&format!("{} WHERE b.id = $1", BOOK_WITH_AUTHOR))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;

        let mut details = Self::details_from_row(&row)?;
        details.categories = self
            .categories_for(&[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        Ok(details)
    }

    async fn isbn_taken(&self, isbn: &str, except_id: Option<i32>) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND ($2::int4 IS NULL OR id <> $2))",
        )
        .bind(isbn)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn author_exists(&self, author_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM authors WHERE id = $1)")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn missing_categories(&self, ids: &[i32]) -> AppResult<Vec<i32>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found: Vec<i32> = sqlx::query_scalar("SELECT id FROM categories WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.iter().filter(|id| !found.contains(id)).copied().collect())
    }

    async fn create(&self, changes: &BookChanges) -> AppResult<i32> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO books (title, isbn, published_year, price, stock, author_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&changes.title)
        .bind(&changes.isbn)
        .bind(changes.published_year)
        .bind(changes.price.flatten())
        .bind(changes.stock)
        .bind(changes.author_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(constraint_error)?;

        // Creation only ever adds associations
        if let Some(ref categories) = changes.categories {
            Self::attach(&mut tx, id, categories).await?;
        }

        tx.commit().await?;
        tracing::info!(book_id = id, isbn = %changes.isbn, "Book created");
        Ok(id)
    }

    async fn update(&self, id: i32, changes: &BookChanges) -> AppResult<CategorySync> {
        let mut set = SetClause::new();
        set.push("title");
        set.push("isbn");
        set.push("published_year");
        set.push("author_id");
        if changes.price.is_some() {
            set.push("price");
        }
        if changes.stock.is_some() {
            set.push("stock");
        }

        let query = format!(
            "UPDATE books SET {} WHERE id = ${} RETURNING id",
            set.sql(),
            set.next_placeholder()
        );

        let mut builder = sqlx::query_scalar::<_, i32>(&query)
            .bind(&changes.title)
            .bind(&changes.isbn)
            .bind(changes.published_year)
            .bind(changes.author_id);
        if let Some(price) = changes.price {
            builder = builder.bind(price);
        }
        if let Some(stock) = changes.stock {
            builder = builder.bind(stock);
        }

        let mut tx = self.pool.begin().await?;

        builder
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(constraint_error)?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;

        let current: Vec<i32> = sqlx::query_scalar(
            "SELECT category_id FROM book_category WHERE book_id = $1 ORDER BY category_id FOR UPDATE",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        // No categories key on update means the book ends up with none
        let wanted = changes.categories.as_deref().unwrap_or(&[]);
        let sync = CategorySync::plan(&current, wanted);
        Self::detach(&mut tx, id, &sync.detached).await?;
        Self::attach(&mut tx, id, &sync.attached).await?;

        tx.commit().await?;
        tracing::info!(
            book_id = id,
            attached = ?sync.attached,
            detached = ?sync.detached,
            "Book updated"
        );
        Ok(sync)
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM book_category WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }

        tx.commit().await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }
}
