//! Repository layer for database operations

pub mod authors;
pub mod books;
pub mod categories;

use sqlx::{Pool, Postgres};

pub use authors::{AuthorsRepository, AuthorsStore};
pub use books::{BooksRepository, BooksStore, CategorySync};
pub use categories::{CategoriesRepository, CategoriesStore};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub authors: AuthorsRepository,
    pub categories: CategoriesRepository,
    pub books: BooksRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: AuthorsRepository::new(pool.clone()),
            categories: CategoriesRepository::new(pool.clone()),
            books: BooksRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database, used by the readiness probe
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Name of the constraint a database error violated, if any
pub(crate) fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    err.as_database_error().and_then(|e| e.constraint())
}

/// Builds `col = $n` assignments for partial updates.
///
/// Placeholders are numbered in push order, so binds must follow the
/// same order.
pub(crate) struct SetClause {
    sets: Vec<String>,
    idx: usize,
}

impl SetClause {
    pub fn new() -> Self {
        Self {
            sets: vec!["updated_at = NOW()".to_string()],
            idx: 1,
        }
    }

    pub fn push(&mut self, column: &str) {
        self.sets.push(format!("{} = ${}", column, self.idx));
        self.idx += 1;
    }

    /// Placeholder index for the next bind after the assignments
    pub fn next_placeholder(&self) -> usize {
        self.idx
    }

    pub fn sql(&self) -> String {
        self.sets.join(", ")
    }
}
