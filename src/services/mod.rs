//! Business logic services

pub mod authors;
pub mod books;
pub mod categories;

use std::sync::Arc;

use crate::{config::InterfaceMode, models::BookRules, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub authors: authors::AuthorsService,
    pub categories: categories::CategoriesService,
    pub books: books::BooksService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, mode: InterfaceMode) -> Self {
        Self {
            authors: authors::AuthorsService::new(Arc::new(repository.authors)),
            categories: categories::CategoriesService::new(Arc::new(repository.categories)),
            books: books::BooksService::new(Arc::new(repository.books), BookRules::from(mode)),
        }
    }
}
