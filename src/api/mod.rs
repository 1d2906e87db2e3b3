//! JSON API handlers, mounted under `/api` when the deployment runs in
//! API mode

pub mod authors;
pub mod books;
pub mod categories;
pub mod health;
pub mod openapi;

use axum::{
    extract::rejection::{JsonDataError, JsonRejection},
    routing::get,
    Router,
};
use serde_path_to_error::Segment;

use crate::{
    error::{AppError, FieldErrors},
    AppState,
};

/// A well-formed body whose field has the wrong type is a field error;
/// anything else about the body is a bad request
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if let JsonRejection::JsonDataError(ref err) = rejection {
            if let Some(field) = rejected_field(err) {
                let message = format!("The {} field is invalid.", field.replace('_', " "));
                return AppError::Validation(FieldErrors::single(&field, message));
            }
        }
        AppError::BadRequest(rejection.body_text())
    }
}

/// Top-level payload key the deserializer stopped at
fn rejected_field(err: &JsonDataError) -> Option<String> {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(current) = source {
        if let Some(path_err) =
            current.downcast_ref::<serde_path_to_error::Error<serde_json::Error>>()
        {
            return match path_err.path().iter().next() {
                Some(Segment::Map { key }) => Some(key.clone()),
                _ => None,
            };
        }
        source = current.source();
    }
    None
}

/// Resource routes for the three catalog entities
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route(
            "/authors",
            get(authors::list_authors).post(authors::create_author),
        )
        .route(
            "/authors/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .patch(authors::update_author)
                .delete(authors::delete_author),
        )
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categories/:id",
            get(categories::get_category)
                .put(categories::update_category)
                .patch(categories::update_category)
                .delete(categories::delete_category),
        )
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .patch(books::update_book)
                .delete(books::delete_book),
        )
        .with_state(state)
}
