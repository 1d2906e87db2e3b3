//! HTML form handlers, mounted at the root when the deployment runs in
//! HTML mode

pub mod authors;
pub mod books;
pub mod categories;
pub mod flash;
pub mod layout;

use axum::{
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use maud::html;
use tower_cookies::CookieManagerLayer;

use crate::{api::health, error::AppError, AppState};

/// Resource pages for the three catalog entities
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/books") }))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/authors", get(authors::index).post(authors::store))
        .route("/authors/create", get(authors::create))
        .route(
            "/authors/:id",
            get(authors::show)
                .put(authors::update)
                .patch(authors::update)
                .delete(authors::destroy)
                .post(authors::spoofed),
        )
        .route("/authors/:id/edit", get(authors::edit))
        .route("/categories", get(categories::index).post(categories::store))
        .route("/categories/create", get(categories::create))
        .route(
            "/categories/:id",
            get(categories::show)
                .put(categories::update)
                .patch(categories::update)
                .delete(categories::destroy)
                .post(categories::spoofed),
        )
        .route("/categories/:id/edit", get(categories::edit))
        .route("/books", get(books::index).post(books::store))
        .route("/books/create", get(books::create))
        .route(
            "/books/:id",
            get(books::show)
                .put(books::update)
                .patch(books::update)
                .delete(books::destroy)
                .post(books::spoofed),
        )
        .route("/books/:id/edit", get(books::edit))
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

/// HTTP method carried in a form's `_method` field, since browsers can
/// only submit GET and POST
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpoofedMethod {
    Update,
    Delete,
}

impl SpoofedMethod {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(|m| m.trim().to_ascii_uppercase()).as_deref() {
            Some("PUT") | Some("PATCH") => Some(SpoofedMethod::Update),
            Some("DELETE") => Some(SpoofedMethod::Delete),
            _ => None,
        }
    }
}

/// Error rendered as an HTML page
#[derive(Debug)]
pub struct HtmlError(pub AppError);

impl From<AppError> for HtmlError {
    fn from(err: AppError) -> Self {
        HtmlError(err)
    }
}

impl IntoResponse for HtmlError {
    fn into_response(self) -> Response {
        let err = self.0;
        err.log();
        let status = err.status_code();
        let title = status.canonical_reason().unwrap_or("Error");
        let content = html! {
            h1 { (status.as_u16()) " " (title) }
            p { (err.public_message()) }
            @if let Some(errors) = err.field_errors() {
                ul class="text-danger" {
                    @for (_, messages) in errors.iter() {
                        @for message in messages {
                            li { (message) }
                        }
                    }
                }
            }
            a href="/books" class="btn btn-secondary" { "Back" }
        };
        (status, layout::page(title, None, content)).into_response()
    }
}

pub type HtmlResult<T> = Result<T, HtmlError>;

/// Response for a form that failed validation: the page re-rendered with
/// the submitted values and the status of the underlying error
pub(crate) fn rejected(err: &AppError, page: maud::Markup) -> Response {
    (err.status_code(), page).into_response()
}

/// Treats blank form input as absent
pub(crate) fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
