//! Book pages, including the author and category pickers

use std::str::FromStr;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;
use maud::{html, Markup};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_cookies::Cookies;

use super::{
    flash::{self, Action, Flash, Resource},
    layout, non_empty, rejected, HtmlResult, SpoofedMethod,
};
use crate::{
    error::{AppError, AppResult, FieldErrors},
    models::{Author, BookDetails, BookPayload, Category},
    AppState,
};

/// Submitted book form. Category ids arrive as repeated `categories[]`
/// keys from the multi-select.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookForm {
    pub title: String,
    pub isbn: String,
    pub published_year: String,
    pub price: String,
    pub author_id: String,
    #[serde(rename = "categories[]")]
    pub categories: Vec<String>,
    #[serde(rename = "_method")]
    pub method: Option<String>,
}

impl BookForm {
    fn from_details(details: &BookDetails) -> Self {
        let book = &details.book;
        Self {
            title: book.title.clone(),
            isbn: book.isbn.clone(),
            published_year: book.published_year.to_string(),
            price: book.price.map(|p| format!("{:.2}", p)).unwrap_or_default(),
            author_id: book.author_id.to_string(),
            categories: details.categories.iter().map(|c| c.id.to_string()).collect(),
            method: None,
        }
    }

    /// Parse the numeric inputs. Values that are not numbers are reported
    /// here, before the payload reaches validation.
    pub fn to_payload(&self) -> Result<BookPayload, FieldErrors> {
        let mut errors = FieldErrors::new();

        let published_year = match non_empty(&self.published_year) {
            Some(raw) => match raw.parse::<i32>() {
                Ok(year) => Some(year),
                Err(_) => {
                    errors.add("published_year", "The published year must be an integer.");
                    None
                }
            },
            None => None,
        };

        let price = match non_empty(&self.price) {
            Some(raw) => match Decimal::from_str(&raw) {
                Ok(price) => Some(price),
                Err(_) => {
                    errors.add("price", "The price must be a number.");
                    None
                }
            },
            None => None,
        };

        let author_id = match non_empty(&self.author_id) {
            Some(raw) => match raw.parse::<i32>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("author_id", "The selected author is invalid.");
                    None
                }
            },
            None => None,
        };

        let mut categories = Vec::with_capacity(self.categories.len());
        for raw in self.categories.iter().filter_map(|c| non_empty(c)) {
            match raw.parse::<i32>() {
                Ok(id) => categories.push(id),
                Err(_) => errors.add("categories", format!("The selected category {} is invalid.", raw)),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(BookPayload {
            title: non_empty(&self.title),
            isbn: non_empty(&self.isbn),
            published_year,
            price: Some(price),
            stock: None,
            author_id,
            categories: if categories.is_empty() { None } else { Some(categories) },
        })
    }
}

pub async fn index(State(state): State<AppState>, cookies: Cookies) -> HtmlResult<Markup> {
    let books = state.services.books.list().await?;
    let notice = flash::take(&cookies);

    let content = html! {
        div class="d-flex justify-content-between align-items-center mb-3" {
            h1 { "Books" }
            a href="/books/create" class="btn btn-primary" { "New Book" }
        }
        table class="table table-striped" {
            thead {
                tr {
                    th { "Title" } th { "Author" } th { "ISBN" } th { "Year" }
                    th { "Price" } th { "Categories" } th {}
                }
            }
            tbody {
                @for details in &books {
                    @let book = &details.book;
                    tr {
                        td { a href=(format!("/books/{}", book.id)) { (book.title) } }
                        td { (details.author.name) }
                        td { (book.isbn) }
                        td { (book.published_year) }
                        td { (price_label(book.price)) }
                        td {
                            @for category in &details.categories {
                                span class="badge bg-secondary me-1" { (category.name) }
                            }
                        }
                        td class="text-end" {
                            a href=(format!("/books/{}/edit", book.id)) class="btn btn-sm btn-outline-secondary me-1" { "Edit" }
                            (layout::delete_button(&format!("/books/{}", book.id), "Delete this book?"))
                        }
                    }
                }
                @if books.is_empty() {
                    tr { td colspan="7" class="text-muted" { "No books yet." } }
                }
            }
        }
    };
    Ok(layout::page("Books", notice.as_deref(), content))
}

pub async fn create(State(state): State<AppState>) -> HtmlResult<Markup> {
    let (authors, categories) = choices(&state).await?;
    Ok(form_page(
        None,
        &BookForm::default(),
        &FieldErrors::new(),
        &authors,
        &categories,
    ))
}

pub async fn store(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<BookForm>,
) -> HtmlResult<Response> {
    let result = match form.to_payload() {
        Ok(payload) => state.services.books.create(payload).await,
        Err(errors) => Err(AppError::Validation(errors)),
    };

    match result {
        Ok(_) => {
            flash::push(&cookies, Flash::new(Resource::Book, Action::Created));
            Ok(Redirect::to("/books").into_response())
        }
        Err(err) => redisplay(&state, None, &form, err).await,
    }
}

pub async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> HtmlResult<Markup> {
    let details = state.services.books.get(id).await?;
    let book = &details.book;

    let content = html! {
        h1 { (book.title) }
        dl class="row" {
            dt class="col-sm-3" { "Author" }
            dd class="col-sm-9" {
                a href=(format!("/authors/{}", details.author.id)) { (details.author.name) }
            }
            dt class="col-sm-3" { "ISBN" }
            dd class="col-sm-9" { (book.isbn) }
            dt class="col-sm-3" { "Published" }
            dd class="col-sm-9" { (book.published_year) }
            dt class="col-sm-3" { "Price" }
            dd class="col-sm-9" { (price_label(book.price)) }
            dt class="col-sm-3" { "Stock" }
            dd class="col-sm-9" {
                @if let Some(stock) = book.stock { (stock) } @else { "-" }
            }
            dt class="col-sm-3" { "Categories" }
            dd class="col-sm-9" {
                @for category in &details.categories {
                    a href=(format!("/categories/{}", category.id)) class="badge bg-secondary me-1 text-decoration-none" { (category.name) }
                }
            }
        }
        a href=(format!("/books/{}/edit", book.id)) class="btn btn-secondary me-2" { "Edit" }
        a href="/books" class="btn btn-link" { "Back" }
    };
    Ok(layout::page(&book.title, None, content))
}

pub async fn edit(State(state): State<AppState>, Path(id): Path<i32>) -> HtmlResult<Markup> {
    let details = state.services.books.get(id).await?;
    let (authors, categories) = choices(&state).await?;
    Ok(form_page(
        Some(id),
        &BookForm::from_details(&details),
        &FieldErrors::new(),
        &authors,
        &categories,
    ))
}

pub async fn update(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<i32>,
    Form(form): Form<BookForm>,
) -> HtmlResult<Response> {
    save(&state, &cookies, id, &form).await
}

pub async fn destroy(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<i32>,
) -> HtmlResult<Response> {
    remove(&state, &cookies, id).await
}

pub async fn spoofed(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<i32>,
    Form(form): Form<BookForm>,
) -> HtmlResult<Response> {
    match SpoofedMethod::parse(form.method.as_deref()) {
        Some(SpoofedMethod::Update) => save(&state, &cookies, id, &form).await,
        Some(SpoofedMethod::Delete) => remove(&state, &cookies, id).await,
        None => Err(AppError::BadRequest("Unsupported form method".to_string()).into()),
    }
}

async fn save(state: &AppState, cookies: &Cookies, id: i32, form: &BookForm) -> HtmlResult<Response> {
    // Unknown ids answer 404 before any field is looked at
    state.services.books.get(id).await?;

    let result = match form.to_payload() {
        Ok(payload) => state.services.books.update(id, payload).await,
        Err(errors) => Err(AppError::Validation(errors)),
    };

    match result {
        Ok(_) => {
            flash::push(cookies, Flash::new(Resource::Book, Action::Updated));
            Ok(Redirect::to("/books").into_response())
        }
        Err(err) => redisplay(state, Some(id), form, err).await,
    }
}

async fn remove(state: &AppState, cookies: &Cookies, id: i32) -> HtmlResult<Response> {
    state.services.books.delete(id).await?;
    flash::push(cookies, Flash::new(Resource::Book, Action::Deleted));
    Ok(Redirect::to("/books").into_response())
}

/// Render the form again with the submitted values, or the error page
/// when the failure is not tied to a field
async fn redisplay(
    state: &AppState,
    target: Option<i32>,
    form: &BookForm,
    err: AppError,
) -> HtmlResult<Response> {
    match err.field_errors() {
        Some(errors) => {
            let (authors, categories) = choices(state).await?;
            Ok(rejected(
                &err,
                form_page(target, form, errors, &authors, &categories),
            ))
        }
        None => Err(err.into()),
    }
}

async fn choices(state: &AppState) -> AppResult<(Vec<Author>, Vec<Category>)> {
    let authors = state.services.authors.list().await?;
    let categories = state.services.categories.list().await?;
    Ok((authors, categories))
}

fn price_label(price: Option<Decimal>) -> String {
    match price {
        Some(price) => format!("${:.2}", price),
        None => "-".to_string(),
    }
}

fn form_page(
    target: Option<i32>,
    form: &BookForm,
    errors: &FieldErrors,
    authors: &[Author],
    categories: &[Category],
) -> Markup {
    let (title, action) = match target {
        Some(id) => ("Edit Book", format!("/books/{}", id)),
        None => ("New Book", "/books".to_string()),
    };

    let content = html! {
        h1 { (title) }
        form action=(action) method="POST" {
            @if target.is_some() {
                (layout::method_field("PUT"))
            }
            (layout::input("title", "Title", "text", &form.title, true, errors))
            (layout::input("isbn", "ISBN", "text", &form.isbn, true, errors))
            (layout::input("published_year", "Published year", "number", &form.published_year, true, errors))
            (layout::input("price", "Price", "number", &form.price, false, errors))
            div class="mb-3" {
                label for="author_id" class="form-label" { "Author" }
                select id="author_id" name="author_id" class="form-select" required {
                    option value="" { "Select an author" }
                    @for author in authors {
                        @let value = author.id.to_string();
                        option value=(value) selected[form.author_id == value] { (author.name) }
                    }
                }
                (layout::field_error(errors, "author_id"))
            }
            div class="mb-3" {
                label for="categories" class="form-label" { "Categories" }
                select id="categories" name="categories[]" class="form-select" multiple {
                    @for category in categories {
                        @let value = category.id.to_string();
                        option value=(value) selected[form.categories.contains(&value)] { (category.name) }
                    }
                }
                (layout::field_error(errors, "categories"))
            }
            button type="submit" class="btn btn-primary" { "Save" }
            a href="/books" class="btn btn-link" { "Cancel" }
        }
    };
    layout::page(title, None, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn category(id: i32, name: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_form_collects_repeated_categories() {
        let form: BookForm = serde_html_form::from_str(
            "title=Ficciones&isbn=978-0&published_year=1944&price=12.5&author_id=1&categories%5B%5D=2&categories%5B%5D=3",
        )
        .unwrap();
        assert_eq!(form.categories, vec!["2", "3"]);

        let payload = form.to_payload().unwrap();
        assert_eq!(payload.published_year, Some(1944));
        assert_eq!(payload.price, Some(Some(Decimal::from_str("12.5").unwrap())));
        assert_eq!(payload.author_id, Some(1));
        assert_eq!(payload.categories, Some(vec![2, 3]));
        assert_eq!(payload.stock, None);
    }

    #[test]
    fn test_no_selection_sends_no_categories() {
        let form = BookForm {
            title: "Ficciones".to_string(),
            ..Default::default()
        };
        let payload = form.to_payload().unwrap();
        assert_eq!(payload.categories, None);
        assert_eq!(payload.price, Some(None));
        assert_eq!(payload.author_id, None);
    }

    #[test]
    fn test_non_numeric_inputs_are_reported() {
        let form = BookForm {
            published_year: "soon".to_string(),
            price: "cheap".to_string(),
            author_id: "x".to_string(),
            categories: vec!["1".to_string(), "drama".to_string()],
            ..Default::default()
        };
        let errors = form.to_payload().unwrap_err();
        assert!(errors.contains("published_year"));
        assert!(errors.contains("price"));
        assert!(errors.contains("author_id"));
        assert_eq!(
            errors.first("categories"),
            Some("The selected category drama is invalid.")
        );
    }

    #[test]
    fn test_edit_form_preselects_categories() {
        let form = BookForm {
            author_id: "1".to_string(),
            categories: vec!["2".to_string()],
            ..Default::default()
        };
        let categories = vec![category(2, "Fiction"), category(3, "Essays")];
        let html = form_page(Some(5), &form, &FieldErrors::new(), &[], &categories).into_string();
        assert!(html.contains(r#"<option value="2" selected>Fiction</option>"#));
        assert!(html.contains(r#"<option value="3">Essays</option>"#));
    }

    #[test]
    fn test_price_label() {
        assert_eq!(price_label(Some(Decimal::from_str("7.5").unwrap())), "$7.50");
        assert_eq!(price_label(None), "-");
    }
}
