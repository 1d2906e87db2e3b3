//! Author pages

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;
use maud::{html, Markup};
use serde::Deserialize;
use tower_cookies::Cookies;

use super::{
    flash::{self, Action, Flash, Resource},
    layout, non_empty, rejected, HtmlResult, SpoofedMethod,
};
use crate::{
    error::{AppError, FieldErrors},
    models::{Author, AuthorPayload},
    AppState,
};

/// Submitted author form, every field as typed
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthorForm {
    pub name: String,
    pub birthdate: String,
    pub nationality: String,
    #[serde(rename = "_method")]
    pub method: Option<String>,
}

impl AuthorForm {
    fn from_author(author: &Author) -> Self {
        Self {
            name: author.name.clone(),
            birthdate: author.birthdate.map(|d| d.to_string()).unwrap_or_default(),
            nationality: author.nationality.clone().unwrap_or_default(),
            method: None,
        }
    }

    /// Blank inputs clear the optional fields
    pub fn to_payload(&self) -> AuthorPayload {
        AuthorPayload {
            name: non_empty(&self.name),
            birthdate: Some(non_empty(&self.birthdate)),
            nationality: Some(non_empty(&self.nationality)),
        }
    }
}

pub async fn index(State(state): State<AppState>, cookies: Cookies) -> HtmlResult<Markup> {
    let authors = state.services.authors.list().await?;
    let notice = flash::take(&cookies);

    let content = html! {
        div class="d-flex justify-content-between align-items-center mb-3" {
            h1 { "Authors" }
            a href="/authors/create" class="btn btn-primary" { "New Author" }
        }
        table class="table table-striped" {
            thead {
                tr { th { "Name" } th { "Birthdate" } th { "Nationality" } th {} }
            }
            tbody {
                @for author in &authors {
                    tr {
                        td { a href=(format!("/authors/{}", author.id)) { (author.name) } }
                        td {
                            @if let Some(birthdate) = author.birthdate { (birthdate.to_string()) }
                        }
                        td {
                            @if let Some(nationality) = &author.nationality { (nationality) }
                        }
                        td class="text-end" {
                            a href=(format!("/authors/{}/edit", author.id)) class="btn btn-sm btn-outline-secondary me-1" { "Edit" }
                            (layout::delete_button(&format!("/authors/{}", author.id), "Delete this author?"))
                        }
                    }
                }
                @if authors.is_empty() {
                    tr { td colspan="4" class="text-muted" { "No authors yet." } }
                }
            }
        }
    };
    Ok(layout::page("Authors", notice.as_deref(), content))
}

pub async fn create() -> Markup {
    form_page(None, &AuthorForm::default(), &FieldErrors::new())
}

pub async fn store(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<AuthorForm>,
) -> HtmlResult<Response> {
    match state.services.authors.create(form.to_payload()).await {
        Ok(_) => {
            flash::push(&cookies, Flash::new(Resource::Author, Action::Created));
            Ok(Redirect::to("/authors").into_response())
        }
        Err(err) => match err.field_errors() {
            Some(errors) => Ok(rejected(&err, form_page(None, &form, errors))),
            None => Err(err.into()),
        },
    }
}

pub async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> HtmlResult<Markup> {
    let details = state.services.authors.get_with_books(id).await?;
    let author = &details.author;

    let content = html! {
        h1 { (author.name) }
        dl class="row" {
            dt class="col-sm-3" { "Birthdate" }
            dd class="col-sm-9" {
                @if let Some(birthdate) = author.birthdate { (birthdate.to_string()) } @else { "-" }
            }
            dt class="col-sm-3" { "Nationality" }
            dd class="col-sm-9" {
                @if let Some(nationality) = &author.nationality { (nationality) } @else { "-" }
            }
        }
        h2 class="h4" { "Books" }
        ul {
            @for book in &details.books {
                li { a href=(format!("/books/{}", book.id)) { (book.title) } " (" (book.published_year) ")" }
            }
            @if details.books.is_empty() {
                li class="text-muted" { "No books." }
            }
        }
        a href=(format!("/authors/{}/edit", author.id)) class="btn btn-secondary me-2" { "Edit" }
        a href="/authors" class="btn btn-link" { "Back" }
    };
    Ok(layout::page(&author.name, None, content))
}

pub async fn edit(State(state): State<AppState>, Path(id): Path<i32>) -> HtmlResult<Markup> {
    let author = state.services.authors.get(id).await?;
    Ok(form_page(Some(id), &AuthorForm::from_author(&author), &FieldErrors::new()))
}

pub async fn update(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<i32>,
    Form(form): Form<AuthorForm>,
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

/// POST carrying a `_method` override
pub async fn spoofed(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<i32>,
    Form(form): Form<AuthorForm>,
) -> HtmlResult<Response> {
    match SpoofedMethod::parse(form.method.as_deref()) {
        Some(SpoofedMethod::Update) => save(&state, &cookies, id, &form).await,
        Some(SpoofedMethod::Delete) => remove(&state, &cookies, id).await,
        None => Err(AppError::BadRequest("Unsupported form method".to_string()).into()),
    }
}

async fn save(state: &AppState, cookies: &Cookies, id: i32, form: &AuthorForm) -> HtmlResult<Response> {
    match state.services.authors.update(id, form.to_payload()).await {
        Ok(_) => {
            flash::push(cookies, Flash::new(Resource::Author, Action::Updated));
            Ok(Redirect::to("/authors").into_response())
        }
        Err(err) => match err.field_errors() {
            Some(errors) => Ok(rejected(&err, form_page(Some(id), form, errors))),
            None => Err(err.into()),
        },
    }
}

async fn remove(state: &AppState, cookies: &Cookies, id: i32) -> HtmlResult<Response> {
    state.services.authors.delete(id).await?;
    flash::push(cookies, Flash::new(Resource::Author, Action::Deleted));
    Ok(Redirect::to("/authors").into_response())
}

fn form_page(target: Option<i32>, form: &AuthorForm, errors: &FieldErrors) -> Markup {
    let (title, action) = match target {
        Some(id) => ("Edit Author", format!("/authors/{}", id)),
        None => ("New Author", "/authors".to_string()),
    };

    let content = html! {
        h1 { (title) }
        form action=(action) method="POST" {
            @if target.is_some() {
                (layout::method_field("PUT"))
            }
            (layout::input("name", "Name", "text", &form.name, true, errors))
            (layout::input("birthdate", "Birthdate", "date", &form.birthdate, false, errors))
            (layout::input("nationality", "Nationality", "text", &form.nationality, false, errors))
            button type="submit" class="btn btn-primary" { "Save" }
            a href="/authors" class="btn btn-link" { "Cancel" }
        }
    };
    layout::page(title, None, content)
}
