//! Category pages

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
    models::{Category, CategoryPayload},
    AppState,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
    pub description: String,
    #[serde(rename = "_method")]
    pub method: Option<String>,
}

impl CategoryForm {
    fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            description: category.description.clone().unwrap_or_default(),
            method: None,
        }
    }

    pub fn to_payload(&self) -> CategoryPayload {
        CategoryPayload {
            name: non_empty(&self.name),
            description: Some(non_empty(&self.description)),
        }
    }
}

pub async fn index(State(state): State<AppState>, cookies: Cookies) -> HtmlResult<Markup> {
    let categories = state.services.categories.list().await?;
    let notice = flash::take(&cookies);

    let content = html! {
        div class="d-flex justify-content-between align-items-center mb-3" {
            h1 { "Categories" }
            a href="/categories/create" class="btn btn-primary" { "New Category" }
        }
        table class="table table-striped" {
            thead {
                tr { th { "Name" } th { "Description" } th {} }
            }
            tbody {
                @for category in &categories {
                    tr {
                        td { a href=(format!("/categories/{}", category.id)) { (category.name) } }
                        td {
                            @if let Some(description) = &category.description { (description) }
                        }
                        td class="text-end" {
                            a href=(format!("/categories/{}/edit", category.id)) class="btn btn-sm btn-outline-secondary me-1" { "Edit" }
                            (layout::delete_button(&format!("/categories/{}", category.id), "Delete this category?"))
                        }
                    }
                }
                @if categories.is_empty() {
                    tr { td colspan="3" class="text-muted" { "No categories yet." } }
                }
            }
        }
    };
    Ok(layout::page("Categories", notice.as_deref(), content))
}

pub async fn create() -> Markup {
    form_page(None, &CategoryForm::default(), &FieldErrors::new())
}

pub async fn store(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<CategoryForm>,
) -> HtmlResult<Response> {
    match state.services.categories.create(form.to_payload()).await {
        Ok(_) => {
            flash::push(&cookies, Flash::new(Resource::Category, Action::Created));
            Ok(Redirect::to("/categories").into_response())
        }
        Err(err) => match err.field_errors() {
            Some(errors) => Ok(rejected(&err, form_page(None, &form, errors))),
            None => Err(err.into()),
        },
    }
}

pub async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> HtmlResult<Markup> {
    let details = state.services.categories.get_with_books(id).await?;
    let category = &details.category;

    let content = html! {
        h1 { (category.name) }
        @if let Some(description) = &category.description {
            p class="lead" { (description) }
        }
        h2 class="h4" { "Books" }
        ul {
            @for book in &details.books {
                li { a href=(format!("/books/{}", book.id)) { (book.title) } }
            }
            @if details.books.is_empty() {
                li class="text-muted" { "No books in this category." }
            }
        }
        a href=(format!("/categories/{}/edit", category.id)) class="btn btn-secondary me-2" { "Edit" }
        a href="/categories" class="btn btn-link" { "Back" }
    };
    Ok(layout::page(&category.name, None, content))
}

pub async fn edit(State(state): State<AppState>, Path(id): Path<i32>) -> HtmlResult<Markup> {
    let category = state.services.categories.get(id).await?;
    Ok(form_page(Some(id), &CategoryForm::from_category(&category), &FieldErrors::new()))
}

pub async fn update(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<i32>,
    Form(form): Form<CategoryForm>,
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
    Form(form): Form<CategoryForm>,
) -> HtmlResult<Response> {
    match SpoofedMethod::parse(form.method.as_deref()) {
        Some(SpoofedMethod::Update) => save(&state, &cookies, id, &form).await,
        Some(SpoofedMethod::Delete) => remove(&state, &cookies, id).await,
        None => Err(AppError::BadRequest("Unsupported form method".to_string()).into()),
    }
}

async fn save(state: &AppState, cookies: &Cookies, id: i32, form: &CategoryForm) -> HtmlResult<Response> {
    match state.services.categories.update(id, form.to_payload()).await {
        Ok(_) => {
            flash::push(cookies, Flash::new(Resource::Category, Action::Updated));
            Ok(Redirect::to("/categories").into_response())
        }
        Err(err) => match err.field_errors() {
            Some(errors) => Ok(rejected(&err, form_page(Some(id), form, errors))),
            None => Err(err.into()),
        },
    }
}

async fn remove(state: &AppState, cookies: &Cookies, id: i32) -> HtmlResult<Response> {
    state.services.categories.delete(id).await?;
    flash::push(cookies, Flash::new(Resource::Category, Action::Deleted));
    Ok(Redirect::to("/categories").into_response())
}

fn form_page(target: Option<i32>, form: &CategoryForm, errors: &FieldErrors) -> Markup {
    let (title, action) = match target {
        Some(id) => ("Edit Category", format!("/categories/{}", id)),
        None => ("New Category", "/categories".to_string()),
    };

    let content = html! {
        h1 { (title) }
        form action=(action) method="POST" {
            @if target.is_some() {
                (layout::method_field("PUT"))
            }
            (layout::input("name", "Name", "text", &form.name, true, errors))
            div class="mb-3" {
                label for="description" class="form-label" { "Description" }
                textarea id="description" name="description" class="form-control" rows="3" { (form.description) }
                (layout::field_error(errors, "description"))
            }
            button type="submit" class="btn btn-primary" { "Save" }
            a href="/categories" class="btn btn-link" { "Cancel" }
        }
    };
    layout::page(title, None, content)
}
