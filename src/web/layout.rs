//! Page shell and form widgets shared by the HTML views

use maud::{html, Markup, DOCTYPE};

use crate::error::FieldErrors;

/// Full page with navigation and an optional success notice
pub fn page(title: &str, flash: Option<&str>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " | Library Catalog" }
                link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/css/bootstrap.min.css" rel="stylesheet";
            }
            body {
                nav class="navbar navbar-expand-lg navbar-dark bg-dark mb-4" {
                    div class="container-fluid" {
                        a class="navbar-brand" href="/" { "Library" }
                        ul class="navbar-nav me-auto" {
                            li class="nav-item" { a class="nav-link" href="/authors" { "Authors" } }
                            li class="nav-item" { a class="nav-link" href="/categories" { "Categories" } }
                            li class="nav-item" { a class="nav-link" href="/books" { "Books" } }
                        }
                    }
                }
                main class="container" {
                    @if let Some(message) = flash {
                        div class="alert alert-success" { (message) }
                    }
                    (content)
                }
            }
        }
    }
}

/// Messages recorded against one field
pub fn field_error(errors: &FieldErrors, name: &str) -> Markup {
    html! {
        @if let Some(message) = errors.first(name) {
            div class="text-danger" { (message) }
        }
    }
}

/// Labelled `<input>` with its error line
pub fn input(
    name: &str,
    label: &str,
    kind: &str,
    value: &str,
    required: bool,
    errors: &FieldErrors,
) -> Markup {
    html! {
        div class="mb-3" {
            label for=(name) class="form-label" { (label) }
            input type=(kind) id=(name) name=(name) class="form-control" value=(value)
                step=[(kind == "number" && name == "price").then_some("0.01")]
                required[required];
            (field_error(errors, name))
        }
    }
}

/// Hidden `_method` field for PUT / DELETE submissions
pub fn method_field(method: &str) -> Markup {
    html! {
        input type="hidden" name="_method" value=(method);
    }
}

/// Inline delete button posting a spoofed DELETE
pub fn delete_button(action: &str, confirm: &str) -> Markup {
    html! {
        form action=(action) method="POST" class="d-inline" {
            (method_field("DELETE"))
            button class="btn btn-danger btn-sm"
                onclick=(format!("return confirm('{}')", confirm)) { "Delete" }
        }
    }
}
