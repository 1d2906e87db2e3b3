//! Book model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{author::Author, category::Category, trimmed};
use crate::{
    config::InterfaceMode,
    error::{AppResult, FieldErrors},
};

/// Book row as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub isbn: String,
    pub published_year: i32,
    /// Decimal with two fraction digits, serialized as a string
    #[schema(value_type = Option<String>, example = "19.90")]
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub author_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Book with its author and categories resolved
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub author: Author,
    pub categories: Vec<Category>,
}

/// Create / update book request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct BookPayload {
    #[validate(
        required(message = "The title field is required."),
        length(min = 1, max = 255, message = "The title must be between 1 and 255 characters.")
    )]
    pub title: Option<String>,
    #[validate(
        required(message = "The isbn field is required."),
        length(min = 1, max = 255, message = "The isbn must be between 1 and 255 characters.")
    )]
    pub isbn: Option<String>,
    #[validate(required(message = "The published year field is required."))]
    pub published_year: Option<i32>,
    /// Absent leaves the stored price untouched, `null` clears it
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Option<Decimal>>,
    #[validate(range(min = 0, message = "The stock must be at least 0."))]
    pub stock: Option<i32>,
    #[validate(required(message = "The author id field is required."))]
    pub author_id: Option<i32>,
    /// Category ids. On update, an absent list detaches every category.
    pub categories: Option<Vec<i32>>,
}

/// Field requirements that differ between the two interface modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookRules {
    pub price_required: bool,
    pub stock_required: bool,
}

impl From<InterfaceMode> for BookRules {
    fn from(mode: InterfaceMode) -> Self {
        match mode {
            InterfaceMode::Html => Self {
                price_required: false,
                stock_required: false,
            },
            InterfaceMode::Api => Self {
                price_required: true,
                stock_required: true,
            },
        }
    }
}

/// Validated book fields ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct BookChanges {
    pub title: String,
    pub isbn: String,
    pub published_year: i32,
    pub price: Option<Option<Decimal>>,
    pub stock: Option<i32>,
    pub author_id: i32,
    /// Deduplicated, in submission order
    pub categories: Option<Vec<i32>>,
}

/// Largest value a `NUMERIC(10, 2)` price column holds
fn max_price() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

impl BookPayload {
    /// Check the payload against the book field rules.
    ///
    /// Only shape is checked here; isbn uniqueness and the author and
    /// category references need the store.
    pub fn into_changes(mut self, rules: BookRules) -> AppResult<BookChanges> {
        self.title = trimmed(self.title);
        self.isbn = trimmed(self.isbn);

        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        match self.price {
            Some(Some(price)) if price.is_sign_negative() => {
                errors.add("price", "The price must be at least 0.");
            }
            Some(Some(price)) if price.round_dp(2) > max_price() => {
                errors.add("price", "The price may not be greater than 99999999.99.");
            }
            Some(Some(_)) => {}
            _ if rules.price_required => errors.add("price", "The price field is required."),
            _ => {}
        }

        if rules.stock_required && self.stock.is_none() {
            errors.add("stock", "The stock field is required.");
        }

        errors.into_result()?;

        let categories = self.categories.map(|ids| {
            let mut seen = Vec::with_capacity(ids.len());
            for id in ids {
                if !seen.contains(&id) {
                    seen.push(id);
                }
            }
            seen
        });

        Ok(BookChanges {
            title: self.title.unwrap_or_default(),
            isbn: self.isbn.unwrap_or_default(),
            published_year: self.published_year.unwrap_or_default(),
            price: self.price.map(|p| p.map(|d| d.round_dp(2))),
            stock: self.stock,
            author_id: self.author_id.unwrap_or_default(),
            categories,
        })
    }
}
