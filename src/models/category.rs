//! Category model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{book::Book, trimmed, trimmed_nullable};
use crate::error::{AppResult, FieldErrors};

/// Category record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category with the books filed under it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryWithBooks {
    #[serde(flatten)]
    pub category: Category,
    pub books: Vec<Book>,
}

/// Create / update category request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CategoryPayload {
    #[validate(
        required(message = "The name field is required."),
        length(min = 1, max = 255, message = "The name must be between 1 and 255 characters.")
    )]
    pub name: Option<String>,
    /// Absent leaves the stored description untouched, `null` clears it
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

/// Validated category fields ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryChanges {
    pub name: String,
    pub description: Option<Option<String>>,
}

impl CategoryPayload {
    pub fn into_changes(mut self) -> AppResult<CategoryChanges> {
        self.name = trimmed(self.name);
        self.description = trimmed_nullable(self.description);

        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        if let Some(Some(ref description)) = self.description {
            if description.chars().count() > 255 {
                errors.add(
                    "description",
                    "The description may not be greater than 255 characters.",
                );
            }
        }

        errors.into_result()?;

        Ok(CategoryChanges {
            name: self.name.unwrap_or_default(),
            description: self.description,
        })
    }
}
