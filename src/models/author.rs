//! Author model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::book::Book;
use super::{parse_date, trimmed, trimmed_nullable};
use crate::error::{AppResult, FieldErrors};

/// Full author model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub name: String,
    pub birthdate: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Author with the books they wrote
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorWithBooks {
    #[serde(flatten)]
    pub author: Author,
    pub books: Vec<Book>,
}

/// Create / update author request.
///
/// Nullable fields distinguish "absent" (left untouched on update) from
/// an explicit `null` (cleared).
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AuthorPayload {
    pub name: Option<String>,
    /// Date of birth, `YYYY-MM-DD`
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub birthdate: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub nationality: Option<Option<String>>,
}

#[derive(Debug, Validate)]
struct AuthorRules {
    #[validate(
        required(message = "The name field is required."),
        length(min = 1, max = 255, message = "The name must be between 1 and 255 characters.")
    )]
    name: Option<String>,
    #[validate(length(max = 255, message = "The nationality may not be greater than 255 characters."))]
    nationality: Option<String>,
}

/// Validated author fields ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorChanges {
    pub name: String,
    pub birthdate: Option<Option<NaiveDate>>,
    pub nationality: Option<Option<String>>,
}

impl AuthorPayload {
    /// Check the payload against the author field rules
    pub fn into_changes(mut self) -> AppResult<AuthorChanges> {
        self.name = trimmed(self.name);
        self.birthdate = trimmed_nullable(self.birthdate);
        self.nationality = trimmed_nullable(self.nationality);

        let rules = AuthorRules {
            name: self.name.clone(),
            nationality: self.nationality.clone().flatten(),
        };

        let mut errors = match rules.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        let birthdate = match self.birthdate {
            Some(Some(raw)) => match parse_date(&raw) {
                Some(date) => Some(Some(date)),
                None => {
                    errors.add("birthdate", "The birthdate is not a valid date.");
                    None
                }
            },
            Some(None) => Some(None),
            None => None,
        };

        errors.into_result()?;

        Ok(AuthorChanges {
            name: self.name.unwrap_or_default(),
            birthdate,
            nationality: self.nationality,
        })
    }
}
