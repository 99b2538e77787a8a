//! Book model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub publication_date: Option<NaiveDate>,
    /// True only while no open reservation references this book.
    /// Owned by the reservation engine; the generic update path cannot
    /// touch it.
    pub available: bool,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Book query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive partial match on title
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub available: Option<bool>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub publication_date: Option<NaiveDate>,
}

/// Update book request. Availability is deliberately absent: only the
/// reservation engine changes it.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub publication_date: Option<NaiveDate>,
}
