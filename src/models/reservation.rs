//! Reservation model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Reservation model from database. Historical record: reservations are
/// never soft-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub reserved_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Engine input for creating a reservation
#[derive(Debug)]
pub struct CreateReservation {
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub reserved_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Reservation listed for a book, expanded with the requester's identity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookReservationEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub reserved_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned: bool,
}

/// Reservation listed for a user, expanded with the book's summary
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserReservationEntry {
    pub id: Uuid,
    pub book_id: Uuid,
    pub book_title: String,
    pub book_author: String,
    pub reserved_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned: bool,
}
