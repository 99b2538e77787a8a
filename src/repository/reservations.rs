//! Reservations repository: the availability flip and the reservation row
//! always move together inside one transaction.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::reservation::{BookReservationEntry, Reservation, UserReservationEntry},
};

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a reservation by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))
    }

    /// Create a reservation and mark the book unavailable atomically.
    ///
    /// The conditional update is the serialization point: two concurrent
    /// requests for the same book contend on the row lock and exactly one
    /// sees `available = TRUE`. A zero-row result means the book is
    /// missing, disabled, or already reserved; all three surface as
    /// `BookUnavailable`.
    pub async fn create(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        reserved_at: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> AppResult<Reservation> {
        let mut tx = self.pool.begin().await?;

        let flipped = sqlx::query(
            r#"
            UPDATE books
            SET available = FALSE, updated_at = NOW()
            WHERE id = $1 AND enabled = TRUE AND available = TRUE
            "#,
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            return Err(AppError::BookUnavailable("Book not available".to_string()));
        }

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (id, user_id, book_id, reserved_at, due_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(book_id)
        .bind(reserved_at)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(reservation)
    }

    /// Mark a reservation returned and free the book atomically.
    /// `Returned` is terminal: flipping twice fails with `AlreadyReturned`.
    pub async fn mark_returned(&self, id: Uuid) -> AppResult<Reservation> {
        let mut tx = self.pool.begin().await?;

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET returned = TRUE, updated_at = NOW()
            WHERE id = $1 AND returned = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let reservation = match reservation {
            Some(r) => r,
            None => {
                // Distinguish a missing reservation from a terminal one
                let exists: bool = sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM reservations WHERE id = $1)",
                )
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

                return if exists {
                    Err(AppError::AlreadyReturned(
                        "Reservation already returned".to_string(),
                    ))
                } else {
                    Err(AppError::NotFound(format!(
                        "Reservation with id {} not found",
                        id
                    )))
                };
            }
        };

        sqlx::query(
            "UPDATE books SET available = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(reservation.book_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(reservation)
    }

    /// Full reservation history of a book, with the requester expanded
    pub async fn list_by_book(&self, book_id: Uuid) -> AppResult<Vec<BookReservationEntry>> {
        let entries = sqlx::query_as::<_, BookReservationEntry>(
            r#"
            SELECT r.id, r.user_id, u.name AS user_name, u.email AS user_email,
                   r.reserved_at, r.due_date, r.returned
            FROM reservations r
            JOIN users u ON r.user_id = u.id
            WHERE r.book_id = $1
            ORDER BY r.reserved_at
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Full reservation history of a user, with the book expanded
    pub async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<UserReservationEntry>> {
        let entries = sqlx::query_as::<_, UserReservationEntry>(
            r#"
            SELECT r.id, r.book_id, b.title AS book_title, b.author AS book_author,
                   r.reserved_at, r.due_date, r.returned
            FROM reservations r
            JOIN books b ON r.book_id = b.id
            WHERE r.user_id = $1
            ORDER BY r.reserved_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
