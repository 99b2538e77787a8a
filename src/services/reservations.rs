//! Reservation engine: links a book's availability flag to the
//! reservation lifecycle.
//!
//! A reservation is `Open` until the return operation marks it `Returned`,
//! which is terminal. While a book has an open reservation its
//! availability flag is false; both sides of that invariant are flipped in
//! the same transaction by the repository.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::reservation::{
        BookReservationEntry, CreateReservation, Reservation, UserReservationEntry,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
}

impl ReservationsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Reserve a book for a user.
    ///
    /// The reservation start defaults to now; the due date is required.
    /// Fails with `BookUnavailable` when the book is missing, disabled, or
    /// already reserved.
    pub async fn create_reservation(
        &self,
        reservation: CreateReservation,
    ) -> AppResult<Reservation> {
        let due_date = reservation
            .due_date
            .ok_or_else(|| AppError::Validation("Due date is required".to_string()))?;
        let reserved_at = reservation.reserved_at.unwrap_or_else(Utc::now);

        self.repository
            .reservations
            .create(reservation.user_id, reservation.book_id, reserved_at, due_date)
            .await
    }

    /// End a reservation: mark it returned and free the book
    pub async fn end_reservation(&self, id: Uuid) -> AppResult<Reservation> {
        self.repository.reservations.mark_returned(id).await
    }

    /// Reservation history of a book, with requester identities expanded
    pub async fn list_by_book(&self, book_id: Uuid) -> AppResult<Vec<BookReservationEntry>> {
        self.repository.reservations.list_by_book(book_id).await
    }

    /// Reservation history of a user, with book summaries expanded
    pub async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<UserReservationEntry>> {
        self.repository.reservations.list_by_user(user_id).await
    }
}
