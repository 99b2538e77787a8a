//! Reservation endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        reservation::{
            BookReservationEntry, CreateReservation, Reservation, UserReservationEntry,
        },
        user::Operation,
    },
};

use super::AuthenticatedUser;

/// Create reservation request. The requester is taken from the session
/// token, never from the body.
#[derive(Deserialize, ToSchema)]
pub struct CreateReservationRequest {
    /// Book ID
    pub book_id: Uuid,
    /// Reservation start (defaults to now)
    pub reserved_at: Option<DateTime<Utc>>,
    /// Due date for returning the book
    pub due_date: Option<DateTime<Utc>>,
}

/// Reserve a book for the authenticated user
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Reservation created", body = Reservation),
        (status = 400, description = "Missing due date"),
        (status = 401, description = "Not authenticated"),
        (status = 422, description = "Book not available")
    )
)]
pub async fn create_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateReservationRequest>,
) -> AppResult<(StatusCode, Json<Reservation>)> {
    claims.require(&Operation::CreateReservation)?;

    let reservation = CreateReservation {
        user_id: claims.user_id,
        book_id: request.book_id,
        reserved_at: request.reserved_at,
        due_date: request.due_date,
    };

    let created = state
        .services
        .reservations
        .create_reservation(reservation)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Return a reserved book, ending the reservation
#[utoipa::path(
    post,
    path = "/reservations/{id}/return",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Reservation ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = Reservation),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn end_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Reservation>> {
    let reservation = state.services.reservations.end_reservation(id).await?;
    Ok(Json(reservation))
}

/// Reservation history of a book
#[utoipa::path(
    get,
    path = "/books/{id}/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Reservations of the book", body = Vec<BookReservationEntry>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_reservations_by_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(book_id): Path<Uuid>,
) -> AppResult<Json<Vec<BookReservationEntry>>> {
    let reservations = state.services.reservations.list_by_book(book_id).await?;
    Ok(Json(reservations))
}

/// Reservation history of a user
#[utoipa::path(
    get,
    path = "/users/{id}/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Reservations of the user", body = Vec<UserReservationEntry>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_reservations_by_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<UserReservationEntry>>> {
    let reservations = state.services.reservations.list_by_user(user_id).await?;
    Ok(Json(reservations))
}
