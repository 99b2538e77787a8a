//! Books repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get an enabled book by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 AND enabled = TRUE")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Insert a new book
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, title, author, genre, publisher, publication_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(&book.publisher)
        .bind(book.publication_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// List enabled books matching the given filters. Title is a
    /// case-insensitive partial match, all other filters are exact.
    pub async fn search(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let mut builder = sqlx::QueryBuilder::<Postgres>::new(
            "SELECT * FROM books WHERE enabled = TRUE",
        );

        if let Some(ref title) = query.title {
            builder.push(" AND title ILIKE ");
            builder.push_bind(format!("%{}%", title));
        }
        if let Some(ref author) = query.author {
            builder.push(" AND author = ");
            builder.push_bind(author.clone());
        }
        if let Some(ref genre) = query.genre {
            builder.push(" AND genre = ");
            builder.push_bind(genre.clone());
        }
        if let Some(ref publisher) = query.publisher {
            builder.push(" AND publisher = ");
            builder.push_bind(publisher.clone());
        }
        if let Some(publication_date) = query.publication_date {
            builder.push(" AND publication_date = ");
            builder.push_bind(publication_date);
        }
        if let Some(available) = query.available {
            builder.push(" AND available = ");
            builder.push_bind(available);
        }
        builder.push(" ORDER BY created_at");

        let books = builder
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Update only the provided fields of an enabled book. Availability is
    /// not reachable from here; the reservation engine owns it.
    pub async fn update(&self, id: Uuid, book: &UpdateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = COALESCE($2, title),
                author = COALESCE($3, author),
                genre = COALESCE($4, genre),
                publisher = COALESCE($5, publisher),
                publication_date = COALESCE($6, publication_date),
                updated_at = NOW()
            WHERE id = $1 AND enabled = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(&book.publisher)
        .bind(book.publication_date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Soft-delete a book. Idempotent, and independent of the availability
    /// state.
    pub async fn soft_delete(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET enabled = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }
}
