//! Book catalog service

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// List books matching the given filters
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        self.repository.books.search(query).await
    }

    /// Create a new book
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.repository.books.create(&book).await
    }

    /// Update an existing book
    pub async fn update_book(&self, id: Uuid, book: UpdateBook) -> AppResult<Book> {
        book.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.repository.books.update(id, &book).await
    }

    /// Disable a book (soft delete). Independent of the availability state:
    /// a reserved book can be disabled without touching its reservation.
    pub async fn delete_book(&self, id: Uuid) -> AppResult<Book> {
        self.repository.books.soft_delete(id).await
    }
}
