//! Business logic services

pub mod books;
pub mod reservations;
pub mod users;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub books: books::BooksService,
    pub reservations: reservations::ReservationsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            users: users::UsersService::new(repository.clone(), auth_config),
            books: books::BooksService::new(repository.clone()),
            reservations: reservations::ReservationsService::new(repository),
        }
    }
}
