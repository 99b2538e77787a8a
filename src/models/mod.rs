//! Data models for the Biblioteca server

pub mod book;
pub mod reservation;
pub mod user;
