//! External metadata providers.

pub mod tmdb;
