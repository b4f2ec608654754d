//! Core types and traits for the shortlink URL shortener.
//!
//! This crate holds the pieces shared by the shortener service, the storage
//! backends and the HTTP gateway: the [`Alias`] type, the URL validator, the
//! error taxonomy and the collaborator traits ([`Repository`],
//! [`AdminChecker`], [`UrlShortener`]).

pub mod admin;
pub mod alias;
pub mod error;
pub mod repository;
pub mod shortener;
pub mod validation;

pub use admin::{AdminChecker, StaticAdminChecker};
pub use alias::Alias;
pub use error::{AdminCheckError, ServiceError, StorageError};
pub use repository::{Repository, UrlRecord};
pub use shortener::{Requester, ShortenParams, UrlShortener};
pub use validation::{validate_url, UrlValidationError};
