pub mod service;

pub use service::UrlService;
pub use shortlink_core::{Alias, Requester, ServiceError, ShortenParams, UrlShortener};
