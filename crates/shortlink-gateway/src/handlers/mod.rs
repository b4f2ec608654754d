mod health;
mod metrics;
mod redirect;
mod url;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use redirect::redirect_handler;
pub use url::{create_url_handler, delete_url_handler, RESERVED_ALIASES};
