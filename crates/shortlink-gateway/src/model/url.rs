use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateUrlRequest {
    pub original_url: String,
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateUrlResponse {
    pub status: &'static str,
    pub alias: String,
    pub short_url: String,
}
