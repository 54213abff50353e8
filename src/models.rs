use serde::{Deserialize, Serialize};

// Chat request as accepted from clients and forwarded upstream
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default)]
    pub stream: bool,
}

// Parsed upstream reply
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GenerateResponse {
    pub model: String,
    pub response: String,
}
