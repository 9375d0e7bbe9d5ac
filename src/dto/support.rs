use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{SupportMessage, SupportQuery};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitQueryRequest {
    /// One of the subjects offered to the caller's role.
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PostMessageRequest {
    pub body: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QueryList {
    pub items: Vec<SupportQuery>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageList {
    pub items: Vec<SupportMessage>,
}
