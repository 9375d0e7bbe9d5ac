use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Review;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitReviewRequest {
    /// 1 to 5 stars.
    pub rating: i16,
    pub comment: String,
    /// Already-hosted image URLs; the API never handles uploads.
    pub image_urls: Option<Vec<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewList {
    pub items: Vec<Review>,
}
