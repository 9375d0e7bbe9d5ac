use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Address;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddAddressRequest {
    pub name: String,
    pub phone: String,
    pub pincode: String,
    pub state: String,
    pub city: String,
    pub street: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddressList {
    pub items: Vec<Address>,
}
