pub mod addresses;
pub mod cart_items;
pub mod coupons;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod used_coupons;

pub use addresses::Entity as Addresses;
pub use cart_items::Entity as CartItems;
pub use coupons::Entity as Coupons;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use used_coupons::Entity as UsedCoupons;
