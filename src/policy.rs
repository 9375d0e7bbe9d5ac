use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Marketplace roles. `Admin` accounts are created by the seed tool only;
/// self-registration is limited to the three trading roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Retailer,
    Wholesaler,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Retailer => "retailer",
            Role::Wholesaler => "wholesaler",
            Role::Admin => "admin",
        }
    }

    /// Roles that publish price overrides and work incoming orders.
    pub fn is_seller(&self) -> bool {
        matches!(self, Role::Retailer | Role::Wholesaler)
    }

    /// Roles that hold a cart and place orders.
    pub fn is_buyer(&self) -> bool {
        matches!(self, Role::Customer | Role::Retailer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "retailer" => Ok(Role::Retailer),
            "wholesaler" => Ok(Role::Wholesaler),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Shop,
    Cart,
    Checkout,
    Inventory,
    Acceptance,
    Addresses,
    Coupons,
    Catalog,
    Users,
    Reviews,
    Support,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
}

/// Authorization policy evaluated at the handler layer. The original system
/// only hid UI routes per role; here every protected operation goes through
/// this table before touching the database.
pub fn allow(role: Role, resource: Resource, action: Action) -> bool {
    use Action::*;
    use Resource::*;
    match (resource, action) {
        (Shop, Read) => role != Role::Admin,
        (Shop, Write) => false,
        (Cart, _) | (Checkout, _) | (Addresses, _) => role.is_buyer(),
        (Inventory, _) => role.is_seller(),
        (Acceptance, _) => role.is_seller(),
        (Coupons, Read) => role.is_buyer(),
        (Coupons, Write) => role == Role::Admin,
        (Catalog, Read) => true,
        (Catalog, Write) => role == Role::Admin,
        (Users, _) => role == Role::Admin,
        (Reviews, Read) => true,
        // Admins moderate through their own endpoints, not the submit form.
        (Reviews, Write) => role != Role::Admin,
        (Support, _) => role != Role::Admin,
    }
}

/// Which seller tier a buying role is priced against: customers buy from
/// retailers, everyone else buys from wholesalers.
pub fn supplier_tier(role: Role) -> Role {
    match role {
        Role::Customer => Role::Retailer,
        _ => Role::Wholesaler,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QuantityBounds {
    pub min: Decimal,
    pub max: Decimal,
    /// Retailers order in whole kilograms.
    pub whole_kg: bool,
}

pub fn quantity_bounds(role: Role) -> Option<QuantityBounds> {
    match role {
        Role::Customer => Some(QuantityBounds {
            min: dec!(0.1),
            max: dec!(5),
            whole_kg: false,
        }),
        Role::Retailer => Some(QuantityBounds {
            min: dec!(5),
            max: dec!(5000),
            whole_kg: true,
        }),
        _ => None,
    }
}

/// Validate a requested line quantity against the role's bounds and return
/// the normalized value (whole kilograms for retailers, two decimals
/// otherwise). Rejection must leave the stored cart untouched, so callers
/// bail out before any write.
pub fn normalize_quantity(role: Role, quantity_kg: Decimal) -> Result<Decimal, String> {
    let bounds = quantity_bounds(role).ok_or_else(|| format!("role {role} cannot hold a cart"))?;
    if quantity_kg < bounds.min {
        return Err(format!("Minimum quantity is {}kg", bounds.min));
    }
    if quantity_kg > bounds.max {
        return Err(format!("Maximum quantity is {}kg", bounds.max));
    }
    let scale = if bounds.whole_kg { 0 } else { 2 };
    Ok(quantity_kg.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero))
}

/// Cart-wide quantity ceiling at checkout; retailers are unbounded.
pub fn max_total_quantity(role: Role) -> Option<Decimal> {
    match role {
        Role::Retailer => None,
        _ => Some(dec!(25)),
    }
}

/// Minimum order value in rupees.
pub fn min_order_value(role: Role) -> Decimal {
    match role {
        Role::Retailer => dec!(4999),
        _ => dec!(99),
    }
}

/// Checkout eligibility. Error messages name the specific limit breached,
/// matching what the storefront surfaces to the buyer.
pub fn check_checkout_limits(
    role: Role,
    total_quantity_kg: Decimal,
    total_price: Decimal,
) -> Result<(), String> {
    if let Some(max) = max_total_quantity(role) {
        if total_quantity_kg > max {
            return Err(format!("Maximum order limit is {max}kg"));
        }
    }
    let min_value = min_order_value(role);
    if total_price < min_value {
        return Err(format!("Minimum order amount is ₹{min_value}"));
    }
    Ok(())
}

/// Inclusive display-discount range per role.
pub fn discount_range(role: Role) -> (u32, u32) {
    match role {
        Role::Retailer => (0, 10),
        _ => (10, 20),
    }
}

/// How long after placement the placer may still cancel.
pub fn cancel_window_minutes(role: Role) -> Option<i64> {
    match role {
        Role::Customer => Some(1),
        Role::Retailer => Some(60),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Customer, Role::Retailer, Role::Wholesaler, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("grocer".parse::<Role>().is_err());
    }

    #[test]
    fn sellers_manage_inventory_buyers_do_not() {
        assert!(allow(Role::Retailer, Resource::Inventory, Action::Write));
        assert!(allow(Role::Wholesaler, Resource::Inventory, Action::Write));
        assert!(!allow(Role::Customer, Resource::Inventory, Action::Write));
        assert!(!allow(Role::Admin, Resource::Inventory, Action::Write));
    }

    #[test]
    fn wholesalers_do_not_checkout() {
        assert!(allow(Role::Customer, Resource::Checkout, Action::Write));
        assert!(allow(Role::Retailer, Resource::Checkout, Action::Write));
        assert!(!allow(Role::Wholesaler, Resource::Checkout, Action::Write));
    }

    #[test]
    fn only_admin_writes_catalog_and_coupons() {
        assert!(allow(Role::Admin, Resource::Catalog, Action::Write));
        assert!(!allow(Role::Retailer, Resource::Catalog, Action::Write));
        assert!(allow(Role::Admin, Resource::Coupons, Action::Write));
        assert!(!allow(Role::Customer, Resource::Coupons, Action::Write));
    }

    #[test]
    fn everyone_reads_reviews_trading_roles_write() {
        assert!(allow(Role::Admin, Resource::Reviews, Action::Read));
        assert!(allow(Role::Customer, Resource::Reviews, Action::Write));
        assert!(allow(Role::Wholesaler, Resource::Reviews, Action::Write));
        assert!(!allow(Role::Admin, Resource::Reviews, Action::Write));
        assert!(!allow(Role::Admin, Resource::Support, Action::Write));
        assert!(allow(Role::Retailer, Resource::Support, Action::Write));
    }

    #[test]
    fn customer_quantity_bounds() {
        assert_eq!(
            normalize_quantity(Role::Customer, dec!(0.05)),
            Err("Minimum quantity is 0.1kg".into())
        );
        assert_eq!(
            normalize_quantity(Role::Customer, dec!(5.5)),
            Err("Maximum quantity is 5kg".into())
        );
        assert_eq!(normalize_quantity(Role::Customer, dec!(0.1)), Ok(dec!(0.1)));
        assert_eq!(normalize_quantity(Role::Customer, dec!(2.345)), Ok(dec!(2.35)));
    }

    #[test]
    fn retailer_quantities_are_whole_kilograms() {
        assert_eq!(
            normalize_quantity(Role::Retailer, dec!(4.9)),
            Err("Minimum quantity is 5kg".into())
        );
        assert_eq!(
            normalize_quantity(Role::Retailer, dec!(5001)),
            Err("Maximum quantity is 5000kg".into())
        );
        assert_eq!(normalize_quantity(Role::Retailer, dec!(12.6)), Ok(dec!(13)));
    }

    #[test]
    fn wholesaler_holds_no_cart() {
        assert!(normalize_quantity(Role::Wholesaler, dec!(10)).is_err());
    }

    #[test]
    fn customer_checkout_blocked_over_25kg() {
        let err = check_checkout_limits(Role::Customer, dec!(30), dec!(500)).unwrap_err();
        assert!(err.contains("25kg"), "message should cite the limit: {err}");
    }

    #[test]
    fn minimum_order_values_per_role() {
        let err = check_checkout_limits(Role::Customer, dec!(2), dec!(98.99)).unwrap_err();
        assert!(err.contains("₹99"));
        let err = check_checkout_limits(Role::Retailer, dec!(100), dec!(4998)).unwrap_err();
        assert!(err.contains("₹4999"));
        assert!(check_checkout_limits(Role::Retailer, dec!(9000), dec!(5000)).is_ok());
    }
}
