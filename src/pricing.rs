use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::policy::{Role, discount_range};

/// Two-decimal rupee rounding, half away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// One entry of the fixed package menu a buyer picks from in the shop.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PackageOption {
    pub label: String,
    #[schema(value_type = String)]
    pub quantity_kg: Decimal,
}

/// Retail buyers pick gram packs up to a kilogram; retailers buy in bulk.
pub fn package_menu(role: Role) -> Vec<PackageOption> {
    let options: &[(&str, Decimal)] = match role {
        Role::Retailer => &[
            ("5kg", dec!(5)),
            ("10kg", dec!(10)),
            ("20kg", dec!(20)),
            ("50kg", dec!(50)),
        ],
        _ => &[
            ("100g", dec!(0.1)),
            ("250g", dec!(0.25)),
            ("500g", dec!(0.5)),
            ("1kg", dec!(1)),
        ],
    };
    options
        .iter()
        .map(|(label, quantity_kg)| PackageOption {
            label: (*label).to_string(),
            quantity_kg: *quantity_kg,
        })
        .collect()
}

/// Display discount re-rolled per buyer per day. Derived from a hash of
/// (user id, date) instead of a random roll so the percentage quoted in the
/// shop and the one captured at add-to-cart agree within a day without
/// persisting anything.
pub fn daily_discount_percent(user_id: Uuid, role: Role, date: NaiveDate) -> u32 {
    let (min, max) = discount_range(role);
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in user_id
        .as_bytes()
        .iter()
        .chain(date.num_days_from_ce().to_le_bytes().iter())
    {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    let span = u64::from(max - min + 1);
    min + (hash % span) as u32
}

/// `base × (1 − pct/100)`, rounded to two decimals. A product with no
/// price overrides carries a zero base and prices to zero rather than
/// erroring.
pub fn unit_price(base_per_kg: Decimal, discount_percent: u32) -> Decimal {
    let pct = Decimal::from(discount_percent);
    round2(base_per_kg * (Decimal::ONE_HUNDRED - pct) / Decimal::ONE_HUNDRED)
}

pub fn line_total(unit_price_per_kg: Decimal, quantity_kg: Decimal) -> Decimal {
    round2(unit_price_per_kg * quantity_kg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_is_half_away_from_zero() {
        assert_eq!(round2(dec!(1.005)), dec!(1.01));
        assert_eq!(round2(dec!(2.344)), dec!(2.34));
        assert_eq!(round2(dec!(-1.005)), dec!(-1.01));
    }

    #[test]
    fn package_menus_per_role() {
        let retail: Vec<Decimal> = package_menu(Role::Customer)
            .iter()
            .map(|o| o.quantity_kg)
            .collect();
        assert_eq!(retail, vec![dec!(0.1), dec!(0.25), dec!(0.5), dec!(1)]);

        let bulk: Vec<Decimal> = package_menu(Role::Retailer)
            .iter()
            .map(|o| o.quantity_kg)
            .collect();
        assert_eq!(bulk, vec![dec!(5), dec!(10), dec!(20), dec!(50)]);
    }

    #[test]
    fn discount_is_stable_within_a_day_and_in_range() {
        let user = Uuid::new_v4();
        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();

        let pct = daily_discount_percent(user, Role::Customer, day);
        assert_eq!(pct, daily_discount_percent(user, Role::Customer, day));
        assert!((10..=20).contains(&pct));

        let retailer_pct = daily_discount_percent(user, Role::Retailer, day);
        assert!(retailer_pct <= 10);
    }

    #[test]
    fn unit_price_applies_percentage() {
        assert_eq!(unit_price(dec!(100), 15), dec!(85.00));
        assert_eq!(unit_price(dec!(0), 20), dec!(0.00));
    }

    #[test]
    fn line_total_rounds_to_two_decimals() {
        assert_eq!(line_total(dec!(33.33), dec!(0.25)), dec!(8.33));
        assert_eq!(line_total(dec!(40), dec!(2)), dec!(80.00));
    }
}
