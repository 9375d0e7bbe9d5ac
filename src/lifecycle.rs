use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::policy::{Role, cancel_window_minutes};

/// Persisted order states. An order row is born `Confirmed`; the
/// pre-confirmation "pending" of the storefront never reaches the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum OrderStatus {
    Confirmed,
    Accepted,
    Dispatched,
    Delivered,
    Rejected,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Accepted => "Accepted",
            OrderStatus::Dispatched => "Dispatched",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Rejected => "Rejected",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Rejected | OrderStatus::Cancelled
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Confirmed" => Ok(OrderStatus::Confirmed),
            "Accepted" => Ok(OrderStatus::Accepted),
            "Dispatched" => Ok(OrderStatus::Dispatched),
            "Delivered" => Ok(OrderStatus::Delivered),
            "Rejected" => Ok(OrderStatus::Rejected),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Explicit transition table. Writes that fall outside of it are rejected
/// at the data-access layer, not merely hidden in a UI.
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (from, to),
        (Confirmed, Accepted)
            | (Confirmed, Rejected)
            | (Confirmed, Cancelled)
            | (Accepted, Dispatched)
            | (Accepted, Rejected)
            | (Dispatched, Delivered)
    )
}

/// The seller tier that works a placing role's orders: retailers accept
/// customer orders, wholesalers accept retailer orders. Wholesalers sit at
/// the top of the chain and place none themselves.
pub fn acceptor_role(placed_by: Role) -> Option<Role> {
    match placed_by {
        Role::Customer => Some(Role::Retailer),
        Role::Retailer => Some(Role::Wholesaler),
        _ => None,
    }
}

/// Inverse of [`acceptor_role`]: whose Confirmed orders a seller works.
pub fn accepts_orders_from(acceptor: Role) -> Option<Role> {
    match acceptor {
        Role::Retailer => Some(Role::Customer),
        Role::Wholesaler => Some(Role::Retailer),
        _ => None,
    }
}

pub fn cancel_deadline(placed_by: Role, placed_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    cancel_window_minutes(placed_by).map(|minutes| placed_at + Duration::minutes(minutes))
}

/// Whether the placer may still cancel, measured against the order's
/// creation timestamp on the server clock.
pub fn can_cancel(placed_by: Role, placed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    cancel_deadline(placed_by, placed_at).is_some_and(|deadline| now <= deadline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Accepted,
            OrderStatus::Dispatched,
            OrderStatus::Delivered,
            OrderStatus::Rejected,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn transition_table_is_enforced() {
        use OrderStatus::*;
        assert!(can_transition(Confirmed, Accepted));
        assert!(can_transition(Accepted, Dispatched));
        assert!(can_transition(Dispatched, Delivered));
        assert!(can_transition(Confirmed, Cancelled));
        assert!(can_transition(Accepted, Rejected));

        // A rejected order cannot be revived.
        assert!(!can_transition(Rejected, Accepted));
        assert!(!can_transition(Cancelled, Confirmed));
        assert!(!can_transition(Delivered, Dispatched));
        // No skipping the acceptance step.
        assert!(!can_transition(Confirmed, Dispatched));
        assert!(!can_transition(Confirmed, Delivered));
    }

    #[test]
    fn acceptance_chain() {
        assert_eq!(acceptor_role(Role::Customer), Some(Role::Retailer));
        assert_eq!(acceptor_role(Role::Retailer), Some(Role::Wholesaler));
        assert_eq!(acceptor_role(Role::Wholesaler), None);
        assert_eq!(acceptor_role(Role::Admin), None);
    }

    #[test]
    fn customer_cancel_window_is_one_minute() {
        let placed = Utc::now();
        assert!(can_cancel(Role::Customer, placed, placed + Duration::seconds(50)));
        assert!(!can_cancel(Role::Customer, placed, placed + Duration::minutes(2)));
    }

    #[test]
    fn retailer_cancel_window_is_sixty_minutes() {
        let placed = Utc::now();
        assert!(can_cancel(Role::Retailer, placed, placed + Duration::minutes(59)));
        assert!(!can_cancel(Role::Retailer, placed, placed + Duration::minutes(61)));
    }

    #[test]
    fn wholesalers_have_no_cancel_window() {
        let placed = Utc::now();
        assert!(!can_cancel(Role::Wholesaler, placed, placed));
    }
}
