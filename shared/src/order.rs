//! Order lifecycle domain types
//!
//! Status enums are stored as lowercase strings in the ledger; `as_db` /
//! `from_db` are the single conversion point so SQL and JSON agree.

use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// Transitions are monotonic: `pending -> shipped -> canceled -> refunded`,
/// or `pending -> completed`. The only pair that moves "backward" in money
/// terms is cancel -> refund, and that transition is gated on a confirmed
/// refund from the payment gateway.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Shipped,
    Canceled,
    Refunded,
    Completed,
}

impl OrderStatus {
    /// Database representation (lowercase string)
    pub const fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Shipped => "shipped",
            Self::Canceled => "canceled",
            Self::Refunded => "refunded",
            Self::Completed => "completed",
        }
    }

    /// Parse the database representation
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "shipped" => Some(Self::Shipped),
            "canceled" => Some(Self::Canceled),
            "refunded" => Some(Self::Refunded),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Whether `self -> to` is a legal lifecycle transition
    pub fn can_transition(&self, to: OrderStatus) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Shipped)
                | (Self::Pending, Self::Canceled)
                | (Self::Pending, Self::Completed)
                | (Self::Shipped, Self::Canceled)
                | (Self::Canceled, Self::Refunded)
        )
    }

    /// Statuses from which an order can still be canceled
    pub const fn is_cancelable(&self) -> bool {
        matches!(self, Self::Pending | Self::Shipped)
    }
}

/// Payment record status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub const fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "failed" => Some(Self::Failed),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

/// Physical fulfillment status, advanced by the carrier-tracking collaborator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShippingStatus {
    #[default]
    Pending,
    InTransit,
    Delivered,
}

impl ShippingStatus {
    pub const fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_transit" => Some(Self::InTransit),
            "delivered" => Some(Self::Delivered),
            _ => None,
        }
    }
}

/// Caller role, decoded from the bearer token
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Vendor,
    Customer,
}

impl Role {
    pub const fn as_db(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Vendor => "vendor",
            Self::Customer => "customer",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "super_admin" => Some(Self::SuperAdmin),
            "vendor" => Some(Self::Vendor),
            "customer" => Some(Self::Customer),
            _ => None,
        }
    }

    /// Platform administrators see all orders
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_db_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Shipped,
            OrderStatus::Canceled,
            OrderStatus::Refunded,
            OrderStatus::Completed,
        ] {
            assert_eq!(OrderStatus::from_db(status.as_db()), Some(status));
        }
        assert_eq!(OrderStatus::from_db("voided"), None);
    }

    #[test]
    fn test_order_status_transitions() {
        assert!(OrderStatus::Pending.can_transition(OrderStatus::Shipped));
        assert!(OrderStatus::Pending.can_transition(OrderStatus::Canceled));
        assert!(OrderStatus::Pending.can_transition(OrderStatus::Completed));
        assert!(OrderStatus::Shipped.can_transition(OrderStatus::Canceled));
        assert!(OrderStatus::Canceled.can_transition(OrderStatus::Refunded));

        // No going backward, no skipping the refund gate
        assert!(!OrderStatus::Shipped.can_transition(OrderStatus::Pending));
        assert!(!OrderStatus::Pending.can_transition(OrderStatus::Refunded));
        assert!(!OrderStatus::Refunded.can_transition(OrderStatus::Canceled));
        assert!(!OrderStatus::Completed.can_transition(OrderStatus::Canceled));
    }

    #[test]
    fn test_order_status_cancelable() {
        assert!(OrderStatus::Pending.is_cancelable());
        assert!(OrderStatus::Shipped.is_cancelable());
        assert!(!OrderStatus::Refunded.is_cancelable());
        assert!(!OrderStatus::Completed.is_cancelable());
    }

    #[test]
    fn test_order_status_serde() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Pending).unwrap(),
            "\"pending\""
        );
        let status: OrderStatus = serde_json::from_str("\"refunded\"").unwrap();
        assert_eq!(status, OrderStatus::Refunded);
    }

    #[test]
    fn test_payment_status_db_roundtrip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Paid,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
        ] {
            assert_eq!(PaymentStatus::from_db(status.as_db()), Some(status));
        }
    }

    #[test]
    fn test_shipping_status_db_roundtrip() {
        assert_eq!(
            ShippingStatus::from_db("in_transit"),
            Some(ShippingStatus::InTransit)
        );
        assert_eq!(ShippingStatus::Pending.as_db(), "pending");
    }

    #[test]
    fn test_role() {
        assert_eq!(Role::from_db("super_admin"), Some(Role::SuperAdmin));
        assert_eq!(Role::from_db("vendor"), Some(Role::Vendor));
        assert_eq!(Role::from_db("staff"), None);
        assert!(Role::SuperAdmin.is_admin());
        assert!(!Role::Vendor.is_admin());
    }
}
