//! Order status and payment method enums.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// The REST API accepts exactly the four values in [`OrderStatus::ALL`]
/// for admin status transitions. Any other value read from the API becomes
/// [`OrderStatus::Unknown`] so one odd record cannot break an order list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Every status, in the order the admin status picker lists them.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Paid, Self::Shipped, Self::Cancelled];

    /// Wire value (`"pending"`, `"paid"`, ...).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
            Self::Shipped => "Shipped",
            Self::Cancelled => "Cancelled",
            Self::Unknown => "Unknown",
        }
    }

    /// CSS classes for the status pill.
    #[must_use]
    pub const fn pill_class(&self) -> &'static str {
        match self {
            Self::Pending => "status-pill pending",
            Self::Paid => "status-pill paid",
            Self::Shipped => "status-pill shipped",
            Self::Cancelled => "status-pill cancelled",
            Self::Unknown => "status-pill",
        }
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
        match s.trim() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "shipped" => Ok(Self::Shipped),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("invalid order status: {other}")),
        }
    }
}

/// How the customer pays for an order.
///
/// The checkout form submits `cod`; older API records use `cash` for the
/// same method. Unknown values are preserved so they can still be shown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMethod {
    CashOnDelivery,
    Card,
    Other(String),
}

impl PaymentMethod {
    /// Value sent to the API.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::CashOnDelivery => "cod",
            Self::Card => "card",
            Self::Other(raw) => raw,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::CashOnDelivery => "Cash on Delivery",
            Self::Card => "Card",
            Self::Other(raw) if raw.is_empty() => "-",
            Self::Other(raw) => raw,
        }
    }

    /// Whether checkout can currently accept this method.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::CashOnDelivery)
    }
}

impl From<String> for PaymentMethod {
    fn from(value: String) -> Self {
        match value.trim() {
            "cod" | "cash" => Self::CashOnDelivery,
            "card" => Self::Card,
            _ => Self::Other(value),
        }
    }
}

impl From<PaymentMethod> for String {
    fn from(value: PaymentMethod) -> Self {
        match value {
            PaymentMethod::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("refunded".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"shipped\"");
        let parsed: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, OrderStatus::Cancelled);
    }

    #[test]
    fn test_unrecognized_status_still_deserializes() {
        let parsed: Vec<OrderStatus> =
            serde_json::from_str(r#"["paid","refunded","on_hold"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![OrderStatus::Paid, OrderStatus::Unknown, OrderStatus::Unknown]
        );
        assert_eq!(OrderStatus::Unknown.label(), "Unknown");
        assert!(!OrderStatus::ALL.contains(&OrderStatus::Unknown));
        assert!("unknown".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_aliases() {
        let cash: PaymentMethod = serde_json::from_str("\"cash\"").unwrap();
        let cod: PaymentMethod = serde_json::from_str("\"cod\"").unwrap();
        assert_eq!(cash, PaymentMethod::CashOnDelivery);
        assert_eq!(cod, PaymentMethod::CashOnDelivery);
        assert_eq!(cash.label(), "Cash on Delivery");
    }

    #[test]
    fn test_unknown_payment_method_is_preserved() {
        let other: PaymentMethod = serde_json::from_str("\"voucher\"").unwrap();
        assert_eq!(other.label(), "voucher");
        assert_eq!(serde_json::to_string(&other).unwrap(), "\"voucher\"");
        assert_eq!(PaymentMethod::from(String::new()).label(), "-");
    }

    #[test]
    fn test_only_cash_on_delivery_is_available() {
        assert!(PaymentMethod::CashOnDelivery.is_available());
        assert!(!PaymentMethod::Card.is_available());
    }
}
