//! Status enums for orders and payments.
//!
//! Wire strings match the commerce API's snake_case values.

use serde::{Deserialize, Serialize};

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// Payment status for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// Payment method selected at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CreditCard,
    Paypal,
    CashOnDelivery,
}

impl PaymentMethod {
    /// Human-readable label for display.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CreditCard => "Credit Card",
            Self::Paypal => "PayPal",
            Self::CashOnDelivery => "Cash on Delivery",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit_card" => Ok(Self::CreditCard),
            "paypal" => Ok(Self::Paypal),
            "cash_on_delivery" => Ok(Self::CashOnDelivery),
            other => Err(format!(
                "unknown payment method: {other} (expected credit_card, paypal, or cash_on_delivery)"
            )),
        }
    }
}
