//! Lifecycle status value sets
//!
//! Every status travels as a camelCase string on the wire and in the
//! database. Unknown strings are rejected at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A string did not match any member of a status set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// All members in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    _ => Err(UnknownStatus {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

status_enum! {
    /// Product lifecycle status
    ProductStatus("product status") {
        Initiated => "initiated",
        Active => "active",
        OutOfStock => "outOfStock",
        Inactive => "inactive",
    }
}

status_enum! {
    /// Order lifecycle status
    OrderStatus("order status") {
        Initiated => "initiated",
        Confirmed => "confirmed",
        Shipping => "shipping",
        Canceled => "canceled",
        Completed => "completed",
    }
}

status_enum! {
    /// Payment status of an order
    PaymentStatus("payment status") {
        Pending => "pending",
        Fail => "fail",
        Paid => "paid",
        Refunded => "refunded",
        PartialRefunded => "partialRefunded",
        NoRefund => "noRefund",
        Voided => "voided",
    }
}

status_enum! {
    /// Accepted payment methods
    PaymentMethod("payment method") {
        Card => "card",
    }
}

status_enum! {
    /// Delivery status of an order
    DeliveryStatus("delivery status") {
        Pending => "pending",
        Shipping => "shipping",
        Completed => "completed",
    }
}

impl OrderStatus {
    /// Whether an order in `self` may be moved to `next`.
    ///
    /// Rewriting the current value is always allowed.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        if *self == next {
            return true;
        }
        match self {
            Initiated => matches!(next, Confirmed | Canceled | Shipping | Completed),
            Confirmed => matches!(next, Shipping | Canceled | Completed),
            Shipping => matches!(next, Completed),
            Canceled | Completed => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_are_camel_case() {
        assert_eq!(
            serde_json::to_string(&ProductStatus::OutOfStock).unwrap(),
            "\"outOfStock\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::PartialRefunded).unwrap(),
            "\"partialRefunded\""
        );
        for status in PaymentStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        assert_eq!("card".parse::<PaymentMethod>(), Ok(PaymentMethod::Card));
        let err = "cash".parse::<PaymentMethod>().unwrap_err();
        assert_eq!(err.kind, "payment method");
        assert_eq!(err.to_string(), "unknown payment method value: cash");
    }

    #[test]
    fn test_unknown_value_fails_deserialization() {
        let parsed: Result<DeliveryStatus, _> = serde_json::from_str("\"lost\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_order_status_transitions() {
        use OrderStatus::*;

        assert!(Initiated.can_transition_to(Confirmed));
        assert!(Initiated.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Shipping));
        assert!(Shipping.can_transition_to(Completed));
        assert!(Shipping.can_transition_to(Shipping));

        assert!(!Shipping.can_transition_to(Initiated));
        assert!(!Confirmed.can_transition_to(Initiated));
        assert!(!Completed.can_transition_to(Canceled));
        assert!(!Canceled.can_transition_to(Confirmed));
    }

    #[test]
    fn test_terminal_states_only_allow_themselves() {
        for from in [OrderStatus::Canceled, OrderStatus::Completed] {
            for to in OrderStatus::ALL {
                assert_eq!(from.can_transition_to(*to), from == *to);
            }
        }
    }
}
