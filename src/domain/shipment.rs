use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{DomainError, DomainResult};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ShipmentStatus {
    Pending,
    Packed,
    Shipped,
    Delivered,
    Cancelled,
}

impl ShipmentStatus {
    pub fn can_transition_to(self, target: ShipmentStatus) -> bool {
        use ShipmentStatus::*;
        matches!(
            (self, target),
            (Pending, Packed)
                | (Packed, Shipped)
                | (Shipped, Delivered)
                | (Pending, Cancelled)
                | (Packed, Cancelled)
        )
    }

    pub fn transition_to(self, target: ShipmentStatus) -> DomainResult<ShipmentStatus> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(DomainError::InvalidTransition {
                entity: "shipment",
                from: self.to_string(),
                to: target.to_string(),
            })
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ShipmentStatus::Delivered | ShipmentStatus::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::ShipmentStatus::*;
    use std::str::FromStr;

    #[test]
    fn happy_path() {
        assert_eq!(Pending.transition_to(Packed), Ok(Packed));
        assert_eq!(Packed.transition_to(Shipped), Ok(Shipped));
        assert_eq!(Shipped.transition_to(Delivered), Ok(Delivered));
    }

    #[test]
    fn cancel_only_before_shipping() {
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Packed.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
    }

    #[test]
    fn terminal_states_are_final() {
        for target in [Pending, Packed, Shipped, Delivered, Cancelled] {
            assert!(!Delivered.can_transition_to(target));
            assert!(!Cancelled.can_transition_to(target));
        }
        assert!(Delivered.is_terminal());
        assert!(!Shipped.can_transition_to(Packed));
    }

    #[test]
    fn parses_stored_value() {
        assert_eq!(super::ShipmentStatus::from_str("shipped"), Ok(Shipped));
        assert!(super::ShipmentStatus::from_str("lost").is_err());
    }
}
