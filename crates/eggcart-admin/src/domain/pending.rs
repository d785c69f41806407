//! Staged order edits.

use eggcart_core::model::OrderStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canned notes offered to operators.
pub const PREDEFINED_NOTES: [&str; 4] = [
    "Verifying your payment",
    "Your order was Delivered Successfully",
    "Couldn't verify payment",
    "You've requested Cancellation",
];

/// One edited field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum StagedField {
    /// New status.
    Status(OrderStatus),
    /// New operator notes.
    Notes(String),
}

/// Uncommitted edits to one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingChange {
    /// Order being edited.
    pub order_id: Uuid,
    /// Proposed status.
    pub status: Option<OrderStatus>,
    /// Proposed notes.
    pub notes: Option<String>,
}

impl PendingChange {
    /// An empty change for `order_id`.
    #[must_use]
    pub fn new(order_id: Uuid) -> Self {
        Self {
            order_id,
            status: None,
            notes: None,
        }
    }

    /// Merges one field, replacing an earlier value for the same field.
    pub fn stage(&mut self, field: StagedField) {
        match field {
            StagedField::Status(status) => self.status = Some(status),
            StagedField::Notes(notes) => self.notes = Some(notes),
        }
    }

    /// Both fields, if both are staged.
    #[must_use]
    pub fn complete(&self) -> Option<(OrderStatus, &str)> {
        Some((self.status?, self.notes.as_deref()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_merges_fields_and_later_values_win() {
        let mut change = PendingChange::new(Uuid::new_v4());

        change.stage(StagedField::Status(OrderStatus::Cancelled));
        assert!(change.complete().is_none());
        change.stage(StagedField::Notes(PREDEFINED_NOTES[3].to_owned()));
        change.stage(StagedField::Status(OrderStatus::Delivered));

        assert_eq!(
            change.complete(),
            Some((OrderStatus::Delivered, "You've requested Cancellation"))
        );
    }

    #[test]
    fn test_staged_field_wire_format() {
        let field: StagedField =
            serde_json::from_str(r#"{"field":"status","value":"Delivered"}"#).unwrap();

        assert_eq!(field, StagedField::Status(OrderStatus::Delivered));
    }
}
