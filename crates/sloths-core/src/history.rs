//! # Current-State Projection
//!
//! An item's status, location and responsible person are never stored on the
//! item. They are read off its operation log.
//!
//! ## Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Latest Operation Wins                                │
//! │                                                                         │
//! │  operations for INV-000042                                             │
//! │  ─────────────────────────────────────────────────────────────          │
//! │  seq 1  2026-01-10 09:00  Available   Warehouse   Petrov P.            │
//! │  seq 2  2026-02-01 14:30  In use      Room 101    Ivanov I.            │
//! │  seq 3  2026-02-01 14:30  Repair      Service     Ivanov I.  ◄── current│
//! │                                                                         │
//! │  1. Highest created_at wins                                            │
//! │  2. Equal created_at: highest sequence (later insert) wins             │
//! │  3. Empty log: no current state                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The database layer applies the same ordering in SQL
//! (`ORDER BY created_at DESC, rowid DESC LIMIT 1`); this module is the
//! reference definition it is tested against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::OperationView;

/// Snapshot of an item's derived state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CurrentState {
    /// The operation this state was read from.
    pub operation_id: String,
    pub status_id: String,
    pub status_name: String,
    pub location_id: String,
    pub location_name: String,
    pub responsible_id: String,
    pub responsible_name: String,
    /// When the operation was recorded.
    #[ts(as = "String")]
    pub since: DateTime<Utc>,
}

impl From<&OperationView> for CurrentState {
    fn from(op: &OperationView) -> Self {
        CurrentState {
            operation_id: op.id.clone(),
            status_id: op.status_id.clone(),
            status_name: op.status_name.clone(),
            location_id: op.location_id.clone(),
            location_name: op.location_name.clone(),
            responsible_id: op.responsible_id.clone(),
            responsible_name: op.responsible_name(),
            since: op.created_at,
        }
    }
}

/// Picks the operation that defines the current state.
///
/// The slice may be in any order and may mix items; callers pass one item's
/// history.
pub fn latest_operation(history: &[OperationView]) -> Option<&OperationView> {
    history.iter().max_by_key(|op| (op.created_at, op.sequence))
}

/// Derives the current state from an item's history.
///
/// ## Returns
/// * `Some(CurrentState)` - fields of the latest operation
/// * `None` - the item has no operations
pub fn project_current_state(history: &[OperationView]) -> Option<CurrentState> {
    latest_operation(history).map(CurrentState::from)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn op(sequence: i64, at: DateTime<Utc>, status: &str, location: &str) -> OperationView {
        OperationView {
            id: format!("op-{}", sequence),
            sequence,
            item_id: "item-1".to_string(),
            inventory_number: "INV-1".to_string(),
            category_name: "Laptops".to_string(),
            type_name: "Notebook".to_string(),
            manufacturer_name: "Lenovo".to_string(),
            model_name: "T14".to_string(),
            status_id: format!("status-{}", status),
            status_name: status.to_string(),
            location_id: format!("location-{}", location),
            location_name: location.to_string(),
            responsible_id: "resp-1".to_string(),
            responsible_last_name: "Ivanov".to_string(),
            responsible_first_name: "Ivan".to_string(),
            responsible_middle_name: Some("Ivanovich".to_string()),
            notes: String::new(),
            created_at: at,
            updated_at: at,
        }
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_history_has_no_state() {
        assert!(project_current_state(&[]).is_none());
    }

    #[test]
    fn test_latest_created_at_wins_regardless_of_order() {
        let t = base();
        let history = vec![
            op(2, t + Duration::days(20), "In use", "Room 101"),
            op(1, t, "Available", "Warehouse"),
            op(3, t + Duration::days(5), "Repair", "Service"),
        ];

        let state = project_current_state(&history).unwrap();
        assert_eq!(state.operation_id, "op-2");
        assert_eq!(state.status_name, "In use");
        assert_eq!(state.location_name, "Room 101");
        assert_eq!(state.responsible_name, "Ivanov Ivan Ivanovich");
        assert_eq!(state.since, t + Duration::days(20));
    }

    #[test]
    fn test_equal_timestamps_fall_back_to_insert_order() {
        let t = base();
        let history = vec![op(7, t, "Repair", "Service"), op(6, t, "In use", "Room 101")];

        let state = project_current_state(&history).unwrap();
        assert_eq!(state.operation_id, "op-7");
        assert_eq!(state.status_name, "Repair");
    }

    #[test]
    fn test_dropping_latest_reverts_to_previous() {
        let t = base();
        let mut history = vec![
            op(1, t, "Available", "Warehouse"),
            op(2, t + Duration::hours(1), "In use", "Room 101"),
        ];
        assert_eq!(project_current_state(&history).unwrap().status_name, "In use");

        history.pop();
        assert_eq!(
            project_current_state(&history).unwrap().status_name,
            "Available"
        );
    }

    #[test]
    fn test_empty_status_name_is_preserved() {
        let history = vec![op(1, base(), "", "Warehouse")];
        assert_eq!(project_current_state(&history).unwrap().status_name, "");
    }
}
