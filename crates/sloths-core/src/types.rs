//! # Domain Types
//!
//! Core domain types used throughout Sloths Inventory.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Lookup tables (LookupEntry + LookupKind)                              │
//! │  Category · Manufacturer · Model · Type · Location · Status            │
//! │        │                                        │                       │
//! │        ▼                                        │                       │
//! │  ┌─────────────────┐   ┌─────────────────┐     │   ┌───────────────┐   │
//! │  │     Device      │◄──│      Item       │◄────┼───│   Operation   │   │
//! │  │  ─────────────  │   │  ─────────────  │     └──►│  ───────────  │   │
//! │  │  category_id    │   │  inventory_no   │         │  status_id    │   │
//! │  │  type_id        │   │  serial_number  │         │  location_id  │   │
//! │  │  manufacturer_id│   │  device_id      │         │  responsible  │   │
//! │  │  model_id       │   └─────────────────┘         └───────┬───────┘   │
//! │  └─────────────────┘                                       │           │
//! │                                          ┌─────────────────▼───────┐   │
//! │                                          │      Responsible        │   │
//! │                                          │  last/first/middle name │   │
//! │                                          │  user_id (optional 1:1) │   │
//! │                                          └─────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Audit Fields
//! Every entity carries `notes`, `created_at` and `updated_at`. Named lookup
//! entities additionally carry a unique `name`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Lookup Kind
// =============================================================================

/// The small reference tables of the catalog.
///
/// All of them share the same shape (see [`LookupEntry`]) and the same
/// restrict-on-delete rule: a row cannot be removed while something still
/// points at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    Category,
    Manufacturer,
    Model,
    Type,
    Location,
    Status,
}

impl LookupKind {
    /// Every lookup kind, in catalog order.
    pub const ALL: [LookupKind; 6] = [
        LookupKind::Category,
        LookupKind::Manufacturer,
        LookupKind::Model,
        LookupKind::Type,
        LookupKind::Location,
        LookupKind::Status,
    ];

    /// Database table holding this kind.
    pub const fn table(&self) -> &'static str {
        match self {
            LookupKind::Category => "categories",
            LookupKind::Manufacturer => "manufacturers",
            LookupKind::Model => "models",
            LookupKind::Type => "types",
            LookupKind::Location => "locations",
            LookupKind::Status => "statuses",
        }
    }

    /// URL segment used by the API. Same as the table name.
    pub const fn slug(&self) -> &'static str {
        self.table()
    }

    /// Human-readable entity name for messages.
    pub const fn entity_name(&self) -> &'static str {
        match self {
            LookupKind::Category => "Category",
            LookupKind::Manufacturer => "Manufacturer",
            LookupKind::Model => "Model",
            LookupKind::Type => "Type",
            LookupKind::Location => "Location",
            LookupKind::Status => "Status",
        }
    }

    /// Table that references this kind (and so blocks its deletion).
    pub const fn referenced_by(&self) -> &'static str {
        match self {
            LookupKind::Category
            | LookupKind::Manufacturer
            | LookupKind::Model
            | LookupKind::Type => "devices",
            LookupKind::Location | LookupKind::Status => "operations",
        }
    }

    /// Resolves a URL segment into a lookup kind.
    pub fn from_slug(slug: &str) -> CoreResult<Self> {
        LookupKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == slug)
            .ok_or_else(|| CoreError::not_found("Lookup table", slug))
    }
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.entity_name())
    }
}

// =============================================================================
// Lookup Entry
// =============================================================================

/// A row of any lookup table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LookupEntry {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Unique display name.
    pub name: String,

    /// Free-form notes, may be empty.
    pub notes: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Display for LookupEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

// =============================================================================
// Device
// =============================================================================

/// A catalog device: one combination of category, type, manufacturer and model.
///
/// The four references are unique together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Device {
    pub id: String,
    pub category_id: String,
    pub type_id: String,
    pub manufacturer_id: String,
    pub model_id: String,
    pub notes: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A device joined with the names of its four lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DeviceView {
    pub id: String,
    pub category_id: String,
    pub category_name: String,
    pub type_id: String,
    pub type_name: String,
    pub manufacturer_id: String,
    pub manufacturer_name: String,
    pub model_id: String,
    pub model_name: String,
    pub notes: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl DeviceView {
    /// `"{category} | {type} | {manufacturer} | {model}"`
    pub fn display(&self) -> String {
        device_display(
            &self.category_name,
            &self.type_name,
            &self.manufacturer_name,
            &self.model_name,
        )
    }
}

/// Formats a device from its lookup names.
pub fn device_display(category: &str, kind: &str, manufacturer: &str, model: &str) -> String {
    format!("{} | {} | {} | {}", category, kind, manufacturer, model)
}

// =============================================================================
// Responsible
// =============================================================================

/// A person items can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Responsible {
    pub id: String,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    /// Personnel number, may be empty.
    pub employee_id: String,
    /// Optional one-to-one link to a user account.
    pub user_id: Option<String>,
    pub notes: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Responsible {
    /// `"{last} {first} {middle}"`, or `"{last} {first}"` without a middle name.
    pub fn full_name(&self) -> String {
        person_full_name(&self.last_name, &self.first_name, self.middle_name.as_deref())
    }
}

/// Formats a person's full name, skipping a missing or blank middle name.
pub fn person_full_name(last: &str, first: &str, middle: Option<&str>) -> String {
    match middle.map(str::trim).filter(|m| !m.is_empty()) {
        Some(middle) => format!("{} {} {}", last, first, middle),
        None => format!("{} {}", last, first),
    }
}

// =============================================================================
// Item
// =============================================================================

/// A physical inventory unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Item {
    pub id: String,
    /// Business identifier, unique and case-sensitive.
    pub inventory_number: String,
    /// Manufacturer serial, may be empty.
    pub serial_number: String,
    pub device_id: String,
    pub notes: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// An item with its device names and derived current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemView {
    pub id: String,
    pub inventory_number: String,
    pub serial_number: String,
    pub device_id: String,
    /// `"{category} | {type} | {manufacturer} | {model}"`
    pub device: String,
    pub notes: String,
    /// Latest operation's status/location/responsible, `None` without history.
    pub current: Option<crate::history::CurrentState>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ItemView {
    /// `"{inventory_number} - {device}"`
    pub fn display(&self) -> String {
        item_display(&self.inventory_number, &self.device)
    }
}

/// Formats an item from its inventory number and device display string.
pub fn item_display(inventory_number: &str, device: &str) -> String {
    format!("{} - {}", inventory_number, device)
}

// =============================================================================
// Operation
// =============================================================================

/// One entry of an item's history log.
///
/// Operations are append-only: once recorded they are never modified, and
/// they disappear only together with their item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Operation {
    pub id: String,
    /// Insertion order; breaks ties between equal `created_at` values.
    pub sequence: i64,
    pub item_id: String,
    pub status_id: String,
    pub responsible_id: String,
    pub location_id: String,
    pub notes: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// An operation joined with the names of everything it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OperationView {
    pub id: String,
    pub sequence: i64,
    pub item_id: String,
    pub inventory_number: String,
    pub category_name: String,
    pub type_name: String,
    pub manufacturer_name: String,
    pub model_name: String,
    pub status_id: String,
    pub status_name: String,
    pub location_id: String,
    pub location_name: String,
    pub responsible_id: String,
    pub responsible_last_name: String,
    pub responsible_first_name: String,
    pub responsible_middle_name: Option<String>,
    pub notes: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl OperationView {
    /// Full name of the responsible person.
    pub fn responsible_name(&self) -> String {
        person_full_name(
            &self.responsible_last_name,
            &self.responsible_first_name,
            self.responsible_middle_name.as_deref(),
        )
    }

    /// `"{item} - {status} ({location})"`
    pub fn display(&self) -> String {
        let device = device_display(
            &self.category_name,
            &self.type_name,
            &self.manufacturer_name,
            &self.model_name,
        );
        format!(
            "{} - {} ({})",
            item_display(&self.inventory_number, &device),
            self.status_name,
            self.location_name
        )
    }
}

// =============================================================================
// User
// =============================================================================

/// A login account.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub username: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_kind_slugs_roundtrip() {
        for kind in LookupKind::ALL {
            assert_eq!(LookupKind::from_slug(kind.slug()).unwrap(), kind);
        }
        assert!(LookupKind::from_slug("devices").is_err());
    }

    #[test]
    fn test_lookup_kind_references() {
        assert_eq!(LookupKind::Category.referenced_by(), "devices");
        assert_eq!(LookupKind::Model.referenced_by(), "devices");
        assert_eq!(LookupKind::Status.referenced_by(), "operations");
        assert_eq!(LookupKind::Location.referenced_by(), "operations");
    }

    #[test]
    fn test_device_display() {
        assert_eq!(
            device_display("Laptops", "Notebook", "Lenovo", "T14"),
            "Laptops | Notebook | Lenovo | T14"
        );
    }

    #[test]
    fn test_person_full_name() {
        assert_eq!(
            person_full_name("Ivanov", "Ivan", Some("Ivanovich")),
            "Ivanov Ivan Ivanovich"
        );
        assert_eq!(person_full_name("Ivanov", "Ivan", None), "Ivanov Ivan");
        assert_eq!(person_full_name("Ivanov", "Ivan", Some("  ")), "Ivanov Ivan");
    }

    #[test]
    fn test_operation_display() {
        let now = Utc::now();
        let op = OperationView {
            id: "op".to_string(),
            sequence: 1,
            item_id: "item".to_string(),
            inventory_number: "INV-1".to_string(),
            category_name: "Laptops".to_string(),
            type_name: "Notebook".to_string(),
            manufacturer_name: "Lenovo".to_string(),
            model_name: "T14".to_string(),
            status_id: "s".to_string(),
            status_name: "In use".to_string(),
            location_id: "l".to_string(),
            location_name: "Room 101".to_string(),
            responsible_id: "r".to_string(),
            responsible_last_name: "Ivanov".to_string(),
            responsible_first_name: "Ivan".to_string(),
            responsible_middle_name: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        };
        assert_eq!(
            op.display(),
            "INV-1 - Laptops | Notebook | Lenovo | T14 - In use (Room 101)"
        );
        assert_eq!(op.responsible_name(), "Ivanov Ivan");
    }
}
