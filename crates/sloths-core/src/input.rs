//! # Input Payloads
//!
//! What callers send to create or replace a row. Updates are full
//! replacements, so every entity has a single payload for both.
//!
//! Each payload has `into_valid()`, which trims strings, applies the field
//! rules from [`crate::validation`] and returns the normalized payload. The
//! database layer only ever sees validated payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::validation::{
    validate_employee_id, validate_inventory_number, validate_middle_name, validate_name,
    validate_optional, validate_optional_uuid, validate_password, validate_person_name,
    validate_serial_number, validate_username, validate_uuid, ValidationResult,
};
use crate::{ValidationError, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Upper bound on free-text notes.
const NOTES_MAX_LEN: usize = 10_000;

fn validate_notes(notes: &str) -> ValidationResult<String> {
    validate_optional("notes", notes, NOTES_MAX_LEN)
}

// =============================================================================
// Lookups
// =============================================================================

/// Payload for any lookup table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewLookup {
    pub name: String,
    #[serde(default)]
    pub notes: String,
}

impl NewLookup {
    pub fn into_valid(self) -> ValidationResult<Self> {
        Ok(NewLookup {
            name: validate_name("name", &self.name)?,
            notes: validate_notes(&self.notes)?,
        })
    }
}

// =============================================================================
// Devices
// =============================================================================

/// Payload for a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewDevice {
    pub category_id: String,
    pub type_id: String,
    pub manufacturer_id: String,
    pub model_id: String,
    #[serde(default)]
    pub notes: String,
}

impl NewDevice {
    pub fn into_valid(self) -> ValidationResult<Self> {
        Ok(NewDevice {
            category_id: validate_uuid("category_id", &self.category_id)?,
            type_id: validate_uuid("type_id", &self.type_id)?,
            manufacturer_id: validate_uuid("manufacturer_id", &self.manufacturer_id)?,
            model_id: validate_uuid("model_id", &self.model_id)?,
            notes: validate_notes(&self.notes)?,
        })
    }
}

// =============================================================================
// Responsibles
// =============================================================================

/// Payload for a responsible person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewResponsible {
    pub last_name: String,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub employee_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub notes: String,
}

impl NewResponsible {
    pub fn into_valid(self) -> ValidationResult<Self> {
        Ok(NewResponsible {
            last_name: validate_person_name("last_name", &self.last_name)?,
            first_name: validate_person_name("first_name", &self.first_name)?,
            middle_name: validate_middle_name(self.middle_name.as_deref())?,
            employee_id: validate_employee_id(&self.employee_id)?,
            user_id: validate_optional_uuid("user_id", self.user_id.as_deref())?,
            notes: validate_notes(&self.notes)?,
        })
    }
}

// =============================================================================
// Items
// =============================================================================

/// Payload for an inventory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewItem {
    pub inventory_number: String,
    #[serde(default)]
    pub serial_number: String,
    pub device_id: String,
    #[serde(default)]
    pub notes: String,
}

impl NewItem {
    pub fn into_valid(self) -> ValidationResult<Self> {
        Ok(NewItem {
            inventory_number: validate_inventory_number(&self.inventory_number)?,
            serial_number: validate_serial_number(&self.serial_number)?,
            device_id: validate_uuid("device_id", &self.device_id)?,
            notes: validate_notes(&self.notes)?,
        })
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Payload for recording an operation. The item comes from the URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOperation {
    pub status_id: String,
    pub responsible_id: String,
    pub location_id: String,
    #[serde(default)]
    pub notes: String,
}

impl NewOperation {
    pub fn into_valid(self) -> ValidationResult<Self> {
        Ok(NewOperation {
            status_id: validate_uuid("status_id", &self.status_id)?,
            responsible_id: validate_uuid("responsible_id", &self.responsible_id)?,
            location_id: validate_uuid("location_id", &self.location_id)?,
            notes: validate_notes(&self.notes)?,
        })
    }
}

// =============================================================================
// Users
// =============================================================================

/// Payload for creating a login account. The password is plain text here and
/// is hashed before it is stored.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

impl NewUser {
    pub fn into_valid(self) -> ValidationResult<Self> {
        validate_password(&self.password)?;
        Ok(NewUser {
            username: validate_username(&self.username)?,
            password: self.password,
        })
    }
}

// =============================================================================
// Paging
// =============================================================================

/// Limit/offset window for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    /// Builds a page, clamping the limit to `1..=MAX_PAGE_SIZE`.
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Page {
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(None, None)
    }
}

// =============================================================================
// Creation window
// =============================================================================

/// Half-open window `[after, before)` over `created_at`. Open ends match
/// everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRange {
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

impl CreatedRange {
    /// Builds a window, rejecting one that ends before it starts.
    pub fn new(
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> ValidationResult<Self> {
        if let (Some(after), Some(before)) = (after, before) {
            if before < after {
                return Err(ValidationError::InvalidFormat {
                    field: "created_before".to_string(),
                    reason: "must not be earlier than created_after".to_string(),
                });
            }
        }
        Ok(CreatedRange { after, before })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.after.map_or(true, |after| at >= after)
            && self.before.map_or(true, |before| at < before)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
