//! # Validation Module
//!
//! Input validation utilities for Sloths Inventory.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (axum)                                          │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: field rules (required, length, format)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (names, inventory numbers)                     │
//! │  └── Foreign keys (RESTRICT / CASCADE)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use sloths_core::validation::{validate_name, validate_serial_number};
//!
//! assert_eq!(validate_name("name", "  Laptops ").unwrap(), "Laptops");
//! assert!(validate_serial_number("").is_ok());
//! ```

use crate::error::ValidationError;
use crate::{
    EMPLOYEE_ID_MAX_LEN, INVENTORY_NUMBER_MAX_LEN, NAME_MAX_LEN, PASSWORD_MIN_LEN,
    PERSON_NAME_MAX_LEN, SERIAL_NUMBER_MAX_LEN, USERNAME_MAX_LEN,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Generic String Rules
// =============================================================================

/// Trims and checks a required string field.
///
/// Length is counted in characters, not bytes, so Cyrillic names get the
/// same limit as Latin ones.
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    validate_max_len(field, value, max)?;
    Ok(value.to_string())
}

/// Trims and checks an optional (blank allowed) string field.
pub fn validate_optional(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();
    validate_max_len(field, value, max)?;
    Ok(value.to_string())
}

fn validate_max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Domain Field Validators
// =============================================================================

/// Validates a lookup name (category, manufacturer, model, type, location,
/// status).
///
/// ## Rules
/// - Must not be empty
/// - At most 255 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<String> {
    validate_required(field, name, NAME_MAX_LEN)
}

/// Validates an inventory number.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Case-sensitive: `INV-1` and `inv-1` are different numbers
///
/// ## Example
/// ```rust
/// use sloths_core::validation::validate_inventory_number;
///
/// assert!(validate_inventory_number("INV-000001").is_ok());
/// assert!(validate_inventory_number("").is_err());
/// assert!(validate_inventory_number(&"A".repeat(51)).is_err());
/// ```
pub fn validate_inventory_number(value: &str) -> ValidationResult<String> {
    validate_required("inventory_number", value, INVENTORY_NUMBER_MAX_LEN)
}

/// Validates a serial number. Empty is allowed; at most 50 characters.
pub fn validate_serial_number(value: &str) -> ValidationResult<String> {
    validate_optional("serial_number", value, SERIAL_NUMBER_MAX_LEN)
}

/// Validates a required part of a person's name (last or first name).
pub fn validate_person_name(field: &str, value: &str) -> ValidationResult<String> {
    validate_required(field, value, PERSON_NAME_MAX_LEN)
}

/// Validates a middle name. Blank collapses to `None`.
pub fn validate_middle_name(value: Option<&str>) -> ValidationResult<Option<String>> {
    match value {
        Some(v) => {
            let v = validate_optional("middle_name", v, PERSON_NAME_MAX_LEN)?;
            Ok(if v.is_empty() { None } else { Some(v) })
        }
        None => Ok(None),
    }
}

/// Validates an employee (personnel) number. Empty is allowed.
pub fn validate_employee_id(value: &str) -> ValidationResult<String> {
    validate_optional("employee_id", value, EMPLOYEE_ID_MAX_LEN)
}

/// Validates a login name.
///
/// ## Rules
/// - 1 to 150 characters
/// - ASCII letters, digits and `@ . + - _` only
pub fn validate_username(value: &str) -> ValidationResult<String> {
    let value = validate_required("username", value, USERNAME_MAX_LEN)?;

    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "may contain only ASCII letters, numbers, and @/./+/-/_ characters".to_string(),
        });
    }

    Ok(value)
}

/// Validates a new password. Not trimmed.
pub fn validate_password(value: &str) -> ValidationResult<()> {
    if value.chars().count() < PASSWORD_MIN_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: PASSWORD_MIN_LEN,
        });
    }
    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns unfiltered results)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query, or `None` when blank.
pub fn validate_search_query(query: Option<&str>) -> ValidationResult<Option<String>> {
    let query = match query.map(str::trim) {
        Some(q) if !q.is_empty() => q,
        _ => return Ok(None),
    };

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "q".to_string(),
            max: 100,
        });
    }

    Ok(Some(query.to_string()))
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use sloths_core::validation::validate_uuid;
///
/// assert!(validate_uuid("device_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("device_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(id.to_string())
}

/// Validates an optional UUID reference.
pub fn validate_optional_uuid(field: &str, id: Option<&str>) -> ValidationResult<Option<String>> {
    match id.map(str::trim) {
        Some(id) if !id.is_empty() => validate_uuid(field, id).map(Some),
        _ => Ok(None),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
