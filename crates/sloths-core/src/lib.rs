//! # sloths-core: Pure Domain Logic for Sloths Inventory
//!
//! Domain types, validation rules and the history projection that decides an
//! item's current status, location and responsible person.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Sloths Inventory Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    sloths-api (axum)                            │   │
//! │  │    /auth ──► /api/devices ──► /api/items ──► /health            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ sloths-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  history  │  │   input   │  │ validation│  │   │
//! │  │   │  Device   │  │ current   │  │ NewItem   │  │   rules   │  │   │
//! │  │   │  Item     │  │ state     │  │ NewDevice │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    sloths-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities and joined views (Device, Item, Operation, ...)
//! - [`history`] - Current-state projection over an item's operation log
//! - [`input`] - Create/update payloads with their validation
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validation rules
//! - [`search`] - Unicode case folding for search and sort keys
//!
//! ## Example Usage
//!
//! ```rust
//! use sloths_core::validation::validate_inventory_number;
//!
//! assert!(validate_inventory_number("INV-000123").is_ok());
//! assert!(validate_inventory_number("   ").is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod history;
pub mod input;
pub mod search;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use history::{project_current_state, CurrentState};
pub use input::*;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a lookup name (category, status, location, ...).
pub const NAME_MAX_LEN: usize = 255;

/// Maximum length of an inventory number.
pub const INVENTORY_NUMBER_MAX_LEN: usize = 50;

/// Maximum length of a serial number.
pub const SERIAL_NUMBER_MAX_LEN: usize = 50;

/// Maximum length of each part of a responsible person's name.
pub const PERSON_NAME_MAX_LEN: usize = 150;

/// Maximum length of an employee (personnel) number.
pub const EMPLOYEE_ID_MAX_LEN: usize = 50;

/// Maximum length of a login name.
pub const USERNAME_MAX_LEN: usize = 150;

/// Minimum password length accepted when creating accounts.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Default number of rows returned by list endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Upper bound on rows returned by a single list call.
///
/// Prevents accidental full-table dumps through the API.
pub const MAX_PAGE_SIZE: u32 = 500;
