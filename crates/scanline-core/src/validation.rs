//! # Validation Module
//!
//! Input validation utilities for Scanline.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI shell                                                     │
//! │  ├── Basic format checks (empty input boxes)                           │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Catalog items checked once at load time                           │
//! │  └── Manual barcode entry normalized before resolution                 │
//! │                                                                         │
//! │  Scanned barcodes are NOT validated here: decoded strings are opaque   │
//! │  tokens, and an unknown one is a normal miss, not malformed input.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use scanline_core::validation::normalize_barcode_input;
//!
//! assert_eq!(normalize_barcode_input("  978316 "), Some("978316".to_string()));
//! assert_eq!(normalize_barcode_input("   "), None);
//! ```

use crate::catalog::CatalogItem;
use crate::error::{CatalogError, CatalogResult};

// =============================================================================
// Catalog Item Validation
// =============================================================================

/// Validates a catalog item at load time.
///
/// ## Rules
/// - `id`, `name`, and `barcode` must not be empty (after trimming)
/// - `price` must be non-negative (zero is allowed for free items)
///
/// Items are immutable after load, so passing here means the item stays
/// valid for the life of the catalog.
pub fn validate_catalog_item(item: &CatalogItem) -> CatalogResult<()> {
    for (field, value) in [
        ("id", &item.id),
        ("name", &item.name),
        ("barcode", &item.barcode),
    ] {
        if value.trim().is_empty() {
            return Err(CatalogError::MissingField {
                id: item.id.clone(),
                field: field.to_string(),
            });
        }
    }

    if item.price.is_negative() {
        return Err(CatalogError::NegativePrice {
            id: item.id.clone(),
            cents: item.price.cents(),
        });
    }

    Ok(())
}

// =============================================================================
// Manual Entry Normalization
// =============================================================================

/// Normalizes a manually typed barcode before resolution.
///
/// ## Rules
/// - Leading/trailing whitespace is stripped
/// - Whitespace-only input yields `None` (caller ignores the submission)
///
/// ## Example
/// ```rust
/// use scanline_core::validation::normalize_barcode_input;
///
/// assert_eq!(normalize_barcode_input("9780441013593 "), Some("9780441013593".to_string()));
/// assert_eq!(normalize_barcode_input(""), None);
/// assert_eq!(normalize_barcode_input("  \t"), None);
/// ```
pub fn normalize_barcode_input(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn item(id: &str, name: &str, barcode: &str, cents: i64) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            name: name.to_string(),
            price: Money::from_cents(cents),
            barcode: barcode.to_string(),
        }
    }

    #[test]
    fn test_validate_catalog_item() {
        assert!(validate_catalog_item(&item("b1", "Dune", "9780441013593", 1299)).is_ok());
        assert!(validate_catalog_item(&item("b2", "Freebie", "555", 0)).is_ok());

        assert!(validate_catalog_item(&item("", "Dune", "9780441013593", 1299)).is_err());
        assert!(validate_catalog_item(&item("b1", "   ", "9780441013593", 1299)).is_err());
        assert!(validate_catalog_item(&item("b1", "Dune", "", 1299)).is_err());
        assert!(validate_catalog_item(&item("b1", "Dune", "9780441013593", -1)).is_err());
    }

    #[test]
    fn test_validation_error_carries_context() {
        let err = validate_catalog_item(&item("b9", "Dune", " ", 1299)).unwrap_err();
        assert_eq!(err.to_string(), "catalog item 'b9': barcode is required");

        let err = validate_catalog_item(&item("b9", "Dune", "x", -250)).unwrap_err();
        assert!(err.to_string().contains("-250"));
    }

    #[test]
    fn test_normalize_barcode_input() {
        assert_eq!(
            normalize_barcode_input(" 978316  "),
            Some("978316".to_string())
        );
        assert_eq!(normalize_barcode_input("978316"), Some("978316".to_string()));
        assert_eq!(normalize_barcode_input(""), None);
        assert_eq!(normalize_barcode_input("   "), None);
        assert_eq!(normalize_barcode_input("\t\n"), None);
    }
}
