//! # Error Types
//!
//! Domain-specific error types for scanline-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  scanline-core errors (this file)                                      │
//! │  └── CatalogError     - Catalog construction failures                  │
//! │                                                                         │
//! │  scanline-session errors (separate crate)                              │
//! │  ├── AcquisitionError - Camera negotiation failures (classified)       │
//! │  └── SessionError     - Lifecycle violations (AlreadyRunning, ...)     │
//! │                                                                         │
//! │  NOT an error: a barcode with no catalog match. Resolution misses are  │
//! │  a normal outcome (Option::None) routed to the unresolved callback.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item id, offending value)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Catalog Error
// =============================================================================

/// Catalog construction errors.
///
/// Raised by `Catalog::from_items` when the loader hands us malformed data.
/// Items are immutable after load, so these can only occur at build time.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A required field is missing or empty.
    ///
    /// ## When This Occurs
    /// - Hand-edited catalog JSON with a blank `barcode` or `name`
    /// - An exporter bug producing items without ids
    #[error("catalog item '{id}': {field} is required")]
    MissingField { id: String, field: String },

    /// Item price is negative.
    ///
    /// Zero is allowed (giveaways, bundle fillers); negative prices would
    /// let a scan reduce the order total.
    #[error("catalog item '{id}': price cannot be negative ({cents} cents)")]
    NegativePrice { id: String, cents: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CatalogError.
pub type CatalogResult<T> = Result<T, CatalogError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CatalogError::MissingField {
            id: "itm-1".to_string(),
            field: "barcode".to_string(),
        };
        assert_eq!(err.to_string(), "catalog item 'itm-1': barcode is required");

        let err = CatalogError::NegativePrice {
            id: "itm-2".to_string(),
            cents: -500,
        };
        assert_eq!(
            err.to_string(),
            "catalog item 'itm-2': price cannot be negative (-500 cents)"
        );
    }
}
