//! # Catalog Module
//!
//! The item catalog and barcode resolution.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Catalog                                        │
//! │                                                                         │
//! │  loader JSON ──► Vec<CatalogItem> ──► Catalog::from_items              │
//! │                                           │                             │
//! │                         ┌─────────────────┴────────────────┐           │
//! │                         │ items: Vec<Arc<CatalogItem>>     │           │
//! │                         │ by_barcode: barcode → index      │           │
//! │                         └─────────────────┬────────────────┘           │
//! │                                           │                             │
//! │  scanned/typed barcode ──► resolve() ──► Option<Arc<CatalogItem>>     │
//! │                                                                         │
//! │  Resolution is EXACT string equality. A miss is a normal outcome       │
//! │  (unknown code), never an error.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Where the catalog comes from (file, database, network) is the embedding
//! shell's concern. This crate receives the already-deserialized items once
//! and treats them as immutable for the life of the catalog.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use ts_rs::TS;

use crate::error::CatalogResult;
use crate::money::Money;
use crate::validation::validate_catalog_item;

// =============================================================================
// Catalog Item
// =============================================================================

/// A sellable item as loaded from the catalog source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CatalogItem {
    /// Unique identifier. Minted by the loader, opaque to this crate.
    pub id: String,

    /// Display name shown to the operator and on the order.
    pub name: String,

    /// Price in integer cents.
    pub price: Money,

    /// Barcode exactly as the decode engine reports it.
    ///
    /// Opaque token: no checksum or symbology validation happens here.
    pub barcode: String,
}

// =============================================================================
// Catalog
// =============================================================================

/// Read-only item collection with a barcode index.
///
/// Built once from loader output. Items are shared as `Arc<CatalogItem>` so
/// order lines reference them without copying.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Items in load order.
    items: Vec<Arc<CatalogItem>>,

    /// Barcode → index into `items`. First occurrence wins for duplicates.
    by_barcode: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog from loader output.
    ///
    /// ## Behavior
    /// - Every item is validated (`validate_catalog_item`); the first bad
    ///   item aborts the build.
    /// - Duplicate barcodes keep the FIRST occurrence in the index. Data
    ///   quality is the loader's concern; resolution just needs a stable
    ///   answer.
    /// - An empty input is a valid (always-missing) catalog.
    pub fn from_items(items: Vec<CatalogItem>) -> CatalogResult<Self> {
        let mut stored = Vec::with_capacity(items.len());
        let mut by_barcode = HashMap::with_capacity(items.len());

        for item in items {
            validate_catalog_item(&item)?;
            by_barcode.entry(item.barcode.clone()).or_insert(stored.len());
            stored.push(Arc::new(item));
        }

        Ok(Catalog {
            items: stored,
            by_barcode,
        })
    }

    /// Resolves a barcode to its catalog item by exact string equality.
    ///
    /// Returns `None` for unknown codes. Callers route misses to the
    /// unresolved path (operator feedback), never to error handling.
    pub fn resolve(&self, barcode: &str) -> Option<Arc<CatalogItem>> {
        self.by_barcode
            .get(barcode)
            .map(|&idx| Arc::clone(&self.items[idx]))
    }

    /// Items in load order (for browse/list views in the UI shell).
    pub fn items(&self) -> impl Iterator<Item = &Arc<CatalogItem>> {
        self.items.iter()
    }

    /// Number of loaded items (duplicates included).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
