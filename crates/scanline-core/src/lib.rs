//! # scanline-core: Pure Business Logic for Scanline
//!
//! This crate is the **heart** of Scanline. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Scanline Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI Shell (external)                          │   │
//! │  │   Scan view ──► Order view ──► Manual entry ──► Checkout       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              scanline-session (lifecycle layer)                 │   │
//! │  │    start/stop, camera negotiation, decode-event pump           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ scanline-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  catalog  │  │  filter   │  │   order   │  │   money   │  │   │
//! │  │   │  resolve  │  │  warmup   │  │  add/set  │  │  integer  │  │   │
//! │  │   │  by code  │  │  dedup    │  │  totals   │  │   cents   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO TIMERS • NO HARDWARE • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] - The item catalog and exact-match barcode resolution
//! - [`filter`] - Decode-stream filtering (warmup, debounce, duplicate cool-down)
//! - [`order`] - The running order accumulator and its snapshot DTOs
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Catalog item checks and manual-entry normalization
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No Clocks**: Time enters as explicit `Instant` arguments on events
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Misses Are Not Errors**: An unknown barcode resolves to `None`, never `Err`
//!
//! ## Example Usage
//!
//! ```rust
//! use std::time::Instant;
//! use scanline_core::catalog::{Catalog, CatalogItem};
//! use scanline_core::filter::{DecodeFilter, FilterVerdict, ScanEvent, WARMUP_PERIOD};
//! use scanline_core::money::Money;
//! use scanline_core::order::Order;
//!
//! let catalog = Catalog::from_items(vec![CatalogItem {
//!     id: "b1".into(),
//!     name: "Dune".into(),
//!     price: Money::from_cents(1299),
//!     barcode: "9780441013593".into(),
//! }])
//! .unwrap();
//!
//! let started = Instant::now();
//! let mut filter = DecodeFilter::new(started);
//! let mut order = Order::new();
//!
//! let event = ScanEvent::new("9780441013593", started + WARMUP_PERIOD);
//! if filter.accept(&event) == FilterVerdict::Accepted {
//!     if let Some(item) = catalog.resolve(&event.barcode) {
//!         order.add_item(item);
//!     }
//! }
//!
//! assert_eq!(order.total().cents(), 1299);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod error;
pub mod filter;
pub mod money;
pub mod order;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use scanline_core::Money` instead of
// `use scanline_core::money::Money`

pub use catalog::{Catalog, CatalogItem};
pub use error::{CatalogError, CatalogResult};
pub use filter::{DecodeFilter, FilterVerdict, ScanEvent, SuppressReason};
pub use money::Money;
pub use order::{Order, OrderLine, OrderLineView, OrderSnapshot, OrderState, OrderTotals};
