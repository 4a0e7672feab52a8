//! # Order Accumulator
//!
//! The running order a scan session feeds into.
//!
//! ## Thread Safety
//! The order is wrapped in `Arc<Mutex<T>>` (see [`OrderState`]) because:
//! 1. The decode pump adds resolved items from its own task
//! 2. The UI shell edits quantities and clears from its thread
//! 3. Only one of them may modify the order at a time
//!
//! ## Order Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Order State Operations                               │
//! │                                                                         │
//! │  Source                   Operation               Order Change          │
//! │  ──────                   ─────────               ────────────          │
//! │                                                                         │
//! │  Accepted scan ──────────► add_item() ──────────► qty += 1 or new line │
//! │  Manual entry ───────────► add_item() ──────────► (same funnel)        │
//! │                                                                         │
//! │  Quantity control ───────► set_quantity() ──────► qty = n (n<=0 drops) │
//! │                                                                         │
//! │  Remove button ──────────► remove_item() ───────► line deleted         │
//! │                                                                         │
//! │  New customer ───────────► clear() ─────────────► lines.clear()        │
//! │                                                                         │
//! │  Checkout display ───────► total() ─────────────► Σ price × quantity   │
//! │                                                                         │
//! │  The order NEVER empties itself. Session stop, acquisition failure,    │
//! │  and filter resets leave accumulated lines untouched.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::CatalogItem;
use crate::money::Money;

// =============================================================================
// Order Line
// =============================================================================

/// One line of the running order.
///
/// ## Design Notes
/// - `item`: shared read-only reference into the catalog. The catalog is
///   immutable after load, so there is no price drift to freeze against and
///   no copy to keep in sync.
/// - At most one line exists per distinct item id; repeat scans land on the
///   existing line.
#[derive(Debug, Clone)]
pub struct OrderLine {
    /// The catalog item this line sells.
    pub item: Arc<CatalogItem>,

    /// How many units. Always >= 1 while the line exists.
    pub quantity: i64,

    /// When the line was first created.
    pub added_at: DateTime<Utc>,
}

impl OrderLine {
    fn new(item: Arc<CatalogItem>) -> Self {
        OrderLine {
            item,
            quantity: 1,
            added_at: Utc::now(),
        }
    }

    /// Line total (unit price × quantity).
    pub fn line_total(&self) -> Money {
        self.item.price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Order
// =============================================================================

/// The running order.
///
/// ## Invariants
/// - Lines are unique by item id (adding the same item increments quantity)
/// - Line quantity is >= 1 (setting it to zero or below removes the line)
/// - Insertion order is stable: first scan of an item fixes its position
#[derive(Debug, Clone, Default)]
pub struct Order {
    /// Lines in first-scan order.
    lines: Vec<OrderLine>,

    /// When the order was created/last cleared.
    created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new empty order.
    pub fn new() -> Self {
        Order {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds one unit of an item, merging into an existing line if present.
    ///
    /// ## Behavior
    /// - Item already in the order: quantity += 1
    /// - Otherwise: a new line with quantity 1 is appended
    ///
    /// Always succeeds; every accepted scan and manual entry funnels
    /// through here, one unit at a time.
    pub fn add_item(&mut self, item: Arc<CatalogItem>) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.item.id == item.id) {
            line.quantity += 1;
            return;
        }
        self.lines.push(OrderLine::new(item));
    }

    /// Sets the quantity of a line directly.
    ///
    /// ## Behavior
    /// - `quantity <= 0`: behaves exactly like [`Order::remove_item`]
    /// - Item not in the order: no-op
    ///
    /// ## Returns
    /// Whether a line was changed or removed.
    pub fn set_quantity(&mut self, item_id: &str, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(item_id);
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.item.id == item_id) {
            line.quantity = quantity;
            true
        } else {
            false
        }
    }

    /// Removes a line by item id.
    ///
    /// ## Returns
    /// Whether a line was removed (false means the id was not in the order).
    pub fn remove_item(&mut self, item_id: &str) -> bool {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.item.id != item_id);
        self.lines.len() != initial_len
    }

    /// Clears all lines from the order.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    /// Order total: Σ unit price × quantity.
    ///
    /// Recomputed on every call, so there is no cached value to go stale.
    /// Never negative while catalog prices are non-negative (enforced at
    /// catalog load).
    pub fn total(&self) -> Money {
        self.lines.iter().map(|l| l.line_total()).sum()
    }

    /// Returns the number of lines (distinct items).
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Lines in first-scan order.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// When the order was created or last cleared.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Checks if the order is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Snapshot DTOs
// =============================================================================

/// One order line flattened for the UI shell.
///
/// The live [`OrderLine`] holds an `Arc` into the catalog; this view copies
/// the displayed fields out so it serializes as plain data.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderLineView {
    pub item_id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_total: Money,
    pub added_at: DateTime<Utc>,
}

impl From<&OrderLine> for OrderLineView {
    fn from(line: &OrderLine) -> Self {
        OrderLineView {
            item_id: line.item.id.clone(),
            name: line.item.name.clone(),
            unit_price: line.item.price,
            quantity: line.quantity,
            line_total: line.line_total(),
            added_at: line.added_at,
        }
    }
}

/// Order totals summary for the UI shell.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub total: Money,
}

impl From<&Order> for OrderTotals {
    fn from(order: &Order) -> Self {
        OrderTotals {
            line_count: order.line_count(),
            total_quantity: order.total_quantity(),
            total: order.total(),
        }
    }
}

/// Full order snapshot: lines plus totals, taken under one lock.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderSnapshot {
    pub lines: Vec<OrderLineView>,
    pub totals: OrderTotals,
}

impl From<&Order> for OrderSnapshot {
    fn from(order: &Order) -> Self {
        OrderSnapshot {
            lines: order.lines().iter().map(OrderLineView::from).collect(),
            totals: OrderTotals::from(order),
        }
    }
}

// =============================================================================
// Shared Order State
// =============================================================================

/// Shared handle to the running order.
///
/// ## Thread Safety
/// Uses `Arc<Mutex<Order>>` because:
/// - `Arc`: the decode pump and the UI shell hold the same order
/// - `Mutex`: one writer at a time; every operation is a short critical
///   section with no await inside
///
/// ## Why Not RwLock?
/// Order operations are quick and most of them write. A RwLock would add
/// complexity with minimal benefit.
#[derive(Debug, Clone, Default)]
pub struct OrderState {
    order: Arc<Mutex<Order>>,
}

impl OrderState {
    /// Creates a new empty order state.
    pub fn new() -> Self {
        OrderState {
            order: Arc::new(Mutex::new(Order::new())),
        }
    }

    /// Executes a function with read access to the order.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let totals = order_state.with_order(|order| OrderTotals::from(order));
    /// ```
    pub fn with_order<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Order) -> R,
    {
        let order = self.order.lock().expect("Order mutex poisoned");
        f(&order)
    }

    /// Executes a function with write access to the order.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// order_state.with_order_mut(|order| order.add_item(item));
    /// ```
    pub fn with_order_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Order) -> R,
    {
        let mut order = self.order.lock().expect("Order mutex poisoned");
        f(&mut order)
    }

    /// Takes a consistent snapshot of lines and totals under one lock.
    pub fn snapshot(&self) -> OrderSnapshot {
        self.with_order(|order| OrderSnapshot::from(order))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_item(id: &str, price_cents: i64) -> Arc<CatalogItem> {
        Arc::new(CatalogItem {
            id: id.to_string(),
            name: format!("Item {}", id),
            price: Money::from_cents(price_cents),
            barcode: format!("code-{}", id),
        })
    }

    #[test]
    fn test_add_item_creates_line() {
        let mut order = Order::new();
        order.add_item(test_item("b1", 1299));

        assert_eq!(order.line_count(), 1);
        assert_eq!(order.total_quantity(), 1);
        assert_eq!(order.total().cents(), 1299);
    }

    #[test]
    fn test_add_same_item_increments_quantity() {
        let mut order = Order::new();
        let item = test_item("b1", 1299);

        // Three scans of one title: a single line, quantity 3
        order.add_item(Arc::clone(&item));
        order.add_item(Arc::clone(&item));
        order.add_item(item);

        assert_eq!(order.line_count(), 1);
        assert_eq!(order.lines()[0].quantity, 3);
        assert_eq!(order.total().cents(), 3897);
    }

    #[test]
    fn test_lines_keep_first_scan_order() {
        let mut order = Order::new();
        order.add_item(test_item("b2", 200));
        order.add_item(test_item("b1", 100));
        order.add_item(test_item("b2", 200)); // repeat does not reorder

        let ids: Vec<&str> = order.lines().iter().map(|l| l.item.id.as_str()).collect();
        assert_eq!(ids, ["b2", "b1"]);
    }

    #[test]
    fn test_set_quantity() {
        let mut order = Order::new();
        order.add_item(test_item("b1", 500));

        assert!(order.set_quantity("b1", 4));
        assert_eq!(order.lines()[0].quantity, 4);
        assert_eq!(order.total().cents(), 2000);
    }

    #[test]
    fn test_set_quantity_zero_or_below_removes() {
        let mut order = Order::new();
        order.add_item(test_item("b1", 500));
        order.add_item(test_item("b2", 300));

        assert!(order.set_quantity("b1", 0));
        assert_eq!(order.line_count(), 1);

        assert!(order.set_quantity("b2", -3));
        assert!(order.is_empty());
    }

    #[test]
    fn test_missing_item_id_is_noop() {
        let mut order = Order::new();
        order.add_item(test_item("b1", 500));

        assert!(!order.set_quantity("ghost", 2));
        assert!(!order.remove_item("ghost"));
        assert_eq!(order.line_count(), 1);
        assert_eq!(order.lines()[0].quantity, 1);
    }

    #[test]
    fn test_remove_item() {
        let mut order = Order::new();
        order.add_item(test_item("b1", 500));
        order.add_item(test_item("b2", 300));

        assert!(order.remove_item("b1"));
        assert_eq!(order.line_count(), 1);
        assert_eq!(order.lines()[0].item.id, "b2");
        assert_eq!(order.total().cents(), 300);
    }

    #[test]
    fn test_clear() {
        let mut order = Order::new();
        order.add_item(test_item("b1", 500));
        order.add_item(test_item("b2", 300));
        assert!(!order.is_empty());

        order.clear();
        assert!(order.is_empty());
        assert!(order.total().is_zero());
    }

    #[test]
    fn test_total_spans_lines() {
        let mut order = Order::new();
        let dune = test_item("b1", 1299);
        order.add_item(Arc::clone(&dune));
        order.add_item(dune);
        order.add_item(test_item("b2", 850));

        // 2 × $12.99 + $8.50
        assert_eq!(order.total().cents(), 3448);
        assert_eq!(order.total_quantity(), 3);
    }

    #[test]
    fn test_snapshot_views() {
        let mut order = Order::new();
        order.add_item(test_item("b1", 1299));
        order.add_item(test_item("b1", 1299));

        let snapshot = OrderSnapshot::from(&order);
        assert_eq!(snapshot.lines.len(), 1);
        assert_eq!(snapshot.lines[0].quantity, 2);
        assert_eq!(snapshot.lines[0].line_total.cents(), 2598);
        assert_eq!(snapshot.totals.total.cents(), 2598);
        assert_eq!(snapshot.totals.line_count, 1);
    }

    #[test]
    fn test_order_state_is_shared() {
        let state = OrderState::new();
        let pump_side = state.clone();

        pump_side.with_order_mut(|order| order.add_item(test_item("b1", 999)));

        let totals = state.with_order(|order| OrderTotals::from(order));
        assert_eq!(totals.total_quantity, 1);
        assert_eq!(totals.total.cents(), 999);
    }
}
