//! In-memory shopping cart store.
//!
//! The cart is independent of authentication: it fills up before login and
//! survives auth failures untouched. Every mutation is synchronous, runs to
//! completion, and is infallible - invalid input (zero quantity, unknown
//! product id) degrades to a no-op rather than an error, because cart edits
//! are pure local state transitions with no external resource to fail on.
//!
//! State lives behind a mutex so the store can be shared by handle with the
//! presentation layer and the checkout flow; the lock is only ever held for
//! the duration of one synchronous mutation, never across a suspension
//! point. Subscribers receive a [`CartEvent`] per change through a broadcast
//! channel instead of re-reading the whole store.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::debug;

use quitanda_core::{Price, ProductId};

use crate::models::{CartLine, Product};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A discrete cart change, published to subscribers after each mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// A new line entered the cart.
    LineAdded(ProductId),
    /// An existing line's quantity changed.
    LineUpdated(ProductId),
    /// A line left the cart.
    LineRemoved(ProductId),
    /// The whole cart was emptied.
    Cleared,
}

/// Authoritative in-memory cart.
///
/// Lines keep first-added order, one line per product id. Totals are always
/// computed from the lines, never cached, so they cannot desync.
#[derive(Debug)]
pub struct CartStore {
    lines: Mutex<Vec<CartLine>>,
    events: broadcast::Sender<CartEvent>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            lines: Mutex::new(Vec::new()),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CartLine>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to cart change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.events.subscribe()
    }

    /// Add `quantity` units of `product` to the cart.
    ///
    /// If the product is already in the cart its line quantity is
    /// incremented; otherwise a new line is appended. A zero quantity is a
    /// no-op. Stock is not checked here - quantity selectors clamp before
    /// calling, and the remote side revalidates at submission.
    pub fn add_item(&self, product: &Product, quantity: u32) {
        if quantity == 0 {
            return;
        }

        let event = {
            let mut lines = self.lock();
            if let Some(line) = lines.iter_mut().find(|l| l.product_id == product.id) {
                line.quantity += quantity;
                debug!(product_id = %product.id, quantity = line.quantity, "cart line incremented");
                CartEvent::LineUpdated(product.id)
            } else {
                lines.push(CartLine {
                    product_id: product.id,
                    name: product.name.clone(),
                    unit_price: product.price,
                    quantity,
                    image_url: product.image_url.clone(),
                });
                debug!(product_id = %product.id, quantity, "cart line added");
                CartEvent::LineAdded(product.id)
            }
        };
        self.publish(event);
    }

    /// Set the quantity of an existing line.
    ///
    /// A quantity of zero removes the line entirely, same as
    /// [`remove_item`](Self::remove_item). Unknown product ids are a no-op.
    pub fn update_quantity(&self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove_item(product_id);
            return;
        }

        let updated = {
            let mut lines = self.lock();
            match lines.iter_mut().find(|l| l.product_id == product_id) {
                Some(line) => {
                    line.quantity = quantity;
                    true
                }
                None => false,
            }
        };
        if updated {
            debug!(%product_id, quantity, "cart line quantity set");
            self.publish(CartEvent::LineUpdated(product_id));
        }
    }

    /// Remove a line from the cart. No-op if the product is not in the cart.
    pub fn remove_item(&self, product_id: ProductId) {
        let removed = {
            let mut lines = self.lock();
            let before = lines.len();
            lines.retain(|l| l.product_id != product_id);
            lines.len() != before
        };
        if removed {
            debug!(%product_id, "cart line removed");
            self.publish(CartEvent::LineRemoved(product_id));
        }
    }

    /// Empty the cart.
    ///
    /// Called by the checkout flow after a successful submission, or directly
    /// by the user.
    pub fn clear(&self) {
        let cleared = {
            let mut lines = self.lock();
            if lines.is_empty() {
                false
            } else {
                lines.clear();
                true
            }
        };
        if cleared {
            debug!("cart cleared");
            self.publish(CartEvent::Cleared);
        }
    }

    /// A copy of the current lines in first-added order.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.lock().clone()
    }

    /// The lines and total price captured in one consistent view.
    ///
    /// This is what the checkout flow submits: mutations made after the
    /// snapshot do not affect it.
    #[must_use]
    pub fn snapshot(&self) -> (Vec<CartLine>, Price) {
        let lines = self.lock();
        let total = lines.iter().map(CartLine::line_total).sum();
        (lines.clone(), total)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether the cart has a line for this product.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.lock().iter().any(|l| l.product_id == product_id)
    }

    /// Quantity of a product currently in the cart, zero if absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.lock()
            .iter()
            .find(|l| l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.lock().iter().map(|l| l.quantity).sum()
    }

    /// Sum of `unit_price x quantity` over all lines.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.lock().iter().map(CartLine::line_total).sum()
    }

    fn publish(&self, event: CartEvent) {
        // A send error just means nobody is subscribed right now.
        let _ = self.events.send(event);
    }
}
