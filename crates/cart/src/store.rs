//! The authoritative in-process cart store.

use palmetto_core::{Price, ProductId};
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::line::{CartLine, ProductSnapshot};
use crate::storage::CartStorage;

/// Single authoritative store for the shopping cart.
///
/// The store keeps an insertion-ordered list of [`CartLine`]s, one per
/// product id, and writes the full serialized list back to its storage slot
/// after every mutation. Opening the store performs the one-time hydration,
/// so a store value is always past its initial read before any mutation can
/// be issued against it.
///
/// Storage failures are non-fatal: they are logged and the in-memory state
/// continues to serve as the source of truth for the session.
pub struct CartStore<S: CartStorage> {
    lines: Vec<CartLine>,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Open the store, hydrating it from the storage slot.
    ///
    /// A missing slot yields an empty cart. A malformed payload is discarded
    /// (logged at `warn`) and also yields an empty cart; the bad payload is
    /// overwritten by the next mutation.
    pub async fn open(storage: S) -> Self {
        let lines = match storage.load().await {
            Ok(Some(payload)) => match serde_json::from_str::<Vec<CartLine>>(&payload) {
                Ok(lines) => lines,
                Err(e) => {
                    warn!("Discarding malformed persisted cart: {e}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read persisted cart, starting empty: {e}");
                Vec::new()
            }
        };

        Self { lines, storage }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a product to the cart.
    ///
    /// If a line for the product id already exists, its quantity increments
    /// by 1 and the stored display snapshot is left as-is, even when the new
    /// snapshot carries different values (first-write-wins). Otherwise a new
    /// line is appended with quantity 1, not selected.
    pub async fn add_item(&mut self, snapshot: ProductSnapshot) {
        match self.lines.iter_mut().find(|line| line.id == snapshot.id) {
            Some(line) => line.quantity += 1,
            None => self.lines.push(CartLine::from_snapshot(snapshot)),
        }
        self.persist().await;
    }

    /// Remove a line from the cart. Silent no-op if the id is absent.
    pub async fn remove_item(&mut self, id: &ProductId) {
        let before = self.lines.len();
        self.lines.retain(|line| &line.id != id);
        if self.lines.len() != before {
            self.persist().await;
        }
    }

    /// Set a line's quantity exactly.
    ///
    /// A quantity of zero is rejected without mutating anything; callers are
    /// expected to use [`Self::remove_item`] for that case. Silent no-op if
    /// the id is absent.
    pub async fn update_quantity(&mut self, id: &ProductId, quantity: u32) {
        if quantity == 0 {
            debug!(%id, "Rejected quantity update below 1");
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|line| &line.id == id) {
            line.quantity = quantity;
            self.persist().await;
        }
    }

    /// Flip the selection flag of one line. Silent no-op if the id is absent.
    pub async fn toggle_select(&mut self, id: &ProductId) {
        if let Some(line) = self.lines.iter_mut().find(|line| &line.id == id) {
            line.selected = !line.selected;
            self.persist().await;
        }
    }

    /// Toggle selection for all lines, based on the aggregate state.
    ///
    /// If every line is currently selected, all are deselected; otherwise
    /// all are selected. There is no per-line memory of prior flags.
    pub async fn toggle_select_all(&mut self) {
        if self.lines.is_empty() {
            return;
        }
        let select = !self.lines.iter().all(|line| line.selected);
        for line in &mut self.lines {
            line.selected = select;
        }
        self.persist().await;
    }

    /// Empty the cart and persist the empty state.
    pub async fn clear(&mut self) {
        self.lines.clear();
        self.persist().await;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// All lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Look up one line by product id.
    #[must_use]
    pub fn line(&self, id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }

    /// The selected subsequence of lines, preserving insertion order.
    ///
    /// This is the checkout hand-off set; stock and pricing validation is
    /// the order-submission collaborator's job.
    #[must_use]
    pub fn selected_items(&self) -> Vec<&CartLine> {
        self.lines.iter().filter(|line| line.selected).collect()
    }

    /// Sum of `price * quantity` over selected lines.
    ///
    /// Unselected lines contribute nothing.
    #[must_use]
    pub fn total_amount(&self) -> Price {
        self.lines
            .iter()
            .filter(|line| line.selected)
            .map(CartLine::line_total)
            .sum()
    }

    /// Total quantity across all lines (the cart badge count).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Serialize and write the full line list back to the slot.
    ///
    /// Failures are logged and swallowed; the in-memory state stays
    /// authoritative.
    async fn persist(&self) {
        let result: Result<(), StorageError> = async {
            let payload = serde_json::to_string(&self.lines)?;
            self.storage.save(&payload).await
        }
        .await;

        if let Err(e) = result {
            warn!("Failed to persist cart, keeping in-memory state: {e}");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn snapshot(id: &str, price: i64) -> ProductSnapshot {
        ProductSnapshot {
            id: id.into(),
            name: format!("Product {id}"),
            price: Price::from_major(price),
            image: format!("/img/{id}.jpg"),
        }
    }

    async fn store_with(snapshots: &[(&str, i64)]) -> CartStore<MemoryStore> {
        let mut store = CartStore::open(MemoryStore::new()).await;
        for (id, price) in snapshots {
            store.add_item(snapshot(id, *price)).await;
        }
        store
    }

    #[tokio::test]
    async fn test_repeat_add_increments_single_line() {
        let mut store = CartStore::open(MemoryStore::new()).await;
        for _ in 0..3 {
            store.add_item(snapshot("p-1", 10)).await;
        }

        assert_eq!(store.len(), 1);
        assert_eq!(store.line(&"p-1".into()).unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn test_snapshot_is_first_write_wins() {
        let mut store = CartStore::open(MemoryStore::new()).await;
        store.add_item(snapshot("p-1", 10)).await;

        let mut changed = snapshot("p-1", 99);
        changed.name = "Renamed".to_string();
        store.add_item(changed).await;

        let line = store.line(&"p-1".into()).unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.price, Price::from_major(10));
        assert_eq!(line.name, "Product p-1");
    }

    #[tokio::test]
    async fn test_remove_item_absent_is_noop() {
        let mut store = store_with(&[("p-1", 10)]).await;
        store.remove_item(&"missing".into()).await;
        assert_eq!(store.len(), 1);

        store.remove_item(&"p-1".into()).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_update_quantity_zero_rejected() {
        let mut store = store_with(&[("p-1", 10)]).await;
        store.update_quantity(&"p-1".into(), 5).await;
        assert_eq!(store.line(&"p-1".into()).unwrap().quantity, 5);

        store.update_quantity(&"p-1".into(), 0).await;
        assert_eq!(store.line(&"p-1".into()).unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn test_toggle_select_all_aggregate() {
        let mut store = store_with(&[("p-1", 10), ("p-2", 20), ("p-3", 30)]).await;

        // Mixed state: one line selected, so toggle selects everything.
        store.toggle_select(&"p-2".into()).await;
        store.toggle_select_all().await;
        assert!(store.lines().iter().all(|line| line.selected));

        // All selected, so toggle deselects everything.
        store.toggle_select_all().await;
        assert!(store.lines().iter().all(|line| !line.selected));
    }

    #[tokio::test]
    async fn test_toggle_select_all_twice_restores_uniform_state() {
        let mut store = store_with(&[("p-1", 10), ("p-2", 20)]).await;

        store.toggle_select_all().await;
        store.toggle_select_all().await;
        assert!(store.lines().iter().all(|line| !line.selected));
    }

    #[tokio::test]
    async fn test_total_amount_counts_selected_only() {
        let mut store = store_with(&[("p-1", 100), ("p-2", 50)]).await;
        store.update_quantity(&"p-1".into(), 2).await;
        store.toggle_select(&"p-1".into()).await;

        assert_eq!(store.total_amount(), Price::from_major(200));

        store.toggle_select(&"p-2".into()).await;
        assert_eq!(store.total_amount(), Price::from_major(250));
    }

    #[tokio::test]
    async fn test_selected_items_preserve_order() {
        let mut store = store_with(&[("p-1", 1), ("p-2", 2), ("p-3", 3)]).await;
        store.toggle_select(&"p-3".into()).await;
        store.toggle_select(&"p-1".into()).await;

        let ids: Vec<_> = store
            .selected_items()
            .iter()
            .map(|line| line.id.as_str().to_string())
            .collect();
        assert_eq!(ids, ["p-1", "p-3"]);
    }

    #[tokio::test]
    async fn test_item_count_sums_quantities() {
        let mut store = store_with(&[("p-1", 1), ("p-2", 2)]).await;
        store.update_quantity(&"p-1".into(), 4).await;

        assert_eq!(store.item_count(), 5);
    }

    #[tokio::test]
    async fn test_clear_persists_empty_state() {
        let storage = MemoryStore::new();
        let mut store = CartStore::open(storage).await;
        store.add_item(snapshot("p-1", 10)).await;
        store.clear().await;

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_yields_empty_cart() {
        let storage = MemoryStore::with_payload("definitely not json");
        let store = CartStore::open(storage).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_shape_payload_yields_empty_cart() {
        let storage = MemoryStore::with_payload(r#"{"cart": []}"#);
        let store = CartStore::open(storage).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_storage_write_failure_keeps_memory_state() {
        struct FailingStore;

        impl CartStorage for FailingStore {
            async fn load(&self) -> Result<Option<String>, StorageError> {
                Err(std::io::Error::other("read failed").into())
            }

            async fn save(&self, _payload: &str) -> Result<(), StorageError> {
                Err(std::io::Error::other("write failed").into())
            }
        }

        let mut store = CartStore::open(FailingStore).await;
        store.add_item(snapshot("p-1", 10)).await;
        store.update_quantity(&"p-1".into(), 3).await;

        assert_eq!(store.line(&"p-1".into()).unwrap().quantity, 3);
        assert_eq!(store.item_count(), 3);
    }
}
