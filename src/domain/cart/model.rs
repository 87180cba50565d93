use super::errors::ValidationError;
use super::value_objects::{LineItem, LineItemDraft, LineItemId};

// ============================================================================
// Cart - Draft line items awaiting submission
// ============================================================================
//
// Newest item first. The cart is session state only: it is never written to
// durable storage and disappears when sealed into an order.
//
// ============================================================================

#[derive(Debug, Default)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft, prepend it as a new line item, reset the draft
    ///
    /// On error neither the cart nor the draft is touched.
    pub fn add_item(&mut self, draft: &mut LineItemDraft) -> Result<LineItemId, ValidationError> {
        let drug_name = draft.drug_name.trim();
        if drug_name.is_empty() {
            return Err(ValidationError::EmptyDrugName);
        }

        let quantity = match draft.quantity {
            None => 1,
            Some(raw) => u32::try_from(raw)
                .ok()
                .filter(|q| *q >= 1)
                .ok_or(ValidationError::InvalidQuantity(raw))?,
        };

        let item = LineItem {
            id: LineItemId::new(),
            drug_name: drug_name.to_string(),
            quantity,
            notes: draft
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            image: draft.take_image(),
        };
        draft.clear();

        let id = item.id;
        tracing::debug!(
            item_id = %id,
            drug_name = %item.drug_name,
            quantity = item.quantity,
            "Added item to cart"
        );

        self.items.insert(0, item);
        Ok(id)
    }

    /// Returns whether an item was removed; unknown ids are a no-op
    pub fn remove_item(&mut self, id: LineItemId) -> bool {
        match self.items.iter().position(|item| item.id == id) {
            Some(index) => {
                let removed = self.items.remove(index);
                tracing::debug!(item_id = %removed.id, "Removed item from cart");
                true
            }
            None => false,
        }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn get(&self, id: LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Empties the cart, handing the items to the caller (used when sealing)
    pub(crate) fn take_items(&mut self) -> Vec<LineItem> {
        std::mem::take(&mut self.items)
    }
}
