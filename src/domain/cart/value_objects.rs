use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Cart Value Objects
// ============================================================================

/// Identity of a line item, time-ordered and unique within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(Uuid);

impl LineItemId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for LineItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for LineItemId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// Image Previews
// ============================================================================
//
// The file picker hands the cart an opaque preview handle per selected image.
// A handle is owned by exactly one draft or line item and is released back to
// its host when dropped: on replacement, on removal, and when the cart is
// sealed into an order. Orders never carry image data.
//
// ============================================================================

/// Owner of preview resources (object URLs, thumbnails, ...)
pub trait PreviewHost: Send + Sync {
    fn release(&self, key: &str);
}

/// Display-only reference to a picked image
pub struct PreviewHandle {
    key: String,
    host: Arc<dyn PreviewHost>,
}

impl PreviewHandle {
    pub fn new(key: impl Into<String>, host: Arc<dyn PreviewHost>) -> Self {
        Self {
            key: key.into(),
            host,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        tracing::debug!(preview = %self.key, "Releasing image preview");
        self.host.release(&self.key);
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle").field("key", &self.key).finish()
    }
}

/// A picked image: preview handle plus the raw file bytes, if loaded
pub struct ImageAttachment {
    pub preview: PreviewHandle,
    pub payload: Option<Vec<u8>>,
}

impl ImageAttachment {
    pub fn new(preview: PreviewHandle) -> Self {
        Self {
            preview,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = Some(payload);
        self
    }
}

impl fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("preview", &self.preview)
            .field("payload_bytes", &self.payload.as_ref().map(Vec::len))
            .finish()
    }
}

// ============================================================================
// Draft & Line Item
// ============================================================================

/// The "new item" form state
///
/// Quantity is kept as raw signed input so that bad values can be rejected
/// with a message instead of being unrepresentable.
#[derive(Debug, Default)]
pub struct LineItemDraft {
    pub drug_name: String,
    pub quantity: Option<i64>,
    pub notes: Option<String>,
    image: Option<ImageAttachment>,
}

impl LineItemDraft {
    pub fn new(drug_name: impl Into<String>) -> Self {
        Self {
            drug_name: drug_name.into(),
            ..Self::default()
        }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.attach_image(image);
        self
    }

    /// Replaces any previous image; the old preview is released
    pub fn attach_image(&mut self, image: ImageAttachment) {
        self.image = Some(image);
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    pub fn image(&self) -> Option<&ImageAttachment> {
        self.image.as_ref()
    }

    pub(crate) fn take_image(&mut self) -> Option<ImageAttachment> {
        self.image.take()
    }

    /// Back to the empty form; any attached preview is released
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_blank(&self) -> bool {
        self.drug_name.is_empty()
            && self.quantity.is_none()
            && self.notes.is_none()
            && self.image.is_none()
    }
}

/// A validated entry in the cart
#[derive(Debug)]
pub struct LineItem {
    pub id: LineItemId,
    pub drug_name: String,
    pub quantity: u32,
    pub notes: Option<String>,
    pub image: Option<ImageAttachment>,
}


#[cfg(test)]
mod tests {
    use super::test_support::RecordingHost;
    use super::*;

    #[test]
    fn test_line_item_ids_are_unique_and_ordered() {
        let first = LineItemId::new();
        let second = LineItemId::new();
        assert_ne!(first, second);
        assert!(first < second);
    }

    #[test]
    fn test_replacing_draft_image_releases_previous_preview() {
        let host = Arc::new(RecordingHost::default());
        let mut draft = LineItemDraft::new("Panadol")
            .with_image(ImageAttachment::new(PreviewHandle::new("blob:1", host.clone())));

        draft.attach_image(ImageAttachment::new(PreviewHandle::new("blob:2", host.clone())));
        assert_eq!(host.released(), vec!["blob:1"]);
        assert_eq!(draft.image().unwrap().preview.key(), "blob:2");

        draft.clear();
        assert_eq!(host.released(), vec!["blob:1", "blob:2"]);
        assert!(draft.is_blank());
    }

    #[test]
    fn test_attachment_debug_hides_payload_bytes() {
        let host = Arc::new(RecordingHost::default());
        let image = ImageAttachment::new(PreviewHandle::new("blob:9", host)).with_payload(vec![0; 2048]);

        let rendered = format!("{image:?}");
        assert!(rendered.contains("payload_bytes: Some(2048)"));
        assert!(rendered.contains("blob:9"));
    }
}
