use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::domain::cart::{LineItem, LineItemId};

// ============================================================================
// Order Value Objects
// ============================================================================

/// Delivery status, strictly one-directional:
/// `PENDING → ACCEPTED → ON_DELIVERY → DELIVERED`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Accepted,
    OnDelivery,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::OnDelivery,
        OrderStatus::Delivered,
    ];

    /// The single status that may follow this one, `None` once delivered
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Accepted),
            OrderStatus::Accepted => Some(OrderStatus::OnDelivery),
            OrderStatus::OnDelivery => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Wire name, as stored in snapshots
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::OnDelivery => "ON_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
        }
    }

    /// Operator-facing label
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Accepted => "Processing",
            OrderStatus::OnDelivery => "On Way",
            OrderStatus::Delivered => "Delivered",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable order identifier: `ORD-` plus six digits
///
/// The digits are the tail of the creation time in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub const PREFIX: &'static str = "ORD-";
    const SUFFIX_MODULUS: u64 = 1_000_000;

    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        let millis = at.timestamp_millis().rem_euclid(Self::SUFFIX_MODULUS as i64);
        Self::from_suffix(millis.unsigned_abs())
    }

    pub fn from_suffix(suffix: u64) -> Self {
        Self(format!("{}{:06}", Self::PREFIX, suffix % Self::SUFFIX_MODULUS))
    }

    /// Wraps an arbitrary identifier, e.g. one read back from storage
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn suffix(&self) -> Option<u64> {
        self.0.strip_prefix(Self::PREFIX)?.parse().ok()
    }

    /// Next id in the six-digit space, wrapping after `999999`
    pub fn successor(&self) -> Self {
        Self::from_suffix(self.suffix().map_or(0, |s| s + 1))
    }

    pub(crate) fn space_size() -> u64 {
        Self::SUFFIX_MODULUS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of an item inside a stored order
///
/// Items sealed by this crate carry a `LineItemId`. Snapshots written by
/// older clients used epoch-millis numbers, and anything else that is a
/// string is kept verbatim, so no stored order is lost to its item ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Line(LineItemId),
    Legacy(u64),
    Other(String),
}

impl From<LineItemId> for ItemId {
    fn from(id: LineItemId) -> Self {
        ItemId::Line(id)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Line(id) => id.fmt(f),
            ItemId::Legacy(millis) => millis.fmt(f),
            ItemId::Other(raw) => f.write_str(raw),
        }
    }
}

/// Snapshot of a line item inside an order
///
/// A value copy of the cart entry minus its image, which never leaves the
/// cart. Decoding is lenient: quantities stored as text (`"2"`) are parsed,
/// and a missing or unusable quantity reads as 1; blank or non-text notes
/// read as absent. Unknown fields (`image`, `imagePreview`) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: ItemId,
    pub drug_name: String,
    #[serde(default = "default_quantity", deserialize_with = "lenient_quantity")]
    pub quantity: u32,
    #[serde(default, deserialize_with = "lenient_notes")]
    pub notes: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

fn lenient_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    let parsed = match &raw {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX))
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    Ok(parsed
        .and_then(|q| u32::try_from(q).ok())
        .filter(|q| *q >= 1)
        .unwrap_or_else(default_quantity))
}

fn lenient_notes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

impl From<LineItem> for OrderItem {
    fn from(item: LineItem) -> Self {
        // item.image is dropped here, releasing its preview
        Self {
            id: item.id.into(),
            drug_name: item.drug_name,
            quantity: item.quantity,
            notes: item.notes,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
