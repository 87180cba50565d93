use super::value_objects::OrderStatus;

/// Per-transition chance that an order moves on during one tick
///
/// Simulation knobs, defaulting to 30% / 30% / 20%. Every value is clamped
/// to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressionPolicy {
    accept: f64,
    dispatch: f64,
    deliver: f64,
}

impl ProgressionPolicy {
    pub const DEFAULT_ACCEPT: f64 = 0.3;
    pub const DEFAULT_DISPATCH: f64 = 0.3;
    pub const DEFAULT_DELIVER: f64 = 0.2;

    pub fn new(accept: f64, dispatch: f64, deliver: f64) -> Self {
        Self {
            accept: clamp_probability(accept),
            dispatch: clamp_probability(dispatch),
            deliver: clamp_probability(deliver),
        }
    }

    /// Every order advances on every tick
    pub fn always() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    /// Nothing ever advances
    pub fn frozen() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// `PENDING → ACCEPTED`
    pub fn accept(&self) -> f64 {
        self.accept
    }

    /// `ACCEPTED → ON_DELIVERY`
    pub fn dispatch(&self) -> f64 {
        self.dispatch
    }

    /// `ON_DELIVERY → DELIVERED`
    pub fn deliver(&self) -> f64 {
        self.deliver
    }

    /// Chance of leaving `from` on a single tick
    pub fn probability(&self, from: OrderStatus) -> f64 {
        match from {
            OrderStatus::Pending => self.accept,
            OrderStatus::Accepted => self.dispatch,
            OrderStatus::OnDelivery => self.deliver,
            OrderStatus::Delivered => 0.0,
        }
    }

    /// A roll in `[0, 1)` passes when it falls under the probability
    pub fn passes(&self, from: OrderStatus, roll: f64) -> bool {
        roll < self.probability(from)
    }
}

impl Default for ProgressionPolicy {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_ACCEPT,
            Self::DEFAULT_DISPATCH,
            Self::DEFAULT_DELIVER,
        )
    }
}

fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}
