use std::fmt;

// ============================================================================
// Session Health - Persistence and scheduler, folded into one verdict
// ============================================================================
//
// A session has exactly two moving parts. Persistence degrades when writes
// fail and the collection lives only in memory; the scheduler is unhealthy
// once its task has stopped. Orders stay readable in both cases.
//
// ============================================================================

/// Severity, ordered so the worst component decides the session verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum HealthStatus {
    #[default]
    Healthy,
    /// Still serving orders, with reduced guarantees
    Degraded,
    Unhealthy,
}

/// A session component together with the facts its verdict is based on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Persistence {
        key: String,
        consecutive_failures: u32,
        in_memory_only: bool,
    },
    Scheduler {
        ticks: u64,
        running: bool,
    },
}

impl Component {
    pub fn name(&self) -> &'static str {
        match self {
            Component::Persistence { .. } => "persistence",
            Component::Scheduler { .. } => "scheduler",
        }
    }
}

/// Verdict for one component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentHealth {
    pub component: Component,
    pub status: HealthStatus,
    /// Set whenever the status is not `Healthy`
    pub reason: Option<String>,
}

impl ComponentHealth {
    pub fn healthy(component: Component) -> Self {
        Self {
            component,
            status: HealthStatus::Healthy,
            reason: None,
        }
    }

    pub fn degraded(component: Component, reason: impl Into<String>) -> Self {
        Self {
            component,
            status: HealthStatus::Degraded,
            reason: Some(reason.into()),
        }
    }

    pub fn unhealthy(component: Component, reason: impl Into<String>) -> Self {
        Self {
            component,
            status: HealthStatus::Unhealthy,
            reason: Some(reason.into()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.component.name()
    }
}

impl fmt::Display for ComponentHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {}", self.name(), reason),
            None => write!(f, "{}: ok", self.name()),
        }
    }
}

/// Implemented by the write-through sink and the scheduler handle
pub trait ReportsHealth {
    fn health(&self) -> ComponentHealth;
}

/// Point-in-time view over every component of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHealth {
    pub overall_status: HealthStatus,
    pub components: Vec<ComponentHealth>,
}

impl SessionHealth {
    pub fn from_components(components: Vec<ComponentHealth>) -> Self {
        let overall_status = components
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or_default();
        Self {
            overall_status,
            components,
        }
    }

    pub fn component(&self, name: &str) -> Option<&ComponentHealth> {
        self.components.iter().find(|c| c.name() == name)
    }

    /// True once persistence has given up and changes live only in memory
    pub fn is_in_memory_only(&self) -> bool {
        self.components.iter().any(|c| {
            matches!(
                c.component,
                Component::Persistence {
                    in_memory_only: true,
                    ..
                }
            )
        })
    }

    /// Reasons of every non-healthy component, `"ok"` when there are none
    pub fn summary(&self) -> String {
        let reasons: Vec<String> = self
            .components
            .iter()
            .filter(|c| c.status != HealthStatus::Healthy)
            .map(ToString::to_string)
            .collect();

        if reasons.is_empty() {
            "ok".to_string()
        } else {
            reasons.join("; ")
        }
    }
}
