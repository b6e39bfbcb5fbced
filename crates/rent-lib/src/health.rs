//! Liveness and readiness for the rent predictor
//!
//! The service is ready once a model artifact is loaded and no component is
//! unhealthy. Overall health is the worst component status. Pipeline health
//! follows prediction outcomes: any failure degrades it, and a run of
//! failures with no success in between marks it unhealthy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Consecutive pipeline failures after which the service stops being ready
pub const UNHEALTHY_AFTER_FAILURES: u32 = 5;

/// Health of one component, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Serving, with problems worth surfacing
    Degraded,
    Unhealthy,
}

/// Parts of the service that report health
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// The loaded model artifact
    Artifact,
    /// Feature assembly and inference
    Pipeline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    pub fn new(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn healthy() -> Self {
        Self::new(ComponentStatus::Healthy, None)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: BTreeMap<Component, ComponentHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Default)]
struct HealthState {
    components: BTreeMap<Component, ComponentHealth>,
    model_version: Option<String>,
    consecutive_failures: u32,
}

/// Shared health state; clones observe the same registry
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    state: Arc<RwLock<HealthState>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_healthy(&self, component: Component) {
        self.state
            .write()
            .await
            .components
            .insert(component, ComponentHealth::healthy());
    }

    /// A prediction completed; clears any failure streak
    pub async fn record_success(&self) {
        if self.state.read().await.consecutive_failures == 0 {
            return;
        }
        let mut state = self.state.write().await;
        state.consecutive_failures = 0;
        state
            .components
            .insert(Component::Pipeline, ComponentHealth::healthy());
    }

    /// A prediction failed inside the pipeline. Rejected user input is not
    /// a failure and must not be reported here.
    pub async fn record_failure(&self, reason: &str) {
        let mut state = self.state.write().await;
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);

        let failures = state.consecutive_failures;
        let status = if failures >= UNHEALTHY_AFTER_FAILURES {
            ComponentStatus::Unhealthy
        } else {
            ComponentStatus::Degraded
        };
        let message = format!("{} consecutive prediction failures, last: {}", failures, reason);
        state
            .components
            .insert(Component::Pipeline, ComponentHealth::new(status, Some(message)));
    }

    /// Record the loaded model and mark the artifact healthy
    pub async fn set_model_loaded(&self, version: impl Into<String>) {
        let mut state = self.state.write().await;
        state.model_version = Some(version.into());
        state
            .components
            .insert(Component::Artifact, ComponentHealth::healthy());
    }

    pub async fn health(&self) -> HealthResponse {
        let state = self.state.read().await;
        HealthResponse {
            status: overall_status(&state.components),
            components: state.components.clone(),
        }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let state = self.state.read().await;

        let reason = if state.model_version.is_none() {
            Some("Model artifact not loaded".to_string())
        } else if overall_status(&state.components) == ComponentStatus::Unhealthy {
            Some("Critical component unhealthy".to_string())
        } else {
            None
        };

        ReadinessResponse {
            ready: reason.is_none(),
            model_version: state.model_version.clone(),
            reason,
        }
    }
}

fn overall_status(components: &BTreeMap<Component, ComponentHealth>) -> ComponentStatus {
    components
        .values()
        .map(|c| c.status)
        .max()
        .unwrap_or(ComponentStatus::Healthy)
}
