//! Tool capability and quota traits
//!
//! The engine dispatches plan steps through the `Tool` trait and reserves
//! per-tenant capacity through `QuotaGate` before every invocation. Both
//! traits must be safe to call from many concurrent executor instances.

use async_trait::async_trait;

use crate::types::{ToolError, ToolId, ToolInput};

/// A single tool capability: one `ToolId`, one invocation contract.
///
/// Implementations own their safety policy (timeouts, response size caps,
/// destination blocking) independently of the planner's security gate.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The identifier this implementation serves
    fn id(&self) -> ToolId;

    /// Invoke the tool with a fully resolved input.
    ///
    /// Returns the tool's result object. The engine summarizes and caps the
    /// result before persisting anything; implementations may return full
    /// payloads.
    async fn invoke(&self, input: &ToolInput) -> Result<serde_json::Value, ToolError>;
}

/// Outcome of a quota reservation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    /// The step may run; capacity has been reserved
    Allowed,

    /// The step must not run; the run aborts with this reason
    Denied { reason: String },
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotaDecision::Allowed)
    }
}

/// Per-tenant capacity gate, consulted once per step before invocation.
///
/// Implementations are shared across concurrently running executors and must
/// guard their counters internally.
#[async_trait]
pub trait QuotaGate: Send + Sync {
    /// Check the tenant's remaining capacity and reserve one step.
    async fn check_and_reserve(&self, tenant_id: &str) -> QuotaDecision;
}
