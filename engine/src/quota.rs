//! Per-tenant step quota
//!
//! The executor reserves capacity through [`sdk::tool::QuotaGate`] before
//! every step. [`InMemoryQuotaGate`] is the reference implementation: a
//! daily per-tenant counter behind a mutex, safe for many concurrently
//! running executors. Hosts with durable accounting supply their own gate.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sdk::tool::{QuotaDecision, QuotaGate};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::warn;

struct TenantUsage {
    day: NaiveDate,
    used: u64,
}

/// Daily per-tenant step counter.
pub struct InMemoryQuotaGate {
    daily_limit: u64,
    usage: Mutex<HashMap<String, TenantUsage>>,
}

impl InMemoryQuotaGate {
    pub fn new(daily_limit: u64) -> Self {
        Self {
            daily_limit,
            usage: Mutex::new(HashMap::new()),
        }
    }

    /// Steps used today by a tenant. Zero for unknown tenants.
    pub fn used_today(&self, tenant_id: &str) -> u64 {
        let usage = match self.usage.lock() {
            Ok(usage) => usage,
            Err(poisoned) => poisoned.into_inner(),
        };
        let today = Utc::now().date_naive();
        usage
            .get(tenant_id)
            .filter(|u| u.day == today)
            .map_or(0, |u| u.used)
    }
}

#[async_trait]
impl QuotaGate for InMemoryQuotaGate {
    async fn check_and_reserve(&self, tenant_id: &str) -> QuotaDecision {
        let mut usage = match self.usage.lock() {
            Ok(usage) => usage,
            Err(poisoned) => poisoned.into_inner(),
        };

        let today = Utc::now().date_naive();
        let entry = usage.entry(tenant_id.to_string()).or_insert(TenantUsage {
            day: today,
            used: 0,
        });

        // Counter resets at the day boundary
        if entry.day != today {
            entry.day = today;
            entry.used = 0;
        }

        if entry.used >= self.daily_limit {
            warn!(tenant_id, used = entry.used, limit = self.daily_limit, "quota_denied");
            return QuotaDecision::Denied {
                reason: format!(
                    "Daily tool call limit reached ({}/{})",
                    entry.used, self.daily_limit
                ),
            };
        }

        entry.used += 1;
        QuotaDecision::Allowed
    }
}

/// Gate that always allows; for hosts without quota accounting and for tests.
pub struct UnlimitedQuotaGate;

#[async_trait]
impl QuotaGate for UnlimitedQuotaGate {
    async fn check_and_reserve(&self, _tenant_id: &str) -> QuotaDecision {
        QuotaDecision::Allowed
    }
}
