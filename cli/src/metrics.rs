//! # Prometheus Metrics
//!
//! Counters for one simulation run. Kept in a dedicated
//! [`prometheus::Registry`] under the `strongroom` prefix and dumped in text
//! exposition format when `--metrics` is given.

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

/// Holds all Prometheus metric handles for a run.
#[derive(Clone)]
pub struct SimulationMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Tickets handed out by executed proposals.
    pub tickets_issued_total: IntCounter,
    /// Assets that left the vault through a ticket.
    pub assets_redeemed_total: IntCounter,
    /// Assets sent back to the vault through a borrow ticket.
    pub assets_returned_total: IntCounter,
    /// Tickets retired with both ledgers empty.
    pub tickets_retired_total: IntCounter,
    /// Approvals, executions and ticket operations that were refused.
    pub rejected_operations_total: IntCounter,
}

impl SimulationMetrics {
    /// Creates and registers all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("strongroom".into()), None)?;

        let counter = |name: &str, help: &str| -> Result<IntCounter, prometheus::Error> {
            let c = IntCounter::new(name, help)?;
            registry.register(Box::new(c.clone()))?;
            Ok(c)
        };

        let tickets_issued_total =
            counter("tickets_issued_total", "Tickets issued by executed proposals")?;
        let assets_redeemed_total =
            counter("assets_redeemed_total", "Assets taken out of the vault by ticket")?;
        let assets_returned_total =
            counter("assets_returned_total", "Borrowed assets returned to the vault")?;
        let tickets_retired_total =
            counter("tickets_retired_total", "Tickets retired after full accounting")?;
        let rejected_operations_total = counter(
            "rejected_operations_total",
            "Approvals, executions and ticket operations that were refused",
        )?;

        Ok(Self {
            registry,
            tickets_issued_total,
            assets_redeemed_total,
            assets_returned_total,
            tickets_retired_total,
            rejected_operations_total,
        })
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
