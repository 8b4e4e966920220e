use prometheus::{
    Encoder, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub bid_transitions_total: IntCounterVec,
    pub lifecycle_events_in_queue: IntGauge,
    pub notifications_total: IntCounterVec,
    pub bookings_by_milestone: IntGaugeVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let bid_transitions_total = IntCounterVec::new(
            Opts::new("bid_transitions_total", "Bid status transitions by target status"),
            &["to"],
        )
        .expect("valid bid_transitions_total metric");

        let lifecycle_events_in_queue = IntGauge::new(
            "lifecycle_events_in_queue",
            "Lifecycle events waiting for the notifier",
        )
        .expect("valid lifecycle_events_in_queue metric");

        let notifications_total = IntCounterVec::new(
            Opts::new("notifications_total", "Notifications created by kind"),
            &["kind"],
        )
        .expect("valid notifications_total metric");

        let bookings_by_milestone = IntGaugeVec::new(
            Opts::new("bookings_by_milestone", "Open bookings per shipment milestone"),
            &["milestone"],
        )
        .expect("valid bookings_by_milestone metric");

        registry
            .register(Box::new(bid_transitions_total.clone()))
            .expect("register bid_transitions_total");
        registry
            .register(Box::new(lifecycle_events_in_queue.clone()))
            .expect("register lifecycle_events_in_queue");
        registry
            .register(Box::new(notifications_total.clone()))
            .expect("register notifications_total");
        registry
            .register(Box::new(bookings_by_milestone.clone()))
            .expect("register bookings_by_milestone");

        Self {
            registry,
            bid_transitions_total,
            lifecycle_events_in_queue,
            notifications_total,
            bookings_by_milestone,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
