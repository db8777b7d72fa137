//! Client metrics
//!
//! OpenTelemetry instruments recorded by both transports when metrics are
//! enabled on the [`crate::ClientBuilder`]. They are exported by whatever
//! meter provider is installed globally, normally the one set up by
//! `ariarpc_core::init_observability`.
//!
//! # Metrics Collected
//!
//! - **ariarpc.client.calls.total**: calls by method and status (counter)
//! - **ariarpc.client.call.duration**: call latency in seconds (histogram)
//! - **ariarpc.client.errors.total**: failures by kind (counter)
//! - **ariarpc.client.backpressure.total**: calls rejected by a full queue (counter)
//! - **ariarpc.client.late_replies.total**: replies with no waiting caller (counter)
//! - **ariarpc.client.notifications.received**: notifications by method (counter)
//! - **ariarpc.client.pending**: pending calls after each change (gauge)

use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Histogram, Meter},
    InstrumentationScope, KeyValue,
};

/// Instruments shared by a transport's tasks
pub struct ClientMetrics {
    pub calls_total: Counter<u64>,
    pub call_duration: Histogram<f64>,
    pub errors_total: Counter<u64>,
    pub backpressure_total: Counter<u64>,
    pub late_replies_total: Counter<u64>,
    pub notifications_received: Counter<u64>,
    pub pending: Gauge<i64>,
}

impl ClientMetrics {
    /// Instruments on the global meter provider
    pub fn new(service_name: impl Into<String>) -> Self {
        let scope = InstrumentationScope::builder(service_name.into())
            .with_version(env!("CARGO_PKG_VERSION"))
            .build();
        Self::new_with_meter(&global::meter_with_scope(scope))
    }

    /// Instruments on a specific meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            calls_total: meter
                .u64_counter("ariarpc.client.calls.total")
                .with_description("Total number of calls by method and status")
                .build(),
            call_duration: meter
                .f64_histogram("ariarpc.client.call.duration")
                .with_description("Call duration in seconds")
                .with_unit("s")
                .build(),
            errors_total: meter
                .u64_counter("ariarpc.client.errors.total")
                .with_description("Total number of failed calls by error kind")
                .build(),
            backpressure_total: meter
                .u64_counter("ariarpc.client.backpressure.total")
                .with_description("Calls rejected because the outbound queue was full")
                .build(),
            late_replies_total: meter
                .u64_counter("ariarpc.client.late_replies.total")
                .with_description("Replies that arrived with no pending call")
                .build(),
            notifications_received: meter
                .u64_counter("ariarpc.client.notifications.received")
                .with_description("Notifications received by method")
                .build(),
            pending: meter
                .i64_gauge("ariarpc.client.pending")
                .with_description("Calls waiting for a reply")
                .build(),
        }
    }

    pub fn record_call(
        &self,
        transport: &'static str,
        method: &str,
        status: &'static str,
        duration_secs: f64,
    ) {
        let attributes = &[
            KeyValue::new("transport", transport),
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status),
        ];
        self.calls_total.add(1, attributes);
        self.call_duration.record(duration_secs, attributes);
    }

    pub fn record_error(&self, kind: &'static str) {
        self.errors_total.add(1, &[KeyValue::new("error_kind", kind)]);
        if kind == "backpressure" {
            self.backpressure_total.add(1, &[]);
        }
    }

    pub fn record_late_reply(&self) {
        self.late_replies_total.add(1, &[]);
    }

    pub fn record_notification(&self, method: &str) {
        self.notifications_received
            .add(1, &[KeyValue::new("method", method.to_string())]);
    }

    pub fn record_pending(&self, count: usize) {
        self.pending.record(count as i64, &[]);
    }
}
