//! Prometheus metrics for the Replied server
//!
//! - Submission outcomes and latency
//! - Rate limiter fail-open events
//! - Seal fallbacks (plaintext stored)
//! - Undecodable records skipped on read
//! - Notification delivery results

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, IntCounter, IntCounterVec, TextEncoder, opts, register_histogram,
    register_int_counter, register_int_counter_vec,
};

// ============================================================================
// Submission Metrics
// ============================================================================

/// Submissions by outcome ("accepted" or a rejection reason code)
pub static SUBMISSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "replied_submissions_total",
            "Total number of message submissions by outcome"
        ),
        &["outcome"]
    )
    .expect("Failed to register SUBMISSIONS_TOTAL metric")
});

pub static SUBMISSION_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "replied_submission_duration_seconds",
        "Time spent in the submission pipeline"
    )
    .expect("Failed to register SUBMISSION_DURATION metric")
});

/// Admissions let through because the counter store was unavailable
pub static RATE_LIMITER_FAIL_OPEN_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "replied_rate_limiter_fail_open_total",
        "Admissions allowed because the rate-limit store failed"
    ))
    .expect("Failed to register RATE_LIMITER_FAIL_OPEN_TOTAL metric")
});

/// Messages persisted in plaintext because sealing failed
pub static SEAL_FALLBACK_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "replied_seal_fallback_total",
        "Messages stored without encryption after a seal failure"
    ))
    .expect("Failed to register SEAL_FALLBACK_TOTAL metric")
});

// ============================================================================
// Read Path Metrics
// ============================================================================

/// Stored rows left out of a listing because they did not decode
pub static RECORDS_SKIPPED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "replied_records_skipped_total",
            "Stored records skipped on read because they failed to decode"
        ),
        &["record"]
    )
    .expect("Failed to register RECORDS_SKIPPED_TOTAL metric")
});

// ============================================================================
// Notification Metrics
// ============================================================================

/// Notification attempts by result ("sent", "rejected", "transport_error", "skipped")
pub static NOTIFICATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "replied_notifications_total",
            "Email notification attempts by result"
        ),
        &["result"]
    )
    .expect("Failed to register NOTIFICATIONS_TOTAL metric")
});

/// Render every registered metric in the Prometheus text format
pub fn gather_metrics() -> Result<String> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode(&metric_families, &mut buffer)?;

    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_includes_submission_counter() {
        SUBMISSIONS_TOTAL.with_label_values(&["accepted"]).inc();
        let text = gather_metrics().unwrap();
        assert!(text.contains("replied_submissions_total"));
    }
}
