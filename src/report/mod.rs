//! Per-label evaluation reporting.
//!
//! Two engines assemble one metric row per label into a single table:
//! cross-validated (means plus standard deviations) and held-out (one
//! battery on the test partition). Precision-recall curve plots hang off
//! the held-out engine.
pub mod plots;
pub mod report;

pub use report::{
    cv_multi_report, heldout_multi_report, score_report, HeldOutSettings, MetricRow, MetricTable,
    ModelChoice, ReportOutcome,
};
