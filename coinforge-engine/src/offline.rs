//! Offline reconciliation: granting earnings for wall-clock idle time.

/// Amount earned between the checkpoint and the present, assuming the
/// restored production rate held constant over the whole idle interval.
/// A missing or future `saved_at` grants nothing; the grant is never
/// negative or unbounded.
#[must_use]
pub fn reconcile(saved_at: Option<f64>, now: f64, cps: f64) -> f64 {
    let Some(saved_at) = saved_at else {
        return 0.0;
    };
    let elapsed = (now - saved_at).max(0.0);
    if cps > 0.0 && elapsed > 0.0 {
        cps * elapsed
    } else {
        0.0
    }
}
