//! Decile lift analysis.
//!
//! Customers are ranked descending by predicted probability and cut into ten
//! equal-sized bins; decile 1 holds the highest probabilities. Lift compares
//! each bin's response rate to the overall baseline, so the cumulative lift
//! of the first k deciles describes a "target the top k/10" campaign.

use serde::Serialize;

/// One row of the lift table.
#[derive(Debug, Clone, Serialize)]
pub struct LiftRow {
    /// 1-based bin number; decile 1 is the highest-probability bin.
    pub decile: usize,
    pub count: usize,
    pub positive_count: usize,
    pub response_rate: f64,
    pub lift: f64,
    pub cumulative_count: usize,
    pub cumulative_positive: usize,
    pub cumulative_response_rate: f64,
    pub cumulative_lift: f64,
}

/// Compute the lift table over `bins` rank bins (usually 10).
///
/// `ranked_labels` must already be sorted descending by probability. Bin
/// sizes differ by at most one; the first `n % bins` bins take the extra
/// element. A zero baseline response rate yields zero lift everywhere.
pub(crate) fn lift_table(ranked_labels: &[u8], bins: usize) -> Vec<LiftRow> {
    let n = ranked_labels.len();
    if n == 0 || bins == 0 {
        return Vec::new();
    }
    let bins = bins.min(n);

    let total_positive = ranked_labels.iter().filter(|&&l| l == 1).count();
    let baseline = total_positive as f64 / n as f64;

    let base_size = n / bins;
    let remainder = n % bins;

    let mut rows = Vec::with_capacity(bins);
    let mut start = 0usize;
    let mut cumulative_count = 0usize;
    let mut cumulative_positive = 0usize;

    for decile in 1..=bins {
        let size = base_size + usize::from(decile <= remainder);
        let slice = &ranked_labels[start..start + size];
        let positive_count = slice.iter().filter(|&&l| l == 1).count();
        let response_rate = positive_count as f64 / size as f64;

        cumulative_count += size;
        cumulative_positive += positive_count;
        let cumulative_response_rate = cumulative_positive as f64 / cumulative_count as f64;

        let (lift, cumulative_lift) = if baseline > 0.0 {
            (response_rate / baseline, cumulative_response_rate / baseline)
        } else {
            (0.0, 0.0)
        };

        rows.push(LiftRow {
            decile,
            count: size,
            positive_count,
            response_rate,
            lift,
            cumulative_count,
            cumulative_positive,
            cumulative_response_rate,
            cumulative_lift,
        });
        start += size;
    }

    rows
}
