//! Probability-ranking primitives shared by the ranking metrics.

use tracing::warn;

/// Indices sorted descending by probability.
///
/// The sort is stable, so equal probabilities keep their input order; every
/// ranking metric built on this is deterministic across runs.
pub(crate) fn ranked_indices(proba: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..proba.len()).collect();
    indices.sort_by(|&a, &b| {
        proba[b]
            .partial_cmp(&proba[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices
}

/// ROC-AUC via the rank-sum statistic with tie-averaged ranks.
///
/// A single-class input has no ranking to measure; it scores 0.5 with a
/// warning rather than failing.
pub(crate) fn roc_auc(labels: &[u8], proba: &[f64]) -> f64 {
    let n = labels.len();
    let positives = labels.iter().filter(|&&l| l == 1).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
        warn!("ROC-AUC is undefined for single-class labels; returning 0.5");
        return 0.5;
    }

    // Ascending by probability; ties share the average of their rank range.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        proba[a]
            .partial_cmp(&proba[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut rank_sum_positive = 0.0f64;
    let mut i = 0usize;
    while i < n {
        let mut j = i;
        while j + 1 < n && proba[order[j + 1]] == proba[order[i]] {
            j += 1;
        }
        // Ranks are 1-based; the tie group [i, j] all get the mean rank.
        let average_rank = ((i + 1 + j + 1) as f64) / 2.0;
        for &idx in &order[i..=j] {
            if labels[idx] == 1 {
                rank_sum_positive += average_rank;
            }
        }
        i = j + 1;
    }

    let positives = positives as f64;
    let negatives = negatives as f64;
    (rank_sum_positive - positives * (positives + 1.0) / 2.0) / (positives * negatives)
}

/// PR-AUC as average precision: the precision at each recall step, weighted
/// by the recall gained there. Equal probabilities form one threshold group.
pub(crate) fn average_precision(labels: &[u8], proba: &[f64]) -> f64 {
    let total_positive = labels.iter().filter(|&&l| l == 1).count();
    if total_positive == 0 {
        warn!("PR-AUC is undefined without positive labels; returning 0.0");
        return 0.0;
    }

    let order = ranked_indices(proba);
    let n = order.len();

    let mut ap = 0.0f64;
    let mut true_positives = 0usize;
    let mut seen = 0usize;
    let mut previous_tp = 0usize;

    let mut i = 0usize;
    while i < n {
        let mut j = i;
        while j + 1 < n && proba[order[j + 1]] == proba[order[i]] {
            j += 1;
        }
        for &idx in &order[i..=j] {
            if labels[idx] == 1 {
                true_positives += 1;
            }
            seen += 1;
        }
        let precision = true_positives as f64 / seen as f64;
        let recall_gain = (true_positives - previous_tp) as f64 / total_positive as f64;
        ap += precision * recall_gain;
        previous_tp = true_positives;
        i = j + 1;
    }

    ap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranked_indices_descending_and_stable() {
        let proba = [0.2, 0.9, 0.5, 0.5, 0.1];
        assert_eq!(ranked_indices(&proba), vec![1, 2, 3, 0, 4]);
    }

    #[test]
    fn test_perfect_separation() {
        let labels = [0, 0, 1, 1];
        let proba = [0.1, 0.2, 0.8, 0.9];
        assert!((roc_auc(&labels, &proba) - 1.0).abs() < 1e-12);
        assert!((average_precision(&labels, &proba) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverted_ranking() {
        let labels = [1, 1, 0, 0];
        let proba = [0.1, 0.2, 0.8, 0.9];
        assert!(roc_auc(&labels, &proba).abs() < 1e-12);
    }

    #[test]
    fn test_ties_averaged() {
        // One positive and one negative share a probability: AUC 0.5.
        let labels = [0, 1];
        let proba = [0.5, 0.5];
        assert!((roc_auc(&labels, &proba) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_single_class_is_half() {
        let labels = [1, 1, 1];
        let proba = [0.1, 0.5, 0.9];
        assert_eq!(roc_auc(&labels, &proba), 0.5);
    }

    #[test]
    fn test_average_precision_known_value() {
        // Ranked: 1, 0, 1, 0. AP = 1/1 * 1/2 + 2/3 * 1/2 = 5/6.
        let labels = [1, 0, 1, 0];
        let proba = [0.9, 0.8, 0.7, 0.6];
        assert!((average_precision(&labels, &proba) - 5.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_average_precision_no_positives() {
        let labels = [0, 0];
        let proba = [0.4, 0.6];
        assert_eq!(average_precision(&labels, &proba), 0.0);
    }
}
