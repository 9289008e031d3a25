//! Model evaluation over aligned (label, prediction, probability) arrays.
//!
//! A pure function of its three inputs: no coupling to the feature pipeline
//! or to any model implementation.

use crate::error::{EvalError, Result};
use crate::lift::{lift_table, LiftRow};
use crate::ranking::{average_precision, ranked_indices, roc_auc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Default targeting sizes for precision@k / recall@k.
pub const DEFAULT_K_VALUES: [usize; 4] = [10, 20, 50, 100];

/// Default targeting sizes for the ROI metrics.
pub const DEFAULT_ROI_TARGETS: [usize; 3] = [100, 500, 1000];

/// Core classification and ranking metrics.
#[derive(Debug, Clone, Serialize)]
pub struct BasicMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub roc_auc: f64,
    pub pr_auc: f64,
}

/// Campaign economics at one targeting size.
#[derive(Debug, Clone, Serialize)]
pub struct RoiMetrics {
    pub targeted: usize,
    pub total_cost: f64,
    pub expected_conversions: usize,
    pub expected_revenue: f64,
    pub net_profit: f64,
    pub roi: f64,
}

/// Evaluates one model's predictions against the true labels.
///
/// All ranking metrics order customers descending by probability with a
/// stable tie-break on input order, so repeated runs agree exactly.
pub struct Evaluator {
    y_true: Vec<u8>,
    y_pred: Vec<u8>,
    y_proba: Vec<f64>,
    /// Input indices ranked descending by probability, computed once.
    ranking: Vec<usize>,
}

impl Evaluator {
    /// Validate and wrap aligned label/prediction/probability arrays.
    pub fn new(y_true: Vec<u8>, y_pred: Vec<u8>, y_proba: Vec<f64>) -> Result<Self> {
        if y_true.is_empty() {
            return Err(EvalError::EmptyInput);
        }
        if y_pred.len() != y_true.len() {
            return Err(EvalError::LengthMismatch {
                expected: y_true.len(),
                actual: y_pred.len(),
            });
        }
        if y_proba.len() != y_true.len() {
            return Err(EvalError::LengthMismatch {
                expected: y_true.len(),
                actual: y_proba.len(),
            });
        }
        for (index, &value) in y_true.iter().enumerate() {
            if value > 1 {
                return Err(EvalError::InvalidLabel { index, value });
            }
        }

        let ranking = ranked_indices(&y_proba);
        Ok(Self {
            y_true,
            y_pred,
            y_proba,
            ranking,
        })
    }

    pub fn len(&self) -> usize {
        self.y_true.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y_true.is_empty()
    }

    /// Accuracy, precision, recall, F1, ROC-AUC and PR-AUC.
    ///
    /// Precision, recall and F1 treat an empty denominator as 0 rather than
    /// failing on degenerate predictions.
    pub fn basic_metrics(&self) -> BasicMetrics {
        let n = self.len() as f64;
        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut fn_ = 0usize;
        let mut correct = 0usize;
        for (&truth, &pred) in self.y_true.iter().zip(&self.y_pred) {
            if truth == pred {
                correct += 1;
            }
            match (truth, pred) {
                (1, 1) => tp += 1,
                (0, 1) => fp += 1,
                (1, 0) => fn_ += 1,
                _ => {}
            }
        }

        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        let metrics = BasicMetrics {
            accuracy: correct as f64 / n,
            precision,
            recall,
            f1_score,
            roc_auc: roc_auc(&self.y_true, &self.y_proba),
            pr_auc: average_precision(&self.y_true, &self.y_proba),
        };
        info!(
            "Basic metrics: accuracy={:.3} roc_auc={:.3} pr_auc={:.3}",
            metrics.accuracy, metrics.roc_auc, metrics.pr_auc
        );
        metrics
    }

    /// Positive rate among the top-k customers by probability.
    ///
    /// A `k` beyond the input size falls back to the overall positive rate.
    pub fn precision_at_k(&self, k_values: &[usize]) -> BTreeMap<usize, f64> {
        let positives = self.positive_count();
        k_values
            .iter()
            .map(|&k| {
                let precision = if k == 0 {
                    0.0
                } else if k <= self.len() {
                    let hits = self.top_k_positives(k);
                    hits as f64 / k as f64
                } else {
                    positives as f64 / self.len() as f64
                };
                (k, precision)
            })
            .collect()
    }

    /// Share of all positives captured in the top-k customers.
    ///
    /// A `k` beyond the input size captures everything (1.0). With no
    /// positives at all, recall is 0.
    pub fn recall_at_k(&self, k_values: &[usize]) -> BTreeMap<usize, f64> {
        let positives = self.positive_count();
        k_values
            .iter()
            .map(|&k| {
                let recall = if positives == 0 {
                    0.0
                } else if k <= self.len() {
                    self.top_k_positives(k) as f64 / positives as f64
                } else {
                    1.0
                };
                (k, recall)
            })
            .collect()
    }

    /// Lift table over ten probability-rank deciles. See [`LiftRow`].
    pub fn calculate_lift(&self) -> Vec<LiftRow> {
        self.calculate_lift_with_bins(10)
    }

    /// Lift table over an arbitrary number of equal-sized probability-rank
    /// bins.
    pub fn calculate_lift_with_bins(&self, bins: usize) -> Vec<LiftRow> {
        let ranked: Vec<u8> = self.ranking.iter().map(|&i| self.y_true[i]).collect();
        lift_table(&ranked, bins)
    }

    /// ROI of "contact the top k" campaigns at the given targeting sizes.
    ///
    /// Targeting sizes beyond the customer count are skipped.
    pub fn business_metrics(
        &self,
        marketing_cost: f64,
        conversion_value: f64,
        targets: &[usize],
    ) -> Vec<RoiMetrics> {
        targets
            .iter()
            .filter(|&&k| k > 0 && k <= self.len())
            .map(|&k| {
                let total_cost = k as f64 * marketing_cost;
                let expected_conversions = self.top_k_positives(k);
                let expected_revenue = expected_conversions as f64 * conversion_value;
                let net_profit = expected_revenue - total_cost;
                // A free campaign has no meaningful return ratio; report 0
                // instead of dividing by zero.
                let roi = if total_cost > 0.0 {
                    net_profit / total_cost
                } else {
                    0.0
                };
                RoiMetrics {
                    targeted: k,
                    total_cost,
                    expected_conversions,
                    expected_revenue,
                    net_profit,
                    roi,
                }
            })
            .collect()
    }

    /// Plain-text evaluation report covering every metric family.
    pub fn generate_report(&self, marketing_cost: f64, conversion_value: f64) -> String {
        let basic = self.basic_metrics();
        let precision_at_k = self.precision_at_k(&DEFAULT_K_VALUES);
        let recall_at_k = self.recall_at_k(&DEFAULT_K_VALUES);
        let business = self.business_metrics(marketing_cost, conversion_value, &DEFAULT_ROI_TARGETS);

        let mut report = String::new();
        report.push_str("MODEL EVALUATION REPORT\n");
        report.push_str("=======================\n\n");
        report.push_str("Basic Metrics:\n");
        report.push_str(&format!("- Accuracy: {:.3}\n", basic.accuracy));
        report.push_str(&format!("- Precision: {:.3}\n", basic.precision));
        report.push_str(&format!("- Recall: {:.3}\n", basic.recall));
        report.push_str(&format!("- F1-Score: {:.3}\n", basic.f1_score));
        report.push_str(&format!("- ROC-AUC: {:.3}\n", basic.roc_auc));
        report.push_str(&format!("- PR-AUC: {:.3}\n", basic.pr_auc));

        report.push_str("\nPrecision at K:\n");
        for (k, precision) in &precision_at_k {
            report.push_str(&format!("- Precision@{k}: {precision:.3}\n"));
        }
        report.push_str("\nRecall at K:\n");
        for (k, recall) in &recall_at_k {
            report.push_str(&format!("- Recall@{k}: {recall:.3}\n"));
        }

        report.push_str("\nBusiness Metrics:\n");
        for roi in &business {
            report.push_str(&format!(
                "- ROI@{}: {:.2} (net profit {:.2}, {} conversions)\n",
                roi.targeted, roi.roi, roi.net_profit, roi.expected_conversions
            ));
        }

        report
    }

    fn positive_count(&self) -> usize {
        self.y_true.iter().filter(|&&l| l == 1).count()
    }

    /// True positives among the k highest-probability customers.
    fn top_k_positives(&self, k: usize) -> usize {
        self.ranking[..k]
            .iter()
            .filter(|&&i| self.y_true[i] == 1)
            .count()
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn evaluator() -> Evaluator {
        // Ranked by proba: indices 3, 2, 1, 0 -> labels 1, 1, 0, 0.
        Evaluator::new(
            vec![0, 0, 1, 1],
            vec![0, 1, 1, 1],
            vec![0.1, 0.4, 0.8, 0.9],
        )
        .unwrap()
    }

    #[test]
    fn test_input_validation() {
        assert!(matches!(
            Evaluator::new(vec![], vec![], vec![]),
            Err(EvalError::EmptyInput)
        ));
        assert!(matches!(
            Evaluator::new(vec![1, 0], vec![1], vec![0.5, 0.5]),
            Err(EvalError::LengthMismatch { .. })
        ));
        assert!(matches!(
            Evaluator::new(vec![1, 2], vec![1, 0], vec![0.5, 0.5]),
            Err(EvalError::InvalidLabel { index: 1, value: 2 })
        ));
    }

    #[test]
    fn test_basic_metrics() {
        let metrics = evaluator().basic_metrics();
        assert_eq!(metrics.accuracy, 0.75);
        assert!((metrics.precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(metrics.recall, 1.0);
        assert!((metrics.f1_score - 0.8).abs() < 1e-12);
        assert_eq!(metrics.roc_auc, 1.0);
    }

    #[test]
    fn test_precision_at_full_length_is_positive_rate() {
        let eval = evaluator();
        let precision = eval.precision_at_k(&[4]);
        assert_eq!(precision[&4], 0.5);
    }

    #[test]
    fn test_precision_and_recall_at_k() {
        let eval = evaluator();
        let precision = eval.precision_at_k(&[2]);
        assert_eq!(precision[&2], 1.0);
        let recall = eval.recall_at_k(&[1, 2, 100]);
        assert_eq!(recall[&1], 0.5);
        assert_eq!(recall[&2], 1.0);
        assert_eq!(recall[&100], 1.0);
    }

    #[test]
    fn test_business_metrics() {
        // Top 2 are both converters: revenue 200, cost 20, ROI 9.
        let eval = evaluator();
        let business = eval.business_metrics(10.0, 100.0, &[2, 1000]);
        assert_eq!(business.len(), 1);
        assert_eq!(business[0].expected_conversions, 2);
        assert!((business[0].roi - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_cost_campaign_has_zero_roi() {
        let eval = evaluator();
        let business = eval.business_metrics(0.0, 100.0, &[2]);
        assert_eq!(business.len(), 1);
        assert_eq!(business[0].total_cost, 0.0);
        assert!(business[0].roi.is_finite());
        assert_eq!(business[0].roi, 0.0);
        assert_eq!(business[0].net_profit, 200.0);
    }

    #[test]
    fn test_lift_bin_count_is_configurable() {
        let eval = evaluator();
        let halves = eval.calculate_lift_with_bins(2);
        assert_eq!(halves.len(), 2);
        assert_eq!(halves[0].count, 2);
        // Top half holds both positives.
        assert_eq!(halves[0].positive_count, 2);
        assert_eq!(halves[1].positive_count, 0);
    }

    #[test]
    fn test_report_contains_all_sections() {
        let report = evaluator().generate_report(10.0, 100.0);
        assert!(report.contains("Basic Metrics"));
        assert!(report.contains("Precision at K"));
        assert!(report.contains("Recall at K"));
        assert!(report.contains("Business Metrics"));
    }

    #[test]
    fn test_metrics_serialize_to_json() {
        let metrics = evaluator().basic_metrics();
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["accuracy"], 0.75);
        assert!(json.get("roc_auc").is_some());
    }

    #[test]
    fn test_lift_is_deterministic_under_ties() {
        let eval = Evaluator::new(
            vec![1, 0, 1, 0, 1, 0, 1, 0, 1, 0],
            vec![1; 10],
            vec![0.5; 10],
        )
        .unwrap();
        let a = eval.calculate_lift();
        let b = eval.calculate_lift();
        let rates_a: Vec<f64> = a.iter().map(|r| r.response_rate).collect();
        let rates_b: Vec<f64> = b.iter().map(|r| r.response_rate).collect();
        assert_eq!(rates_a, rates_b);
    }
}
