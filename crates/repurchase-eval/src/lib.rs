//! Evaluation toolkit for repeat-purchase models.
//!
//! A pure function of three aligned arrays (true labels, predicted labels,
//! predicted probabilities) with no coupling to the feature pipeline:
//!
//! - classification metrics: accuracy, precision, recall, F1
//! - ranking metrics: ROC-AUC, PR-AUC, precision@k, recall@k
//! - campaign metrics: decile lift and ROI at fixed targeting sizes
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use repurchase_eval::Evaluator;
//!
//! let eval = Evaluator::new(y_true, y_pred, y_proba)?;
//! let metrics = eval.basic_metrics();
//! println!("ROC-AUC: {:.3}", metrics.roc_auc);
//! println!("{}", eval.generate_report(10.0, 100.0));
//! ```
//!
//! Models are opaque behind the [`Classifier`] trait; a [`ModelRegistry`]
//! holds fitted models by name, built once and immutable afterward.

pub mod error;
pub mod evaluator;
pub mod lift;
pub mod model;
mod ranking;

pub use error::{EvalError, Result};
pub use evaluator::{
    BasicMetrics, Evaluator, RoiMetrics, DEFAULT_K_VALUES, DEFAULT_ROI_TARGETS,
};
pub use lift::LiftRow;
pub use model::{Classifier, ModelRegistry, ModelRegistryBuilder};
