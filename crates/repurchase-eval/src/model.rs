//! Classifier contract and model registry.
//!
//! The evaluation side treats models as opaque: anything that can fit on a
//! feature matrix and emit positive-class probabilities. The registry is
//! built once at startup and immutable afterward; scoring code receives it
//! explicitly instead of reaching for process-wide state.

use crate::error::{EvalError, Result};
use polars::prelude::DataFrame;
use std::collections::BTreeMap;
use tracing::info;

/// An opaque binary classifier.
///
/// `predict_proba` returns the positive-class probability per row of `x`,
/// aligned with the input order.
pub trait Classifier {
    fn fit(&mut self, x: &DataFrame, y: &[u8]) -> Result<()>;
    fn predict(&self, x: &DataFrame) -> Result<Vec<u8>>;
    fn predict_proba(&self, x: &DataFrame) -> Result<Vec<f64>>;
}

/// A named, immutable collection of fitted classifiers.
///
/// # Example
///
/// ```rust,ignore
/// let registry = ModelRegistry::builder()
///     .register("gradient_boosting", boosted)
///     .register("logistic", logistic)
///     .build();
///
/// let model = registry.get("logistic")?;
/// let proba = model.predict_proba(&features)?;
/// ```
pub struct ModelRegistry {
    models: BTreeMap<String, Box<dyn Classifier>>,
}

impl ModelRegistry {
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::default()
    }

    /// Look up a model by name.
    pub fn get(&self, name: &str) -> Result<&dyn Classifier> {
        self.models
            .get(name)
            .map(|m| m.as_ref())
            .ok_or_else(|| EvalError::UnknownModel(name.to_string()))
    }

    /// Registered model names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.models.keys().map(|k| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Collects models before freezing them into a [`ModelRegistry`].
#[derive(Default)]
pub struct ModelRegistryBuilder {
    models: BTreeMap<String, Box<dyn Classifier>>,
}

impl ModelRegistryBuilder {
    /// Register a model under a name; a repeated name replaces the earlier
    /// entry.
    pub fn register(mut self, name: impl Into<String>, model: impl Classifier + 'static) -> Self {
        self.models.insert(name.into(), Box::new(model));
        self
    }

    pub fn build(self) -> ModelRegistry {
        info!("Model registry sealed with {} models", self.models.len());
        ModelRegistry {
            models: self.models,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scores every row with the same constant.
    struct ConstantModel {
        proba: f64,
    }

    impl Classifier for ConstantModel {
        fn fit(&mut self, _x: &DataFrame, _y: &[u8]) -> Result<()> {
            Ok(())
        }

        fn predict(&self, x: &DataFrame) -> Result<Vec<u8>> {
            Ok(vec![u8::from(self.proba >= 0.5); x.height()])
        }

        fn predict_proba(&self, x: &DataFrame) -> Result<Vec<f64>> {
            Ok(vec![self.proba; x.height()])
        }
    }

    #[test]
    fn test_registry_lookup() {
        let registry = ModelRegistry::builder()
            .register("always_yes", ConstantModel { proba: 0.9 })
            .register("always_no", ConstantModel { proba: 0.1 })
            .build();

        assert_eq!(registry.names(), vec!["always_no", "always_yes"]);
        assert!(registry.get("always_yes").is_ok());
        assert!(matches!(
            registry.get("missing"),
            Err(EvalError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_constant_model_contract() {
        let df = polars::df!["a" => [1.0, 2.0, 3.0]].unwrap();
        let model = ConstantModel { proba: 0.9 };
        assert_eq!(model.predict_proba(&df).unwrap(), vec![0.9, 0.9, 0.9]);
        assert_eq!(model.predict(&df).unwrap(), vec![1, 1, 1]);
    }
}
