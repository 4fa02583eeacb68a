//! Pipeline step implementations for bundled classifiers

use serde::Deserialize;
use std::fmt::Debug;

use super::PredictionError;
use crate::record::{EmployeeRecord, FieldValue};

/// First pipeline stage: turns a record into a feature vector
pub trait RecordEncoder: Send + Sync + Debug {
    fn encode(&self, record: &EmployeeRecord) -> Result<Vec<f64>, PredictionError>;

    /// Length of the vectors produced by `encode`
    fn width(&self) -> usize;
}

/// Intermediate stage: vector in, vector out
pub trait VectorTransform: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn transform(&self, features: Vec<f64>) -> Result<Vec<f64>, PredictionError>;

    /// True for stand-ins registered by the compatibility shim
    fn is_placeholder(&self) -> bool {
        false
    }
}

/// Final stage: probability of the positive class
pub trait Estimator: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn positive_probability(&self, features: &[f64]) -> Result<f64, PredictionError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleUnknown {
    #[default]
    Error,
    Ignore,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoricalColumn {
    pub column: String,
    pub categories: Vec<String>,
}

/// Numeric passthrough followed by one-hot encoded categoricals
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnEncoder {
    #[serde(default)]
    pub numeric: Vec<String>,
    #[serde(default)]
    pub categorical: Vec<CategoricalColumn>,
    #[serde(default)]
    pub handle_unknown: HandleUnknown,
}

impl ColumnEncoder {
    fn lookup<'r>(record: &'r EmployeeRecord, column: &str) -> Result<&'r FieldValue, PredictionError> {
        record
            .get(column)
            .ok_or_else(|| PredictionError::MissingColumn(column.to_string()))
    }
}

impl RecordEncoder for ColumnEncoder {
    fn encode(&self, record: &EmployeeRecord) -> Result<Vec<f64>, PredictionError> {
        let mut features = Vec::with_capacity(self.width());

        for column in &self.numeric {
            match Self::lookup(record, column)? {
                FieldValue::Int(v) => features.push(*v as f64),
                FieldValue::Text(v) => {
                    return Err(PredictionError::NonNumeric {
                        column: column.clone(),
                        value: v.clone(),
                    })
                }
            }
        }

        for cat in &self.categorical {
            // Ordinal fields may be trained as categories; compare on the rendered value
            let value = Self::lookup(record, &cat.column)?.to_string();
            let position = cat.categories.iter().position(|c| *c == value);
            if position.is_none() && self.handle_unknown == HandleUnknown::Error {
                return Err(PredictionError::UnknownCategory {
                    column: cat.column.clone(),
                    value,
                });
            }
            features.extend((0..cat.categories.len()).map(|i| {
                if Some(i) == position {
                    1.0
                } else {
                    0.0
                }
            }));
        }

        Ok(features)
    }

    fn width(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>()
    }
}

/// Per-feature standardization: `(x - mean) / scale`
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn validate(&self) -> Result<(), String> {
        if self.mean.len() != self.scale.len() {
            return Err(format!(
                "StandardScaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            ));
        }
        Ok(())
    }
}

impl VectorTransform for StandardScaler {
    fn name(&self) -> &str {
        "StandardScaler"
    }

    fn transform(&self, mut features: Vec<f64>) -> Result<Vec<f64>, PredictionError> {
        if features.len() != self.mean.len() {
            return Err(PredictionError::DimensionMismatch {
                step: self.name().to_string(),
                expected: self.mean.len(),
                actual: features.len(),
            });
        }
        for ((x, mean), scale) in features.iter_mut().zip(&self.mean).zip(&self.scale) {
            // Constant features are stored with a zero scale
            let scale = if *scale == 0.0 { 1.0 } else { *scale };
            *x = (*x - mean) / scale;
        }
        Ok(features)
    }
}

/// Clamps every feature into `[lower, upper]`
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureClipper {
    pub lower: f64,
    pub upper: f64,
}

impl FeatureClipper {
    pub fn validate(&self) -> Result<(), String> {
        if self.lower > self.upper {
            return Err(format!(
                "FeatureClipper lower bound {} exceeds upper bound {}",
                self.lower, self.upper
            ));
        }
        Ok(())
    }
}

impl VectorTransform for FeatureClipper {
    fn name(&self) -> &str {
        "FeatureClipper"
    }

    fn transform(&self, mut features: Vec<f64>) -> Result<Vec<f64>, PredictionError> {
        for x in features.iter_mut() {
            *x = x.clamp(self.lower, self.upper);
        }
        Ok(features)
    }
}

/// Binary logistic regression
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticRegression {
    pub coef: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

impl Estimator for LogisticRegression {
    fn name(&self) -> &str {
        "LogisticRegression"
    }

    fn positive_probability(&self, features: &[f64]) -> Result<f64, PredictionError> {
        if features.len() != self.coef.len() {
            return Err(PredictionError::DimensionMismatch {
                step: self.name().to_string(),
                expected: self.coef.len(),
                actual: features.len(),
            });
        }
        let z: f64 = self
            .coef
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

/// Identity stand-in for a helper type the running code no longer provides
#[derive(Debug, Clone)]
pub struct Placeholder {
    symbol: String,
}

impl Placeholder {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }
}

impl VectorTransform for Placeholder {
    fn name(&self) -> &str {
        &self.symbol
    }

    fn transform(&self, features: Vec<f64>) -> Result<Vec<f64>, PredictionError> {
        Ok(features)
    }

    fn is_placeholder(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overtime_encoder(handle_unknown: HandleUnknown) -> ColumnEncoder {
        ColumnEncoder {
            numeric: vec!["Age".into(), "MonthlyIncome".into()],
            categorical: vec![CategoricalColumn {
                column: "OverTime".into(),
                categories: vec!["No".into(), "Yes".into()],
            }],
            handle_unknown,
        }
    }

    #[test]
    fn test_column_encoder_layout() {
        let encoder = overtime_encoder(HandleUnknown::Error);
        let record = EmployeeRecord::from_inputs([("Age", "40"), ("OverTime", "Yes")]).unwrap();
        let features = encoder.encode(&record).unwrap();
        assert_eq!(features, vec![40.0, 5000.0, 0.0, 1.0]);
        assert_eq!(encoder.width(), 4);
    }

    #[test]
    fn test_column_encoder_unknown_category() {
        let mut encoder = overtime_encoder(HandleUnknown::Error);
        encoder.categorical[0].categories = vec!["No".into()];
        let err = encoder.encode(&EmployeeRecord::defaults()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Found unknown category 'Yes' in column 'OverTime' during transform"
        );

        encoder.handle_unknown = HandleUnknown::Ignore;
        let features = encoder.encode(&EmployeeRecord::defaults()).unwrap();
        assert_eq!(features, vec![30.0, 5000.0, 0.0]);
    }

    #[test]
    fn test_column_encoder_missing_column() {
        let encoder = ColumnEncoder {
            numeric: vec!["Tenure".into()],
            categorical: vec![],
            handle_unknown: HandleUnknown::Error,
        };
        assert!(matches!(
            encoder.encode(&EmployeeRecord::defaults()),
            Err(PredictionError::MissingColumn(c)) if c == "Tenure"
        ));
    }

    #[test]
    fn test_column_encoder_ordinal_as_category() {
        let encoder = ColumnEncoder {
            numeric: vec![],
            categorical: vec![CategoricalColumn {
                column: "JobLevel".into(),
                categories: vec!["1".into(), "2".into(), "3".into()],
            }],
            handle_unknown: HandleUnknown::Error,
        };
        let record = EmployeeRecord::from_inputs([("JobLevel", "2")]).unwrap();
        assert_eq!(encoder.encode(&record).unwrap(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_standard_scaler() {
        let scaler = StandardScaler {
            mean: vec![10.0, 5.0],
            scale: vec![2.0, 0.0],
        };
        assert_eq!(scaler.transform(vec![14.0, 7.0]).unwrap(), vec![2.0, 2.0]);
        assert!(scaler.transform(vec![1.0]).is_err());
    }

    #[test]
    fn test_scaler_validation() {
        let scaler = StandardScaler {
            mean: vec![0.0],
            scale: vec![],
        };
        assert!(scaler.validate().is_err());
    }

    #[test]
    fn test_feature_clipper() {
        let clipper = FeatureClipper {
            lower: -3.0,
            upper: 3.0,
        };
        assert_eq!(clipper.transform(vec![-5.0, 0.5, 9.0]).unwrap(), vec![-3.0, 0.5, 3.0]);
    }

    #[test]
    fn test_logistic_regression() {
        let model = LogisticRegression {
            coef: vec![1.0, -1.0],
            intercept: 0.0,
        };
        let p = model.positive_probability(&[2.0, 2.0]).unwrap();
        assert!((p - 0.5).abs() < 1e-12);
        let p = model.positive_probability(&[3.0, 0.0]).unwrap();
        assert!(p > 0.95);
        assert!(model.positive_probability(&[1.0]).is_err());
    }

    #[test]
    fn test_placeholder_is_identity() {
        let placeholder = Placeholder::new("attrition.helpers.OutlierClipper");
        assert!(placeholder.is_placeholder());
        assert_eq!(placeholder.name(), "attrition.helpers.OutlierClipper");
        assert_eq!(placeholder.transform(vec![1.0, 2.0]).unwrap(), vec![1.0, 2.0]);
    }
}
