//! Bundled classifier pipeline: encoder, transforms, estimator

use super::steps::{Estimator, RecordEncoder, VectorTransform};
use super::{Classifier, PredictionError};
use crate::models::RawLabel;
use crate::record::EmployeeRecord;

/// Decision threshold on the positive-class probability
const DECISION_THRESHOLD: f64 = 0.5;

/// A resolved pipeline step
#[derive(Debug)]
pub enum Step {
    Encoder(Box<dyn RecordEncoder>),
    Transform(Box<dyn VectorTransform>),
    Estimator(Box<dyn Estimator>),
}

impl Step {
    fn kind(&self) -> &'static str {
        match self {
            Step::Encoder(_) => "encoder",
            Step::Transform(_) => "transform",
            Step::Estimator(_) => "estimator",
        }
    }
}

/// Classifier assembled from a bundle
#[derive(Debug)]
pub struct Pipeline {
    encoder: Box<dyn RecordEncoder>,
    transforms: Vec<Box<dyn VectorTransform>>,
    estimator: Box<dyn Estimator>,
    classes: [RawLabel; 2],
}

impl Pipeline {
    /// Assemble steps, checking the encoder → transforms → estimator shape
    pub fn from_steps(steps: Vec<Step>, classes: [RawLabel; 2]) -> Result<Self, String> {
        let mut steps = steps.into_iter();

        let encoder = match steps.next() {
            Some(Step::Encoder(e)) => e,
            Some(other) => {
                return Err(format!(
                    "pipeline must start with an encoder, found a {}",
                    other.kind()
                ))
            }
            None => return Err("pipeline is empty".to_string()),
        };

        let mut transforms = Vec::new();
        let mut estimator = None;
        for step in steps {
            if estimator.is_some() {
                return Err(format!(
                    "pipeline continues with a {} after its estimator",
                    step.kind()
                ));
            }
            match step {
                Step::Transform(t) => transforms.push(t),
                Step::Estimator(e) => estimator = Some(e),
                Step::Encoder(_) => {
                    return Err("pipeline has more than one encoder".to_string());
                }
            }
        }

        let estimator = estimator.ok_or_else(|| "pipeline must end with an estimator".to_string())?;

        Ok(Self {
            encoder,
            transforms,
            estimator,
            classes,
        })
    }

    pub fn classes(&self) -> &[RawLabel; 2] {
        &self.classes
    }

    /// Names of the placeholder transforms standing in for missing helpers
    pub fn placeholders(&self) -> Vec<&str> {
        self.transforms
            .iter()
            .filter(|t| t.is_placeholder())
            .map(|t| t.name())
            .collect()
    }

    fn positive_probability(&self, record: &EmployeeRecord) -> Result<f64, PredictionError> {
        let mut features = self.encoder.encode(record)?;
        for transform in &self.transforms {
            features = transform.transform(features)?;
        }
        self.estimator.positive_probability(&features)
    }
}

impl Classifier for Pipeline {
    fn predict(&self, record: &EmployeeRecord) -> Result<RawLabel, PredictionError> {
        let p = self.positive_probability(record)?;
        let index = usize::from(p >= DECISION_THRESHOLD);
        Ok(self.classes[index].clone())
    }

    fn predict_proba(&self, record: &EmployeeRecord) -> Result<Vec<f64>, PredictionError> {
        let p = self.positive_probability(record)?;
        Ok(vec![1.0 - p, p])
    }

    fn describe(&self) -> String {
        let mut names = vec!["encoder".to_string()];
        names.extend(self.transforms.iter().map(|t| t.name().to_string()));
        names.push(self.estimator.name().to_string());
        format!("pipeline[{}]", names.join(" -> "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::steps::{
        CategoricalColumn, ColumnEncoder, FeatureClipper, HandleUnknown, LogisticRegression,
        Placeholder,
    };

    fn encoder() -> Step {
        Step::Encoder(Box::new(ColumnEncoder {
            numeric: vec![],
            categorical: vec![CategoricalColumn {
                column: "OverTime".into(),
                categories: vec!["No".into(), "Yes".into()],
            }],
            handle_unknown: HandleUnknown::Error,
        }))
    }

    fn estimator() -> Step {
        // Strong positive weight on OverTime=Yes
        Step::Estimator(Box::new(LogisticRegression {
            coef: vec![-2.0, 2.0],
            intercept: 0.0,
        }))
    }

    fn text_classes() -> [RawLabel; 2] {
        [RawLabel::Text("No".into()), RawLabel::Text("Yes".into())]
    }

    #[test]
    fn test_pipeline_predicts_with_declared_classes() {
        let pipeline = Pipeline::from_steps(vec![encoder(), estimator()], text_classes()).unwrap();

        let overtime = EmployeeRecord::from_inputs([("OverTime", "Yes")]).unwrap();
        assert_eq!(pipeline.predict(&overtime).unwrap(), RawLabel::Text("Yes".into()));

        let no_overtime = EmployeeRecord::from_inputs([("OverTime", "No")]).unwrap();
        assert_eq!(pipeline.predict(&no_overtime).unwrap(), RawLabel::Text("No".into()));

        let proba = pipeline.predict_proba(&overtime).unwrap();
        assert_eq!(proba.len(), 2);
        assert!((proba[0] + proba[1] - 1.0).abs() < 1e-12);
        assert!(proba[1] > 0.9);
    }

    #[test]
    fn test_pipeline_runs_through_placeholder() {
        let steps = vec![
            encoder(),
            Step::Transform(Box::new(Placeholder::new("attrition.helpers.OutlierClipper"))),
            Step::Transform(Box::new(FeatureClipper {
                lower: -1.0,
                upper: 1.0,
            })),
            estimator(),
        ];
        let pipeline = Pipeline::from_steps(steps, [RawLabel::Int(0), RawLabel::Int(1)]).unwrap();
        assert_eq!(pipeline.placeholders(), vec!["attrition.helpers.OutlierClipper"]);
        assert_eq!(
            pipeline.predict(&EmployeeRecord::defaults()).unwrap(),
            RawLabel::Int(1)
        );
        assert!(pipeline.describe().contains("OutlierClipper"));
    }

    #[test]
    fn test_pipeline_shape_errors() {
        assert!(Pipeline::from_steps(vec![], text_classes()).is_err());
        assert!(Pipeline::from_steps(vec![estimator()], text_classes()).is_err());
        assert!(Pipeline::from_steps(vec![encoder()], text_classes()).is_err());
        assert!(Pipeline::from_steps(vec![encoder(), estimator(), estimator()], text_classes()).is_err());
        assert!(Pipeline::from_steps(vec![encoder(), encoder(), estimator()], text_classes()).is_err());
        let placeholder_last = vec![
            encoder(),
            Step::Transform(Box::new(Placeholder::new("sklearn.ensemble.Gone"))),
        ];
        let err = Pipeline::from_steps(placeholder_last, text_classes()).unwrap_err();
        assert!(err.contains("estimator"));
    }
}
