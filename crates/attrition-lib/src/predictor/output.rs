//! Prediction output formatting
//!
//! Turns a normalized prediction into the decision message shown on the form
//! and in CLI output.

use crate::models::{AttritionClass, Prediction};

/// Decimal places for rendered probabilities
pub const PROBABILITY_DECIMALS: usize = 2;

/// Display style of a status message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

impl Severity {
    pub fn css_class(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

/// Formats predictions for display
#[derive(Debug, Clone, Default)]
pub struct PredictionFormatter;

impl PredictionFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Probability with two decimals, e.g. `0.27`
    pub fn format_probability(&self, probability: f64) -> String {
        format!("{:.*}", PROBABILITY_DECIMALS, probability)
    }

    /// Leave predictions are error-styled, stay predictions success-styled
    pub fn severity(&self, prediction: &Prediction) -> Severity {
        match prediction.class {
            AttritionClass::Leave => Severity::Error,
            AttritionClass::Stay => Severity::Success,
        }
    }

    /// Decision sentence including the leave probability
    pub fn message(&self, prediction: &Prediction) -> String {
        let probability = self.format_probability(prediction.leave_probability);
        match prediction.class {
            AttritionClass::Leave => format!(
                "The employee is likely to leave. (Probability: {})",
                probability
            ),
            AttritionClass::Stay => format!(
                "The employee is likely to stay. (Leave Probability: {})",
                probability
            ),
        }
    }

    /// Message shown when a single prediction request fails
    pub fn failure(&self, reason: &str) -> String {
        format!("Prediction failed: {}", reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawLabel;

    fn prediction(class: AttritionClass, p: f64) -> Prediction {
        Prediction {
            class,
            leave_probability: p,
            raw_label: RawLabel::Int(i64::from(class == AttritionClass::Leave)),
        }
    }

    #[test]
    fn test_stay_message_uses_two_decimals() {
        let formatter = PredictionFormatter::new();
        let p = prediction(AttritionClass::Stay, 0.27);
        assert_eq!(
            formatter.message(&p),
            "The employee is likely to stay. (Leave Probability: 0.27)"
        );
        assert_eq!(formatter.severity(&p), Severity::Success);
    }

    #[test]
    fn test_leave_message() {
        let formatter = PredictionFormatter::new();
        let p = prediction(AttritionClass::Leave, 0.6);
        let message = formatter.message(&p);
        assert!(message.contains("likely to leave"));
        assert!(message.contains("0.60"));
        assert_eq!(formatter.severity(&p).css_class(), "error");
    }

    #[test]
    fn test_probability_rounding() {
        let formatter = PredictionFormatter::new();
        assert_eq!(formatter.format_probability(0.0), "0.00");
        assert_eq!(formatter.format_probability(1.0), "1.00");
        assert_eq!(formatter.format_probability(0.126), "0.13");
    }

    #[test]
    fn test_failure_message() {
        let formatter = PredictionFormatter::new();
        assert_eq!(formatter.failure("boom"), "Prediction failed: boom");
    }
}
