//! Employee record schema
//!
//! The field table mirrors the columns the attrition classifiers were trained
//! on. Order matters: records, dense encodings and the form layout all follow
//! the order of [`FIELDS`].

use serde::Serialize;
use thiserror::Error;

use super::FieldValue;

/// Number of fields in every employee record
pub const FIELD_COUNT: usize = 34;

/// Width of the built-in dense encoding (numeric values, then one-hot categoricals)
pub const DENSE_WIDTH: usize = dense_width();

const SCALE_1_4: &[i64] = &[1, 2, 3, 4];
const SCALE_1_5: &[i64] = &[1, 2, 3, 4, 5];

/// Domain of a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Free-ranged integer with an inclusive lower bound and optional upper bound
    Numeric {
        min: i64,
        max: Option<i64>,
        default: i64,
    },
    /// Integer restricted to a small enumerated set; the first option is the default
    Ordinal { options: &'static [i64] },
    /// String label restricted to a fixed set; the first option is the default
    Categorical { options: &'static [&'static str] },
}

/// Declaration of one record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    /// Form column (1-3)
    pub column: u8,
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// Rejected input for a single field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Unknown field '{0}'")]
    Unknown(String),

    #[error("{field} must be a whole number, got '{value}'")]
    NotAnInteger { field: &'static str, value: String },

    #[error("{field} must be a string label, got '{value}'")]
    NotText { field: &'static str, value: String },

    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        field: &'static str,
        min: i64,
        value: i64,
    },

    #[error("{field} must be at most {max}, got {value}")]
    AboveMaximum {
        field: &'static str,
        max: i64,
        value: i64,
    },

    #[error("{field} must be one of [{options}], got '{value}'")]
    NotAnOption {
        field: &'static str,
        options: String,
        value: String,
    },
}

const fn numeric(
    name: &'static str,
    label: &'static str,
    column: u8,
    min: i64,
    max: Option<i64>,
    default: i64,
) -> FieldSpec {
    FieldSpec {
        name,
        label,
        column,
        kind: FieldKind::Numeric { min, max, default },
    }
}

const fn ordinal(name: &'static str, label: &'static str, column: u8, options: &'static [i64]) -> FieldSpec {
    FieldSpec {
        name,
        label,
        column,
        kind: FieldKind::Ordinal { options },
    }
}

const fn categorical(
    name: &'static str,
    label: &'static str,
    column: u8,
    options: &'static [&'static str],
) -> FieldSpec {
    FieldSpec {
        name,
        label,
        column,
        kind: FieldKind::Categorical { options },
    }
}

/// The full record schema in training-column order
pub static FIELDS: [FieldSpec; FIELD_COUNT] = FIELD_TABLE;

const FIELD_TABLE: [FieldSpec; FIELD_COUNT] = [
    numeric("Age", "Age", 1, 18, Some(60), 30),
    numeric("DailyRate", "Daily Rate", 1, 0, None, 800),
    numeric("DistanceFromHome", "Distance From Home", 1, 0, None, 5),
    ordinal("Education", "Education (1-5)", 1, SCALE_1_5),
    ordinal("EmployeeCount", "Employee Count", 1, &[1]),
    numeric("EmployeeNumber", "Employee Number", 1, 1, None, 1),
    ordinal("EnvironmentSatisfaction", "Environment Satisfaction (1-4)", 1, SCALE_1_4),
    numeric("HourlyRate", "Hourly Rate", 1, 0, None, 60),
    ordinal("JobInvolvement", "Job Involvement (1-4)", 1, SCALE_1_4),
    ordinal("JobLevel", "Job Level (1-5)", 1, SCALE_1_5),
    ordinal("JobSatisfaction", "Job Satisfaction (1-4)", 2, SCALE_1_4),
    numeric("MonthlyIncome", "Monthly Income", 2, 1000, Some(20000), 5000),
    numeric("MonthlyRate", "Monthly Rate", 2, 1000, Some(30000), 10000),
    numeric("NumCompaniesWorked", "Num Companies Worked", 2, 0, None, 2),
    numeric("PercentSalaryHike", "Percent Salary Hike", 2, 0, None, 10),
    ordinal("PerformanceRating", "Performance Rating (1-4)", 2, SCALE_1_4),
    ordinal("RelationshipSatisfaction", "Relationship Satisfaction (1-4)", 2, SCALE_1_4),
    ordinal("StandardHours", "Standard Hours", 2, &[80]),
    ordinal("StockOptionLevel", "Stock Option Level (0-3)", 2, &[0, 1, 2, 3]),
    numeric("TotalWorkingYears", "Total Working Years", 3, 0, None, 5),
    numeric("TrainingTimesLastYear", "Training Times Last Year", 3, 0, None, 2),
    ordinal("WorkLifeBalance", "Work Life Balance (1-4)", 3, SCALE_1_4),
    numeric("YearsAtCompany", "Years At Company", 3, 0, None, 3),
    numeric("YearsInCurrentRole", "Years In Current Role", 3, 0, None, 2),
    numeric("YearsSinceLastPromotion", "Years Since Last Promotion", 3, 0, None, 1),
    numeric("YearsWithCurrManager", "Years With Current Manager", 3, 0, None, 2),
    categorical(
        "BusinessTravel",
        "Business Travel",
        3,
        &["Travel_Rarely", "Travel_Frequently", "Non-Travel"],
    ),
    categorical(
        "Department",
        "Department",
        3,
        &["Sales", "Research & Development", "Human Resources"],
    ),
    categorical(
        "EducationField",
        "Education Field",
        3,
        &[
            "Life Sciences",
            "Medical",
            "Marketing",
            "Technical Degree",
            "Human Resources",
            "Other",
        ],
    ),
    categorical("Gender", "Gender", 3, &["Male", "Female"]),
    categorical(
        "JobRole",
        "Job Role",
        3,
        &[
            "Sales Executive",
            "Research Scientist",
            "Laboratory Technician",
            "Manufacturing Director",
            "Healthcare Representative",
            "Manager",
            "Sales Representative",
            "Research Director",
            "Human Resources",
        ],
    ),
    categorical("MaritalStatus", "Marital Status", 3, &["Single", "Married", "Divorced"]),
    categorical("Over18", "Over 18", 3, &["Y"]),
    categorical("OverTime", "OverTime", 3, &["Yes", "No"]),
];

const fn dense_width() -> usize {
    let mut width = 0;
    let mut i = 0;
    while i < FIELD_COUNT {
        width += match FIELD_TABLE[i].kind {
            FieldKind::Categorical { options } => options.len(),
            _ => 1,
        };
        i += 1;
    }
    width
}

/// Position of a field in the schema
pub fn field_index(name: &str) -> Option<usize> {
    FIELDS.iter().position(|f| f.name == name)
}

/// Look up a field by name
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.name == name)
}

impl FieldSpec {
    pub fn is_categorical(&self) -> bool {
        matches!(self.kind, FieldKind::Categorical { .. })
    }

    /// Value the form shows before the user touches the widget
    pub fn default_value(&self) -> FieldValue {
        match self.kind {
            FieldKind::Numeric { default, .. } => FieldValue::Int(default),
            FieldKind::Ordinal { options } => FieldValue::Int(options[0]),
            FieldKind::Categorical { options } => FieldValue::Text(options[0].to_string()),
        }
    }

    /// Parse a raw widget string. Blank input falls back to the default.
    pub fn parse(&self, raw: &str) -> Result<FieldValue, FieldError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(self.default_value());
        }

        let value = match self.kind {
            FieldKind::Categorical { .. } => FieldValue::Text(raw.to_string()),
            _ => raw
                .parse::<i64>()
                .map(FieldValue::Int)
                .map_err(|_| FieldError::NotAnInteger {
                    field: self.name,
                    value: raw.to_string(),
                })?,
        };

        self.check(&value)?;
        Ok(value)
    }

    /// Convert a JSON value. Null falls back to the default.
    pub fn from_json(&self, json: &serde_json::Value) -> Result<FieldValue, FieldError> {
        use serde_json::Value;

        let value = match (json, self.kind) {
            (Value::Null, _) => return Ok(self.default_value()),
            (Value::String(s), FieldKind::Categorical { .. }) => FieldValue::Text(s.clone()),
            (Value::String(s), _) => return self.parse(s),
            (Value::Number(n), FieldKind::Categorical { .. }) => {
                return Err(FieldError::NotText {
                    field: self.name,
                    value: n.to_string(),
                })
            }
            (Value::Number(n), _) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => {
                    return Err(FieldError::NotAnInteger {
                        field: self.name,
                        value: n.to_string(),
                    })
                }
            },
            (other, FieldKind::Categorical { .. }) => {
                return Err(FieldError::NotText {
                    field: self.name,
                    value: other.to_string(),
                })
            }
            (other, _) => {
                return Err(FieldError::NotAnInteger {
                    field: self.name,
                    value: other.to_string(),
                })
            }
        };

        self.check(&value)?;
        Ok(value)
    }

    /// Check that a value lies inside the declared domain
    pub fn check(&self, value: &FieldValue) -> Result<(), FieldError> {
        match (self.kind, value) {
            (FieldKind::Numeric { min, max, .. }, FieldValue::Int(v)) => {
                if *v < min {
                    return Err(FieldError::BelowMinimum {
                        field: self.name,
                        min,
                        value: *v,
                    });
                }
                if let Some(max) = max {
                    if *v > max {
                        return Err(FieldError::AboveMaximum {
                            field: self.name,
                            max,
                            value: *v,
                        });
                    }
                }
                Ok(())
            }
            (FieldKind::Ordinal { options }, FieldValue::Int(v)) => {
                if options.contains(v) {
                    Ok(())
                } else {
                    Err(FieldError::NotAnOption {
                        field: self.name,
                        options: join(options.iter()),
                        value: v.to_string(),
                    })
                }
            }
            (FieldKind::Categorical { options }, FieldValue::Text(v)) => {
                if options.contains(&v.as_str()) {
                    Ok(())
                } else {
                    Err(FieldError::NotAnOption {
                        field: self.name,
                        options: join(options.iter()),
                        value: v.clone(),
                    })
                }
            }
            (FieldKind::Categorical { .. }, FieldValue::Int(v)) => Err(FieldError::NotText {
                field: self.name,
                value: v.to_string(),
            }),
            (_, FieldValue::Text(v)) => Err(FieldError::NotAnInteger {
                field: self.name,
                value: v.clone(),
            }),
        }
    }
}

fn join<T: std::fmt::Display>(items: impl Iterator<Item = T>) -> String {
    items.map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}
