//! Employee records assembled from form input
//!
//! A record is built fresh for every prediction request, holds exactly one
//! value per schema field, and is discarded once the result is rendered.

mod schema;

pub use schema::{
    field, field_index, FieldError, FieldKind, FieldSpec, DENSE_WIDTH, FIELDS, FIELD_COUNT,
};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A single field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Text(String),
}

impl FieldValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Int(_) => None,
            FieldValue::Text(v) => Some(v),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Text(v) => f.write_str(v),
        }
    }
}

/// One row of model input, aligned with [`FIELDS`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRecord {
    values: Vec<FieldValue>,
}

impl Default for EmployeeRecord {
    fn default() -> Self {
        Self::defaults()
    }
}

impl EmployeeRecord {
    /// Record with every field at its declared default
    pub fn defaults() -> Self {
        Self {
            values: FIELDS.iter().map(FieldSpec::default_value).collect(),
        }
    }

    /// Build a record from raw widget strings. Fields not present keep their default.
    pub fn from_inputs<'a, I>(inputs: I) -> Result<Self, FieldError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut record = Self::defaults();
        for (name, raw) in inputs {
            let index = field_index(name).ok_or_else(|| FieldError::Unknown(name.to_string()))?;
            record.values[index] = FIELDS[index].parse(raw)?;
        }
        Ok(record)
    }

    /// Build a record from a JSON object. Fields not present keep their default.
    pub fn from_json(object: &serde_json::Map<String, serde_json::Value>) -> Result<Self, FieldError> {
        let mut record = Self::defaults();
        for (name, value) in object {
            let index = field_index(name).ok_or_else(|| FieldError::Unknown(name.clone()))?;
            record.values[index] = FIELDS[index].from_json(value)?;
        }
        Ok(record)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        field_index(name).map(|i| &self.values[i])
    }

    /// Replace a field value after checking it against the schema
    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        let index = field_index(name).ok_or_else(|| FieldError::Unknown(name.to_string()))?;
        FIELDS[index].check(&value)?;
        self.values[index] = value;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fields and values in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&'static FieldSpec, &FieldValue)> + '_ {
        FIELDS.iter().zip(self.values.iter())
    }

    /// Built-in dense encoding: numeric fields as-is, categoricals one-hot
    /// over their declared options.
    pub fn to_dense(&self) -> Vec<f32> {
        let mut dense = Vec::with_capacity(DENSE_WIDTH);
        for (spec, value) in self.iter() {
            match spec.kind {
                FieldKind::Categorical { options } => {
                    let selected = value.as_text();
                    dense.extend(
                        options
                            .iter()
                            .map(|o| if Some(*o) == selected { 1.0 } else { 0.0 }),
                    );
                }
                _ => dense.push(value.as_int().unwrap_or_default() as f32),
            }
        }
        dense
    }
}

impl Serialize for EmployeeRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (spec, value) in self.iter() {
            map.serialize_entry(spec.name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_cover_every_field() {
        let record = EmployeeRecord::defaults();
        assert_eq!(record.len(), FIELD_COUNT);
        assert_eq!(record.get("Age"), Some(&FieldValue::Int(30)));
        assert_eq!(record.get("MonthlyIncome"), Some(&FieldValue::Int(5000)));
        assert_eq!(record.get("BusinessTravel"), Some(&FieldValue::Text("Travel_Rarely".into())));
        assert_eq!(record.get("OverTime"), Some(&FieldValue::Text("Yes".into())));
    }

    #[test]
    fn test_echo_keeps_inputs_and_defaults() {
        let inputs = [("Age", "45"), ("OverTime", "Yes")];
        let record = EmployeeRecord::from_inputs(inputs).unwrap();

        let echo = serde_json::to_value(&record).unwrap();
        let object = echo.as_object().unwrap();
        assert_eq!(object.len(), 34);
        assert_eq!(object["Age"], 45);
        assert_eq!(object["OverTime"], "Yes");
        assert_eq!(object["DailyRate"], 800);
        assert_eq!(object["Gender"], "Male");
    }

    #[test]
    fn test_echo_preserves_schema_order() {
        let json = serde_json::to_string(&EmployeeRecord::defaults()).unwrap();
        let age = json.find("\"Age\"").unwrap();
        let daily = json.find("\"DailyRate\"").unwrap();
        let overtime = json.find("\"OverTime\"").unwrap();
        assert!(age < daily && daily < overtime);
    }

    #[test]
    fn test_from_inputs_rejects_unknown_field() {
        let err = EmployeeRecord::from_inputs([("Salary", "100")]).unwrap_err();
        assert_eq!(err, FieldError::Unknown("Salary".into()));
    }

    #[test]
    fn test_from_inputs_rejects_out_of_domain() {
        let err = EmployeeRecord::from_inputs([("MonthlyIncome", "25000")]).unwrap_err();
        assert!(err.to_string().contains("MonthlyIncome"));
    }

    #[test]
    fn test_from_hash_map() {
        let mut form = HashMap::new();
        form.insert("Age".to_string(), "22".to_string());
        form.insert("MaritalStatus".to_string(), "Divorced".to_string());
        let record =
            EmployeeRecord::from_inputs(form.iter().map(|(k, v)| (k.as_str(), v.as_str()))).unwrap();
        assert_eq!(record.get("Age").and_then(FieldValue::as_int), Some(22));
        assert_eq!(record.get("MaritalStatus").and_then(FieldValue::as_text), Some("Divorced"));
    }

    #[test]
    fn test_from_json() {
        let body = serde_json::json!({ "Age": 45, "OverTime": "No", "JobLevel": "3" });
        let record = EmployeeRecord::from_json(body.as_object().unwrap()).unwrap();
        assert_eq!(record.get("Age"), Some(&FieldValue::Int(45)));
        assert_eq!(record.get("JobLevel"), Some(&FieldValue::Int(3)));
        assert_eq!(record.get("OverTime"), Some(&FieldValue::Text("No".into())));
    }

    #[test]
    fn test_records_are_independent() {
        let first = EmployeeRecord::from_inputs([("Age", "50"), ("Gender", "Female")]).unwrap();
        let second = EmployeeRecord::from_inputs([("Age", "25")]).unwrap();
        assert_eq!(first.get("Gender"), Some(&FieldValue::Text("Female".into())));
        assert_eq!(second.get("Gender"), Some(&FieldValue::Text("Male".into())));
    }

    #[test]
    fn test_set_validates() {
        let mut record = EmployeeRecord::defaults();
        record.set("JobLevel", FieldValue::Int(5)).unwrap();
        assert!(record.set("JobLevel", FieldValue::Int(6)).is_err());
        assert!(record.set("Gender", FieldValue::Int(1)).is_err());
        assert_eq!(record.get("JobLevel"), Some(&FieldValue::Int(5)));
    }

    #[test]
    fn test_dense_encoding() {
        let record = EmployeeRecord::from_inputs([("Age", "41"), ("OverTime", "No")]).unwrap();
        let dense = record.to_dense();
        assert_eq!(dense.len(), DENSE_WIDTH);
        assert_eq!(dense[0], 41.0);
        // OverTime is the last field: ["Yes", "No"]
        assert_eq!(&dense[DENSE_WIDTH - 2..], &[0.0, 1.0]);
        // Over18 has a single option and is always set
        assert_eq!(dense[DENSE_WIDTH - 3], 1.0);
    }
}
