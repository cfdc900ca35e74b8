//! Vital-sign readings.
//!
//! Each kind of measurement lives in its own table and implements [`Vital`],
//! which describes its table, its value columns and how to validate, bind
//! and read it. Storage and handlers are written once, generically, over
//! that trait.

use crate::types::{Result, ValidationErrors};
use chrono::{DateTime, Utc};
use libsql::{Row, Value};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use utoipa::ToSchema;

/// A kind of vital-sign measurement.
pub trait Vital: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Backing table.
    const TABLE: &'static str;
    /// Measurement columns, in bind/read order.
    const COLUMNS: &'static [&'static str];
    /// Human-readable name used in log lines.
    const LABEL: &'static str;

    fn validate(&self) -> std::result::Result<(), ValidationErrors>;

    /// Column values in [`Vital::COLUMNS`] order.
    fn values(&self) -> Vec<Value>;

    /// Reads the measurement columns starting at `offset`.
    fn from_row(row: &Row, offset: i32) -> Result<Self>;
}

/// A stored reading of vital `V` with its server-assigned timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VitalRecord<V> {
    pub id: i64,
    pub patient_id: i64,
    #[serde(flatten)]
    pub reading: V,
    pub recorded_at: DateTime<Utc>,
}

/// Declares the OpenAPI shape of a serialized [`VitalRecord`] for one kind,
/// with the reading's columns flattened next to the record fields.
macro_rules! record_schema {
    ($(#[$doc:meta])* $name:ident { $($field:ident: $ty:ty),+ $(,)? }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Serialize, ToSchema)]
        pub struct $name {
            pub id: i64,
            pub patient_id: i64,
            $(pub $field: $ty,)+
            pub recorded_at: DateTime<Utc>,
        }
    };
}

record_schema!(
    /// A stored blood pressure reading.
    BloodPressureRecord { systolic: i64, diastolic: i64 }
);
record_schema!(
    /// A stored heart rate reading.
    HeartRateRecord { value: i64 }
);
record_schema!(
    /// A stored weight reading.
    WeightRecord { value: f64 }
);
record_schema!(
    /// A stored blood glucose reading.
    GlucoseRecord { value: i64 }
);
record_schema!(
    /// A stored body temperature reading.
    TemperatureRecord { value: f64 }
);

fn require_positive_int(errors: &mut ValidationErrors, field: &str, value: i64) {
    if value <= 0 {
        errors.add(field, "Must be greater than 0.");
    }
}

fn require_positive_number(errors: &mut ValidationErrors, field: &str, value: f64) {
    if !value.is_finite() || value <= 0.0 {
        errors.add(field, "Must be a number greater than 0.");
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BloodPressure {
    pub systolic: i64,
    pub diastolic: i64,
}

impl Vital for BloodPressure {
    const TABLE: &'static str = "blood_pressures";
    const COLUMNS: &'static [&'static str] = &["systolic", "diastolic"];
    const LABEL: &'static str = "blood pressure";

    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_positive_int(&mut errors, "systolic", self.systolic);
        require_positive_int(&mut errors, "diastolic", self.diastolic);
        if errors.is_empty() && self.systolic <= self.diastolic {
            errors.add("systolic", "Systolic pressure must exceed diastolic pressure.");
        }
        errors.into_result()
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::Integer(self.systolic), Value::Integer(self.diastolic)]
    }

    fn from_row(row: &Row, offset: i32) -> Result<Self> {
        Ok(Self {
            systolic: row.get(offset)?,
            diastolic: row.get(offset + 1)?,
        })
    }
}

/// Beats per minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HeartRate {
    pub value: i64,
}

impl Vital for HeartRate {
    const TABLE: &'static str = "heart_rates";
    const COLUMNS: &'static [&'static str] = &["value"];
    const LABEL: &'static str = "heart rate";

    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_positive_int(&mut errors, "value", self.value);
        errors.into_result()
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::Integer(self.value)]
    }

    fn from_row(row: &Row, offset: i32) -> Result<Self> {
        Ok(Self {
            value: row.get(offset)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Weight {
    pub value: f64,
}

impl Vital for Weight {
    const TABLE: &'static str = "weights";
    const COLUMNS: &'static [&'static str] = &["value"];
    const LABEL: &'static str = "weight";

    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_positive_number(&mut errors, "value", self.value);
        errors.into_result()
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::Real(self.value)]
    }

    fn from_row(row: &Row, offset: i32) -> Result<Self> {
        Ok(Self {
            value: row.get(offset)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Glucose {
    pub value: i64,
}

impl Vital for Glucose {
    const TABLE: &'static str = "glucose";
    const COLUMNS: &'static [&'static str] = &["value"];
    const LABEL: &'static str = "glucose";

    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_positive_int(&mut errors, "value", self.value);
        errors.into_result()
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::Integer(self.value)]
    }

    fn from_row(row: &Row, offset: i32) -> Result<Self> {
        Ok(Self {
            value: row.get(offset)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Temperature {
    pub value: f64,
}

impl Vital for Temperature {
    const TABLE: &'static str = "temperatures";
    const COLUMNS: &'static [&'static str] = &["value"];
    const LABEL: &'static str = "temperature";

    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_positive_number(&mut errors, "value", self.value);
        errors.into_result()
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::Real(self.value)]
    }

    fn from_row(row: &Row, offset: i32) -> Result<Self> {
        Ok(Self {
            value: row.get(offset)?,
        })
    }
}
