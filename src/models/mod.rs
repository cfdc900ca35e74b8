//! Domain entities.
//!
//! Plain data types shared by the storage layer and the HTTP handlers.
//! Relationships are represented by foreign-key ids; listing endpoints that
//! need related names use the `*Detail` types filled by explicit joins.

mod clinical;
mod scheduling;
mod user;
pub mod vitals;

pub use clinical::{Diagnosis, DiagnosisDetail, Goal, Medication};
pub use scheduling::{Appointment, AppointmentDetail, Notification};
pub use user::{User, UserCredentials, UserSummary};
pub use vitals::{
    BloodPressure, BloodPressureRecord, Glucose, GlucoseRecord, HeartRate, HeartRateRecord,
    Temperature, TemperatureRecord, Vital, VitalRecord, Weight, WeightRecord,
};
