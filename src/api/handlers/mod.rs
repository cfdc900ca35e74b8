//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by resource.

/// Appointment scheduling handlers.
pub mod appointments;
/// Diagnosis handlers.
pub mod diagnoses;
/// Goal handlers.
pub mod goals;
/// Liveness check.
pub mod health;
/// Medication handlers.
pub mod medications;
/// Notification inbox handlers.
pub mod notifications;
/// Registration, login and account management handlers.
pub mod users;
/// Vital-sign handlers (blood pressure, heart rate, weight, glucose, temperature).
pub mod vitals;
