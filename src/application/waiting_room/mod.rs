mod admission_queue;

pub use admission_queue::{AdmissionConfig, AdmissionQueue};
