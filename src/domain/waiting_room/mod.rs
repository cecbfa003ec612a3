//! Waiting-room (admission queue) domain types

pub mod model;

pub use model::{ActiveSession, AdmissionState, AdmissionStatus, QueueEntry, RoomSnapshot};
