pub mod checkout;
pub mod health;
pub mod metrics;
pub mod request_id;
pub mod reservations;
pub mod seats;
pub mod tickets;
pub mod waiting_room;
