//! Background task that periodically expires overdue reservations.
//!
//! Lazy expiry on read already keeps seats correct; the sweep frees seats of
//! holds nobody looks at again and drops waiting rooms that emptied out.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use super::reservation::ReservationService;
use crate::application::waiting_room::AdmissionQueue;
use crate::shared::shutdown::ShutdownSignal;

/// Start the reservation expiry background task.
///
/// Every `check_interval_secs` the task asks the reservation manager to
/// expire active holds whose window has lapsed, then prunes idle rooms of
/// `admission` when one is given.
pub fn start_reservation_expiry_task(
    reservations: Arc<ReservationService>,
    admission: Option<Arc<AdmissionQueue>>,
    shutdown: ShutdownSignal,
    check_interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            check_interval = check_interval_secs,
            "Reservation expiry task started"
        );

        let mut interval = tokio::time::interval(Duration::from_secs(check_interval_secs.max(1)));

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match reservations.expire_overdue().await {
                        Ok(0) => {}
                        Ok(count) => debug!(count, "Expired overdue reservations"),
                        Err(e) => warn!(error = %e, "Reservation expiry check error"),
                    }
                    if let Some(admission) = &admission {
                        admission.prune_idle_rooms();
                    }
                }
                _ = shutdown.notified().wait() => {
                    info!("Reservation expiry task shutting down");
                    break;
                }
            }
        }

        info!("Reservation expiry task stopped");
    })
}
