//! API router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::{ConnectionTrait, DatabaseConnection};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{
    AdmissionQueue, EventLocks, ReservationService, SeatMapService, TicketService,
};
use crate::config::AppConfig;
use crate::domain::RepositoryProvider;
use crate::interfaces::http::common::ApiResponse;
use crate::shared::time::SharedClock;

use super::modules::{
    checkout, health, metrics, request_id, reservations, seats, tickets, waiting_room,
};

/// Everything the HTTP layer needs. Handlers pull their own slice of it
/// through `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub seat_map: Arc<SeatMapService>,
    pub reservations: Arc<ReservationService>,
    pub tickets: Arc<TicketService>,
    pub admission: Arc<AdmissionQueue>,
    pub health: health::HealthState,
}

impl ApiState {
    /// Wire the booking services over `repos` from configuration.
    ///
    /// Seat map generation and reservations share one set of per-event locks.
    pub fn build(
        repos: Arc<dyn RepositoryProvider>,
        config: &AppConfig,
        clock: SharedClock,
        db: Option<DatabaseConnection>,
    ) -> Self {
        let locks = Arc::new(EventLocks::new());
        let retry = config.retry_config();
        let backend = db
            .as_ref()
            .map(|db| format!("{:?}", db.get_database_backend()).to_lowercase())
            .unwrap_or_else(|| "memory".to_string());

        Self {
            seat_map: Arc::new(SeatMapService::new(
                repos.clone(),
                locks.clone(),
                config.seat_map_layout(),
                retry.clone(),
            )),
            reservations: Arc::new(ReservationService::new(
                repos.clone(),
                locks,
                clock.clone(),
                config.reservation_settings(),
            )),
            tickets: Arc::new(TicketService::new(repos, retry)),
            admission: Arc::new(AdmissionQueue::new(config.admission_config(), clock)),
            health: health::HealthState {
                started_at: Arc::new(Instant::now()),
                db,
                backend,
            },
        }
    }
}

impl FromRef<ApiState> for seats::SeatsState {
    fn from_ref(s: &ApiState) -> Self {
        seats::SeatsState {
            seat_map: Arc::clone(&s.seat_map),
            reservations: Arc::clone(&s.reservations),
        }
    }
}

impl FromRef<ApiState> for reservations::ReservationAppState {
    fn from_ref(s: &ApiState) -> Self {
        reservations::ReservationAppState {
            reservations: Arc::clone(&s.reservations),
        }
    }
}

impl FromRef<ApiState> for checkout::CheckoutState {
    fn from_ref(s: &ApiState) -> Self {
        checkout::CheckoutState {
            reservations: Arc::clone(&s.reservations),
        }
    }
}

impl FromRef<ApiState> for tickets::TicketsState {
    fn from_ref(s: &ApiState) -> Self {
        tickets::TicketsState {
            tickets: Arc::clone(&s.tickets),
        }
    }
}

impl FromRef<ApiState> for waiting_room::WaitingRoomState {
    fn from_ref(s: &ApiState) -> Self {
        waiting_room::WaitingRoomState {
            admission: Arc::clone(&s.admission),
        }
    }
}

impl FromRef<ApiState> for health::HealthState {
    fn from_ref(s: &ApiState) -> Self {
        s.health.clone()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        seats::list_seats,
        seats::reserve_seats,
        reservations::get_reservation,
        reservations::cancel_reservation,
        checkout::checkout,
        tickets::list_tickets,
        waiting_room::join_waiting_room,
        waiting_room::waiting_room_status,
    ),
    components(
        schemas(
            ApiResponse<String>,
            health::HealthResponse,
            health::StorageHealth,
            seats::SeatDto,
            seats::ReserveSeatsRequest,
            seats::ReservationDto,
            reservations::ReservationDetailsDto,
            checkout::CheckoutRequest,
            checkout::PurchaseDto,
            checkout::TicketDto,
            tickets::WalletTicketDto,
            waiting_room::JoinWaitingRoomRequest,
            waiting_room::AdmissionStatusDto,
        )
    ),
    tags(
        (name = "Health", description = "Liveness and storage reachability"),
        (name = "Seats", description = "Seat maps and seat holds"),
        (name = "Reservations", description = "Inspect and release seat holds"),
        (name = "Checkout", description = "Turn a hold into a purchase with tickets"),
        (name = "Tickets", description = "A user's ticket wallet"),
        (name = "Waiting Room", description = "Per-event admission queue"),
    ),
    info(
        title = "Box Office API",
        version = "1.0.0",
        description = "Seat reservation, checkout and waiting room service",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Build the full API router.
///
/// `/metrics` is mounted only when a Prometheus handle is supplied.
pub fn create_api_router(state: ApiState, prometheus: Option<PrometheusHandle>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/seats/reserve", post(seats::reserve_seats))
        .route("/seats/{event_id}", get(seats::list_seats))
        .route("/reservations/{reservation_id}", get(reservations::get_reservation))
        .route(
            "/reservations/{reservation_id}/cancel",
            post(reservations::cancel_reservation),
        )
        .route("/checkout", post(checkout::checkout))
        .route("/tickets", get(tickets::list_tickets))
        .route("/waiting-room/join", post(waiting_room::join_waiting_room))
        .route("/waiting-room/status", get(waiting_room::waiting_room_status));

    let mut router = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health::health_check))
        .nest("/api/v1", api_routes)
        .with_state(state);

    if let Some(handle) = prometheus {
        router = router.merge(
            Router::new()
                .route("/metrics", get(metrics::render_metrics))
                .with_state(metrics::MetricsState { handle }),
        );
    }

    router
        .layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::domain::purchase::PurchaseRepository;
    use crate::domain::reservation::ReservationRepository;
    use crate::domain::seat::SeatRepository;
    use crate::domain::{DomainError, DomainResult, Purchase, Ticket};
    use crate::infrastructure::InMemoryRepositoryProvider;
    use crate::shared::time::ManualClock;

    fn app_over(repos: Arc<dyn RepositoryProvider>, config: AppConfig) -> Router {
        let state = ApiState::build(repos, &config, ManualClock::starting_now(), None);
        create_api_router(state, None)
    }

    fn app_with(config: AppConfig) -> Router {
        app_over(Arc::new(InMemoryRepositoryProvider::new()), config)
    }

    fn app() -> Router {
        app_with(AppConfig::default())
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn seat_ids(app: &Router, event: &str, n: usize) -> Vec<String> {
        let (status, body) = call(app, "GET", &format!("/api/v1/seats/{event}"), None).await;
        assert_eq!(status, StatusCode::OK);
        body["data"].as_array().unwrap()[..n]
            .iter()
            .map(|s| s["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn seat_map_is_generated_on_first_read() {
        let app = app();
        let (status, body) = call(&app, "GET", "/api/v1/seats/EV-1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let seats = body["data"].as_array().unwrap();
        assert_eq!(seats.len(), 100);
        assert_eq!(seats[0]["section"], "A");
        assert_eq!(seats[0]["status"], "available");
        assert_eq!(seats[0]["price"], 50000.0);
    }

    #[tokio::test]
    async fn overlapping_hold_is_a_conflict() {
        let app = app();
        let ids = seat_ids(&app, "EV-1", 3).await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/seats/reserve",
            Some(json!({"eventId": "EV-1", "userId": "alice", "seatIds": [ids[0], ids[1]]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "active");

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/seats/reserve",
            Some(json!({"eventId": "EV-1", "userId": "bob", "seatIds": [ids[1], ids[2]]})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);

        // bob's free seat was not taken by the failed attempt
        let (_, seats) = call(&app, "GET", "/api/v1/seats/EV-1", None).await;
        assert_eq!(seats["data"][2]["status"], "available");
    }

    #[tokio::test]
    async fn empty_seat_list_fails_validation() {
        let (status, _) = call(
            &app(),
            "POST",
            "/api/v1/seats/reserve",
            Some(json!({"eventId": "EV-1", "userId": "alice", "seatIds": []})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn unknown_reservation_is_404() {
        let app = app();
        let (status, _) = call(&app, "GET", "/api/v1/reservations/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, "POST", "/api/v1/reservations/nope/cancel", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn checkout_adds_service_fee_and_issues_tickets() {
        let app = app();
        let ids = seat_ids(&app, "EV-1", 2).await;
        let (_, held) = call(
            &app,
            "POST",
            "/api/v1/seats/reserve",
            Some(json!({"eventId": "EV-1", "userId": "alice", "seatIds": ids})),
        )
        .await;
        let reservation_id = held["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/checkout",
            Some(json!({"reservationId": reservation_id, "paymentDetails": {"method": "debit"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 110000.0);
        assert_eq!(body["data"]["paymentMethod"], "debit");
        assert_eq!(body["data"]["tickets"].as_array().unwrap().len(), 2);

        // A second checkout of the same hold is refused
        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/checkout",
            Some(json!({"reservationId": reservation_id, "paymentDetails": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, wallet) = call(&app, "GET", "/api/v1/tickets?userId=alice", None).await;
        assert_eq!(status, StatusCode::OK);
        let wallet = wallet["data"].as_array().unwrap();
        assert_eq!(wallet.len(), 2);
        assert_eq!(wallet[0]["seat"]["status"], "sold");

        let (_, details) = call(&app, "GET", &format!("/api/v1/reservations/{reservation_id}"), None).await;
        assert_eq!(details["data"]["status"], "completed");
        assert_eq!(details["data"]["seats"].as_array().unwrap().len(), 2);
    }

    async fn hold(app: &Router, event: &str, user: &str, ids: &[String]) -> String {
        let (status, held) = call(
            app,
            "POST",
            "/api/v1/seats/reserve",
            Some(json!({"eventId": event, "userId": user, "seatIds": ids})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        held["data"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn checkout_without_payment_details_is_rejected() {
        let app = app();
        let ids = seat_ids(&app, "EV-1", 2).await;
        let reservation_id = hold(&app, "EV-1", "alice", &ids).await;

        for body in [
            json!({"reservationId": reservation_id}),
            json!({"reservationId": reservation_id, "paymentDetails": null}),
            json!({"reservationId": reservation_id, "paymentDetails": "card"}),
        ] {
            let (status, body) = call(&app, "POST", "/api/v1/checkout", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["success"], false);
        }

        // Nothing was sold and the hold is still usable
        let (_, seats) = call(&app, "GET", "/api/v1/seats/EV-1", None).await;
        assert_eq!(seats["data"][0]["status"], "reserved");
        assert_eq!(seats["data"][1]["status"], "reserved");
        let (_, details) = call(&app, "GET", &format!("/api/v1/reservations/{reservation_id}"), None).await;
        assert_eq!(details["data"]["status"], "active");
        let (_, wallet) = call(&app, "GET", "/api/v1/tickets?userId=alice", None).await;
        assert!(wallet["data"].as_array().unwrap().is_empty());

        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/checkout",
            Some(json!({"reservationId": reservation_id, "paymentDetails": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    /// In-memory storage whose ticket reads always fail
    struct UnreadableTickets(InMemoryRepositoryProvider);

    #[async_trait]
    impl PurchaseRepository for UnreadableTickets {
        async fn record(&self, purchase: Purchase, tickets: Vec<Ticket>) -> DomainResult<()> {
            self.0.purchases().record(purchase, tickets).await
        }
        async fn remove(&self, purchase_id: &str) -> DomainResult<()> {
            self.0.purchases().remove(purchase_id).await
        }
        async fn find_by_id(&self, purchase_id: &str) -> DomainResult<Option<Purchase>> {
            self.0.purchases().find_by_id(purchase_id).await
        }
        async fn find_tickets_for_purchase(&self, _: &str) -> DomainResult<Vec<Ticket>> {
            Err(DomainError::StorageUnavailable("read timed out".into()))
        }
        async fn find_tickets_by_user(&self, _: &str) -> DomainResult<Vec<Ticket>> {
            Err(DomainError::StorageUnavailable("read timed out".into()))
        }
    }

    impl RepositoryProvider for UnreadableTickets {
        fn seats(&self) -> &dyn SeatRepository {
            self.0.seats()
        }
        fn reservations(&self) -> &dyn ReservationRepository {
            self.0.reservations()
        }
        fn purchases(&self) -> &dyn PurchaseRepository {
            self
        }
    }

    #[tokio::test]
    async fn committed_checkout_survives_failing_ticket_reads() {
        let app = app_over(
            Arc::new(UnreadableTickets(InMemoryRepositoryProvider::new())),
            AppConfig::default(),
        );
        let ids = seat_ids(&app, "EV-1", 2).await;
        let reservation_id = hold(&app, "EV-1", "alice", &ids).await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/checkout",
            Some(json!({"reservationId": reservation_id, "paymentDetails": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["tickets"].as_array().unwrap().len(), 2);

        let (_, seats) = call(&app, "GET", "/api/v1/seats/EV-1", None).await;
        assert_eq!(seats["data"][0]["status"], "sold");

        // The wallet read itself still reports the outage
        let (status, _) = call(&app, "GET", "/api/v1/tickets?userId=alice", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn cancel_frees_the_seats() {
        let app = app();
        let ids = seat_ids(&app, "EV-1", 1).await;
        let (_, held) = call(
            &app,
            "POST",
            "/api/v1/seats/reserve",
            Some(json!({"eventId": "EV-1", "userId": "alice", "seatIds": ids})),
        )
        .await;
        let id = held["data"]["id"].as_str().unwrap();

        let (status, body) = call(&app, "POST", &format!("/api/v1/reservations/{id}/cancel"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "expired");

        let (_, seats) = call(&app, "GET", "/api/v1/seats/EV-1", None).await;
        assert_eq!(seats["data"][0]["status"], "available");
    }

    #[tokio::test]
    async fn waiting_room_queues_past_capacity() {
        let mut config = AppConfig::default();
        config.waiting_room.max_active_per_event = 1;
        let app = app_with(config);

        let (status, a) = call(
            &app,
            "POST",
            "/api/v1/waiting-room/join",
            Some(json!({"eventId": "EV-1", "userId": "A"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(a["data"]["status"], "active");
        assert_eq!(a["data"]["position"], 0);
        assert!(a["data"]["sessionExpiresAt"].is_string());

        let (_, b) = call(
            &app,
            "POST",
            "/api/v1/waiting-room/join",
            Some(json!({"eventId": "EV-1", "userId": "B"})),
        )
        .await;
        assert_eq!(b["data"]["status"], "waiting");
        assert_eq!(b["data"]["position"], 1);

        let (_, polled) = call(&app, "GET", "/api/v1/waiting-room/status?eventId=EV-1&userId=B", None).await;
        assert_eq!(polled["data"]["estimatedWaitMinutes"], 2);

        let (_, stranger) = call(&app, "GET", "/api/v1/waiting-room/status?eventId=EV-1&userId=C", None).await;
        assert_eq!(stranger["data"]["status"], "not_in_queue");
        assert!(stranger["data"]["position"].is_null());
    }

    #[tokio::test]
    async fn query_identifiers_are_length_checked() {
        let app = app();
        let long = "u".repeat(200);

        let (status, body) = call(
            &app,
            "GET",
            &format!("/api/v1/waiting-room/status?eventId=EV-1&userId={long}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("user_id"));

        let (status, _) = call(
            &app,
            "GET",
            &format!("/api/v1/waiting-room/status?eventId={long}&userId=alice"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = call(&app, "GET", &format!("/api/v1/tickets?userId={long}"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = call(&app, "GET", "/api/v1/waiting-room/status?eventId=EV-1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_reports_memory_backend() {
        let (status, body) = call(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["storage"]["backend"], "memory");
    }
}
