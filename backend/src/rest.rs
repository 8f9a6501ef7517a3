//! Axum REST surface. Handlers are thin: decode, call the service, map the
//! result to a status code.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::error;

use shared::{
    CreateAdvanceRequest, CreateTripRequest, CreateVehicleRequest, CreateVillageRequest,
    ExportToPathRequest, SetStrStatusRequest, TripReportQuery, UpdateTripRequest,
    UpdateVehicleRequest,
};

use crate::domain::{
    AdvanceService, DashboardService, ReportService, TripService, VehicleService, VillageService,
};
use crate::error::DomainError;
use crate::storage::traits::Connection;

pub struct AppState<C: Connection> {
    pub trips: TripService<C>,
    pub advances: AdvanceService<C>,
    pub vehicles: VehicleService<C>,
    pub villages: VillageService<C>,
    pub reports: ReportService<C>,
    pub dashboard: DashboardService<C>,
}

impl<C: Connection> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            trips: self.trips.clone(),
            advances: self.advances.clone(),
            vehicles: self.vehicles.clone(),
            villages: self.villages.clone(),
            reports: self.reports.clone(),
            dashboard: self.dashboard.clone(),
        }
    }
}

impl<C: Connection> AppState<C> {
    pub fn new(connection: &C) -> Self {
        Self {
            trips: TripService::new(connection),
            advances: AdvanceService::new(connection),
            vehicles: VehicleService::new(connection),
            villages: VillageService::new(connection),
            reports: ReportService::new(connection),
            dashboard: DashboardService::new(connection),
        }
    }
}

pub fn router<C: Connection>(state: AppState<C>) -> Router {
    Router::new()
        .route("/api/trips", get(list_trips::<C>).post(create_trip::<C>))
        .route(
            "/api/trips/:id",
            put(update_trip::<C>).delete(delete_trip::<C>),
        )
        .route("/api/trips/:id/str-status", put(set_str_status::<C>))
        .route("/api/trips/:id/advances", get(trip_advance_summary::<C>))
        .route(
            "/api/advances",
            get(list_advances::<C>).post(create_advance::<C>),
        )
        .route(
            "/api/vehicles",
            get(list_vehicles::<C>).post(upsert_vehicle::<C>),
        )
        .route(
            "/api/vehicles/:number",
            put(update_vehicle::<C>).delete(deactivate_vehicle::<C>),
        )
        .route(
            "/api/villages",
            get(list_villages::<C>).post(create_village::<C>),
        )
        .route("/api/villages/:id/usage", post(record_village_usage::<C>))
        .route("/api/reports/trips", get(trip_report::<C>))
        .route(
            "/api/reports/export",
            get(export_report::<C>).post(export_report_to_path::<C>),
        )
        .route("/api/dashboard", get(dashboard_metrics::<C>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(e: anyhow::Error) -> Response {
    let status = match e.downcast_ref::<DomainError>() {
        Some(DomainError::Validation(_)) => StatusCode::BAD_REQUEST,
        Some(DomainError::NotFound(_)) => StatusCode::NOT_FOUND,
        None => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("request failed: {e:#}");
    }
    (
        status,
        Json(ErrorBody {
            error: e.to_string(),
        }),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct TripListQuery {
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    vehicle_number: Option<String>,
}

async fn list_trips<C: Connection>(
    State(state): State<AppState<C>>,
    Query(query): Query<TripListQuery>,
) -> Response {
    let result = match (&query.vehicle_number, query.date_from, query.date_to) {
        (Some(vehicle), _, _) => state.trips.trips_by_vehicle(vehicle).await,
        (None, Some(from), Some(to)) => state.trips.trips_by_date_range(from, to).await,
        _ => state.trips.list_trips().await,
    };
    match result {
        Ok(trips) => Json(trips).into_response(),
        Err(e) => error_response(e),
    }
}

async fn create_trip<C: Connection>(
    State(state): State<AppState<C>>,
    Json(request): Json<CreateTripRequest>,
) -> Response {
    match state.trips.create_trip(request).await {
        Ok(trip) => (StatusCode::CREATED, Json(trip)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn update_trip<C: Connection>(
    State(state): State<AppState<C>>,
    Path(trip_id): Path<String>,
    Json(request): Json<UpdateTripRequest>,
) -> Response {
    match state.trips.update_trip(&trip_id, request).await {
        Ok(trip) => Json(trip).into_response(),
        Err(e) => error_response(e),
    }
}

async fn delete_trip<C: Connection>(
    State(state): State<AppState<C>>,
    Path(trip_id): Path<String>,
) -> Response {
    match state.trips.delete_trip(&trip_id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(DomainError::not_found("trip")),
        Err(e) => error_response(e),
    }
}

async fn set_str_status<C: Connection>(
    State(state): State<AppState<C>>,
    Path(trip_id): Path<String>,
    Json(request): Json<SetStrStatusRequest>,
) -> Response {
    match state.trips.set_str_status(&trip_id, request).await {
        Ok(trip) => Json(trip).into_response(),
        Err(e) => error_response(e),
    }
}

async fn trip_advance_summary<C: Connection>(
    State(state): State<AppState<C>>,
    Path(trip_id): Path<String>,
) -> Response {
    match state.trips.get_trip(&trip_id).await {
        Ok(Some(trip)) => Json(state.advances.trip_summary(&trip).await).into_response(),
        Ok(None) => error_response(DomainError::not_found("trip")),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct AdvanceListQuery {
    vehicle_number: Option<String>,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
}

async fn list_advances<C: Connection>(
    State(state): State<AppState<C>>,
    Query(query): Query<AdvanceListQuery>,
) -> Response {
    let result = match (&query.vehicle_number, query.date_from, query.date_to) {
        (Some(vehicle), _, _) => state.advances.advances_by_vehicle(vehicle).await,
        (None, Some(from), Some(to)) => state.advances.advances_by_date_range(from, to).await,
        _ => state.advances.all_advances().await,
    };
    match result {
        Ok(advances) => Json(advances).into_response(),
        Err(e) => error_response(e),
    }
}

async fn create_advance<C: Connection>(
    State(state): State<AppState<C>>,
    Json(request): Json<CreateAdvanceRequest>,
) -> Response {
    match state.advances.add_advance(request).await {
        Ok(advance) => (StatusCode::CREATED, Json(advance)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn list_vehicles<C: Connection>(State(state): State<AppState<C>>) -> Response {
    match state.vehicles.list_vehicles().await {
        Ok(vehicles) => Json(vehicles).into_response(),
        Err(e) => error_response(e),
    }
}

async fn upsert_vehicle<C: Connection>(
    State(state): State<AppState<C>>,
    Json(request): Json<CreateVehicleRequest>,
) -> Response {
    match state.vehicles.upsert_vehicle(request).await {
        Ok(vehicle) => (StatusCode::CREATED, Json(vehicle)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn update_vehicle<C: Connection>(
    State(state): State<AppState<C>>,
    Path(vehicle_number): Path<String>,
    Json(request): Json<UpdateVehicleRequest>,
) -> Response {
    match state.vehicles.update_vehicle(&vehicle_number, request).await {
        Ok(vehicle) => Json(vehicle).into_response(),
        Err(e) => error_response(e),
    }
}

async fn deactivate_vehicle<C: Connection>(
    State(state): State<AppState<C>>,
    Path(vehicle_number): Path<String>,
) -> Response {
    match state.vehicles.deactivate_vehicle(&vehicle_number).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(DomainError::not_found("vehicle")),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct VillageListQuery {
    q: Option<String>,
}

async fn list_villages<C: Connection>(
    State(state): State<AppState<C>>,
    Query(query): Query<VillageListQuery>,
) -> Response {
    let result = match &query.q {
        Some(needle) => state.villages.search_villages(needle).await,
        None => state.villages.list_villages().await,
    };
    match result {
        Ok(villages) => Json(villages).into_response(),
        Err(e) => error_response(e),
    }
}

async fn create_village<C: Connection>(
    State(state): State<AppState<C>>,
    Json(request): Json<CreateVillageRequest>,
) -> Response {
    match state.villages.add_village(request).await {
        Ok(village) => (StatusCode::CREATED, Json(village)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn record_village_usage<C: Connection>(
    State(state): State<AppState<C>>,
    Path(village_id): Path<String>,
) -> Response {
    match state.villages.record_usage(&village_id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(DomainError::not_found("village")),
        Err(e) => error_response(e),
    }
}

async fn trip_report<C: Connection>(
    State(state): State<AppState<C>>,
    Query(query): Query<TripReportQuery>,
) -> Response {
    match state.reports.trip_report(&query).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(e),
    }
}

async fn export_report<C: Connection>(
    State(state): State<AppState<C>>,
    Query(query): Query<TripReportQuery>,
) -> Response {
    match state.reports.export_csv(&query).await {
        Ok(export) => Json(export).into_response(),
        Err(e) => error_response(e),
    }
}

async fn export_report_to_path<C: Connection>(
    State(state): State<AppState<C>>,
    Json(request): Json<ExportToPathRequest>,
) -> Response {
    match state.reports.export_to_path(request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response(e),
    }
}

async fn dashboard_metrics<C: Connection>(State(state): State<AppState<C>>) -> Response {
    Json(state.dashboard.today_metrics().await).into_response()
}
