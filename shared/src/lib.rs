use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a trip's transport receipt (STR).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StrStatus {
    #[default]
    #[serde(rename = "not received")]
    NotReceived,
    #[serde(rename = "Received")]
    Received,
}

impl fmt::Display for StrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrStatus::NotReceived => write!(f, "not received"),
            StrStatus::Received => write!(f, "Received"),
        }
    }
}

/// Kind of vehicle used for a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    #[default]
    Lorry,
    Tempo,
    Pickup,
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleType::Lorry => write!(f, "lorry"),
            VehicleType::Tempo => write!(f, "tempo"),
            VehicleType::Pickup => write!(f, "pickup"),
        }
    }
}

/// Tag distinguishing the one advance tied to a trip's creation from later
/// top-ups. Absent on records written before the tag existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvanceKind {
    Initial,
    Additional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    /// Serial number, unique and monotonically assigned
    pub sl_number: u32,
    pub date: NaiveDate,
    pub vehicle_number: String,
    /// Transport receipt number
    pub str_number: String,
    pub str_status: StrStatus,
    /// Destination villages, order-preserving
    pub villages: Vec<String>,
    pub quantity: f64,
    pub driver_name: String,
    pub mobile_number: String,
    pub vehicle_type: VehicleType,
    /// Legacy advance paid at trip-creation time, kept on the trip record
    pub advance_amount: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advance {
    pub id: String,
    /// Kept redundantly so orphaned records stay recoverable
    pub vehicle_number: String,
    /// None for orphaned records whose trip reference was left empty
    pub trip_id: Option<String>,
    /// Denormalized copy of the owning trip's date
    pub trip_date: NaiveDate,
    pub amount: f64,
    pub kind: Option<AdvanceKind>,
    pub note: String,
    /// Declared but unused by any calculation
    pub is_settled: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub vehicle_number: String,
    pub driver_name: String,
    pub mobile_number: String,
    pub vehicle_type: VehicleType,
    /// Soft-delete marker
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Village {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    /// Incremented each time the village is selected in a trip entry
    pub usage_count: u32,
    pub last_used: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTripRequest {
    pub date: NaiveDate,
    pub vehicle_number: String,
    pub str_number: String,
    #[serde(default)]
    pub villages: Vec<String>,
    pub quantity: f64,
    pub driver_name: String,
    pub mobile_number: String,
    #[serde(default)]
    pub vehicle_type: VehicleType,
    /// Optional advance paid at trip creation
    #[serde(default)]
    pub advance_amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTripRequest {
    pub date: Option<NaiveDate>,
    pub str_number: Option<String>,
    pub villages: Option<Vec<String>>,
    pub quantity: Option<f64>,
    pub driver_name: Option<String>,
    pub mobile_number: Option<String>,
    pub vehicle_type: Option<VehicleType>,
    /// Raising this past the stored value appends an additional advance
    pub advance_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetStrStatusRequest {
    pub str_status: StrStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAdvanceRequest {
    pub vehicle_number: String,
    pub trip_id: Option<String>,
    pub trip_date: NaiveDate,
    pub amount: f64,
    #[serde(default)]
    pub note: String,
    /// Defaults to `additional`; `initial` records are created by the trip flow
    pub kind: Option<AdvanceKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateVehicleRequest {
    pub vehicle_number: String,
    pub driver_name: String,
    pub mobile_number: String,
    #[serde(default)]
    pub vehicle_type: VehicleType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateVehicleRequest {
    pub driver_name: Option<String>,
    pub mobile_number: Option<String>,
    pub vehicle_type: Option<VehicleType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateVillageRequest {
    pub name: String,
}

/// Reconciled advance picture for one trip: real records categorized by kind,
/// plus a synthesized initial entry when only the trip's legacy field exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripAdvanceSummary {
    pub trip_id: String,
    pub initial_advances: Vec<Advance>,
    pub additional_advances: Vec<Advance>,
    pub initial_total: f64,
    pub additional_total: f64,
    pub grand_total: f64,
    /// Count of all fetched records, categorized or not
    pub record_count: usize,
    pub initial_count: usize,
    pub additional_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripReportQuery {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    /// Case-insensitive substring match on vehicle number
    pub vehicle_number: Option<String>,
    /// Case-insensitive substring match against any destination village
    pub village: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripReportRow {
    pub trip: Trip,
    pub summary: TripAdvanceSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_trips: usize,
    pub total_advances: f64,
    pub total_quantity: f64,
    pub unique_vehicles: usize,
    pub avg_advance_per_trip: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripReportResponse {
    pub rows: Vec<TripReportRow>,
    pub summary: ReportSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDataResponse {
    pub csv_content: String,
    pub filename: String,
    pub row_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportToPathRequest {
    #[serde(flatten)]
    pub query: TripReportQuery,
    /// Export directory override; defaults to the platform documents folder
    pub custom_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportToPathResponse {
    pub success: bool,
    pub message: String,
    pub file_path: String,
    pub row_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub today_trips_count: usize,
    pub today_advances_total: f64,
    pub total_vehicles: usize,
    pub recent_trips: Vec<Trip>,
    pub recent_advances: Vec<Advance>,
}
