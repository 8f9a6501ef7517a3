use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use tracing::{error, info};

use shared::{
    Advance, ExportDataResponse, ExportToPathRequest, ExportToPathResponse, ReportSummary, Trip,
    TripAdvanceSummary, TripReportQuery, TripReportResponse, TripReportRow,
};

use crate::storage::traits::{AdvanceStore, Connection, TripStore};

use super::advance_service::day_bounds;
use super::reconciliation::reconcile;

/// Filtered trip reports with reconciled advance totals, plus CSV export of
/// the same rows.
#[derive(Clone)]
pub struct ReportService<C: Connection> {
    trips: C::TripRepository,
    advances: C::AdvanceRepository,
}

impl<C: Connection> ReportService<C> {
    pub fn new(connection: &C) -> Self {
        Self {
            trips: connection.create_trip_repository(),
            advances: connection.create_advance_repository(),
        }
    }

    pub async fn trip_report(&self, query: &TripReportQuery) -> Result<TripReportResponse> {
        let mut trips = self
            .trips
            .trips_by_date_range(query.date_from, query.date_to)
            .await?;
        trips.sort_by(|a, b| b.date.cmp(&a.date));

        if let Some(vehicle) = &query.vehicle_number {
            let needle = vehicle.trim().to_lowercase();
            if !needle.is_empty() {
                trips.retain(|trip| trip.vehicle_number.to_lowercase().contains(&needle));
            }
        }
        if let Some(village) = &query.village {
            let needle = village.trim().to_lowercase();
            if !needle.is_empty() {
                trips.retain(|trip| {
                    trip.villages
                        .iter()
                        .any(|name| name.to_lowercase().contains(&needle))
                });
            }
        }

        // One fetch for the whole range; orphans (no trip reference) fall out
        // of the grouping, synthesis covers their trips from the legacy field.
        let (start, end) = day_bounds(query.date_from, query.date_to);
        let range_advances = self.advances.advances_created_between(start, end).await?;
        let mut by_trip: HashMap<String, Vec<Advance>> = HashMap::new();
        for advance in range_advances {
            if let Some(trip_id) = advance.trip_id.clone() {
                by_trip.entry(trip_id).or_default().push(advance);
            }
        }

        let rows: Vec<TripReportRow> = trips
            .into_iter()
            .map(|trip| {
                let advances = by_trip.remove(&trip.id).unwrap_or_default();
                let summary = reconcile(&trip, &advances);
                TripReportRow { trip, summary }
            })
            .collect();

        let summary = summarize(&rows);
        Ok(TripReportResponse { rows, summary })
    }

    pub async fn export_csv(&self, query: &TripReportQuery) -> Result<ExportDataResponse> {
        let report = self.trip_report(query).await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "SL Number",
            "Date",
            "Vehicle Number",
            "STR Number",
            "Villages",
            "Quantity",
            "Driver Name",
            "Mobile Number",
            "Initial Advances Total",
            "Initial Advances Count",
            "Additional Advances Total",
            "Additional Advances Count",
            "Grand Total Advances",
            "Total Advance Records",
        ])?;
        for row in &report.rows {
            writer.write_record(csv_row(&row.trip, &row.summary))?;
        }
        let bytes = writer
            .into_inner()
            .context("failed to finish csv export buffer")?;
        let csv_content =
            String::from_utf8(bytes).context("csv export produced invalid utf-8")?;

        let filename = format!(
            "roadline_trips_{}_{}.csv",
            query.date_from.format("%Y%m%d"),
            query.date_to.format("%Y%m%d"),
        );
        info!(
            "exported {} report rows ({} bytes) as {filename}",
            report.rows.len(),
            csv_content.len()
        );
        Ok(ExportDataResponse {
            row_count: report.rows.len(),
            csv_content,
            filename,
        })
    }

    /// Write the export to disk, defaulting to the platform documents folder.
    /// I/O problems come back as an unsuccessful response, not an error.
    pub async fn export_to_path(&self, request: ExportToPathRequest) -> Result<ExportToPathResponse> {
        let export = self.export_csv(&request.query).await?;

        let export_dir = match request.custom_path {
            Some(custom_path) if !custom_path.trim().is_empty() => {
                std::path::PathBuf::from(sanitize_path(&custom_path))
            }
            _ => match dirs::document_dir().or_else(dirs::home_dir) {
                Some(dir) => dir,
                None => {
                    error!("could not determine a default export directory");
                    return Ok(ExportToPathResponse {
                        success: false,
                        message: "Failed to determine export directory".to_string(),
                        file_path: String::new(),
                        row_count: 0,
                    });
                }
            },
        };

        let file_path = export_dir.join(&export.filename);
        if let Err(e) = std::fs::create_dir_all(&export_dir) {
            error!("failed to create export directory {}: {e}", export_dir.display());
            return Ok(ExportToPathResponse {
                success: false,
                message: format!("Failed to create export directory: {e}"),
                file_path: export_dir.to_string_lossy().to_string(),
                row_count: 0,
            });
        }

        match std::fs::write(&file_path, &export.csv_content) {
            Ok(()) => {
                let file_path = file_path.to_string_lossy().to_string();
                info!("exported {} rows to {file_path}", export.row_count);
                Ok(ExportToPathResponse {
                    success: true,
                    message: format!("File exported successfully to: {file_path}"),
                    file_path,
                    row_count: export.row_count,
                })
            }
            Err(e) => {
                error!("failed to write export file {}: {e}", file_path.display());
                Ok(ExportToPathResponse {
                    success: false,
                    message: format!("Failed to write export file: {e}"),
                    file_path: file_path.to_string_lossy().to_string(),
                    row_count: 0,
                })
            }
        }
    }
}

fn summarize(rows: &[TripReportRow]) -> ReportSummary {
    let total_trips = rows.len();
    let total_advances: f64 = rows.iter().map(|row| row.summary.grand_total).sum();
    let total_quantity: f64 = rows.iter().map(|row| row.trip.quantity).sum();
    let unique_vehicles = rows
        .iter()
        .map(|row| row.trip.vehicle_number.as_str())
        .collect::<HashSet<_>>()
        .len();
    let avg_advance_per_trip = if total_trips > 0 {
        total_advances / total_trips as f64
    } else {
        0.0
    };
    ReportSummary {
        total_trips,
        total_advances,
        total_quantity,
        unique_vehicles,
        avg_advance_per_trip,
    }
}

fn csv_row(trip: &Trip, summary: &TripAdvanceSummary) -> Vec<String> {
    vec![
        trip.sl_number.to_string(),
        trip.date.format("%Y-%m-%d").to_string(),
        trip.vehicle_number.clone(),
        trip.str_number.clone(),
        trip.villages.join("; "),
        trip.quantity.to_string(),
        trip.driver_name.clone(),
        trip.mobile_number.clone(),
        summary.initial_total.to_string(),
        summary.initial_count.to_string(),
        summary.additional_total.to_string(),
        summary.additional_count.to_string(),
        summary.grand_total.to_string(),
        summary.record_count.to_string(),
    ]
}

/// Clean up a user-supplied export path: quotes, escaped spaces, trailing
/// separators, tilde expansion.
fn sanitize_path(path: &str) -> String {
    let mut cleaned = path.trim().to_string();

    if (cleaned.starts_with('"') && cleaned.ends_with('"') && cleaned.len() >= 2)
        || (cleaned.starts_with('\'') && cleaned.ends_with('\'') && cleaned.len() >= 2)
    {
        cleaned = cleaned[1..cleaned.len() - 1].to_string();
    }
    cleaned = cleaned.trim().to_string();
    cleaned = cleaned.replace("\\ ", " ");
    while cleaned.ends_with('/') || cleaned.ends_with('\\') {
        cleaned.pop();
    }
    if cleaned.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            if cleaned == "~" {
                cleaned = home.to_string_lossy().to_string();
            } else if cleaned.starts_with("~/") || cleaned.starts_with("~\\") {
                cleaned = home.join(&cleaned[2..]).to_string_lossy().to_string();
            }
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use shared::{AdvanceKind, CreateTripRequest, VehicleType};

    use super::*;
    use crate::domain::trip_service::TripService;
    use crate::storage::sqlite::SqliteConnection;

    fn query(from: (i32, u32, u32), to: (i32, u32, u32)) -> TripReportQuery {
        TripReportQuery {
            date_from: NaiveDate::from_ymd_opt(from.0, from.1, from.2).unwrap(),
            date_to: NaiveDate::from_ymd_opt(to.0, to.1, to.2).unwrap(),
            vehicle_number: None,
            village: None,
        }
    }

    fn create_request(vehicle: &str, village: &str, advance: f64) -> CreateTripRequest {
        CreateTripRequest {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            vehicle_number: vehicle.to_string(),
            str_number: "STR-1".to_string(),
            villages: vec![village.to_string()],
            quantity: 10.0,
            driver_name: "Ravi".to_string(),
            mobile_number: "9876543210".to_string(),
            vehicle_type: VehicleType::Lorry,
            advance_amount: advance,
        }
    }

    async fn seeded_connection() -> SqliteConnection {
        let conn = SqliteConnection::connect_test().await.unwrap();
        let trips = TripService::new(&conn);
        trips
            .create_trip(create_request("KA01AB1234", "Hosur", 500.0))
            .await
            .unwrap();
        trips
            .create_trip(create_request("KA02CD5678", "Attibele", 0.0))
            .await
            .unwrap();
        conn
    }

    fn today() -> (i32, u32, u32) {
        // Trips are dated 2024-01-15 but advances are created "now", so the
        // report range has to cover both; use a wide window.
        (2024, 1, 15)
    }

    #[tokio::test]
    async fn report_reconciles_each_trip() {
        let conn = seeded_connection().await;
        let service = ReportService::new(&conn);

        let mut q = query(today(), today());
        q.date_to = Utc::now().date_naive();
        let report = service.trip_report(&q).await.unwrap();

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.summary.total_trips, 2);
        assert_eq!(report.summary.total_advances, 500.0);
        assert_eq!(report.summary.total_quantity, 20.0);
        assert_eq!(report.summary.unique_vehicles, 2);
        assert_eq!(report.summary.avg_advance_per_trip, 250.0);
    }

    #[tokio::test]
    async fn vehicle_filter_is_substring_and_case_insensitive() {
        let conn = seeded_connection().await;
        let service = ReportService::new(&conn);

        let mut q = query(today(), today());
        q.date_to = Utc::now().date_naive();
        q.vehicle_number = Some("ka01".to_string());
        let report = service.trip_report(&q).await.unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].trip.vehicle_number, "KA01AB1234");
    }

    #[tokio::test]
    async fn village_filter_matches_any_destination() {
        let conn = seeded_connection().await;
        let service = ReportService::new(&conn);

        let mut q = query(today(), today());
        q.date_to = Utc::now().date_naive();
        q.village = Some("atti".to_string());
        let report = service.trip_report(&q).await.unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].trip.villages, vec!["Attibele".to_string()]);
    }

    #[tokio::test]
    async fn empty_range_produces_zero_summary() {
        let conn = SqliteConnection::connect_test().await.unwrap();
        let service = ReportService::new(&conn);

        let report = service
            .trip_report(&query((2020, 1, 1), (2020, 1, 31)))
            .await
            .unwrap();
        assert!(report.rows.is_empty());
        assert_eq!(report.summary.avg_advance_per_trip, 0.0);
        assert_eq!(report.summary.unique_vehicles, 0);
    }

    #[tokio::test]
    async fn export_header_matches_summary_fields() {
        let conn = seeded_connection().await;
        let service = ReportService::new(&conn);

        let mut q = query(today(), today());
        q.date_to = Utc::now().date_naive();
        let export = service.export_csv(&q).await.unwrap();

        let mut lines = export.csv_content.lines();
        let header = lines.next().unwrap();
        assert_eq!(
            header,
            "SL Number,Date,Vehicle Number,STR Number,Villages,Quantity,\
             Driver Name,Mobile Number,Initial Advances Total,Initial Advances Count,\
             Additional Advances Total,Additional Advances Count,Grand Total Advances,\
             Total Advance Records"
        );
        assert_eq!(export.row_count, 2);
        assert_eq!(lines.count(), 2);
    }

    #[tokio::test]
    async fn export_rows_carry_reconciled_totals() {
        let conn = seeded_connection().await;
        let service = ReportService::new(&conn);

        let mut q = query(today(), today());
        q.date_to = Utc::now().date_naive();
        q.vehicle_number = Some("KA01AB1234".to_string());
        let export = service.export_csv(&q).await.unwrap();

        let data_line = export.csv_content.lines().nth(1).unwrap();
        let fields: Vec<&str> = data_line.split(',').collect();
        assert_eq!(fields[8], "500"); // initial total
        assert_eq!(fields[9], "1"); // initial count
        assert_eq!(fields[12], "500"); // grand total
    }

    #[tokio::test]
    async fn export_to_path_writes_the_file() {
        let conn = seeded_connection().await;
        let service = ReportService::new(&conn);
        let dir = tempfile::tempdir().unwrap();

        let mut q = query(today(), today());
        q.date_to = Utc::now().date_naive();
        let response = service
            .export_to_path(ExportToPathRequest {
                query: q,
                custom_path: Some(dir.path().to_string_lossy().to_string()),
            })
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.row_count, 2);
        let written = std::fs::read_to_string(&response.file_path).unwrap();
        assert!(written.starts_with("SL Number,"));
    }

    #[test]
    fn sanitize_path_handles_quotes_and_trailing_separators() {
        assert_eq!(sanitize_path("  /path/to/dir  "), "/path/to/dir");
        assert_eq!(sanitize_path("\"/path/to/dir\""), "/path/to/dir");
        assert_eq!(sanitize_path("'/path/to/dir/'"), "/path/to/dir");
        assert_eq!(sanitize_path("/path\\ to\\ dir"), "/path to dir");
    }
}
