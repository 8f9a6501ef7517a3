pub mod advance_service;
pub mod advance_totals;
pub mod dashboard_service;
pub mod reconciliation;
pub mod report_service;
pub mod trip_service;
pub mod vehicle_service;
pub mod village_service;

pub use advance_service::AdvanceService;
pub use dashboard_service::DashboardService;
pub use report_service::ReportService;
pub use trip_service::TripService;
pub use vehicle_service::VehicleService;
pub use village_service::VillageService;
