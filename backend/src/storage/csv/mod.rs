pub mod advance_repository;
pub mod connection;
pub mod trip_repository;
pub mod vehicle_repository;
pub mod village_repository;

#[cfg(test)]
pub mod test_utils;

pub use connection::CsvConnection;

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use shared::{Advance, AdvanceKind, StrStatus, Trip, Vehicle, VehicleType, Village};

    use super::test_utils::TestHelper;
    use crate::storage::traits::{AdvanceStore, TripStore, VehicleStore, VillageStore};

    fn sample_trip(id: &str, sl_number: u32) -> Trip {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        Trip {
            id: id.to_string(),
            sl_number,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            vehicle_number: "KA01AB1234".to_string(),
            str_number: "STR-77".to_string(),
            str_status: StrStatus::Received,
            villages: vec!["Hosur".to_string(), "Attibele".to_string()],
            quantity: 12.5,
            driver_name: "Ravi".to_string(),
            mobile_number: "9876543210".to_string(),
            vehicle_type: VehicleType::Pickup,
            advance_amount: 500.0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn trip_round_trip_preserves_fields() {
        let helper = TestHelper::new().unwrap();
        let trip = sample_trip("trip-1", 1);
        helper.trip_repo.store_trip(&trip).await.unwrap();

        let loaded = helper.trip_repo.get_trip("trip-1").await.unwrap().unwrap();
        assert_eq!(loaded, trip);
    }

    #[tokio::test]
    async fn update_rewrites_only_the_matching_trip() {
        let helper = TestHelper::new().unwrap();
        helper.trip_repo.store_trip(&sample_trip("trip-1", 1)).await.unwrap();
        helper.trip_repo.store_trip(&sample_trip("trip-2", 2)).await.unwrap();

        let mut edited = sample_trip("trip-1", 1);
        edited.quantity = 99.0;
        helper.trip_repo.update_trip(&edited).await.unwrap();

        let one = helper.trip_repo.get_trip("trip-1").await.unwrap().unwrap();
        let two = helper.trip_repo.get_trip("trip-2").await.unwrap().unwrap();
        assert_eq!(one.quantity, 99.0);
        assert_eq!(two.quantity, 12.5);
    }

    #[tokio::test]
    async fn empty_village_list_survives_round_trip() {
        let helper = TestHelper::new().unwrap();
        let mut trip = sample_trip("trip-1", 1);
        trip.villages = Vec::new();
        helper.trip_repo.store_trip(&trip).await.unwrap();

        let loaded = helper.trip_repo.get_trip("trip-1").await.unwrap().unwrap();
        assert!(loaded.villages.is_empty());
    }

    #[tokio::test]
    async fn orphaned_advance_keeps_empty_trip_reference() {
        let helper = TestHelper::new().unwrap();
        let advance = Advance {
            id: "adv-1".to_string(),
            vehicle_number: "KA01AB1234".to_string(),
            trip_id: None,
            trip_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            amount: 250.0,
            kind: None,
            note: "fuel".to_string(),
            is_settled: false,
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
        };
        helper.advance_repo.store_advance(&advance).await.unwrap();

        let orphans = helper
            .advance_repo
            .orphaned_advances_by_vehicle("KA01AB1234")
            .await
            .unwrap();
        assert_eq!(orphans, vec![advance]);
    }

    #[tokio::test]
    async fn advance_kind_tag_round_trips() {
        let helper = TestHelper::new().unwrap();
        let advance = Advance {
            id: "adv-1".to_string(),
            vehicle_number: "KA01AB1234".to_string(),
            trip_id: Some("trip-1".to_string()),
            trip_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            amount: 250.0,
            kind: Some(AdvanceKind::Initial),
            note: String::new(),
            is_settled: true,
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
        };
        helper.advance_repo.store_advance(&advance).await.unwrap();

        let loaded = helper.advance_repo.advances_by_trip("trip-1").await.unwrap();
        assert_eq!(loaded, vec![advance]);
    }

    #[tokio::test]
    async fn vehicle_upsert_and_soft_delete() {
        let helper = TestHelper::new().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut vehicle = Vehicle {
            vehicle_number: "KA01AB1234".to_string(),
            driver_name: "Ravi".to_string(),
            mobile_number: "9876543210".to_string(),
            vehicle_type: VehicleType::Lorry,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        helper.vehicle_repo.store_vehicle(&vehicle).await.unwrap();

        vehicle.driver_name = "Suresh".to_string();
        helper.vehicle_repo.store_vehicle(&vehicle).await.unwrap();
        let active = helper.vehicle_repo.list_active_vehicles().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].driver_name, "Suresh");

        assert!(helper
            .vehicle_repo
            .deactivate_vehicle("KA01AB1234")
            .await
            .unwrap());
        assert!(helper
            .vehicle_repo
            .list_active_vehicles()
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn village_usage_counter_persists() {
        let helper = TestHelper::new().unwrap();
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        helper
            .village_repo
            .store_village(&Village {
                id: "v-1".to_string(),
                name: "Hosur".to_string(),
                is_active: true,
                usage_count: 0,
                last_used: created,
            })
            .await
            .unwrap();

        let used_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        assert!(helper.village_repo.record_usage("v-1", used_at).await.unwrap());
        assert!(helper.village_repo.record_usage("v-1", used_at).await.unwrap());

        let village = helper
            .village_repo
            .find_village_by_name("Hosur")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(village.usage_count, 2);
        assert_eq!(village.last_used, used_at);
    }
}
