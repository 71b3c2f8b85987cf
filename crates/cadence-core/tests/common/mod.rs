#![allow(dead_code)]

use cadence_core::{
    models::{Category, Priority, WorkItem},
    PlanStore, StoreBuilder,
};
use jiff::civil::{date, Date, DateTime};
use tempfile::TempDir;

/// Helper function to create a test store backed by a temporary database
pub async fn create_test_store() -> (TempDir, PlanStore) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let store = StoreBuilder::new()
        .with_database_path(Some(&db_path))
        .build()
        .await
        .expect("Failed to create store");
    (temp_dir, store)
}

pub fn monday() -> Date {
    date(2026, 3, 2)
}

pub fn monday_morning() -> DateTime {
    monday().at(8, 0, 0, 0)
}

/// A work item starting on Monday 2026-03-02
pub fn work_item(id: &str, category: Category, due: DateTime, minutes: u32) -> WorkItem {
    WorkItem {
        id: id.to_string(),
        title: format!("{id} ({category})"),
        category,
        due,
        priority: Priority::Medium,
        estimated_minutes: minutes,
        start_date: monday(),
        user_steps: Vec::new(),
    }
}
