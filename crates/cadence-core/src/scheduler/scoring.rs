//! Task priority scoring.

use jiff::civil::DateTime;

use super::timeline::minutes_between;
use crate::models::{Category, ScheduleTask};

pub const PRIORITY_WEIGHT: f64 = 0.5;
pub const DUE_WEIGHT: f64 = 0.4;
pub const CATEGORY_WEIGHT: f64 = 0.1;

pub const INDEX_WEIGHT: f64 = 0.8;
pub const ENERGY_WEIGHT: f64 = 0.2;

/// Weight of a category in `[0, 1]`.
pub fn category_factor(category: Category) -> f64 {
    match category {
        Category::Exam => 1.0,
        Category::Quiz => 0.8,
        Category::Project => 0.7,
        Category::Homework => 0.6,
        Category::Review => 0.5,
        Category::Reading => 0.4,
    }
}

/// Urgency in `(0, 1]`: 1 when due now or overdue, 0.5 one day out.
pub fn due_factor(now: DateTime, due: DateTime) -> f64 {
    let minutes = minutes_between(now, due);
    if minutes <= 0 {
        return 1.0;
    }
    let days = minutes as f64 / (24.0 * 60.0);
    1.0 / (1.0 + days)
}

/// `0.5 * priority + 0.4 * due + 0.1 * category`.
pub fn schedule_index(task: &ScheduleTask, now: DateTime) -> f64 {
    PRIORITY_WEIGHT * task.priority.factor()
        + DUE_WEIGHT * due_factor(now, task.due)
        + CATEGORY_WEIGHT * category_factor(task.category)
}

/// `0.8 * schedule_index + 0.2 * energy_match`.
pub fn placement_score(schedule_index: f64, energy_match: f64) -> f64 {
    INDEX_WEIGHT * schedule_index + ENERGY_WEIGHT * energy_match
}
