//! Work items (assignments) and their categories.

use std::{fmt, str::FromStr};

use jiff::civil::{Date, DateTime};
use serde::{Deserialize, Serialize};

use super::Priority;

/// Closed set of work-item categories driving plan generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Exam,
    Quiz,
    Homework,
    Reading,
    Project,
    Review,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Exam,
        Category::Quiz,
        Category::Homework,
        Category::Reading,
        Category::Project,
        Category::Review,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Exam => "exam",
            Category::Quiz => "quiz",
            Category::Homework => "homework",
            Category::Reading => "reading",
            Category::Project => "project",
            Category::Review => "review",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exam" | "test" | "midterm" | "final" => Ok(Category::Exam),
            "quiz" => Ok(Category::Quiz),
            "homework" | "hw" | "assignment" => Ok(Category::Homework),
            "reading" => Ok(Category::Reading),
            "project" => Ok(Category::Project),
            "review" => Ok(Category::Review),
            _ => Err(format!("Invalid category: {s}")),
        }
    }
}

/// A step the author supplied explicitly (projects).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserStep {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes: Option<u32>,
}

/// High-level work item metadata consumed by the plan generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkItem {
    /// Unique identifier of the work item
    pub id: String,

    /// Human-readable title
    pub title: String,

    pub category: Category,

    /// Local due date and time
    pub due: DateTime,

    /// Scheduling priority of the work item
    #[serde(default)]
    pub priority: Priority,

    /// Estimated total effort in minutes
    pub estimated_minutes: u32,

    /// First day steps may be planned on
    pub start_date: Date,

    /// Author-specified steps, used by categories that accept them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_steps: Vec<UserStep>,
}
