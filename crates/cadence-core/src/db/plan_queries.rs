//! Plan record persistence.

use jiff::Timestamp;
use log::warn;
use rusqlite::{params, OptionalExtension};

use crate::{
    error::{DatabaseResultExt, Result},
    models::{AssignmentPlan, PlanRecord},
};

const UPSERT_PLAN_SQL: &str = "INSERT INTO plans (work_item_id, version, record, updated_at) VALUES (?1, ?2, ?3, ?4) \
     ON CONFLICT(work_item_id) DO UPDATE SET version = excluded.version, record = excluded.record, updated_at = excluded.updated_at";
const SELECT_PLAN_SQL: &str = "SELECT record FROM plans WHERE work_item_id = ?1";
const SELECT_ALL_PLANS_SQL: &str = "SELECT work_item_id, record FROM plans ORDER BY work_item_id";
const DELETE_PLAN_SQL: &str = "DELETE FROM plans WHERE work_item_id = ?1";
const DELETE_PLAN_BLOCKS_SQL: &str = "DELETE FROM blocks WHERE task_id IN (SELECT value FROM json_each(?1))";
const DELETE_PLAN_UNSCHEDULED_SQL: &str = "DELETE FROM unscheduled WHERE task_id IN (SELECT value FROM json_each(?1))";

/// Decodes a stored record, falling back to an empty plan on any failure.
pub(crate) fn decode_plan(work_item_id: &str, raw: &str) -> AssignmentPlan {
    let decoded = serde_json::from_str::<PlanRecord>(raw)
        .map_err(Into::into)
        .and_then(AssignmentPlan::from_record);

    match decoded {
        Ok(plan) => plan,
        Err(e) => {
            warn!("Stored plan '{work_item_id}' could not be decoded, using an empty plan: {e}");
            AssignmentPlan::new(work_item_id)
        }
    }
}

impl super::Database {
    /// Inserts or replaces the stored record of `plan`.
    pub fn save_plan(&mut self, plan: &AssignmentPlan) -> Result<()> {
        self.save_plans(std::slice::from_ref(plan))
    }

    /// Writes several plans in one transaction.
    pub fn save_plans(&mut self, plans: &[AssignmentPlan]) -> Result<()> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;
        let now = Timestamp::now().to_string();

        for plan in plans {
            let record = plan.to_record();
            let json = serde_json::to_string(&record)?;
            tx.execute(
                UPSERT_PLAN_SQL,
                params![record.work_item_id, record.version, json, now],
            )
            .db_context("Failed to save plan")?;
        }

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(())
    }

    /// Loads one plan. Undecodable records come back as empty plans.
    pub fn load_plan(&self, work_item_id: &str) -> Result<Option<AssignmentPlan>> {
        let raw: Option<String> = self
            .connection
            .query_row(SELECT_PLAN_SQL, params![work_item_id], |row| row.get(0))
            .optional()
            .db_context("Failed to query plan")?;

        Ok(raw.map(|raw| decode_plan(work_item_id, &raw)))
    }

    /// Loads every stored plan ordered by work item id.
    pub fn load_plans(&self) -> Result<Vec<AssignmentPlan>> {
        let mut stmt = self
            .connection
            .prepare(SELECT_ALL_PLANS_SQL)
            .db_context("Failed to prepare query")?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .db_context("Failed to query plans")?;

        let mut plans = Vec::new();
        for row in rows {
            let (id, raw) = row.db_context("Failed to read plan row")?;
            plans.push(decode_plan(&id, &raw));
        }
        Ok(plans)
    }

    /// Deletes a plan and the blocks of its steps. Returns whether a plan was
    /// removed.
    pub fn delete_plan(&mut self, plan: &AssignmentPlan) -> Result<bool> {
        let step_ids: Vec<&str> = plan.graph.steps().iter().map(|s| s.id.as_str()).collect();
        let step_ids = serde_json::to_string(&step_ids)?;

        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;
        tx.execute(DELETE_PLAN_BLOCKS_SQL, params![step_ids])
            .db_context("Failed to delete plan blocks")?;
        tx.execute(DELETE_PLAN_UNSCHEDULED_SQL, params![step_ids])
            .db_context("Failed to delete unscheduled plan steps")?;
        let deleted = tx
            .execute(DELETE_PLAN_SQL, params![plan.work_item_id])
            .db_context("Failed to delete plan")?;
        tx.commit().db_context("Failed to commit transaction")?;

        Ok(deleted > 0)
    }
}
