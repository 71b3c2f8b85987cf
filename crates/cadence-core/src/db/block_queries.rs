//! Schedule persistence.

use jiff::civil::{Date, Time};
use rusqlite::{params, types::Type};

use crate::{
    error::{DatabaseResultExt, Result},
    models::{ScheduleResult, ScheduledBlock, UnscheduledTask},
};

const DELETE_BLOCKS_SQL: &str = "DELETE FROM blocks";
const DELETE_UNSCHEDULED_SQL: &str = "DELETE FROM unscheduled";
const INSERT_BLOCK_SQL: &str = "INSERT OR REPLACE INTO blocks (task_id, day, start_time, end_time, locked) VALUES (?1, ?2, ?3, ?4, ?5)";
const INSERT_UNSCHEDULED_SQL: &str = "INSERT OR REPLACE INTO unscheduled (task_id, remaining_minutes, reason) VALUES (?1, ?2, ?3)";
const SELECT_BLOCKS_SQL: &str = "SELECT task_id, day, start_time, end_time, locked FROM blocks ORDER BY day, start_time, task_id";
const SELECT_UNSCHEDULED_SQL: &str = "SELECT task_id, remaining_minutes, reason FROM unscheduled ORDER BY task_id";
const DELETE_TASK_BLOCKS_SQL: &str = "DELETE FROM blocks WHERE task_id = ?1";

fn parse_column<T>(row: &rusqlite::Row, index: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    row.get::<_, String>(index)?
        .parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

impl super::Database {
    fn build_block_from_row(row: &rusqlite::Row) -> rusqlite::Result<ScheduledBlock> {
        Ok(ScheduledBlock {
            task_id: row.get(0)?,
            day: parse_column::<Date>(row, 1)?,
            start: parse_column::<Time>(row, 2)?,
            end: parse_column::<Time>(row, 3)?,
            locked: row.get(4)?,
        })
    }

    /// Replaces the stored schedule with `result`. Decisions are not stored.
    pub fn save_schedule(&mut self, result: &ScheduleResult) -> Result<()> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        tx.execute(DELETE_BLOCKS_SQL, [])
            .db_context("Failed to clear blocks")?;
        tx.execute(DELETE_UNSCHEDULED_SQL, [])
            .db_context("Failed to clear unscheduled tasks")?;

        for block in &result.blocks {
            tx.execute(
                INSERT_BLOCK_SQL,
                params![
                    block.task_id,
                    block.day.to_string(),
                    block.start.to_string(),
                    block.end.to_string(),
                    block.locked
                ],
            )
            .db_context("Failed to insert block")?;
        }
        for task in &result.unscheduled {
            tx.execute(
                INSERT_UNSCHEDULED_SQL,
                params![task.task_id, task.remaining_minutes, task.reason],
            )
            .db_context("Failed to insert unscheduled task")?;
        }

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(())
    }

    /// Loads the stored schedule, blocks ordered by day and start time.
    pub fn load_schedule(&self) -> Result<ScheduleResult> {
        let mut stmt = self
            .connection
            .prepare(SELECT_BLOCKS_SQL)
            .db_context("Failed to prepare query")?;
        let blocks = stmt
            .query_map([], Self::build_block_from_row)
            .db_context("Failed to query blocks")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .db_context("Failed to read block row")?;

        let mut stmt = self
            .connection
            .prepare(SELECT_UNSCHEDULED_SQL)
            .db_context("Failed to prepare query")?;
        let unscheduled = stmt
            .query_map([], |row| {
                Ok(UnscheduledTask {
                    task_id: row.get(0)?,
                    remaining_minutes: row.get(1)?,
                    reason: row.get(2)?,
                })
            })
            .db_context("Failed to query unscheduled tasks")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .db_context("Failed to read unscheduled row")?;

        Ok(ScheduleResult {
            blocks,
            unscheduled,
            decisions: Vec::new(),
        })
    }

    /// Removes every stored block of `task_id`, returning how many were
    /// deleted.
    pub fn delete_blocks_for(&mut self, task_id: &str) -> Result<usize> {
        self.connection
            .execute(DELETE_TASK_BLOCKS_SQL, params![task_id])
            .db_context("Failed to delete blocks")
    }
}
