//! Debounced background persistence.
//!
//! Mutations only enqueue the id of what changed. The persister waits until
//! no new command arrived for the debounce period, then writes everything
//! pending in one batch, reading the data from the latest published
//! snapshot.

use std::{collections::BTreeSet, path::PathBuf, sync::Arc, time::Duration};

use log::{debug, error};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::{self, JoinHandle},
    time,
};

use super::StoreSnapshot;
use crate::{
    db::Database,
    error::{CadenceError, Result},
    models::AssignmentPlan,
};

#[derive(Debug, Clone)]
pub(crate) struct PersisterConfig {
    pub(crate) db_path: PathBuf,
    pub(crate) debounce: Duration,
}

#[derive(Debug)]
pub(crate) enum PersistCommand {
    /// The plan of this work item changed
    Plan(String),
    /// The plan was deleted; carries its last state for block cleanup
    Delete(AssignmentPlan),
    /// The schedule changed
    Schedule,
    /// Write now and report the outcome
    Flush(oneshot::Sender<Result<()>>),
}

#[derive(Debug, Default)]
struct Pending {
    plans: BTreeSet<String>,
    deleted: Vec<AssignmentPlan>,
    schedule: bool,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.plans.is_empty() && self.deleted.is_empty() && !self.schedule
    }

    fn record(&mut self, command: PersistCommand) -> Option<oneshot::Sender<Result<()>>> {
        match command {
            PersistCommand::Plan(id) => {
                self.plans.insert(id);
            }
            PersistCommand::Delete(plan) => {
                self.plans.remove(&plan.work_item_id);
                self.deleted.push(plan);
            }
            PersistCommand::Schedule => self.schedule = true,
            PersistCommand::Flush(reply) => return Some(reply),
        }
        None
    }
}

pub(crate) fn spawn(
    config: PersisterConfig,
    snapshots: watch::Receiver<Arc<StoreSnapshot>>,
) -> (mpsc::UnboundedSender<PersistCommand>, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run(config, rx, snapshots));
    (tx, handle)
}

async fn run(
    config: PersisterConfig,
    mut commands: mpsc::UnboundedReceiver<PersistCommand>,
    snapshots: watch::Receiver<Arc<StoreSnapshot>>,
) {
    let mut pending = Pending::default();
    loop {
        let command = if pending.is_empty() {
            match commands.recv().await {
                Some(command) => command,
                None => break,
            }
        } else {
            match time::timeout(config.debounce, commands.recv()).await {
                Ok(Some(command)) => command,
                Ok(None) => break,
                Err(_) => {
                    if let Err(e) = write(&config, &snapshots, &mut pending).await {
                        error!("Failed to persist changes: {e}");
                    }
                    continue;
                }
            }
        };

        if let Some(reply) = pending.record(command) {
            let outcome = write(&config, &snapshots, &mut pending).await;
            if let Err(e) = &outcome {
                error!("Failed to persist changes: {e}");
            }
            let _ = reply.send(outcome);
        }
    }

    if !pending.is_empty() {
        if let Err(e) = write(&config, &snapshots, &mut pending).await {
            error!("Failed to persist changes on shutdown: {e}");
        }
    }
}

/// Writes and clears everything pending.
async fn write(
    config: &PersisterConfig,
    snapshots: &watch::Receiver<Arc<StoreSnapshot>>,
    pending: &mut Pending,
) -> Result<()> {
    if pending.is_empty() {
        return Ok(());
    }
    let batch = std::mem::take(pending);
    let snapshot = snapshots.borrow().clone();
    let plans: Vec<AssignmentPlan> = batch
        .plans
        .iter()
        .filter_map(|id| snapshot.plans.get(id).cloned())
        .collect();
    let schedule = batch.schedule.then(|| snapshot.schedule.clone());
    let deleted = batch.deleted;
    let db_path = config.db_path.clone();

    debug!(
        "Writing {} plans, {} deletions, schedule: {}",
        plans.len(),
        deleted.len(),
        schedule.is_some()
    );

    task::spawn_blocking(move || {
        let mut db = Database::new(&db_path)?;
        for plan in &deleted {
            db.delete_plan(plan)?;
        }
        db.save_plans(&plans)?;
        if let Some(schedule) = &schedule {
            db.save_schedule(schedule)?;
        }
        Ok::<(), CadenceError>(())
    })
    .await
    .map_err(CadenceError::join)?
}
