//! Manual ordering of tasks.
//!
//! Active and archived tasks are ordered independently. Active tasks use
//! `order_index` values 0..n; archived tasks start one above the highest
//! active index, so the two ranges never collide and reordering one never
//! rewrites the other.
//!
//! Each changed index is written as its own update, sequentially. A failed
//! write is logged and skipped; callers reload from the backend afterwards,
//! and that reload is the source of truth for what is displayed.

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::backend::{DataAccess, Filter, Row, Table};
use crate::task::Task;

/// Which ordering namespace a reorder applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Active,
    Archived,
}

impl Partition {
    fn contains(self, task: &Task) -> bool {
        match self {
            Partition::Active => task.is_active(),
            Partition::Archived => task.archived,
        }
    }
}

/// Writes issued by one reorder.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReorderOutcome {
    pub written: usize,
    pub failed: usize,
}

/// Result of a drag gesture: `ids` with the item at `from` moved to `to`.
///
/// Returns `None` when nothing moved, so a no-op drag issues no writes.
pub fn move_item(ids: &[Uuid], from: usize, to: usize) -> Option<Vec<Uuid>> {
    if from == to || from >= ids.len() || to >= ids.len() {
        return None;
    }
    let mut out = ids.to_vec();
    let id = out.remove(from);
    out.insert(to, id);
    Some(out)
}

/// First index of the archived range.
pub fn archive_base(tasks: &[Task]) -> i64 {
    tasks
        .iter()
        .filter(|t| t.is_active())
        .map(|t| t.order_index)
        .max()
        .map_or(0, |max| max + 1)
}

/// Index updates needed so `sequence` reads `base, base+1, ...`.
///
/// Ids that are unknown or belong to the other partition are ignored;
/// tasks already at their target index are left alone.
pub fn plan(tasks: &[Task], partition: Partition, sequence: &[Uuid], base: i64) -> Vec<(Uuid, i64)> {
    sequence
        .iter()
        .filter_map(|id| tasks.iter().find(|t| t.id == *id && partition.contains(t)))
        .enumerate()
        .filter_map(|(pos, task)| {
            let target = base + pos as i64;
            (task.order_index != target).then_some((task.id, target))
        })
        .collect()
}

fn persist(backend: &mut dyn DataAccess, updates: &[(Uuid, i64)]) -> ReorderOutcome {
    let mut outcome = ReorderOutcome::default();
    for (id, order_index) in updates {
        let mut patch = Row::new();
        patch.insert("order_index".into(), json!(order_index));
        match backend.update(Table::Tasks, &patch, &[Filter::eq("id", id)]) {
            Ok(()) => outcome.written += 1,
            Err(e) => {
                warn!(task = %id, order_index, "order update failed: {e}");
                outcome.failed += 1;
            }
        }
    }
    outcome
}

/// Assign `order_index = position` to the active tasks in `sequence`.
pub fn reorder_active(backend: &mut dyn DataAccess, tasks: &[Task], sequence: &[Uuid]) -> ReorderOutcome {
    let updates = plan(tasks, Partition::Active, sequence, 0);
    let outcome = persist(backend, &updates);
    info!(written = outcome.written, failed = outcome.failed, "active order updated");
    outcome
}

/// Assign `order_index = archive_base + position` to the archived tasks in `sequence`.
pub fn reorder_archived(backend: &mut dyn DataAccess, tasks: &[Task], sequence: &[Uuid]) -> ReorderOutcome {
    let updates = plan(tasks, Partition::Archived, sequence, archive_base(tasks));
    let outcome = persist(backend, &updates);
    info!(written = outcome.written, failed = outcome.failed, "archive order updated");
    outcome
}

/// Ids of one partition in their current order.
fn current_sequence(tasks: &[Task], partition: Partition) -> Vec<Uuid> {
    let mut part: Vec<&Task> = tasks.iter().filter(|t| partition.contains(t)).collect();
    part.sort_by_key(|t| t.order_index);
    part.into_iter().map(|t| t.id).collect()
}

/// Index updates that renumber both partitions densely in their current
/// order: active tasks from 0, archived tasks right after the last active one.
pub fn settle_plan(tasks: &[Task]) -> Vec<(Uuid, i64)> {
    let active = current_sequence(tasks, Partition::Active);
    let archived = current_sequence(tasks, Partition::Archived);
    let mut updates = plan(tasks, Partition::Active, &active, 0);
    updates.extend(plan(tasks, Partition::Archived, &archived, active.len() as i64));
    updates
}

/// Close gaps and overlaps left after a task entered or left a partition.
pub fn settle(backend: &mut dyn DataAccess, tasks: &[Task]) -> ReorderOutcome {
    let updates = settle_plan(tasks);
    if updates.is_empty() {
        return ReorderOutcome::default();
    }
    let outcome = persist(backend, &updates);
    info!(written = outcome.written, failed = outcome.failed, "order indices settled");
    outcome
}
