use tokio_util::sync::CancellationToken;

use super::engine::ReconcilePlan;
use super::report;
use crate::catalog::CatalogStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairFailure {
    pub record_id: i64,
    pub name: String,
    pub change: String,
    pub error: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub repaired: usize,
    pub reordered: usize,
    pub failures: Vec<RepairFailure>,
    pub cancelled: bool,
}

/// Applies the plan record by record. Repairs are independent, so one bad
/// row is recorded and the batch continues; in dry-run mode nothing is
/// written at all. Cancellation is honored between writes, never mid-write.
pub async fn apply(
    store: &CatalogStore,
    plan: &ReconcilePlan,
    dry_run: bool,
    cancel: &CancellationToken,
) -> ApplyOutcome {
    let mut outcome = ApplyOutcome::default();
    if dry_run {
        return outcome;
    }

    for repair in &plan.id_repairs {
        if cancel.is_cancelled() {
            outcome.cancelled = true;
            return outcome;
        }
        match store
            .update_file_id_and_order(repair.record_id, &repair.new_file_id, repair.new_order)
            .await
        {
            Ok(()) => {
                eprintln!(
                    "[reconciler] {} -> drive_file_id updated, order {}",
                    repair.name, repair.new_order
                );
                outcome.repaired += 1;
            }
            Err(err) => {
                eprintln!("[reconciler] failed to repair {}: {err}", repair.name);
                outcome.failures.push(RepairFailure {
                    record_id: repair.record_id,
                    name: repair.name.clone(),
                    change: report::describe_id_repair(repair),
                    error: err.to_string(),
                });
            }
        }
    }

    for repair in &plan.position_repairs {
        if cancel.is_cancelled() {
            outcome.cancelled = true;
            return outcome;
        }
        match store.update_order(repair.record_id, repair.new_order).await {
            Ok(()) => {
                eprintln!(
                    "[reconciler] {} -> order {}",
                    repair.name, repair.new_order
                );
                outcome.reordered += 1;
            }
            Err(err) => {
                eprintln!("[reconciler] failed to reorder {}: {err}", repair.name);
                outcome.failures.push(RepairFailure {
                    record_id: repair.record_id,
                    name: repair.name.clone(),
                    change: report::describe_position_repair(repair),
                    error: err.to_string(),
                });
            }
        }
    }

    outcome
}
