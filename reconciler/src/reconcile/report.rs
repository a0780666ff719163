use super::applier::ApplyOutcome;
use super::engine::{IdRepair, PositionRepair, ReconcilePlan};

fn fmt_order(order: Option<i64>) -> String {
    match order {
        Some(value) => value.to_string(),
        None => "none".to_string(),
    }
}

pub fn describe_id_repair(repair: &IdRepair) -> String {
    format!(
        "{}: drive_file_id {} -> {}, order {} -> {}{}",
        repair.name,
        repair.old_file_id.as_deref().unwrap_or("none"),
        repair.new_file_id,
        fmt_order(repair.old_order),
        repair.new_order,
        if repair.has_playback_asset {
            " (has playback asset)"
        } else {
            ""
        },
    )
}

pub fn describe_position_repair(repair: &PositionRepair) -> String {
    format!(
        "{}: order {} -> {}",
        repair.name,
        fmt_order(repair.old_order),
        repair.new_order
    )
}

/// The pre-apply analysis: counts, then every intended change old -> new,
/// then the unmatched warnings.
pub fn render_plan(plan: &ReconcilePlan) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} videos with a stale drive_file_id\n",
        plan.id_repairs.len()
    ));
    out.push_str(&format!(
        "{} videos with a wrong playback_order\n",
        plan.position_repairs.len()
    ));
    out.push_str(&format!(
        "{} drive videos without a catalog match\n",
        plan.unmatched.len()
    ));

    if !plan.id_repairs.is_empty() {
        out.push_str("\ndrive_file_id repairs:\n");
        for repair in &plan.id_repairs {
            out.push_str(&format!("  {}\n", describe_id_repair(repair)));
        }
    }
    if !plan.position_repairs.is_empty() {
        out.push_str("\nplayback_order updates:\n");
        for repair in &plan.position_repairs {
            out.push_str(&format!("  {}\n", describe_position_repair(repair)));
        }
    }
    if !plan.unmatched.is_empty() {
        out.push_str("\nno catalog match (run the drive ingest sync first):\n");
        for unmatched in &plan.unmatched {
            out.push_str(&format!(
                "  {} (drive_file_id: {})\n",
                unmatched.name, unmatched.file_id
            ));
        }
    }
    out
}

pub fn render_summary(outcome: &ApplyOutcome) -> String {
    let mut out = format!(
        "done: {} file ids repaired, {} orders updated\n",
        outcome.repaired, outcome.reordered
    );
    if !outcome.failures.is_empty() {
        out.push_str(&format!("{} writes failed:\n", outcome.failures.len()));
        for failure in &outcome.failures {
            out.push_str(&format!(
                "  record {} ({}): {} [{}]\n",
                failure.record_id, failure.name, failure.change, failure.error
            ));
        }
    }
    if outcome.cancelled {
        out.push_str("cancelled before all repairs were applied; re-run to finish\n");
    }
    out
}
