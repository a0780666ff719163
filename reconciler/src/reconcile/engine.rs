use std::collections::HashSet;

use super::index::CatalogIndex;
use super::walker::RemoteItem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdRepair {
    pub record_id: i64,
    pub name: String,
    pub old_file_id: Option<String>,
    pub new_file_id: String,
    pub old_order: Option<i64>,
    pub new_order: i64,
    pub has_playback_asset: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionRepair {
    pub record_id: i64,
    pub name: String,
    pub old_order: Option<i64>,
    pub new_order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmatchedItem {
    pub file_id: String,
    pub name: String,
}

/// Output of one reconciliation pass. Built once, then only read.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub id_repairs: Vec<IdRepair>,
    pub position_repairs: Vec<PositionRepair>,
    pub unmatched: Vec<UnmatchedItem>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.id_repairs.is_empty() && self.position_repairs.is_empty() && self.unmatched.is_empty()
    }

    pub fn repair_count(&self) -> usize {
        self.id_repairs.len() + self.position_repairs.len()
    }
}

/// Classifies each remote item against the catalog index.
///
/// The playback position of an item is its 1-based index in the walked
/// sequence; the counter advances once per item whatever the outcome, so
/// positions reflect the item's true global rank.
///
/// Each catalog record is claimed by at most one remote item per run. If a
/// later item would resolve to an already-claimed record (two remote videos
/// sharing a name, one of them also holding the stored id), it is reported
/// as unmatched instead of producing a second conflicting repair.
pub fn reconcile(items: &[RemoteItem], index: &CatalogIndex<'_>) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();
    let mut claimed: HashSet<i64> = HashSet::new();

    for (idx, item) in items.iter().enumerate() {
        let position = idx as i64 + 1;

        if let Some(record) = index.by_file_id(&item.file_id) {
            if !claimed.insert(record.id) {
                plan.unmatched.push(UnmatchedItem {
                    file_id: item.file_id.clone(),
                    name: item.name.clone(),
                });
            } else if record.playback_order != Some(position) {
                plan.position_repairs.push(PositionRepair {
                    record_id: record.id,
                    name: item.name.clone(),
                    old_order: record.playback_order,
                    new_order: position,
                });
            }
        } else if let Some(record) = index.by_name(&item.name) {
            if !claimed.insert(record.id) {
                plan.unmatched.push(UnmatchedItem {
                    file_id: item.file_id.clone(),
                    name: item.name.clone(),
                });
            } else {
                plan.id_repairs.push(IdRepair {
                    record_id: record.id,
                    name: item.name.clone(),
                    old_file_id: record.drive_file_id.clone(),
                    new_file_id: item.file_id.clone(),
                    old_order: record.playback_order,
                    new_order: position,
                    has_playback_asset: record.has_playback_asset(),
                });
            }
        } else {
            plan.unmatched.push(UnmatchedItem {
                file_id: item.file_id.clone(),
                name: item.name.clone(),
            });
        }
    }

    plan
}
