use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::catalog::CatalogRecord;

/// Lookup structures over the loaded catalog, built once per run.
///
/// `by_name` keeps a single winner per uppercased file name. Re-uploads leave
/// duplicate rows behind, and the row that already has a playback asset is
/// the one downstream consumers depend on, so it wins over an empty stub.
/// Among equal candidates the first-loaded row wins.
pub struct CatalogIndex<'a> {
    by_file_id: HashMap<&'a str, &'a CatalogRecord>,
    by_name: HashMap<String, &'a CatalogRecord>,
}

impl<'a> CatalogIndex<'a> {
    pub fn build(records: &'a [CatalogRecord]) -> Self {
        let mut by_file_id = HashMap::new();
        for record in records {
            if let Some(file_id) = record.drive_file_id.as_deref() {
                by_file_id.insert(file_id, record);
            }
        }

        let mut by_name: HashMap<String, &'a CatalogRecord> = HashMap::new();
        for record in records {
            let Some(name) = record.drive_file_name.as_deref() else {
                continue;
            };
            match by_name.entry(name.to_uppercase()) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
                Entry::Occupied(mut slot) => {
                    if record.has_playback_asset() && !slot.get().has_playback_asset() {
                        slot.insert(record);
                    }
                }
            }
        }

        Self {
            by_file_id,
            by_name,
        }
    }

    pub fn by_file_id(&self, file_id: &str) -> Option<&'a CatalogRecord> {
        self.by_file_id.get(file_id).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<&'a CatalogRecord> {
        self.by_name.get(&name.to_uppercase()).copied()
    }
}
