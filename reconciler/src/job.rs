use anyhow::Context;
use drive_core::DriveClient;
use tokio_util::sync::CancellationToken;

use crate::catalog::CatalogStore;
use crate::reconcile::index::CatalogIndex;
use crate::reconcile::walker::ExclusionRules;
use crate::reconcile::{applier, engine, report, walker};

const DEFAULT_PAGE_SIZE: u32 = 1000;
const DEFAULT_SKIP_FOLDER_NAMES: &[&str] = &["archive", "archive 2", "archive2", "duplicates", "raw"];

#[derive(Clone, Debug)]
pub struct JobConfig {
    pub access_token: String,
    pub database_url: String,
    pub api_base: Option<String>,
    pub root_folder_id: String,
    pub archive_folder_id: Option<String>,
    pub skip_folder_names: Vec<String>,
    pub page_size: u32,
    pub dry_run: bool,
}

impl JobConfig {
    pub fn from_env(dry_run: bool) -> anyhow::Result<Self> {
        let access_token = require_env("DRIVE_ACCESS_TOKEN")?;
        let database_url = require_env("CATALOG_DATABASE_URL")?;
        let root_folder_id = require_env("DRIVE_ROOT_FOLDER_ID")?;
        let api_base = read_env("DRIVE_API_BASE");
        let archive_folder_id = read_env("DRIVE_ARCHIVE_FOLDER_ID");
        let skip_folder_names = read_env("RECONCILE_SKIP_FOLDERS")
            .map(|raw| parse_skip_folders(&raw))
            .unwrap_or_else(default_skip_folders);
        let page_size = read_u32_env("DRIVE_PAGE_SIZE", DEFAULT_PAGE_SIZE);

        Ok(Self {
            access_token,
            database_url,
            api_base,
            root_folder_id,
            archive_folder_id,
            skip_folder_names,
            page_size,
            dry_run,
        })
    }

    fn exclusion_rules(&self) -> ExclusionRules {
        ExclusionRules::new(
            self.archive_folder_id.iter().cloned(),
            self.skip_folder_names.iter().cloned(),
        )
    }
}

pub struct JobRuntime {
    config: JobConfig,
    client: DriveClient,
    store: CatalogStore,
}

impl JobRuntime {
    pub fn new(config: JobConfig, client: DriveClient, store: CatalogStore) -> Self {
        Self {
            config,
            client,
            store,
        }
    }

    pub async fn bootstrap(config: JobConfig) -> anyhow::Result<Self> {
        let client = match config.api_base.as_deref() {
            Some(base) => DriveClient::with_base_url(base, config.access_token.clone()),
            None => DriveClient::new(config.access_token.clone()),
        }
        .context("failed to build drive client")?;
        let store = CatalogStore::connect(&config.database_url)
            .await
            .context("failed to open catalog database")?;
        Ok(Self::new(config, client, store))
    }

    /// Runs the phases strictly in order: the walk must complete and succeed
    /// in full before any classification happens, and classification before
    /// any write.
    pub async fn run(&self, cancel: &CancellationToken) -> anyhow::Result<()> {
        if self.config.dry_run {
            eprintln!("[reconciler] dry-run: no changes will be written");
        }

        eprintln!("[reconciler] loading catalog records");
        let records = self
            .store
            .load_active_records()
            .await
            .context("failed to load catalog records")?;
        eprintln!("[reconciler] {} active records loaded", records.len());
        let index = CatalogIndex::build(&records);

        eprintln!(
            "[reconciler] walking drive tree from {}",
            self.config.root_folder_id
        );
        let items = walker::walk(
            &self.client,
            &self.config.root_folder_id,
            &self.config.exclusion_rules(),
            self.config.page_size,
            cancel,
        )
        .await
        .context("drive traversal failed")?;
        eprintln!("[reconciler] {} videos found in drive", items.len());

        let plan = engine::reconcile(&items, &index);
        print!("{}", report::render_plan(&plan));

        let outcome = applier::apply(&self.store, &plan, self.config.dry_run, cancel).await;
        if self.config.dry_run {
            println!("dry-run: no changes were written");
        } else {
            print!("{}", report::render_summary(&outcome));
        }
        Ok(())
    }
}

fn require_env(name: &str) -> anyhow::Result<String> {
    read_env(name).with_context(|| format!("{name} is not set"))
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn read_u32_env(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn parse_skip_folders(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_skip_folders() -> Vec<String> {
    DEFAULT_SKIP_FOLDER_NAMES
        .iter()
        .map(|name| name.to_string())
        .collect()
}
