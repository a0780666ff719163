use std::cmp::Ordering;
use std::collections::HashSet;
use std::iter::Peekable;
use std::str::Chars;

use drive_core::{ChildKind, DriveClient, DriveError, DriveFile};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("drive listing failed: {0}")]
    List(#[from] DriveError),
    #[error("walk cancelled")]
    Cancelled,
}

/// One video in the remote tree, in traversal order. Rebuilt fresh on every
/// run, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    pub file_id: String,
    pub name: String,
}

/// Folders to skip, by id or by lowercased name.
#[derive(Debug, Default, Clone)]
pub struct ExclusionRules {
    ids: HashSet<String>,
    names: HashSet<String>,
}

impl ExclusionRules {
    pub fn new(
        ids: impl IntoIterator<Item = String>,
        names: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            names: names.into_iter().map(|name| name.to_lowercase()).collect(),
        }
    }

    pub fn excludes_id(&self, folder_id: &str) -> bool {
        self.ids.contains(folder_id)
    }

    fn excludes(&self, folder: &DriveFile) -> bool {
        self.ids.contains(&folder.id) || self.names.contains(&folder.name.to_lowercase())
    }
}

/// Depth-first pre-order traversal: per folder, all videos sorted by name,
/// then each non-excluded subfolder in the same order. The returned sequence
/// is the single source of truth for playback positions, so any listing
/// failure aborts the whole walk rather than yielding a truncated tree.
pub async fn walk(
    client: &DriveClient,
    root_folder_id: &str,
    rules: &ExclusionRules,
    page_size: u32,
    cancel: &CancellationToken,
) -> Result<Vec<RemoteItem>, WalkError> {
    if rules.excludes_id(root_folder_id) {
        return Ok(Vec::new());
    }
    let mut items = Vec::new();
    walk_folder(client, root_folder_id, rules, page_size, cancel, &mut items).await?;
    Ok(items)
}

async fn walk_folder(
    client: &DriveClient,
    folder_id: &str,
    rules: &ExclusionRules,
    page_size: u32,
    cancel: &CancellationToken,
    out: &mut Vec<RemoteItem>,
) -> Result<(), WalkError> {
    if cancel.is_cancelled() {
        return Err(WalkError::Cancelled);
    }

    let mut videos = client
        .list_children_all(folder_id, ChildKind::Video, page_size)
        .await?;
    sort_children(&mut videos);
    out.extend(videos.into_iter().map(|file| RemoteItem {
        file_id: file.id,
        name: file.name,
    }));

    if cancel.is_cancelled() {
        return Err(WalkError::Cancelled);
    }

    let mut folders = client
        .list_children_all(folder_id, ChildKind::Folder, page_size)
        .await?;
    sort_children(&mut folders);
    for folder in folders {
        if rules.excludes(&folder) {
            continue;
        }
        Box::pin(walk_folder(
            client, &folder.id, rules, page_size, cancel, out,
        ))
        .await?;
    }
    Ok(())
}

fn sort_children(files: &mut [DriveFile]) {
    // Name ties break on exact name, then id, so the order does not depend
    // on what order the API returned the pages in.
    files.sort_by(|a, b| {
        natural_cmp(&a.name, &b.name)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Case-insensitive comparison that orders embedded digit runs numerically,
/// so "Session 2" sorts before "Session 10".
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut chars_a = a.chars().peekable();
    let mut chars_b = b.chars().peekable();
    loop {
        match (chars_a.peek().copied(), chars_b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                if x.is_ascii_digit() && y.is_ascii_digit() {
                    let run_a = take_digit_run(&mut chars_a);
                    let run_b = take_digit_run(&mut chars_b);
                    let ord = cmp_digit_runs(&run_a, &run_b);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                } else {
                    let ord = x.to_lowercase().cmp(y.to_lowercase());
                    if ord != Ordering::Equal {
                        return ord;
                    }
                    chars_a.next();
                    chars_b.next();
                }
            }
        }
    }
}

fn take_digit_run(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    // Equal length means a plain lexicographic compare is numeric.
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn video_query(folder_id: &str) -> String {
        format!("'{folder_id}' in parents and mimeType contains 'video/' and trashed = false")
    }

    fn folder_query(folder_id: &str) -> String {
        format!(
            "'{folder_id}' in parents and mimeType = 'application/vnd.google-apps.folder' and trashed = false"
        )
    }

    async fn mount_children(
        server: &MockServer,
        folder_id: &str,
        videos: serde_json::Value,
        folders: serde_json::Value,
    ) {
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .and(query_param("q", video_query(folder_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "files": videos })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .and(query_param("q", folder_query(folder_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "files": folders })))
            .mount(server)
            .await;
    }

    fn names(items: &[RemoteItem]) -> Vec<&str> {
        items.iter().map(|item| item.name.as_str()).collect()
    }

    #[tokio::test]
    async fn walk_emits_parent_videos_before_subfolder_videos_in_numeric_order() {
        let server = MockServer::start().await;
        mount_children(
            &server,
            "root",
            json!([
                { "id": "v-10", "name": "Session 10.mp4" },
                { "id": "v-2", "name": "Session 2.mp4" }
            ]),
            json!([
                { "id": "sub-b", "name": "b extras" },
                { "id": "sub-a", "name": "A Advanced" }
            ]),
        )
        .await;
        mount_children(
            &server,
            "sub-a",
            json!([{ "id": "v-a", "name": "Closing.mp4" }]),
            json!([]),
        )
        .await;
        mount_children(
            &server,
            "sub-b",
            json!([{ "id": "v-b", "name": "Bonus.mp4" }]),
            json!([]),
        )
        .await;

        let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
        let items = walk(
            &client,
            "root",
            &ExclusionRules::default(),
            100,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            names(&items),
            vec![
                "Session 2.mp4",
                "Session 10.mp4",
                "Closing.mp4",
                "Bonus.mp4"
            ]
        );
    }

    #[tokio::test]
    async fn walk_skips_folders_by_id_and_case_insensitive_name() {
        let server = MockServer::start().await;
        mount_children(
            &server,
            "root",
            json!([{ "id": "v-1", "name": "Intro.mp4" }]),
            json!([
                { "id": "keep", "name": "Keep" },
                { "id": "old", "name": "ARCHIVE" },
                { "id": "blocked", "name": "Misc" }
            ]),
        )
        .await;
        mount_children(
            &server,
            "keep",
            json!([{ "id": "v-2", "name": "Kept.mp4" }]),
            json!([]),
        )
        .await;
        // No mocks for "old" or "blocked": listing them would fail the walk.

        let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
        let rules = ExclusionRules::new(["blocked".to_string()], ["archive".to_string()]);
        let items = walk(&client, "root", &rules, 100, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(names(&items), vec!["Intro.mp4", "Kept.mp4"]);
    }

    #[tokio::test]
    async fn walk_from_excluded_root_returns_empty_sequence() {
        let server = MockServer::start().await;
        let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
        let rules = ExclusionRules::new(["archive-root".to_string()], std::iter::empty());

        let items = walk(
            &client,
            "archive-root",
            &rules,
            100,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn walk_fails_fast_when_any_listing_fails() {
        let server = MockServer::start().await;
        mount_children(
            &server,
            "root",
            json!([{ "id": "v-1", "name": "Intro.mp4" }]),
            json!([{ "id": "broken", "name": "Broken" }]),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .and(query_param("q", video_query("broken")))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
            .mount(&server)
            .await;

        let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
        let err = walk(
            &client,
            "root",
            &ExclusionRules::default(),
            100,
            &CancellationToken::new(),
        )
        .await
        .expect_err("expected walk to abort");

        assert!(matches!(err, WalkError::List(_)));
    }

    #[tokio::test]
    async fn walk_stops_when_cancelled() {
        let server = MockServer::start().await;
        let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = walk(&client, "root", &ExclusionRules::default(), 100, &cancel)
            .await
            .expect_err("expected cancellation");

        assert!(matches!(err, WalkError::Cancelled));
    }

    #[test]
    fn natural_cmp_orders_digit_runs_numerically() {
        assert_eq!(natural_cmp("2", "10"), Ordering::Less);
        assert_eq!(natural_cmp("Session 2", "Session 10"), Ordering::Less);
        assert_eq!(natural_cmp("a2b", "a10b"), Ordering::Less);
        assert_eq!(natural_cmp("10", "10"), Ordering::Equal);
    }

    #[test]
    fn natural_cmp_ignores_case() {
        assert_eq!(natural_cmp("intro", "INTRO"), Ordering::Equal);
        assert_eq!(natural_cmp("Alpha", "beta"), Ordering::Less);
    }

    #[test]
    fn natural_cmp_treats_leading_zeros_as_equal_values() {
        assert_eq!(natural_cmp("02", "2"), Ordering::Equal);
        assert_eq!(natural_cmp("02", "3"), Ordering::Less);
        assert_eq!(natural_cmp("010", "9"), Ordering::Greater);
    }

    #[test]
    fn natural_cmp_shorter_prefix_sorts_first() {
        assert_eq!(natural_cmp("Session", "Session 2"), Ordering::Less);
    }
}
