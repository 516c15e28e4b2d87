//! Local content directory scanning.

use std::path::{Path, PathBuf};

use notegarden_shared::{ContentNode, GardenError, Result};
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use crate::stable_id;

/// File extensions treated as notes.
const NOTE_EXTENSIONS: &[&str] = &["md", "mdx"];

/// Resolve the configured content path against the project directory.
pub fn resolve_content_dir(project_dir: &Path, content_path: &str) -> PathBuf {
    let path = Path::new(content_path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_dir.join(path)
    }
}

/// Create the content directory if it does not exist yet.
pub fn ensure_content_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| GardenError::io(dir, e))?;
        info!(path = %dir.display(), "created content directory");
    }
    Ok(())
}

/// Walk `root` and produce one local-file node per note, labeled with
/// `origin`. Hidden files and directories are skipped; order is by path.
#[instrument(skip_all, fields(root = %root.display(), origin = %origin))]
pub fn scan_local_dir(root: &Path, origin: &str) -> Result<Vec<ContentNode>> {
    let mut nodes = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            GardenError::io(path, std::io::Error::other(e.to_string()))
        })?;

        if !entry.file_type().is_file() || !is_note(entry.path()) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| GardenError::validation(format!("{}: {e}", entry.path().display())))?;

        let Some(node) = node_for(relative, origin) else {
            debug!(path = %relative.display(), "skipping file with non UTF-8 name");
            continue;
        };
        nodes.push(node);
    }

    info!(count = nodes.len(), "local notes scanned");
    Ok(nodes)
}

fn node_for(relative: &Path, origin: &str) -> Option<ContentNode> {
    let components = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    let (file_name, dirs) = components.split_last()?;
    let name = relative.file_stem()?.to_str()?;
    let dir = dirs.join("/");

    // The id keys on the full relative path, extension included, so that
    // `note.md` and `note.mdx` stay distinct nodes.
    let key = if dir.is_empty() {
        (*file_name).to_string()
    } else {
        format!("{dir}/{file_name}")
    };
    let id = stable_id("file", &[origin, &key]);
    Some(ContentNode::local_file(id, origin, dir, name))
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}

fn is_note(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| NOTE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ng-local-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "# note\n").unwrap();
    }

    #[test]
    fn scans_notes_with_dir_and_stem() {
        let tmp = temp_dir();
        touch(&tmp, "sub/My Page.md");
        touch(&tmp, "index.mdx");
        touch(&tmp, "image.png");
        touch(&tmp, ".obsidian/config.md");
        touch(&tmp, "a/b/Deep.MD");

        let nodes = scan_local_dir(&tmp, "/notes").unwrap();
        let parts: Vec<(String, String)> = nodes
            .iter()
            .map(|n| {
                let p = n.relative_path.clone().unwrap();
                (p.dir, p.name)
            })
            .collect();

        assert_eq!(
            parts,
            [
                ("a/b".to_string(), "Deep".to_string()),
                (String::new(), "index".to_string()),
                ("sub".to_string(), "My Page".to_string()),
            ]
        );
        assert!(nodes.iter().all(|n| n.source_origin == "/notes"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ids_are_stable_across_scans() {
        let tmp = temp_dir();
        touch(&tmp, "one.md");
        touch(&tmp, "two.md");

        let first = scan_local_dir(&tmp, "notes").unwrap();
        let second = scan_local_dir(&tmp, "notes").unwrap();
        assert_eq!(first, second);
        assert_ne!(first[0].id, first[1].id);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn same_stem_different_extension_are_distinct_nodes() {
        let tmp = temp_dir();
        touch(&tmp, "note.md");
        touch(&tmp, "note.mdx");
        touch(&tmp, "sub/Note.md");

        let nodes = scan_local_dir(&tmp, "notes").unwrap();
        assert_eq!(nodes.len(), 3);
        let mut ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);

        let store = notegarden_storage::NodeStore::open(&tmp.join("store.db"))
            .await
            .unwrap();
        let stored = store
            .replace_nodes(notegarden_shared::NodeKind::LocalFile, "notes", &nodes)
            .await
            .unwrap();
        assert_eq!(stored, 3);
        let listed = store
            .list_by_kind(notegarden_shared::NodeKind::LocalFile)
            .await
            .unwrap();
        assert_eq!(listed, nodes);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_content_dir_creates_missing() {
        let tmp = temp_dir();
        let dir = resolve_content_dir(&tmp, "content/notes");
        assert_eq!(dir, tmp.join("content/notes"));

        ensure_content_dir(&dir).unwrap();
        assert!(dir.is_dir());
        // Second call is a no-op.
        ensure_content_dir(&dir).unwrap();

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
