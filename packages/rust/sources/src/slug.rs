//! Slug resolution: content node + frozen config → canonical URL path.
//!
//! - Local files keep their directory and file name verbatim.
//! - Remote pages are slugified from their title.
//! - Remote blocks are slugified from their uid; blocks without one are invalid.

use std::sync::LazyLock;

use notegarden_shared::{ContentNode, ContentSourceConfig, GardenError, NodeKind, Result};
use regex::Regex;

/// Runs of anything that is not a letter or digit.
static SEPARATOR_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{Alphabetic}\p{N}]+").expect("separator regex"));

/// Slug separator.
const SEPARATOR: &str = "-";

/// Resolve the canonical slug for `node`. Pure.
pub fn resolve(node: &ContentNode, config: &ContentSourceConfig) -> Result<String> {
    match node.kind {
        NodeKind::LocalFile => {
            let parts = node
                .relative_path
                .as_ref()
                .ok_or_else(|| GardenError::invalid_node(&node.id, "local file without a path"))?;
            if parts.name.is_empty() {
                return Err(GardenError::invalid_node(&node.id, "local file with empty name"));
            }
            Ok(url_join(&[config.base_path(), &parts.dir, &parts.name]))
        }
        NodeKind::RemotePage => {
            let slug = slugify(&node.title);
            if slug.is_empty() {
                return Err(GardenError::invalid_node(
                    &node.id,
                    format!("title {:?} has no sluggable characters", node.title),
                ));
            }
            Ok(url_join(&[config.base_path(), &slug]))
        }
        NodeKind::RemoteBlock => {
            let uid = node
                .uid
                .as_deref()
                .map(str::trim)
                .filter(|uid| !uid.is_empty())
                .ok_or_else(|| GardenError::invalid_node(&node.id, "block without uid"))?;
            let slug = slugify(uid);
            if slug.is_empty() {
                return Err(GardenError::invalid_node(
                    &node.id,
                    format!("uid {uid:?} has no sluggable characters"),
                ));
            }
            Ok(url_join(&[config.base_path(), &slug]))
        }
    }
}

/// Lower-case, trim, and collapse every run of whitespace/punctuation into a
/// single `-`. Deterministic: same input, same slug.
pub fn slugify(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    SEPARATOR_RUN_RE
        .replace_all(&lowered, SEPARATOR)
        .trim_matches('-')
        .to_string()
}

/// Join URL path parts with single `/` separators.
///
/// Always returns an absolute path; empty parts are skipped and no trailing
/// `/` is kept except for the bare root.
pub fn url_join(parts: &[&str]) -> String {
    let segments: Vec<&str> = parts
        .iter()
        .flat_map(|part| part.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base: &str) -> ContentSourceConfig {
        ContentSourceConfig::new(base).expect("config")
    }

    #[test]
    fn url_join_collapses_separators() {
        assert_eq!(url_join(&["/", "sub", "My Page"]), "/sub/My Page");
        assert_eq!(url_join(&["/", "", "index"]), "/index");
        assert_eq!(url_join(&["/garden/", "/a//b/", "c"]), "/garden/a/b/c");
        assert_eq!(url_join(&["/", ""]), "/");
        assert_eq!(url_join(&[]), "/");
    }

    #[test]
    fn slugify_handles_common_titles() {
        assert_eq!(slugify("Hello World!"), "hello-world");
        assert_eq!(slugify("  Rust -- Ownership & Borrowing  "), "rust-ownership-borrowing");
        assert_eq!(slugify("Über Café"), "über-café");
        assert_eq!(slugify("2024/01/05"), "2024-01-05");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn local_file_slug_is_verbatim() {
        let node = ContentNode::local_file("f1", "/notes", "sub", "My Page");
        assert_eq!(resolve(&node, &config("/")).unwrap(), "/sub/My Page");

        let top = ContentNode::local_file("f2", "/notes", "", "README");
        assert_eq!(resolve(&top, &config("/garden")).unwrap(), "/garden/README");
    }

    #[test]
    fn local_file_with_nested_dirs() {
        let node = ContentNode::local_file("f1", "notes", "a/b c", "Some_File.v2");
        assert_eq!(resolve(&node, &config("/")).unwrap(), "/a/b c/Some_File.v2");
    }

    #[test]
    fn local_file_without_path_is_invalid() {
        let mut node = ContentNode::local_file("f1", "notes", "", "x");
        node.relative_path = None;
        let err = resolve(&node, &config("/")).unwrap_err();
        assert!(matches!(err, GardenError::InvalidNode { .. }));
    }

    #[test]
    fn remote_page_slug_is_deterministic() {
        let node = ContentNode::remote_page("p1", "graph", "Hello World!");
        let first = resolve(&node, &config("/")).unwrap();
        let second = resolve(&node, &config("/")).unwrap();
        assert_eq!(first, "/hello-world");
        assert_eq!(first, second);
    }

    #[test]
    fn remote_block_uses_uid() {
        let node = ContentNode::remote_block("b1", "graph", "some text", Some("AbC_12x"));
        assert_eq!(resolve(&node, &config("/notes")).unwrap(), "/notes/abc-12x");
    }

    #[test]
    fn remote_block_without_uid_is_invalid() {
        for uid in [None, Some(""), Some("   ")] {
            let node = ContentNode::remote_block("b1", "graph", "text", uid);
            let err = resolve(&node, &config("/")).unwrap_err();
            assert!(matches!(err, GardenError::InvalidNode { .. }), "uid {uid:?}");
        }
    }
}
