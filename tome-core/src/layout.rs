//! Where exported files go and how they refer to each other.
//!
//! Nothing here reads the filesystem except [`write_atomic`], so paths and
//! links can be planned and checked before anything is written.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Removes characters that are unsafe in a path segment and trims the rest.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .filter(|c| !FORBIDDEN.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Like [`sanitize`], but keeps the length of the name by substituting `_`.
pub fn sanitize_asset_name(name: &str) -> String {
    name.chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect()
}

/// Notion ids with the hyphens removed, as used in file names.
pub fn strip_id(id: &str) -> String {
    id.replace('-', "")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Page,
    Container,
}

impl NodeKind {
    pub fn extension(&self) -> &'static str {
        match self {
            NodeKind::Page => "md",
            NodeKind::Container => "csv",
        }
    }
}

/// `"<title> <id>.<ext>"`, unique within a directory because of the id.
pub fn file_name(title: &str, id: &str, kind: NodeKind) -> String {
    format!("{} {}.{}", sanitize(title), strip_id(id), kind.extension())
}

/// Link from a page to a child's file inside the page's own sub-directory.
/// The space before the id is percent-encoded.
pub fn child_link(parent_title: &str, child_title: &str, child_id: &str, kind: NodeKind) -> String {
    format!(
        "{}/{}%20{}.{}",
        sanitize(parent_title),
        sanitize(child_title),
        strip_id(child_id),
        kind.extension()
    )
}

/// A directory in the export tree together with its distance from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    dir: PathBuf,
    depth: usize,
}

impl Layout {
    pub fn root<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            depth: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Two spaces per level, for progress output.
    pub fn indent(&self) -> String {
        "  ".repeat(self.depth)
    }

    /// The sub-directory holding the children of the node called `title`.
    pub fn child(&self, title: &str) -> Layout {
        Layout {
            dir: self.dir.join(sanitize(title)),
            depth: self.depth + 1,
        }
    }

    pub fn page_file(&self, title: &str, id: &str) -> PathBuf {
        self.dir.join(file_name(title, id, NodeKind::Page))
    }

    pub fn csv_file(&self, title: &str, id: &str) -> PathBuf {
        self.dir.join(file_name(title, id, NodeKind::Container))
    }

    /// Relative path from this directory back up to the export root.
    pub fn to_root(&self) -> String {
        "../".repeat(self.depth)
    }
}

/// Writes `contents` to a temporary file next to `path` and renames it into
/// place, so a reader never sees a half-written file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(contents)?;
    file.persist(path).map_err(|e| e.error)?;

    Ok(())
}
