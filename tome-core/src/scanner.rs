use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::assets::IMAGES_DIR;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Export directory does not exist: {0}")]
    MissingRoot(PathBuf),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Counts of what an export directory holds.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OutputSummary {
    pub pages: usize,
    pub tables: usize,
    pub images: usize,
    pub directories: usize,
}

impl fmt::Display for OutputSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pages, {} CSV tables, {} images in {} directories",
            self.pages, self.tables, self.images, self.directories
        )
    }
}

pub struct OutputScanner {
    root: PathBuf,
}

impl OutputScanner {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            root: path.as_ref().to_path_buf(),
        }
    }

    pub fn scan(&self) -> Result<OutputSummary, ScanError> {
        if !self.root.is_dir() {
            return Err(ScanError::MissingRoot(self.root.clone()));
        }

        let images_dir = self.root.join(IMAGES_DIR);
        let mut summary = OutputSummary::default();

        for entry in WalkDir::new(&self.root).min_depth(1) {
            let entry = entry?;
            let path = entry.path();

            if entry.file_type().is_dir() {
                if path != images_dir {
                    summary.directories += 1;
                }
                continue;
            }

            if path.starts_with(&images_dir) {
                summary.images += 1;
                continue;
            }

            match get_extension(path).as_str() {
                "md" => summary.pages += 1,
                "csv" => summary.tables += 1,
                _ => {}
            }
        }

        Ok(summary)
    }
}

fn get_extension(path: &Path) -> String {
    match path.extension() {
        Some(ext) => ext.to_string_lossy().to_lowercase(),
        None => String::new(),
    }
}
