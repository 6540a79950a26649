use std::path::PathBuf;

use thiserror::Error;

use crate::assets::{AssetError, AssetFetcher, Download, HttpDownloader};
use crate::config::ExportConfig;
use crate::layout::{Layout, NodeKind, write_atomic};
use crate::markdown::{
    RenderContext, render_blocks, render_comments, render_document, render_properties,
};
use crate::model::{Block, BlockKind};
use crate::source::{Source, SourceError};
use crate::tabular::write_csv;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("No source configured")]
    MissingSource,
    #[error("No export configuration given")]
    MissingConfig,
    #[error("Could not set up image downloads: {0}")]
    Downloader(#[from] AssetError),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// What happened during an export. Failures are listed by node id; they never
/// stop the walk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub pages: usize,
    pub containers: usize,
    pub csv_files: usize,
    pub failed: Vec<String>,
}

impl ExportReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A child node referenced from a page's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildNode {
    pub id: String,
    pub kind: NodeKind,
}

/// A page rendered to Markdown but not yet written.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub id: String,
    pub title: String,
    pub path: PathBuf,
    pub markdown: String,
    /// Where the children go; `children` may be empty.
    pub child_layout: Layout,
    pub children: Vec<ChildNode>,
}

fn child_nodes(blocks: &[Block]) -> Vec<ChildNode> {
    blocks
        .iter()
        .filter_map(|block| {
            let kind = match block.kind {
                BlockKind::ChildPage(_) => NodeKind::Page,
                BlockKind::ChildDatabase(_) => NodeKind::Container,
                _ => return None,
            };
            Some(ChildNode {
                id: block.id.clone(),
                kind,
            })
        })
        .collect()
}

#[derive(Default)]
pub struct ExportBuilder {
    source: Option<Box<dyn Source>>,
    config: Option<ExportConfig>,
    downloader: Option<Box<dyn Download>>,
}

impl ExportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source<S: Source + 'static>(mut self, source: S) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn config(mut self, config: ExportConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replaces the HTTP downloader used for images.
    pub fn downloader<D: Download + 'static>(mut self, downloader: D) -> Self {
        self.downloader = Some(Box::new(downloader));
        self
    }

    pub fn build(self) -> Result<Exporter, BuildError> {
        let source = self.source.ok_or(BuildError::MissingSource)?;
        let config = self.config.ok_or(BuildError::MissingConfig)?;

        let assets = if config.download_images {
            let downloader = match self.downloader {
                Some(downloader) => downloader,
                None => Box::new(HttpDownloader::new()?),
            };
            Some(AssetFetcher::new(&config.output_dir, downloader))
        } else {
            None
        };

        Ok(Exporter {
            source,
            config,
            assets,
        })
    }
}

pub struct Exporter {
    source: Box<dyn Source>,
    config: ExportConfig,
    assets: Option<AssetFetcher>,
}

impl Exporter {
    /// Exports the configured root and everything below it.
    pub fn export(&self) -> Result<ExportReport, ExportError> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let layout = Layout::root(&self.config.output_dir);
        let mut report = ExportReport::default();

        match self.config.root_kind {
            NodeKind::Page => self.export_page(&self.config.root_id, &layout, false, &mut report),
            NodeKind::Container => {
                self.export_container(&self.config.root_id, &layout, &mut report)
            }
        }

        Ok(report)
    }

    /// Exports one page and, recursively, its child pages and databases.
    /// A page that cannot be fetched or written is logged and skipped along
    /// with its subtree.
    pub fn export_page(
        &self,
        id: &str,
        layout: &Layout,
        is_record: bool,
        report: &mut ExportReport,
    ) {
        let page = match self.render_page(id, layout, is_record) {
            Ok(page) => page,
            Err(e) => {
                log::error!("{}Error fetching page {}: {}", layout.indent(), id, e);
                report.failed.push(id.to_string());
                return;
            }
        };

        if let Err(e) = self.write_page(&page) {
            log::error!("{}Error writing {}: {}", layout.indent(), page.path.display(), e);
            report.failed.push(id.to_string());
            return;
        }
        report.pages += 1;

        if page.children.is_empty() {
            return;
        }
        if let Err(e) = std::fs::create_dir_all(page.child_layout.dir()) {
            log::error!(
                "{}Error creating {}: {}",
                layout.indent(),
                page.child_layout.dir().display(),
                e
            );
            report.failed.push(id.to_string());
            return;
        }

        for child in &page.children {
            match child.kind {
                NodeKind::Page => self.export_page(&child.id, &page.child_layout, false, report),
                NodeKind::Container => self.export_container(&child.id, &page.child_layout, report),
            }
        }
    }

    /// Exports a database as a CSV next to a directory holding one Markdown
    /// file per record.
    pub fn export_container(&self, id: &str, layout: &Layout, report: &mut ExportReport) {
        if let Err(e) = self.try_export_container(id, layout, report) {
            log::error!("{}Error fetching database {}: {}", layout.indent(), id, e);
            report.failed.push(id.to_string());
        }
    }

    fn try_export_container(
        &self,
        id: &str,
        layout: &Layout,
        report: &mut ExportReport,
    ) -> Result<(), ExportError> {
        let container = self.source.retrieve_container(id)?;
        let title = container.title();
        log::info!("{}🗄️ {}", layout.indent(), title);

        let records = self.source.all_records(id)?;

        let record_layout = layout.child(&title);
        std::fs::create_dir_all(record_layout.dir())?;

        if let Some(path) = write_csv(&records, &title, id, layout)? {
            let name = path.file_name().unwrap_or_default().to_string_lossy();
            log::info!("{}  📊 CSV exported: {}", layout.indent(), name);
            report.csv_files += 1;
        }
        report.containers += 1;

        for record in &records {
            self.export_page(&record.id, &record_layout, true, report);
        }

        Ok(())
    }

    /// Fetches a page and renders its Markdown without writing it. Images
    /// are downloaded here when enabled.
    pub fn render_page(
        &self,
        id: &str,
        layout: &Layout,
        is_record: bool,
    ) -> Result<RenderedPage, ExportError> {
        let page = self.source.retrieve_page(id)?;
        let title = page.title();
        log::info!("{}📄 {}", layout.indent(), title);

        let blocks = self.source.all_children(id)?;

        let comments = self.source.all_comments(id).unwrap_or_else(|e| {
            log::warn!("{}  ⚠️ Could not fetch comments: {}", layout.indent(), e);
            Vec::new()
        });

        let properties = if is_record {
            render_properties(&page)
        } else {
            String::new()
        };

        let ctx = RenderContext {
            layout,
            parent_title: Some(&title),
            source: self.source.as_ref(),
            assets: self.assets.as_ref(),
        };
        let body = render_blocks(&blocks, &ctx);
        let markdown = render_document(&title, &properties, &render_comments(&comments), &body);

        Ok(RenderedPage {
            id: id.to_string(),
            path: layout.page_file(&title, id),
            child_layout: layout.child(&title),
            children: child_nodes(&blocks),
            title,
            markdown,
        })
    }

    pub fn write_page(&self, page: &RenderedPage) -> std::io::Result<()> {
        write_atomic(&page.path, page.markdown.as_bytes())
    }
}
