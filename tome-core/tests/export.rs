use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tempfile::TempDir;
use tome_core::assets::AssetError;
use tome_core::model::{Block, Comment, Container, Page};
use tome_core::{
    Download, ExportBuilder, ExportConfig, ExportReport, Listing, NodeKind, OutputScanner, Source,
    SourceError,
};

/// In-memory workspace that serves listings `page_size` items at a time.
struct FakeNotion {
    page_size: usize,
    pages: HashMap<String, Value>,
    containers: HashMap<String, Value>,
    children: HashMap<String, Vec<Value>>,
    records: HashMap<String, Vec<Value>>,
    comments: HashMap<String, Vec<Value>>,
}

impl FakeNotion {
    fn new(page_size: usize) -> Self {
        Self {
            page_size,
            pages: HashMap::new(),
            containers: HashMap::new(),
            children: HashMap::new(),
            records: HashMap::new(),
            comments: HashMap::new(),
        }
    }

    fn page(mut self, id: &str, title: &str, blocks: Vec<Value>) -> Self {
        self.pages.insert(
            id.to_string(),
            json!({
                "id": id,
                "properties": {"title": {"type": "title", "title": [{"plain_text": title}]}}
            }),
        );
        self.children.insert(id.to_string(), blocks);
        self
    }

    fn container(mut self, id: &str, title: &str, records: Vec<Value>) -> Self {
        self.containers
            .insert(id.to_string(), json!({"id": id, "title": [{"plain_text": title}]}));
        for record in &records {
            let record_id = record["id"].as_str().unwrap().to_string();
            self.pages.insert(record_id, record.clone());
        }
        self.records.insert(id.to_string(), records);
        self
    }

    fn comments(mut self, id: &str, comments: Vec<Value>) -> Self {
        self.comments.insert(id.to_string(), comments);
        self
    }

    fn listing<T: DeserializeOwned>(
        &self,
        items: Option<&Vec<Value>>,
        cursor: Option<&str>,
    ) -> Result<Listing<T>, SourceError> {
        let items = items.cloned().unwrap_or_default();
        let start: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
        let end = (start + self.page_size).min(items.len());
        let has_more = end < items.len();
        let next_cursor = has_more.then(|| end.to_string());

        Ok(serde_json::from_value(json!({
            "object": "list",
            "results": &items[start..end],
            "has_more": has_more,
            "next_cursor": next_cursor,
        }))?)
    }
}

impl Source for FakeNotion {
    fn retrieve_page(&self, id: &str) -> Result<Page, SourceError> {
        let value = self.pages.get(id).ok_or_else(|| SourceError::NotFound(id.to_string()))?;
        Ok(serde_json::from_value(value.clone())?)
    }

    fn retrieve_container(&self, id: &str) -> Result<Container, SourceError> {
        let value = self.containers.get(id).ok_or_else(|| SourceError::NotFound(id.to_string()))?;
        Ok(serde_json::from_value(value.clone())?)
    }

    fn list_children(&self, id: &str, cursor: Option<&str>) -> Result<Listing<Block>, SourceError> {
        self.listing(self.children.get(id), cursor)
    }

    fn query_records(&self, id: &str, cursor: Option<&str>) -> Result<Listing<Page>, SourceError> {
        self.listing(self.records.get(id), cursor)
    }

    fn list_comments(
        &self,
        id: &str,
        cursor: Option<&str>,
    ) -> Result<Listing<Comment>, SourceError> {
        match self.comments.get(id) {
            Some(comments) => self.listing(Some(comments), cursor),
            None => Err(SourceError::Api {
                status: 403,
                code: "restricted_resource".to_string(),
                message: "Insufficient permissions".to_string(),
            }),
        }
    }
}

struct CountingDownloader {
    calls: Rc<Cell<usize>>,
}

impl Download for CountingDownloader {
    fn download(&self, _url: &str) -> Result<Vec<u8>, AssetError> {
        self.calls.set(self.calls.get() + 1);
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}

fn paragraph(text: &str) -> Value {
    json!({
        "id": format!("p-{text}"),
        "type": "paragraph",
        "paragraph": {"rich_text": [{"plain_text": text}]}
    })
}

fn child_page(id: &str, title: &str) -> Value {
    json!({"id": id, "type": "child_page", "child_page": {"title": title}})
}

fn child_database(id: &str, title: &str) -> Value {
    json!({"id": id, "type": "child_database", "child_database": {"title": title}})
}

fn hosted_image(url: &str) -> Value {
    json!({
        "id": "img",
        "type": "image",
        "image": {"type": "file", "file": {"url": url}, "caption": []}
    })
}

fn task(id: &str, name: &str, tags: &[&str]) -> Value {
    let tags: Vec<Value> = tags.iter().map(|t| json!({"name": t})).collect();
    json!({
        "id": id,
        "properties": {
            "Name": {"type": "title", "title": [{"plain_text": name}]},
            "Tags": {"type": "multi_select", "multi_select": tags},
            "Due": {"type": "date", "date": null}
        }
    })
}

fn run(source: FakeNotion, config: ExportConfig) -> ExportReport {
    ExportBuilder::new()
        .source(source)
        .config(config)
        .build()
        .unwrap()
        .export()
        .unwrap()
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_leaf_page_becomes_one_markdown_file() {
    let out = TempDir::new().unwrap();
    let source = FakeNotion::new(10)
        .page("1111-aaaa", "Title", vec![paragraph("Hello world")])
        .comments("1111-aaaa", vec![]);

    let report = run(source, ExportConfig::new("1111-aaaa", out.path()).download_images(false));

    assert_eq!(report.pages, 1);
    assert!(report.is_clean());
    assert_eq!(read(out.path().join("Title 1111aaaa.md")), "# Title\n\nHello world\n");
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 1);
}

#[test]
fn test_container_exports_csv_and_record_pages() {
    let out = TempDir::new().unwrap();
    let source = FakeNotion::new(1).container(
        "db-1",
        "Tasks",
        vec![task("r-1", "One", &["x", "y"]), task("r-2", "Two", &[])],
    );
    let config = ExportConfig::new("db-1", out.path())
        .root_kind(NodeKind::Container)
        .download_images(false);

    let report = run(source, config);

    assert_eq!((report.containers, report.csv_files, report.pages), (1, 1, 2));

    let mut reader = csv::Reader::from_path(out.path().join("Tasks db1.csv")).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, vec!["Name", "Tags", "Due"]);
    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    assert_eq!(rows, vec![vec!["One", "x, y", ""], vec!["Two", "", ""]]);

    let first = read(out.path().join("Tasks/One r1.md"));
    assert!(first.starts_with("# One\n\n| Tags |\n| --- |\n| x, y |\n\n---\n"));

    // An empty property table leaves just the heading.
    assert_eq!(read(out.path().join("Tasks/Two r2.md")), "# Two\n\n");
}

#[test]
fn test_nested_page_is_linked_and_placed_in_parent_directory() {
    let out = TempDir::new().unwrap();
    let source = FakeNotion::new(10)
        .page("par-1", "Parent", vec![paragraph("intro"), child_page("chi-1", "Child")])
        .page("chi-1", "Child", vec![paragraph("deep")]);

    let report = run(source, ExportConfig::new("par-1", out.path()).download_images(false));

    assert_eq!(report.pages, 2);
    let parent = read(out.path().join("Parent par1.md"));
    assert!(parent.contains("📄 [Child](Parent/Child%20chi1.md)"));

    let child = out.path().join("Parent/Child chi1.md");
    assert_eq!(read(child), "# Child\n\ndeep\n");
}

#[test]
fn test_failed_sibling_does_not_stop_the_export() {
    let out = TempDir::new().unwrap();
    let source = FakeNotion::new(2)
        .page(
            "root",
            "Root",
            vec![child_page("a-1", "A"), child_page("b-1", "B"), child_page("c-1", "C")],
        )
        .page("a-1", "A", vec![])
        .page("c-1", "C", vec![]);

    let report = run(source, ExportConfig::new("root", out.path()).download_images(false));

    assert_eq!(report.pages, 3);
    assert_eq!(report.failed, vec!["b-1".to_string()]);
    assert!(out.path().join("Root/A a1.md").exists());
    assert!(out.path().join("Root/C c1.md").exists());
    assert!(!out.path().join("Root/B b1.md").exists());
    assert_eq!(fs::read_dir(out.path().join("Root")).unwrap().count(), 2);
}

#[test]
fn test_missing_root_writes_nothing() {
    let out = TempDir::new().unwrap();

    let config = ExportConfig::new("nope", out.path()).download_images(false);

    let report = run(FakeNotion::new(5), config);

    assert_eq!(report.failed, vec!["nope".to_string()]);
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_child_database_inside_page() {
    let out = TempDir::new().unwrap();
    let source = FakeNotion::new(3)
        .page("home", "Home", vec![child_database("db-9", "Reading List")])
        .container("db-9", "Reading List", vec![task("bk-1", "Dune", &["sf"])]);

    let report = run(source, ExportConfig::new("home", out.path()).download_images(false));

    assert_eq!((report.pages, report.containers), (2, 1));
    // Only the space before the id is encoded.
    let home = read(out.path().join("Home home.md"));
    assert!(home.contains("🗄️ [Reading List](Home/Reading List%20db9.csv)"));
    assert!(out.path().join("Home/Reading List db9.csv").exists());
    assert!(out.path().join("Home/Reading List/Dune bk1.md").exists());

    let summary = OutputScanner::new(out.path()).scan().unwrap();
    assert_eq!((summary.pages, summary.tables, summary.directories), (2, 1, 2));
}

#[test]
fn test_failed_database_writes_nothing_and_siblings_continue() {
    let out = TempDir::new().unwrap();
    let source = FakeNotion::new(10)
        .page(
            "home",
            "Home",
            vec![child_database("db-0", "Gone"), child_page("pg-1", "Notes")],
        )
        .page("pg-1", "Notes", vec![paragraph("kept")]);

    let report = run(source, ExportConfig::new("home", out.path()).download_images(false));

    assert_eq!(report.failed, vec!["db-0".to_string()]);
    assert_eq!((report.pages, report.containers, report.csv_files), (2, 0, 0));
    assert_eq!(read(out.path().join("Home/Notes pg1.md")), "# Notes\n\nkept\n");
    assert!(!out.path().join("Home/Gone db0.csv").exists());
    assert!(!out.path().join("Home/Gone").exists());
}

#[test]
fn test_long_listings_are_drained() {
    let out = TempDir::new().unwrap();
    let blocks: Vec<Value> = (1..=7).map(|n| paragraph(&n.to_string())).collect();
    let source = FakeNotion::new(2).page("big", "Big", blocks);

    run(source, ExportConfig::new("big", out.path()).download_images(false));

    assert_eq!(
        read(out.path().join("Big big.md")),
        "# Big\n\n1\n\n2\n\n3\n\n4\n\n5\n\n6\n\n7\n"
    );
}

#[test]
fn test_comments_precede_content() {
    let out = TempDir::new().unwrap();
    let comment = |text: &str| {
        json!({
            "created_by": {"id": "u-1", "name": "Ada"},
            "created_time": "2024-02-03T04:05:06.000Z",
            "rich_text": [{"plain_text": text}]
        })
    };
    let source = FakeNotion::new(1)
        .page("c", "Discussed", vec![paragraph("body")])
        .comments("c", vec![comment("first"), comment("second")]);

    run(source, ExportConfig::new("c", out.path()).download_images(false));

    assert_eq!(
        read(out.path().join("Discussed c.md")),
        "# Discussed\n\n## 💬 Comments\n\n\
         > **Ada** (2024-02-03): first\n\n\
         > **Ada** (2024-02-03): second\n\n\n---\nbody\n"
    );
}

#[test]
fn test_images_are_downloaded_once_and_linked_relative_to_page() {
    let out = TempDir::new().unwrap();
    let url = "https://prod-files.example.com/space/f-77/chart%201.png?sig=abc";
    let source = FakeNotion::new(10)
        .page("top", "Top", vec![hosted_image(url), child_page("sub", "Sub")])
        .page("sub", "Sub", vec![hosted_image(url)]);
    let calls = Rc::new(Cell::new(0));

    let report = ExportBuilder::new()
        .source(source)
        .config(ExportConfig::new("top", out.path()))
        .downloader(CountingDownloader { calls: calls.clone() })
        .build()
        .unwrap()
        .export()
        .unwrap();

    assert_eq!(report.pages, 2);
    assert_eq!(calls.get(), 1);
    assert!(out.path().join("images/f-77_chart 1.png").exists());
    assert!(read(out.path().join("Top top.md")).contains("![](images/f-77_chart 1.png)"));
    assert!(read(out.path().join("Top/Sub sub.md")).contains("![](../images/f-77_chart 1.png)"));
}

#[test]
fn test_images_keep_remote_url_when_downloads_disabled() {
    let out = TempDir::new().unwrap();
    let url = "https://prod-files.example.com/space/f-77/chart.png";
    let source = FakeNotion::new(10).page("top", "Top", vec![hosted_image(url)]);

    run(source, ExportConfig::new("top", out.path()).download_images(false));

    assert!(read(out.path().join("Top top.md")).contains(&format!("![]({url})")));
    assert!(!out.path().join("images").exists());
}
