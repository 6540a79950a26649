use std::path::PathBuf;

use crate::layout::{Layout, write_atomic};
use crate::model::Page;
use crate::property::property_value;

/// Column order for a database export, taken from the first record: its title
/// property first, then the rest in the order the API listed them.
///
/// Properties that only later records carry get no column.
pub fn columns(first: &Page) -> Vec<String> {
    let mut columns: Vec<String> = Vec::with_capacity(first.properties.len());

    if let Some(title) = first.title_property() {
        columns.push(title.to_string());
    }
    columns.extend(
        first
            .properties
            .iter()
            .filter(|(_, value)| !value.is_title())
            .map(|(name, _)| name.clone()),
    );

    columns
}

/// CSV bytes for `records`, or `None` when there are no records.
pub fn render_csv(records: &[Page]) -> Result<Option<Vec<u8>>, csv::Error> {
    let Some(first) = records.first() else {
        return Ok(None);
    };
    let columns = columns(first);

    let mut bytes = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut bytes);
        writer.write_record(&columns)?;

        for record in records {
            let row = columns.iter().map(|name| {
                record
                    .properties
                    .get(name)
                    .map(property_value)
                    .unwrap_or_default()
            });
            writer.write_record(row)?;
        }

        writer.flush()?;
    }

    Ok(Some(bytes))
}

/// Writes `<title> <id>.csv` into `layout`'s directory. Returns the path
/// written, or `None` for an empty database.
pub fn write_csv(
    records: &[Page],
    title: &str,
    container_id: &str,
    layout: &Layout,
) -> Result<Option<PathBuf>, csv::Error> {
    let Some(bytes) = render_csv(records)? else {
        return Ok(None);
    };

    let path = layout.csv_file(title, container_id);
    write_atomic(&path, &bytes)?;

    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(value: serde_json::Value) -> Page {
        serde_json::from_value(value).unwrap()
    }

    fn records() -> Vec<Page> {
        vec![
            record(json!({
                "id": "r-1",
                "properties": {
                    "Done": {"type": "checkbox", "checkbox": true},
                    "Name": {"type": "title", "title": [{"plain_text": "First"}]},
                    "Tags": {"type": "multi_select", "multi_select": [{"name": "x"}, {"name": "y"}]}
                }
            })),
            record(json!({
                "id": "r-2",
                "properties": {
                    "Name": {"type": "title", "title": [{"plain_text": "Second, \"quoted\""}]},
                    "Extra": {"type": "number", "number": 1}
                }
            })),
        ]
    }

    #[test]
    fn test_columns_put_title_first_then_natural_order() {
        assert_eq!(columns(&records()[0]), vec!["Name", "Done", "Tags"]);
    }

    #[test]
    fn test_columns_without_title_property() {
        let r = record(json!({
            "id": "x",
            "properties": {"B": {"type": "url"}, "A": {"type": "url"}}
        }));
        assert_eq!(columns(&r), vec!["B", "A"]);
    }

    #[test]
    fn test_render_csv_rows_follow_first_record_columns() {
        let bytes = render_csv(&records()).unwrap().unwrap();
        let mut reader = csv::Reader::from_reader(bytes.as_slice());

        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, vec!["Name", "Done", "Tags"]);

        let rows: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        assert_eq!(rows[0], vec!["First", "✅", "x, y"]);
        assert_eq!(rows[1], vec!["Second, \"quoted\"", "", ""]);
    }

    #[test]
    fn test_empty_collection_is_a_no_op() {
        let out = TempDir::new().unwrap();
        let layout = Layout::root(out.path());

        assert!(render_csv(&[]).unwrap().is_none());
        assert!(write_csv(&[], "DB", "d-1", &layout).unwrap().is_none());
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_csv_names_file_after_title_and_id() {
        let out = TempDir::new().unwrap();
        let layout = Layout::root(out.path());

        let path = write_csv(&records(), "Tasks: 2024", "ab-cd", &layout).unwrap().unwrap();

        assert_eq!(path, out.path().join("Tasks 2024 abcd.csv"));
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().next(), Some("Name,Done,Tags"));
        assert!(text.contains("\"x, y\""));
    }
}
