//! Typed views over the JSON objects returned by the Notion API.
//!
//! Every block and property arrives as `{"type": kind, kind: payload}`. The
//! payload of a known kind is decoded into a struct whose fields default when
//! absent; a payload that does not decode falls back to that default, and an
//! unknown kind is kept by name. Nothing in here rejects a listing because one
//! element looks odd.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Number, Value};

pub const UNTITLED: &str = "Untitled";

/// One styled run of text.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RichText {
    pub plain_text: String,
    pub annotations: Annotations,
    pub href: Option<String>,
}

impl RichText {
    pub fn plain<S: Into<String>>(text: S) -> Self {
        Self {
            plain_text: text.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub code: bool,
}

/// Concatenates the unstyled text of a run sequence.
pub fn plain_text(runs: &[RichText]) -> String {
    runs.iter().map(|r| r.plain_text.as_str()).collect()
}

fn first_run_or_untitled(runs: &[RichText]) -> String {
    match runs.first() {
        Some(run) if !run.plain_text.is_empty() => run.plain_text.clone(),
        _ => UNTITLED.to_string(),
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub person: Option<Person>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Person {
    pub email: Option<String>,
}

impl User {
    /// Display name, falling back to the user id.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.id,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct DateRange {
    pub start: String,
    pub end: Option<String>,
}

/// `{"type": kind, kind: payload, ...rest}` split into its parts.
#[derive(Deserialize)]
struct Tagged {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Tagged {
    fn take_payload(&mut self) -> Value {
        self.fields.remove(&self.kind).unwrap_or(Value::Null)
    }
}

fn lenient<T: DeserializeOwned + Default>(value: Value) -> T {
    serde_json::from_value(value).unwrap_or_default()
}

fn count(value: Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        _ => 0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Formula {
    String(Option<String>),
    Number(Option<Number>),
    Boolean(Option<bool>),
    Date(Option<DateRange>),
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rollup {
    Number(Option<Number>),
    Array(usize),
    Other,
}

/// Value of one typed database property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Title(Vec<RichText>),
    RichText(Vec<RichText>),
    Number(Option<Number>),
    Select(Option<SelectOption>),
    MultiSelect(Vec<SelectOption>),
    Status(Option<SelectOption>),
    Date(Option<DateRange>),
    People(Vec<User>),
    Checkbox(bool),
    Url(Option<String>),
    Email(Option<String>),
    PhoneNumber(Option<String>),
    Formula(Formula),
    /// Number of related pages.
    Relation(usize),
    Rollup(Rollup),
    CreatedTime(String),
    CreatedBy(User),
    LastEditedTime(String),
    LastEditedBy(User),
    /// Number of attached files.
    Files(usize),
    Unknown(String),
}

impl PropertyValue {
    pub fn is_title(&self) -> bool {
        matches!(self, PropertyValue::Title(_))
    }

    fn from_tagged(mut tagged: Tagged) -> Self {
        let payload = tagged.take_payload();
        match tagged.kind.as_str() {
            "title" => PropertyValue::Title(lenient(payload)),
            "rich_text" => PropertyValue::RichText(lenient(payload)),
            "number" => PropertyValue::Number(lenient(payload)),
            "select" => PropertyValue::Select(lenient(payload)),
            "multi_select" => PropertyValue::MultiSelect(lenient(payload)),
            "status" => PropertyValue::Status(lenient(payload)),
            "date" => PropertyValue::Date(lenient(payload)),
            "people" => PropertyValue::People(lenient(payload)),
            "checkbox" => PropertyValue::Checkbox(lenient(payload)),
            "url" => PropertyValue::Url(lenient(payload)),
            "email" => PropertyValue::Email(lenient(payload)),
            "phone_number" => PropertyValue::PhoneNumber(lenient(payload)),
            "formula" => PropertyValue::Formula(Formula::from_value(payload)),
            "relation" => PropertyValue::Relation(count(payload)),
            "rollup" => PropertyValue::Rollup(Rollup::from_value(payload)),
            "created_time" => PropertyValue::CreatedTime(lenient(payload)),
            "created_by" => PropertyValue::CreatedBy(lenient(payload)),
            "last_edited_time" => PropertyValue::LastEditedTime(lenient(payload)),
            "last_edited_by" => PropertyValue::LastEditedBy(lenient(payload)),
            "files" => PropertyValue::Files(count(payload)),
            _ => PropertyValue::Unknown(tagged.kind),
        }
    }
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Tagged::deserialize(deserializer).map(PropertyValue::from_tagged)
    }
}

impl Formula {
    fn from_value(value: Value) -> Self {
        let Ok(mut tagged) = serde_json::from_value::<Tagged>(value) else {
            return Formula::Other;
        };
        let payload = tagged.take_payload();
        match tagged.kind.as_str() {
            "string" => Formula::String(lenient(payload)),
            "number" => Formula::Number(lenient(payload)),
            "boolean" => Formula::Boolean(lenient(payload)),
            "date" => Formula::Date(lenient(payload)),
            _ => Formula::Other,
        }
    }
}

impl Rollup {
    fn from_value(value: Value) -> Self {
        let Ok(mut tagged) = serde_json::from_value::<Tagged>(value) else {
            return Rollup::Other;
        };
        let payload = tagged.take_payload();
        match tagged.kind.as_str() {
            "number" => Rollup::Number(lenient(payload)),
            "array" => Rollup::Array(count(payload)),
            _ => Rollup::Other,
        }
    }
}

/// A page, or a database record (a page whose properties carry the data).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: IndexMap<String, PropertyValue>,
}

impl Page {
    /// First run of the first title property, `Untitled` when there is none.
    pub fn title(&self) -> String {
        self.properties
            .values()
            .find_map(|value| match value {
                PropertyValue::Title(runs) => Some(first_run_or_untitled(runs)),
                _ => None,
            })
            .unwrap_or_else(|| UNTITLED.to_string())
    }

    /// Name of the title-typed property, if the page has one.
    pub fn title_property(&self) -> Option<&str> {
        self.properties
            .iter()
            .find(|(_, value)| value.is_title())
            .map(|(name, _)| name.as_str())
    }
}

/// A database. Its records are fetched separately.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Container {
    pub id: String,
    #[serde(default)]
    pub title: Vec<RichText>,
}

impl Container {
    pub fn title(&self) -> String {
        first_run_or_untitled(&self.title)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Comment {
    pub created_by: User,
    pub created_time: String,
    pub rich_text: Vec<RichText>,
}

impl Comment {
    pub fn author(&self) -> &str {
        match self.created_by.display_name() {
            "" => "Unknown",
            name => name,
        }
    }

    /// Creation date without the time of day.
    pub fn date(&self) -> &str {
        truncate_date(&self.created_time)
    }
}

/// First ten characters of an ISO-8601 timestamp.
pub fn truncate_date(timestamp: &str) -> &str {
    match timestamp.char_indices().nth(10) {
        Some((idx, _)) => &timestamp[..idx],
        None => timestamp,
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextBlock {
    pub rich_text: Vec<RichText>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToDo {
    pub rich_text: Vec<RichText>,
    pub checked: bool,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Code {
    pub rich_text: Vec<RichText>,
    pub language: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Callout {
    pub rich_text: Vec<RichText>,
    pub icon: Option<Icon>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Icon {
    pub emoji: Option<String>,
}

impl Callout {
    pub fn emoji(&self) -> &str {
        self.icon
            .as_ref()
            .and_then(|icon| icon.emoji.as_deref())
            .unwrap_or("💡")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Linked from elsewhere on the web.
    External(String),
    /// Uploaded to Notion and served from its file storage.
    Hosted(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub source: ImageSource,
    pub caption: Vec<RichText>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawImage {
    #[serde(rename = "type")]
    kind: String,
    external: Option<FileRef>,
    file: Option<FileRef>,
    caption: Vec<RichText>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct FileRef {
    url: String,
}

impl From<RawImage> for Image {
    fn from(raw: RawImage) -> Self {
        let url = |file: Option<FileRef>| file.map(|f| f.url).unwrap_or_default();
        let source = if raw.kind == "external" {
            ImageSource::External(url(raw.external))
        } else {
            ImageSource::Hosted(url(raw.file))
        };
        Image {
            source,
            caption: raw.caption,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Bookmark {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TableRow {
    pub cells: Vec<Vec<RichText>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChildRef {
    pub title: String,
}

impl Default for ChildRef {
    fn default() -> Self {
        Self {
            title: UNTITLED.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Paragraph(TextBlock),
    Heading1(TextBlock),
    Heading2(TextBlock),
    Heading3(TextBlock),
    BulletedListItem(TextBlock),
    NumberedListItem(TextBlock),
    ToDo(ToDo),
    Toggle(TextBlock),
    Code(Code),
    Quote(TextBlock),
    Divider,
    Callout(Callout),
    Image(Image),
    Bookmark(Bookmark),
    /// Rows are fetched separately as the block's children.
    Table,
    TableRow(TableRow),
    ChildPage(ChildRef),
    ChildDatabase(ChildRef),
    Unsupported(String),
}

impl BlockKind {
    /// Name of the kind as the API spells it.
    pub fn name(&self) -> &str {
        match self {
            BlockKind::Paragraph(_) => "paragraph",
            BlockKind::Heading1(_) => "heading_1",
            BlockKind::Heading2(_) => "heading_2",
            BlockKind::Heading3(_) => "heading_3",
            BlockKind::BulletedListItem(_) => "bulleted_list_item",
            BlockKind::NumberedListItem(_) => "numbered_list_item",
            BlockKind::ToDo(_) => "to_do",
            BlockKind::Toggle(_) => "toggle",
            BlockKind::Code(_) => "code",
            BlockKind::Quote(_) => "quote",
            BlockKind::Divider => "divider",
            BlockKind::Callout(_) => "callout",
            BlockKind::Image(_) => "image",
            BlockKind::Bookmark(_) => "bookmark",
            BlockKind::Table => "table",
            BlockKind::TableRow(_) => "table_row",
            BlockKind::ChildPage(_) => "child_page",
            BlockKind::ChildDatabase(_) => "child_database",
            BlockKind::Unsupported(kind) => kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: String,
    pub kind: BlockKind,
}

#[derive(Deserialize)]
struct RawBlock {
    #[serde(default)]
    id: String,
    #[serde(flatten)]
    tagged: Tagged,
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let RawBlock { id, mut tagged } = RawBlock::deserialize(deserializer)?;
        let payload = tagged.take_payload();
        let kind = match tagged.kind.as_str() {
            "paragraph" => BlockKind::Paragraph(lenient(payload)),
            "heading_1" => BlockKind::Heading1(lenient(payload)),
            "heading_2" => BlockKind::Heading2(lenient(payload)),
            "heading_3" => BlockKind::Heading3(lenient(payload)),
            "bulleted_list_item" => BlockKind::BulletedListItem(lenient(payload)),
            "numbered_list_item" => BlockKind::NumberedListItem(lenient(payload)),
            "to_do" => BlockKind::ToDo(lenient(payload)),
            "toggle" => BlockKind::Toggle(lenient(payload)),
            "code" => BlockKind::Code(lenient(payload)),
            "quote" => BlockKind::Quote(lenient(payload)),
            "divider" => BlockKind::Divider,
            "callout" => BlockKind::Callout(lenient(payload)),
            "image" => BlockKind::Image(lenient::<RawImage>(payload).into()),
            "bookmark" => BlockKind::Bookmark(lenient(payload)),
            "table" => BlockKind::Table,
            "table_row" => BlockKind::TableRow(lenient(payload)),
            "child_page" => BlockKind::ChildPage(lenient(payload)),
            "child_database" => BlockKind::ChildDatabase(lenient(payload)),
            _ => BlockKind::Unsupported(tagged.kind),
        };

        Ok(Block { id, kind })
    }
}
