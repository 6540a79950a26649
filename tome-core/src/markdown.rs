use crate::assets::AssetFetcher;
use crate::layout::{Layout, NodeKind, child_link, strip_id};
use crate::model::{Block, BlockKind, Comment, ImageSource, Page, RichText, plain_text};
use crate::property::property_value;
use crate::source::Source;

/// What a block needs to know about where its page is being written.
pub struct RenderContext<'a> {
    pub layout: &'a Layout,
    /// Title of the page being rendered. Without it, child references are
    /// rendered as plain labels.
    pub parent_title: Option<&'a str>,
    pub source: &'a dyn Source,
    /// Present only when images should be downloaded.
    pub assets: Option<&'a AssetFetcher>,
}

pub fn escape_pipes(text: &str) -> String {
    text.replace('|', "\\|")
}

pub fn render_rich_text(runs: &[RichText]) -> String {
    let mut out = String::new();

    for run in runs {
        let mut content = run.plain_text.clone();
        let style = run.annotations;

        if style.bold {
            content = format!("**{content}**");
        }
        if style.italic {
            content = format!("*{content}*");
        }
        if style.strikethrough {
            content = format!("~~{content}~~");
        }
        if style.code {
            content = format!("`{content}`");
        }
        if let Some(href) = run.href.as_deref().filter(|h| !h.is_empty()) {
            content = format!("[{content}]({href})");
        }

        out.push_str(&content);
    }

    out
}

/// Renders one block. Every fragment ends with a newline.
pub fn render_block(block: &Block, ctx: &RenderContext) -> String {
    match &block.kind {
        BlockKind::Paragraph(text) => format!("{}\n", render_rich_text(&text.rich_text)),
        BlockKind::Heading1(text) => format!("# {}\n", render_rich_text(&text.rich_text)),
        BlockKind::Heading2(text) => format!("## {}\n", render_rich_text(&text.rich_text)),
        BlockKind::Heading3(text) => format!("### {}\n", render_rich_text(&text.rich_text)),
        BlockKind::BulletedListItem(text) => format!("- {}\n", render_rich_text(&text.rich_text)),
        BlockKind::NumberedListItem(text) => format!("1. {}\n", render_rich_text(&text.rich_text)),
        BlockKind::ToDo(todo) => {
            let mark = if todo.checked { "[x]" } else { "[ ]" };
            format!("- {} {}\n", mark, render_rich_text(&todo.rich_text))
        }
        BlockKind::Toggle(text) => format!(
            "<details><summary>{}</summary>\n</details>\n",
            render_rich_text(&text.rich_text)
        ),
        BlockKind::Code(code) => format!(
            "```{}\n{}\n```\n",
            code.language,
            render_rich_text(&code.rich_text)
        ),
        BlockKind::Quote(text) => format!("> {}\n", render_rich_text(&text.rich_text)),
        BlockKind::Divider => "---\n".to_string(),
        BlockKind::Callout(callout) => format!(
            "> {} {}\n",
            callout.emoji(),
            render_rich_text(&callout.rich_text)
        ),
        BlockKind::ChildPage(child) => {
            render_child_ref("📄", &child.title, &block.id, NodeKind::Page, ctx)
        }
        BlockKind::ChildDatabase(child) => {
            render_child_ref("🗄️", &child.title, &block.id, NodeKind::Container, ctx)
        }
        BlockKind::Image(image) => {
            let target = match &image.source {
                ImageSource::External(url) => url.clone(),
                ImageSource::Hosted(url) => match ctx.assets {
                    Some(assets) if !url.is_empty() => assets.fetch(url, ctx.layout),
                    _ => url.clone(),
                },
            };
            format!("![{}]({})\n", render_rich_text(&image.caption), target)
        }
        BlockKind::Bookmark(bookmark) => format!("🔗 {}\n", bookmark.url),
        BlockKind::Table => render_table(block, ctx),
        BlockKind::TableRow(_) | BlockKind::Unsupported(_) => format!("[{}]\n", block.kind.name()),
    }
}

fn render_child_ref(
    icon: &str,
    title: &str,
    id: &str,
    kind: NodeKind,
    ctx: &RenderContext,
) -> String {
    match ctx.parent_title {
        Some(parent) if !strip_id(id).is_empty() => {
            format!("{} [{}]({})\n", icon, title, child_link(parent, title, id, kind))
        }
        _ => format!("{} [{}]\n", icon, title),
    }
}

/// Table rows are children of the table block and are fetched on demand.
fn render_table(block: &Block, ctx: &RenderContext) -> String {
    match ctx.source.all_children(&block.id) {
        Ok(rows) => render_table_rows(&rows),
        Err(e) => {
            log::warn!("{}  ⚠️ Table conversion error: {}", ctx.layout.indent(), e);
            "[Table conversion error]\n".to_string()
        }
    }
}

/// Pipe table from `table_row` blocks. The first row always becomes the
/// header, whatever the table's own header flag says.
pub fn render_table_rows(rows: &[Block]) -> String {
    let mut lines = Vec::new();

    for row in rows {
        let BlockKind::TableRow(row) = &row.kind else {
            continue;
        };

        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell| escape_pipes(&render_rich_text(cell)))
            .collect();
        lines.push(format!("| {} |", cells.join(" | ")));

        if lines.len() == 1 {
            lines.push(separator(cells.len()));
        }
    }

    if lines.is_empty() {
        return "[Empty Table]\n".to_string();
    }

    lines.join("\n") + "\n\n"
}

fn separator(columns: usize) -> String {
    format!("| {} |", vec!["---"; columns].join(" | "))
}

/// Horizontal property table for a database record: names sorted, title and
/// empty values left out. Empty when nothing remains.
pub fn render_properties(page: &Page) -> String {
    let mut items: Vec<(String, String)> = page
        .properties
        .iter()
        .filter(|(_, value)| !value.is_title())
        .map(|(name, value)| (name, property_value(value)))
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| (escape_pipes(name), escape_pipes(&value)))
        .collect();

    if items.is_empty() {
        return String::new();
    }

    items.sort_by(|a, b| a.0.cmp(&b.0));

    let names: Vec<&str> = items.iter().map(|(name, _)| name.as_str()).collect();
    let values: Vec<&str> = items.iter().map(|(_, value)| value.as_str()).collect();

    format!(
        "| {} |\n{}\n| {} |\n\n---\n",
        names.join(" | "),
        separator(items.len()),
        values.join(" | ")
    )
}

pub fn render_comments(comments: &[Comment]) -> String {
    if comments.is_empty() {
        return String::new();
    }

    let mut lines = vec!["## 💬 Comments\n".to_string()];

    for comment in comments {
        let body = plain_text(&comment.rich_text).replace('\n', "\n> ");
        lines.push(format!(
            "> **{}** ({}): {}\n",
            comment.author(),
            comment.date(),
            body
        ));
    }

    lines.push("\n---\n".to_string());
    lines.join("\n")
}

pub fn render_blocks(blocks: &[Block], ctx: &RenderContext) -> String {
    blocks
        .iter()
        .map(|block| render_block(block, ctx))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_document(title: &str, properties: &str, comments: &str, body: &str) -> String {
    format!("# {title}\n\n{properties}{comments}{body}")
}
