//! Server-side page rendering with minijinja.
//!
//! Templates are compiled into the binary so the server runs from any
//! working directory.

use minijinja::{Environment, Value};
use neutronote_common::{ApiError, Ipts};
use neutronote_db::Entry;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use serde::Serialize;
use tracing::error;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("entries/_entry.html", include_str!("../templates/entries/_entry.html")),
    ("entries/_create.html", include_str!("../templates/entries/_create.html")),
    ("entries/index.html", include_str!("../templates/entries/index.html")),
    ("entries/detail.html", include_str!("../templates/entries/detail.html")),
    ("entries/edit.html", include_str!("../templates/entries/edit.html")),
];

/// URL schemes that run script when followed or loaded.
const BLOCKED_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

/// Replace a link or image target that would execute script with `#`.
/// Browsers ignore whitespace and control characters inside the scheme.
fn safe_destination(dest: CowStr<'_>) -> CowStr<'_> {
    let scheme: String = dest
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    if BLOCKED_SCHEMES.iter().any(|blocked| scheme.starts_with(blocked)) {
        CowStr::Borrowed("#")
    } else {
        dest
    }
}

/// Render Markdown to HTML. Raw HTML in the input is shown as text,
/// script links are neutralised and single newlines become line breaks.
pub fn render_markdown(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let events = Parser::new_ext(text, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(CowStr::from(raw.into_string())),
        Event::Start(Tag::Link { link_type, dest_url, title, id }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_destination(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image { link_type, dest_url, title, id }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_destination(dest_url),
            title,
            id,
        }),
        other => other,
    });
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

fn markdown_filter(value: Value) -> Value {
    let text = value.as_str().unwrap_or_default();
    Value::from_safe_string(render_markdown(text))
}

fn fromjson_filter(value: Value) -> Value {
    let text = value.as_str().unwrap_or_default();
    if text.trim().is_empty() {
        return Value::from_serialize(serde_json::json!({}));
    }
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(parsed) => Value::from_serialize(&parsed),
        Err(_) => Value::from_serialize(serde_json::json!({ "error": "Invalid JSON data" })),
    }
}

/// An entry plus the derived fields templates display.
#[derive(Debug, Serialize)]
pub struct EntryView {
    #[serde(flatten)]
    pub entry: Entry,
    pub timestamp_display: String,
    pub edited_at_display: Option<String>,
    pub is_edited: bool,
    pub editable: bool,
}

impl From<Entry> for EntryView {
    fn from(entry: Entry) -> Self {
        Self {
            timestamp_display: entry.timestamp_display(),
            edited_at_display: entry.edited_at_display(),
            is_edited: entry.is_edited(),
            editable: entry.entry_type.is_editable(),
            entry,
        }
    }
}

pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new(current_ipts: Option<&Ipts>) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        env.add_filter("markdown", markdown_filter);
        env.add_filter("fromjson", fromjson_filter);
        env.add_global("current_ipts", Value::from(current_ipts.map(|i| i.to_string())));
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, ApiError> {
        self.env
            .get_template(name)
            .and_then(|tmpl| tmpl.render(ctx))
            .map_err(|e| {
                error!(template = name, error = %e, "template rendering failed");
                ApiError::Internal(format!("template error: {e}"))
            })
    }

    #[cfg(test)]
    fn render_str<S: Serialize>(&self, source: &str, ctx: S) -> Result<String, minijinja::Error> {
        self.env.render_str(source, ctx)
    }
}
