//! Markdown → HTML for prose bodies (overview, descriptions, troubleshooting).

use comrak::{markdown_to_html as comrak_to_html, Options};

/// Render a Markdown fragment to HTML. Blank input renders to `""`.
///
/// Tables, strikethrough and autolinks are on, raw HTML passes through,
/// and single newlines become `<br />` so hand-wrapped guide prose keeps
/// its line breaks.
pub fn markdown_to_html(markdown: &str) -> String {
    if markdown.trim().is_empty() {
        return String::new();
    }
    comrak_to_html(markdown.trim(), &options())
}

fn options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.render.hardbreaks = true;
    options.render.unsafe_ = true;
    options
}
