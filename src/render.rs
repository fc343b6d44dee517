//! Text, JSON and HTML presentation of tablets and result pages.
//!
//! Lines reaching a renderer are already escaped and highlighted for the
//! format's markup; everything else (names, messages) is escaped here.

use std::fmt::{self, Write};

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::commands::{DocumentOutcome, SearchOutcome};
use crate::corpus::{Tablet, TabletObject, TextSection};
use crate::search::{Pagination, SearchMode};
use crate::search::highlight::escape_html;

/// CDLI catalogue search, keyed by the tablet's P-number.
const CDLI_SEARCH_URL: &str = "http://www.cdli.ucla.edu/search/search_results.php?SearchMode=Text&ObjectID=";

/// Message shown when a search has no results.
pub const NO_MATCHES: &str = "No matches found";

/// A value with text and HTML presentations. JSON comes from `Serialize`.
pub trait Render: Serialize {
    /// Write the plain-text form.
    ///
    /// # Errors
    ///
    /// Propagates errors from the writer.
    fn write_text(&self, out: &mut String) -> fmt::Result;

    /// Write the HTML form.
    ///
    /// # Errors
    ///
    /// Propagates errors from the writer.
    fn write_html(&self, out: &mut String) -> fmt::Result;
}

/// Render `value` in `format`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render<T: Render>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => {
            out = serde_json::to_string_pretty(value)?;
            out.push('\n');
        }
        OutputFormat::Text => value.write_text(&mut out)?,
        OutputFormat::Html => value.write_html(&mut out)?,
    }
    Ok(out)
}

impl Render for Tablet {
    fn write_text(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "[{}] {} ({})", self.id, self.name, self.lang)?;
        for object in &self.objects {
            object.write_text(out)?;
        }
        Ok(())
    }

    fn write_html(&self, out: &mut String) -> fmt::Result {
        let name = escape_html(&self.name);
        writeln!(out, "<div class=\"panel panel-default\" data-tablet=\"{}\">", self.id)?;
        match self.cdli_number() {
            Some(number) => writeln!(
                out,
                "<div class=\"panel-heading\"><a href=\"{}{}&amp;requestFrom=Submit+Query\">{name}</a></div>",
                escape_html(CDLI_SEARCH_URL),
                escape_html(number),
            )?,
            None => writeln!(out, "<div class=\"panel-heading\">{name}</div>")?,
        }
        writeln!(out, "<div class=\"panel-body\">")?;
        for object in &self.objects {
            object.write_html(out)?;
        }
        writeln!(out, "</div></div>")
    }
}

impl Render for TabletObject {
    fn write_text(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "  {}", self.name)?;
        for section in &self.sections {
            section.write_text(out)?;
        }
        Ok(())
    }

    fn write_html(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "<div class=\"panel panel-default\">")?;
        writeln!(
            out,
            "<div class=\"panel-heading\"><span class=\"expand-text\">{}</span></div>",
            escape_html(&self.name)
        )?;
        writeln!(out, "<div class=\"panel-body\">")?;
        for section in &self.sections {
            section.write_html(out)?;
        }
        writeln!(out, "</div></div>")
    }
}

impl Render for TextSection {
    fn write_text(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "    {}", self.name)?;
        for (n, line) in self.lines.iter().enumerate() {
            writeln!(out, "    {:>3}. {line}", n + 1)?;
        }
        Ok(())
    }

    fn write_html(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "<div class=\"panel panel-default\">")?;
        writeln!(out, "<div class=\"panel-heading\">{}</div>", escape_html(&self.name))?;
        writeln!(out, "<div class=\"panel-body\">")?;
        writeln!(out, "<ol>")?;
        for line in &self.lines {
            writeln!(out, "<li>{line}</li>")?;
        }
        writeln!(out, "</ol>")?;
        writeln!(out, "</div></div>")
    }
}

impl Render for Pagination {
    fn write_text(&self, out: &mut String) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        write!(out, "Pages: \u{ab}")?;
        for page in self.window() {
            if page == self.current_page {
                write!(out, " [{page}]")?;
            } else {
                write!(out, " {page}")?;
            }
        }
        writeln!(out, " \u{bb} (last page {})", self.last_page)
    }

    fn write_html(&self, out: &mut String) -> fmt::Result {
        write_page_links(self, "?", out)
    }
}

/// Write the page bar with every link starting at `base`.
///
/// `base` is HTML-escaped already and ends where `page=N` is appended.
fn write_page_links(pagination: &Pagination, base: &str, out: &mut String) -> fmt::Result {
    if pagination.is_empty() {
        return Ok(());
    }
    writeln!(out, "<ul class=\"pagination\">")?;
    writeln!(out, "  <li><a href=\"{base}page=1\">&laquo;</a></li>")?;
    for page in pagination.window() {
        let class = if page == pagination.current_page {
            " class=\"active\""
        } else {
            ""
        };
        writeln!(out, "  <li{class}><a href=\"{base}page={page}\">{page}</a></li>")?;
    }
    writeln!(
        out,
        "  <li><a href=\"{base}page={}\">&raquo;</a></li>",
        pagination.last_page
    )?;
    writeln!(out, "</ul>")
}

/// Percent-encode a query string value, spaces as `+`.
fn encode_query_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(char::from(byte));
            }
            b' ' => encoded.push('+'),
            _ => {
                let _ = write!(encoded, "%{byte:02X}");
            }
        }
    }
    encoded
}

impl SearchOutcome {
    /// Link prefix that repeats this search, ready for `page=N`.
    fn page_link_base(&self) -> String {
        let mut base = format!("?search={}&amp;", encode_query_value(&self.query));
        if self.mode == SearchMode::Pattern {
            base.push_str("regex_submit=Regex+Search&amp;");
        }
        base
    }
}

impl Render for SearchOutcome {
    fn write_text(&self, out: &mut String) -> fmt::Result {
        if self.is_empty() {
            return writeln!(out, "{NO_MATCHES}");
        }
        writeln!(out, "Returned {} results", self.pagination.total_results)?;
        for document in &self.documents {
            writeln!(out)?;
            match document {
                DocumentOutcome::Found(tablet) => tablet.write_text(out)?,
                DocumentOutcome::Failed { id, error } => {
                    writeln!(out, "[{id}] error: {error}")?;
                }
            }
        }
        writeln!(out)?;
        self.pagination.write_text(out)
    }

    fn write_html(&self, out: &mut String) -> fmt::Result {
        if self.is_empty() {
            return writeln!(out, "<p>{NO_MATCHES}</p>");
        }
        writeln!(
            out,
            "<p>Returned {} results</p>",
            self.pagination.total_results
        )?;
        for document in &self.documents {
            match document {
                DocumentOutcome::Found(tablet) => tablet.write_html(out)?,
                DocumentOutcome::Failed { id, error } => writeln!(
                    out,
                    "<div class=\"alert alert-warning\" data-tablet=\"{id}\">{}</div>",
                    escape_html(&error.to_string())
                )?,
            }
        }
        write_page_links(&self.pagination, &self.page_link_base(), out)
    }
}
