use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use crate::config::DEFAULT_EXPORT_MIME;
use crate::data::model::{CellValue, RelationshipTable};
use crate::error::{Result, ViewerError};

// ---------------------------------------------------------------------------
// CSV encoding
// ---------------------------------------------------------------------------

/// Serialise a table as UTF-8 CSV: one header row with the column names in
/// table order, then one line per row.
///
/// Quoting is RFC 4180, plus quotes around any string that would otherwise
/// read back as another type (empty, numeric or boolean text), so
/// [`read_csv`](crate::data::loader::read_csv) restores the same table.
pub fn encode_csv(table: &RelationshipTable) -> Result<Vec<u8>> {
    if table.columns.is_empty() {
        return Ok(Vec::new());
    }

    // Fields arrive pre-quoted, so the writer only lays out records.
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(Vec::new());
    writer.write_record(table.columns.iter().map(|name| {
        csv_field(&CellValue::String(name.clone()), name.contains([',', '"', '\n', '\r']))
    }))?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| csv_field(cell, cell.needs_csv_quotes())))?;
    }
    writer
        .into_inner()
        .map_err(|e| ViewerError::Io(e.into_error()))
}

fn csv_field(cell: &CellValue, quote: bool) -> String {
    let text = cell.to_csv_field();
    if quote {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text
    }
}

/// Write the CSV encoding of `table` to `path`.
pub fn save_csv(table: &RelationshipTable, path: &Path) -> Result<()> {
    let bytes = encode_csv(table)?;
    std::fs::write(path, &bytes)?;
    log::info!("Saved {} rows ({} bytes) to {}", table.len(), bytes.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Data URI download links
// ---------------------------------------------------------------------------

/// Non-fatal export conditions surfaced next to the link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportWarning {
    #[error("No filename given; the browser will choose a default name")]
    EmptyFilenameOnExport,
}

/// A self-contained download link: the payload lives in the `href`.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadLink {
    /// `data:<mime>;base64,<payload>`
    pub href: String,
    /// Suggested file name, exactly as supplied. `None` when it was blank.
    pub filename: Option<String>,
    pub text: String,
    pub warning: Option<ExportWarning>,
}

impl DownloadLink {
    /// Render as an HTML anchor with a `download` attribute.
    pub fn to_html(&self) -> String {
        let download = match &self.filename {
            Some(name) => format!(" download=\"{}\"", escape_attr(name)),
            None => " download".to_string(),
        };
        format!(
            "<a href=\"{}\"{download}>{}</a>",
            escape_attr(&self.href),
            escape_text(&self.text)
        )
    }

    /// MIME type declared in the data URI.
    pub fn mime(&self) -> Option<&str> {
        self.href
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
            .map(|(mime, _)| mime)
    }

    /// Decode the embedded payload.
    pub fn payload(&self) -> Option<Vec<u8>> {
        let (_, encoded) = self.href.split_once(";base64,")?;
        STANDARD.decode(encoded).ok()
    }
}

/// Builds download links with a fixed MIME type.
#[derive(Debug, Clone)]
pub struct Exporter {
    mime: String,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(DEFAULT_EXPORT_MIME)
    }
}

impl Exporter {
    pub fn new(mime: &str) -> Self {
        Self {
            mime: mime.to_string(),
        }
    }

    /// Base64-encode `data` into a data URI link suggesting `filename`.
    ///
    /// The filename is not validated or sanitised. A blank one still yields
    /// a working link, just without a suggested name.
    pub fn to_download_link(&self, data: impl AsRef<[u8]>, filename: &str, link_text: &str) -> DownloadLink {
        let encoded = STANDARD.encode(data.as_ref());

        let (filename, warning) = if filename.trim().is_empty() {
            log::warn!("Export requested without a filename");
            (None, Some(ExportWarning::EmptyFilenameOnExport))
        } else {
            (Some(filename.to_string()), None)
        };

        DownloadLink {
            href: format!("data:{};base64,{encoded}", self.mime),
            filename,
            text: link_text.to_string(),
            warning,
        }
    }

    /// Encode `table` as CSV and wrap it in a download link.
    pub fn table_link(&self, table: &RelationshipTable, filename: &str, link_text: &str) -> Result<DownloadLink> {
        let bytes = encode_csv(table)?;
        log::info!(
            "Prepared download of {} rows ({} bytes) as {filename:?}",
            table.len(),
            bytes.len()
        );
        Ok(self.to_download_link(bytes, filename, link_text))
    }
}

/// [`Exporter::to_download_link`] with the default MIME type.
pub fn to_download_link(data: impl AsRef<[u8]>, filename: &str, link_text: &str) -> DownloadLink {
    Exporter::default().to_download_link(data, filename, link_text)
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;").replace('\'', "&#39;")
}
