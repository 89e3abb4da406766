//! Notebook exporter (`pack.export_notebook`)
//!
//! Concatenates stored artifacts into a static HTML page at
//! `viz/exports/<title>.html`. Exports are addressed by title: exporting
//! the same title again overwrites the page.

use crate::error::LabError;
use crate::pipeline::ArtifactWriter;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use syslab_artifact::{ArtifactKind, ArtifactUri, Store};

/// Tool name
pub const TOOL_NAME: &str = "pack.export_notebook";

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Static HTML page
    Html,
}

impl ExportFormat {
    /// File extension
    #[inline]
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(Self::Html),
            other => Err(LabError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Export request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Page title; also names the output file
    pub title: String,
    /// Artifacts to include, in order
    #[serde(default)]
    pub sections: Vec<ArtifactUri>,
    /// Requested format
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    ExportFormat::Html.extension().to_string()
}

impl ExportRequest {
    /// HTML export of `sections` under `title`
    #[must_use]
    pub fn new(title: impl Into<String>, sections: Vec<ArtifactUri>) -> Self {
        Self {
            title: title.into(),
            sections,
            format: default_format(),
        }
    }
}

/// Export summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
    /// Sections rendered
    pub sections: usize,
    /// Page size in bytes
    pub bytes: usize,
}

/// Result returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOutput {
    /// Page URI
    pub uri: ArtifactUri,
    /// Same as `[uri]`
    pub resources: Vec<ArtifactUri>,
    /// Counts
    pub summary: ExportSummary,
}

/// Render and store the notebook page
///
/// # Errors
/// - [`LabError::UnsupportedFormat`] for any format but `html`
/// - [`LabError::InvalidParameters`] for an empty title
/// - store errors if a section is missing or the title escapes `viz`
pub fn export_notebook(request: &ExportRequest, store: &Store) -> Result<ExportOutput, LabError> {
    let format: ExportFormat = request.format.parse()?;
    if request.title.trim().is_empty() {
        return Err(LabError::invalid("title must not be empty"));
    }

    let mut page = String::from("<html><body>\n");
    page.push_str(&format!("<h1>{}</h1>\n", escape_html(&request.title)));
    for uri in &request.sections {
        let bytes = store.read_uri(uri)?;
        let text = String::from_utf8_lossy(&bytes);
        page.push_str(&format!("<pre>{}</pre>\n", escape_html(&text)));
    }
    page.push_str("</body></html>");

    let file_name = format!("{}.{}", request.title.replace(' ', "_"), format.extension());
    let mut writer = ArtifactWriter::new(store);
    let uri = writer.bytes(ArtifactKind::Viz.uri(["exports", file_name.as_str()]), page.as_bytes())?;

    tracing::info!(uri = %uri, sections = request.sections.len(), "notebook exported");

    Ok(ExportOutput {
        resources: vec![uri.clone()],
        uri,
        summary: ExportSummary {
            sections: request.sections.len(),
            bytes: page.len(),
        },
    })
}

/// Escape text for HTML element content and attribute values
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}
