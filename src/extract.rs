//! Text extraction for uploaded documents (PDF, DOCX, TXT).
//!
//! The file kind is chosen from the extension. Extraction returns plain
//! UTF-8 text; whitespace normalization happens later in ingestion.

use std::io::Read;
use std::path::Path;

use thiserror::Error;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Document kinds accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Docx,
    Txt,
}

impl FileKind {
    /// Kind for `path`, by case-insensitive extension.
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(FileKind::Pdf),
            "docx" => Ok(FileKind::Docx),
            "txt" => Ok(FileKind::Txt),
            _ => Err(ExtractError::UnsupportedType(
                path.display().to_string(),
            )),
        }
    }

    /// Short name stored as `file_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Txt => "txt",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0} (expected .pdf, .docx or .txt)")]
    UnsupportedType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
    #[error("text file is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Extract plain text from `bytes` of the given kind.
pub fn extract_text(bytes: &[u8], kind: FileKind) -> Result<String, ExtractError> {
    match kind {
        FileKind::Pdf => extract_pdf(bytes),
        FileKind::Docx => extract_docx(bytes),
        FileKind::Txt => Ok(String::from_utf8(bytes.to_vec())?),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| ExtractError::Docx("word/document.xml not found".to_string()))?;

    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Docx(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }

    paragraphs_from_document_xml(&doc_xml)
}

/// Collect `<w:t>` runs, one line per `<w:p>` paragraph.
fn paragraphs_from_document_xml(xml: &[u8]) -> Result<String, ExtractError> {
    use quick_xml::events::Event;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Text(te)) if in_text => {
                let text = te
                    .unescape()
                    .map_err(|e| ExtractError::Docx(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) if matches!(e.local_name().as_ref(), b"tab" | b"br") => {
                out.push(if e.local_name().as_ref() == b"tab" { ' ' } else { '\n' });
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}
