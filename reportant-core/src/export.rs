//! Document export: flattened report → DOCX or PDF bytes.
//!
//! The exporter is the last stage and only ever receives a fully flattened
//! `ReportDocument`; it is never invoked against a streaming or partial run.

use crate::error::{ExportError, ReportantError, Result};
use crate::types::ReportDocument;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::io::Cursor;
use std::str::FromStr;
use tracing::debug;

/// Lines per generated PDF page.
const PDF_LINES_PER_PAGE: usize = 45;

/// Supported export formats. Anything else is rejected as `InvalidInput`
/// rather than silently defaulting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Docx,
    Pdf,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Pdf => "application/pdf",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ReportantError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            other => Err(ReportantError::invalid_input(format!(
                "unsupported export format '{}', expected 'docx' or 'pdf'",
                other
            ))),
        }
    }
}

/// Encode the document in the requested format.
pub fn export(document: &ReportDocument, format: ExportFormat) -> Result<Vec<u8>> {
    let bytes = match format {
        ExportFormat::Docx => encode_docx(document)?,
        ExportFormat::Pdf => encode_pdf(document)?,
    };
    debug!(
        format = format.file_extension(),
        bytes = bytes.len(),
        title = %document.title,
        "document exported"
    );
    Ok(bytes)
}

/// OOXML package: title heading, then one paragraph per non-empty line of
/// content, 11pt body text.
fn encode_docx(document: &ReportDocument) -> Result<Vec<u8>> {
    use docx_rs::{Docx, Paragraph, Run};

    let mut docx = Docx::new().add_paragraph(
        Paragraph::new().add_run(Run::new().add_text(document.title.as_str()).size(32).bold()),
    );
    for line in document.content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line).size(22)));
    }

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| ExportError::Render {
            format: "docx".to_string(),
            message: e.to_string(),
        })?;
    Ok(buffer.into_inner())
}

/// Single-column text PDF using the built-in Helvetica font; no font files
/// are touched at runtime.
fn encode_pdf(document: &ReportDocument) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut lines: Vec<&str> = vec![document.title.as_str(), ""];
    lines.extend(document.content.lines());

    let mut page_ids: Vec<Object> = Vec::new();
    for page_lines in lines.chunks(PDF_LINES_PER_PAGE) {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 11.into()]),
            Operation::new("TL", vec![16.into()]),
            Operation::new("Td", vec![50.into(), 780.into()]),
        ];
        for (i, line) in page_lines.iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(line.to_string())],
            ));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let encoded = content.encode().map_err(|e| ExportError::Render {
            format: "pdf".to_string(),
            message: e.to_string(),
        })?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id.into());
    }

    let page_count = page_ids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(|e| ExportError::Render {
        format: "pdf".to_string(),
        message: e.to_string(),
    })?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> ReportDocument {
        ReportDocument {
            title: "나의 첫 보고서".to_string(),
            content: "서론\n국내 탄소 배출 현황을 다룬다.\n\n본론\n배출량은 감소 추세이다."
                .to_string(),
        }
    }

    #[test]
    fn test_export_docx_is_zip_package() {
        let bytes = export(&document(), ExportFormat::Docx).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_export_pdf_has_magic() {
        let bytes = export(&document(), ExportFormat::Pdf).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(&bytes[..5], b"%PDF-");
    }

    #[test]
    fn test_export_pdf_paginates_long_documents() {
        let doc = ReportDocument {
            title: "t".to_string(),
            content: "line\n".repeat(PDF_LINES_PER_PAGE * 2 + 5),
        };
        let bytes = export(&doc, ExportFormat::Pdf).unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("docx".parse::<ExportFormat>().unwrap(), ExportFormat::Docx);
        assert_eq!("PDF".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert_eq!(ExportFormat::default(), ExportFormat::Docx);

        let err = "hwp".parse::<ExportFormat>().unwrap_err();
        assert!(matches!(err, ReportantError::InvalidInput { .. }));
    }

    #[test]
    fn test_format_metadata() {
        assert_eq!(ExportFormat::Pdf.content_type(), "application/pdf");
        assert_eq!(ExportFormat::Docx.file_extension(), "docx");
        assert!(ExportFormat::Docx.content_type().contains("wordprocessingml"));
    }
}
