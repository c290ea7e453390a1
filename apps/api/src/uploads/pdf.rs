use std::panic::{self, AssertUnwindSafe};

use lopdf::Document;
use pdf_extract::{output_doc_page, OutputError, PlainTextOutput};
use tracing::{debug, warn};

/// Turns document bytes into plain text. Blocking; callers run it off the async runtime.
///
/// Unreadable input yields an empty string rather than an error: the caller only
/// needs to know whether any text came out.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> String;
}

/// Extracts page by page. A page that errors or panics contributes nothing and
/// the remaining pages are still read.
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> String {
        let doc = match panic::catch_unwind(|| Document::load_mem(bytes)) {
            Ok(Ok(doc)) => doc,
            Ok(Err(e)) => {
                warn!("Could not parse PDF: {e}");
                return String::new();
            }
            Err(_) => {
                warn!("PDF parsing panicked");
                return String::new();
            }
        };

        let pages = doc.get_pages();
        let mut text = String::new();
        for &page_num in pages.keys() {
            // pdf-extract panics on some malformed pages.
            match panic::catch_unwind(AssertUnwindSafe(|| page_text(&doc, page_num))) {
                Ok(Ok(page)) => text.push_str(&page),
                Ok(Err(e)) => warn!(page = page_num, "PDF page extraction failed: {e}"),
                Err(_) => warn!(page = page_num, "PDF page extraction panicked"),
            }
        }
        debug!(pages = pages.len(), text_bytes = text.len(), "Extracted PDF text");
        text
    }
}

fn page_text(doc: &Document, page_num: u32) -> Result<String, OutputError> {
    let mut text = String::new();
    let mut output = PlainTextOutput::new(&mut text);
    output_doc_page(doc, &mut output, page_num)?;
    drop(output);
    Ok(text)
}
