/*
 * @file pdf.rs
 * @brief PDF text extraction for document question answering
 * @author Kevin Thomas
 * @date 2025
 *
 * MIT License
 *
 * Copyright (c) 2025 Kevin Thomas
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! Document text extraction.
//!
//! Pages are read in document order and their text joined with newlines.
//! Pages without extractable text (scans, images, broken content streams)
//! contribute nothing, and a document that cannot be parsed at all yields an
//! empty string. Callers treat `""` as "no usable context".

use lopdf::Document;

/// Converts an uploaded document into plain text.
pub trait TextExtractor: Send + Sync {
    /// Extracts the text of `document`; never fails.
    fn extract(&self, document: &[u8]) -> String;
}

/// [`TextExtractor`] for PDF byte streams.
#[derive(Clone, Copy, Debug, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, document: &[u8]) -> String {
        extract_pdf_text(document)
    }
}

/// Extracts the text of every page of a PDF held in memory.
///
/// # Arguments
/// * `bytes` - The raw PDF file.
///
/// # Returns
/// The non-empty page texts joined by `\n`, or `""` when the document is
/// unreadable or has no text layer.
pub fn extract_pdf_text(bytes: &[u8]) -> String {
    let doc = match Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::warn!("Unreadable PDF ({} bytes): {}", bytes.len(), err);
            return String::new();
        }
    };
    let pages = doc.get_pages();
    let page_count = pages.len();
    let texts = pages.into_keys().map(|page_number| {
        doc.extract_text(&[page_number]).unwrap_or_else(|err| {
            tracing::debug!("No text on page {}: {}", page_number, err);
            String::new()
        })
    });
    let text = join_page_texts(texts);
    tracing::info!(pages = page_count, chars = text.len(), "extracted PDF text");
    text
}

/// Joins per-page texts, skipping pages that yielded nothing.
///
/// Trailing whitespace is stripped from each page first so that the page
/// separator is always a single newline.
pub fn join_page_texts<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for page in pages {
        let page = page.as_ref().trim_end();
        if page.trim().is_empty() {
            continue;
        }
        if !joined.is_empty() {
            joined.push('\n');
        }
        joined.push_str(page);
    }
    joined
}
