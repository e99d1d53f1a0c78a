//! PDF text extraction using lopdf and pdf-extract.

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, warn};

use super::{PdfProcessor, PdfType, Result};
use crate::error::PdfError;

/// Pages with fewer characters than this are treated as having no text.
const MIN_PAGE_TEXT: usize = 10;

/// Deepest page tree walked when looking up inherited resources.
const MAX_TREE_DEPTH: usize = 32;

/// PDF text extractor.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

/// Extracted content from a PDF.
#[derive(Debug, Clone)]
pub struct PdfContent {
    /// Type of PDF content.
    pub pdf_type: PdfType,
    /// Text of all pages, in page order.
    pub text: String,
    /// Per-page content.
    pub pages: Vec<PdfPage>,
}

/// Content from a single PDF page.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// Page number (1-indexed).
    pub number: u32,
    /// Extracted text from this page.
    pub text: String,
    /// Number of image XObjects on this page.
    pub image_count: usize,
}

impl PdfPage {
    /// A page whose content is only images.
    pub fn is_image_only(&self) -> bool {
        self.text.trim().len() < MIN_PAGE_TEXT && self.image_count > 0
    }
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("No document loaded".to_string()))
    }

    /// Extract every page, noting image-only pages.
    pub fn extract_all(&self) -> Result<PdfContent> {
        let page_count = self.page_count();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        let mut pages = Vec::with_capacity(page_count as usize);
        for number in 1..=page_count {
            let text = self.extract_page_text(number).unwrap_or_else(|e| {
                warn!("Failed to extract text from page {}: {}", number, e);
                String::new()
            });
            let image_count = self.page_image_count(number);
            pages.push(PdfPage {
                number,
                text,
                image_count,
            });
        }

        let image_only = pages.iter().filter(|p| p.is_image_only()).count();
        let with_text = pages
            .iter()
            .filter(|p| p.text.trim().len() >= MIN_PAGE_TEXT)
            .count();

        for page in pages.iter().filter(|p| p.is_image_only()) {
            warn!("Page {} has no extractable text (image only)", page.number);
        }

        let pdf_type = classify_pages(with_text, image_only);
        let text = pages
            .iter()
            .filter(|p| !p.text.trim().is_empty())
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        debug!(
            "PDF analysis: {} pages, {} with text, {} image only -> {:?}",
            page_count, with_text, image_only, pdf_type
        );

        Ok(PdfContent {
            pdf_type,
            text,
            pages,
        })
    }

    fn page_image_count(&self, page: u32) -> usize {
        let Ok(doc) = self.document() else {
            return 0;
        };
        let Some(page_id) = doc.get_pages().get(&page).copied() else {
            return 0;
        };
        let Some(resources) = page_resources(doc, page_id, 0) else {
            return 0;
        };

        let Ok(xobjects) = resources.get(b"XObject") else {
            return 0;
        };
        let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) else {
            return 0;
        };

        xobj_dict
            .iter()
            .filter_map(|(_, obj_ref)| doc.dereference(obj_ref).ok())
            .filter(|(_, obj)| is_image(obj))
            .count()
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract needs the decrypted bytes
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn analyze(&self) -> PdfType {
        match self.extract_all() {
            Ok(content) => content.pdf_type,
            Err(_) => PdfType::Empty,
        }
    }

    fn extract_text(&self) -> Result<String> {
        self.document()?;
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        let doc = self.document()?;
        if page == 0 || page > self.page_count() {
            return Err(PdfError::Parse(format!("invalid page number: {}", page)));
        }
        doc.extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

fn classify_pages(with_text: usize, image_only: usize) -> PdfType {
    match (with_text > 0, image_only > 0) {
        (true, false) => PdfType::Text,
        (false, true) => PdfType::Image,
        (true, true) => PdfType::Hybrid,
        (false, false) => PdfType::Empty,
    }
}

fn is_image(obj: &Object) -> bool {
    match obj {
        Object::Stream(stream) => stream
            .dict
            .get(b"Subtype")
            .and_then(|s| s.as_name())
            .map(|name| name == b"Image")
            .unwrap_or(false),
        _ => false,
    }
}

/// Resources dictionary for a page, following inheritance up the page tree.
fn page_resources(doc: &Document, node_id: ObjectId, depth: usize) -> Option<Dictionary> {
    if depth > MAX_TREE_DEPTH {
        warn!("Page tree deeper than {} levels, ignoring inherited resources", MAX_TREE_DEPTH);
        return None;
    }

    let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
        return None;
    };

    if let Ok(resources) = dict.get(b"Resources") {
        if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
            return Some(res_dict.clone());
        }
    }

    match dict.get(b"Parent") {
        Ok(Object::Reference(parent_id)) => page_resources(doc, *parent_id, depth + 1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
        assert!(extractor.extract_text().is_err());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut extractor = PdfExtractor::new();
        let err = extractor.load(b"not a pdf").unwrap_err();
        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_classify_pages() {
        assert_eq!(classify_pages(2, 0), PdfType::Text);
        assert_eq!(classify_pages(0, 1), PdfType::Image);
        assert_eq!(classify_pages(1, 1), PdfType::Hybrid);
        assert_eq!(classify_pages(0, 0), PdfType::Empty);
    }

    #[test]
    fn test_cyclic_page_tree_has_no_resources() {
        let mut doc = Document::with_version("1.5");
        let node_id = doc.new_object_id();
        let mut node = Dictionary::new();
        node.set("Parent", Object::Reference(node_id));
        doc.objects.insert(node_id, Object::Dictionary(node));

        assert!(page_resources(&doc, node_id, 0).is_none());
    }

    #[test]
    fn test_inherited_resources_found() {
        let mut doc = Document::with_version("1.5");
        let parent_id = doc.new_object_id();
        let page_id = doc.new_object_id();

        let mut resources = Dictionary::new();
        resources.set("XObject", Dictionary::new());
        let mut parent = Dictionary::new();
        parent.set("Resources", resources);
        let mut page = Dictionary::new();
        page.set("Parent", Object::Reference(parent_id));

        doc.objects.insert(parent_id, Object::Dictionary(parent));
        doc.objects.insert(page_id, Object::Dictionary(page));

        let found = page_resources(&doc, page_id, 0).unwrap();
        assert!(found.has(b"XObject"));
    }

    #[test]
    fn test_analyze_without_document() {
        assert_eq!(PdfExtractor::new().analyze(), PdfType::Empty);
    }
}
