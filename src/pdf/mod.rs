// Certificate preview rendering
// Rasterization needs the pdfium shared library (PDFIUM_LIBRARY_PATH or the
// system search path); lopdf classifies files when it is missing.
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use image::ImageFormat;
use lopdf::{Document, Object, ObjectId};
use pdfium_render::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// US Letter, used when a page declares no MediaBox anywhere in its tree.
const FALLBACK_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

static PDFIUM: OnceLock<Result<Pdfium, String>> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("PDF could not be parsed: {0}")]
    Unparseable(String),
    #[error("PDF appears to be empty")]
    EmptyDocument,
    #[error("could not rasterize page one: {0}")]
    Rasterize(String),
    #[error("could not encode preview image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("PDF engine unavailable: {0}")]
    Engine(String),
}

#[derive(Debug, Clone)]
pub struct PreviewImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl PreviewImage {
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", BASE64.encode(&self.png))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PreviewRenderer {
    library_path: Option<PathBuf>,
}

impl PreviewRenderer {
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self { library_path }
    }

    /// Render page one on a blocking thread.
    pub async fn render(&self, pdf: Bytes) -> Result<PreviewImage, RenderError> {
        let renderer = self.clone();
        tokio::task::spawn_blocking(move || renderer.render_first_page(&pdf))
            .await
            .map_err(|e| RenderError::Rasterize(e.to_string()))?
    }

    /// Rasterize page one at 1 pixel per PDF point and return it PNG-encoded.
    ///
    /// pdfium decides whether the file is readable, since it repairs damaged
    /// cross-reference tables. Without the engine, lopdf still separates
    /// unparseable files from empty ones before `Engine` is reported.
    ///
    /// The document is dropped at the end of this scope, on success and on
    /// every error path.
    pub fn render_first_page(&self, pdf: &[u8]) -> Result<PreviewImage, RenderError> {
        let pdfium = match self.engine() {
            Ok(pdfium) => pdfium,
            Err(e) => {
                let (width, height) = first_page_size(pdf)?;
                debug!("Page one declares {}x{} pt, no engine to draw it", width, height);
                return Err(e);
            }
        };

        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| match first_page_size(pdf) {
                Err(RenderError::EmptyDocument) => RenderError::EmptyDocument,
                _ => RenderError::Unparseable(format!("{:?}", e)),
            })?;
        if document.pages().len() == 0 {
            return Err(RenderError::EmptyDocument);
        }
        let page = document
            .pages()
            .get(0)
            .map_err(|e| RenderError::Rasterize(format!("{:?}", e)))?;
        debug!(
            "Page one declares {}x{} pt",
            page.width().value,
            page.height().value
        );
        let bitmap = page
            .render_with_config(&PdfRenderConfig::new().scale_page_by_factor(1.0))
            .map_err(|e| RenderError::Rasterize(format!("{:?}", e)))?;

        let mut png = Vec::new();
        bitmap
            .as_image()
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png)?;
        info!(
            "Rendered preview {}x{} ({} bytes PNG)",
            decoded.width(),
            decoded.height(),
            png.len()
        );

        Ok(PreviewImage {
            width: decoded.width(),
            height: decoded.height(),
            png,
        })
    }

    fn engine(&self) -> Result<&'static Pdfium, RenderError> {
        PDFIUM
            .get_or_init(|| bind_pdfium(self.library_path.as_deref()))
            .as_ref()
            .map_err(|e| RenderError::Engine(e.clone()))
    }
}

fn bind_pdfium(library_path: Option<&Path>) -> Result<Pdfium, String> {
    let bindings = match library_path {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            .or_else(|e| {
                warn!("pdfium not found in {}: {:?}", dir.display(), e);
                Pdfium::bind_to_system_library()
            }),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| format!("{:?}", e))?;

    Ok(Pdfium::new(bindings))
}

/// Parse the document and return page one's MediaBox size in points.
pub fn first_page_size(pdf: &[u8]) -> Result<(f32, f32), RenderError> {
    let document =
        Document::load_mem(pdf).map_err(|e| RenderError::Unparseable(e.to_string()))?;
    let pages = document.get_pages();
    let page_id = *pages.values().next().ok_or(RenderError::EmptyDocument)?;
    Ok(media_box_size(&document, page_id).unwrap_or(FALLBACK_PAGE_SIZE))
}

// MediaBox is inheritable, so walk up through Parent links.
fn media_box_size(document: &Document, page_id: ObjectId) -> Option<(f32, f32)> {
    let mut node = document.get_dictionary(page_id).ok()?;
    for _ in 0..32 {
        if let Ok(Object::Array(rect)) = node.get(b"MediaBox") {
            let coords: Vec<f32> = rect.iter().filter_map(number).collect();
            if let [llx, lly, urx, ury] = coords[..] {
                return Some(((urx - llx).abs(), (ury - lly).abs()));
            }
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = document.get_dictionary(parent).ok()?;
    }
    None
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{pdf_with_pages, with_stale_startxref};
    use super::*;

    #[test]
    fn garbage_is_unparseable() {
        let err = PreviewRenderer::default()
            .render_first_page(b"<html>not a pdf</html>")
            .unwrap_err();
        assert!(matches!(err, RenderError::Unparseable(_)));
    }

    #[test]
    fn zero_pages_is_empty_document() {
        let pdf = pdf_with_pages(&[]);
        let err = PreviewRenderer::default().render_first_page(&pdf).unwrap_err();
        assert!(matches!(err, RenderError::EmptyDocument));
        assert_eq!(err.to_string(), "PDF appears to be empty");
    }

    #[test]
    fn first_page_size_reads_media_box() {
        let pdf = pdf_with_pages(&[(842, 595), (100, 100)]);
        assert_eq!(first_page_size(&pdf).unwrap(), (842.0, 595.0));
    }

    #[test]
    fn media_box_is_inherited_from_parent() {
        use lopdf::dictionary;

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 400.into(), 300.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        let mut pdf = Vec::new();
        doc.save_to(&mut pdf).unwrap();

        assert_eq!(first_page_size(&pdf).unwrap(), (400.0, 300.0));
    }

    #[test]
    fn renders_page_one_at_declared_size() {
        let pdf = pdf_with_pages(&[(300, 200), (600, 600)]);
        let (declared_w, declared_h) = first_page_size(&pdf).unwrap();
        assert_eq!((declared_w, declared_h), (300.0, 200.0));

        let renderer = PreviewRenderer::default();
        if let Err(e) = renderer.engine() {
            eprintln!("skipping rasterization check: {}", e);
            return;
        }
        let preview = renderer.render_first_page(&pdf).unwrap();

        assert!((preview.width as f32 - declared_w).abs() <= 1.0, "width {}", preview.width);
        assert!((preview.height as f32 - declared_h).abs() <= 1.0, "height {}", preview.height);
        assert!(preview.png.starts_with(b"\x89PNG"));
        assert!(preview.data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn damaged_files_are_left_to_the_engine() {
        let pdf = pdf_with_pages(&[(300, 200)]);
        let stale_xref = with_stale_startxref(&pdf);
        let leading_bytes = [b"\r\n".as_slice(), pdf.as_slice()].concat();

        let renderer = PreviewRenderer::default();
        for damaged in [stale_xref, leading_bytes] {
            match renderer.engine() {
                Ok(_) => {
                    let preview = renderer.render_first_page(&damaged).unwrap();
                    assert!((preview.width as i64 - 300).abs() <= 1);
                    assert!((preview.height as i64 - 200).abs() <= 1);
                }
                Err(_) => {
                    let err = renderer.render_first_page(&damaged).unwrap_err();
                    assert!(matches!(err, RenderError::Unparseable(_)), "{}", err);
                }
            }
        }
    }

    #[test]
    fn stale_startxref_fixture_only_moves_the_offset() {
        let pdf = pdf_with_pages(&[(300, 200)]);
        let damaged = with_stale_startxref(&pdf);
        assert_ne!(damaged, pdf);
        assert!(first_page_size(&damaged).is_err());
    }

    #[tokio::test]
    async fn async_render_reports_empty_document() {
        let pdf = Bytes::from(pdf_with_pages(&[]));
        let err = PreviewRenderer::default().render(pdf).await.unwrap_err();
        assert!(matches!(err, RenderError::EmptyDocument));
    }
}
