//! Paginated PDF output for plain text documents.
//!
//! Lines are rasterised with an 8x8 bitmap font, each page is JPEG-encoded
//! and placed as a full-bleed image inside the page margins of an A4
//! portrait page. Only the handful of PDF objects needed for that are
//! written: catalog, page tree, and per page a page object, an image
//! XObject and a one-line content stream.

use std::fmt::Write as _;

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, Luma};
use tracing::debug;

use crate::error::{DashboardError, DashboardResult};

const A4_WIDTH_PT: f64 = 595.28;
const A4_HEIGHT_PT: f64 = 841.89;
const POINTS_PER_INCH: f64 = 72.0;

const GLYPH: u32 = 8;

#[derive(Debug, Clone, Copy)]
pub struct PageSetup {
    /// Margin on every side, in inches.
    pub margin_in: f64,
    /// Raster resolution of the page images.
    pub dpi: f64,
    /// Glyph magnification.
    pub scale: u32,
    pub jpeg_quality: u8,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            margin_in: 0.5,
            dpi: 150.0,
            scale: 2,
            jpeg_quality: 98,
        }
    }
}

impl PageSetup {
    fn margin_pt(&self) -> f64 {
        self.margin_in * POINTS_PER_INCH
    }

    fn content_pt(&self) -> (f64, f64) {
        let m = self.margin_pt();
        (A4_WIDTH_PT - 2.0 * m, A4_HEIGHT_PT - 2.0 * m)
    }

    /// Content box in raster pixels.
    pub fn content_px(&self) -> (u32, u32) {
        let (w, h) = self.content_pt();
        let to_px = |pt: f64| (pt / POINTS_PER_INCH * self.dpi).round() as u32;
        (to_px(w), to_px(h))
    }

    fn glyph_px(&self) -> u32 {
        GLYPH * self.scale.max(1)
    }

    fn line_height_px(&self) -> u32 {
        self.glyph_px() * 3 / 2
    }

    /// Characters that fit on one line.
    pub fn chars_per_line(&self) -> usize {
        (self.content_px().0 / self.glyph_px()) as usize
    }

    pub fn lines_per_page(&self) -> usize {
        ((self.content_px().1 / self.line_height_px()) as usize).max(1)
    }
}

fn glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Draw `lines` onto one white page image.
pub fn rasterize_page(lines: &[String], setup: &PageSetup) -> GrayImage {
    let (width, height) = setup.content_px();
    let mut img = GrayImage::from_pixel(width, height, Luma([255u8]));
    let scale = setup.scale.max(1);
    let glyph_px = setup.glyph_px();
    let line_h = setup.line_height_px();

    for (row, line) in lines.iter().enumerate() {
        let top = row as u32 * line_h;
        if top + glyph_px > height {
            break;
        }
        for (col, ch) in line.chars().enumerate() {
            let left = col as u32 * glyph_px;
            if left + glyph_px > width {
                break;
            }
            if ch == ' ' {
                continue;
            }
            for (gy, bits) in glyph(ch).iter().enumerate() {
                for gx in 0..GLYPH {
                    if bits & (1 << gx) == 0 {
                        continue;
                    }
                    let x0 = left + gx * scale;
                    let y0 = top + gy as u32 * scale;
                    for dy in 0..scale {
                        for dx in 0..scale {
                            img.put_pixel(x0 + dx, y0 + dy, Luma([0u8]));
                        }
                    }
                }
            }
        }
    }
    img
}

/// Wrap each line to `width` characters, breaking on spaces where possible.
pub fn wrap_lines(lines: &[String], width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for line in lines {
        let chars: Vec<char> = line.chars().collect();
        if chars.len() <= width {
            out.push(line.clone());
            continue;
        }
        let mut rest: &[char] = &chars;
        while rest.len() > width {
            let cut = rest[..=width]
                .iter()
                .rposition(|c| *c == ' ')
                .filter(|p| *p > 0)
                .unwrap_or(width);
            out.push(rest[..cut].iter().collect::<String>().trim_end().to_string());
            rest = &rest[cut..];
            while rest.first() == Some(&' ') {
                rest = &rest[1..];
            }
        }
        if !rest.is_empty() {
            out.push(rest.iter().collect());
        }
    }
    out
}

fn encode_jpeg(page: &GrayImage, quality: u8) -> DashboardResult<Vec<u8>> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(page)
        .map_err(|e| DashboardError::Document(format!("JPEG encoding failed: {e}")))?;
    Ok(buf)
}

struct PageImage {
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
}

fn assemble(pages: &[PageImage], setup: &PageSetup) -> Vec<u8> {
    // Objects: 1 catalog, 2 page tree, then (page, image, contents) per page.
    let page_obj = |i: usize| 3 + i * 3;
    let mut out: Vec<u8> = Vec::new();
    let mut offsets: Vec<usize> = Vec::new();

    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    offsets.push(out.len());
    out.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

    let kids = (0..pages.len())
        .map(|i| format!("{} 0 R", page_obj(i)))
        .collect::<Vec<_>>()
        .join(" ");
    offsets.push(out.len());
    out.extend_from_slice(
        format!(
            "2 0 obj\n<< /Type /Pages /Kids [{kids}] /Count {} >>\nendobj\n",
            pages.len()
        )
        .as_bytes(),
    );

    let margin = setup.margin_pt();
    let (content_w, content_h) = setup.content_pt();
    for (i, page) in pages.iter().enumerate() {
        let p = page_obj(i);
        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{p} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {A4_WIDTH_PT} {A4_HEIGHT_PT}] \
                 /Resources << /XObject << /Im0 {} 0 R >> >> /Contents {} 0 R >>\nendobj\n",
                p + 1,
                p + 2
            )
            .as_bytes(),
        );

        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{} 0 obj\n<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                 /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
                p + 1,
                page.width,
                page.height,
                page.jpeg.len()
            )
            .as_bytes(),
        );
        out.extend_from_slice(&page.jpeg);
        out.extend_from_slice(b"\nendstream\nendobj\n");

        let contents = format!(
            "q {content_w:.2} 0 0 {content_h:.2} {margin:.2} {margin:.2} cm /Im0 Do Q"
        );
        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{} 0 obj\n<< /Length {} >>\nstream\n{contents}\nendstream\nendobj\n",
                p + 2,
                contents.len()
            )
            .as_bytes(),
        );
    }

    let xref_at = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1);
    for off in &offsets {
        let _ = writeln!(xref, "{off:010} 00000 n ");
    }
    let _ = write!(
        xref,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        offsets.len() + 1
    );
    out.extend_from_slice(xref.as_bytes());
    out
}

/// Render text lines into a paginated PDF.
pub fn render_text_pdf(lines: &[String], setup: &PageSetup) -> DashboardResult<Vec<u8>> {
    let wrapped = wrap_lines(lines, setup.chars_per_line());
    let per_page = setup.lines_per_page();
    let chunks: Vec<&[String]> = if wrapped.is_empty() {
        vec![&wrapped[..]]
    } else {
        wrapped.chunks(per_page).collect()
    };

    let mut pages = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let img = rasterize_page(chunk, setup);
        let (width, height) = img.dimensions();
        pages.push(PageImage {
            jpeg: encode_jpeg(&img, setup.jpeg_quality)?,
            width,
            height,
        });
    }
    debug!(pages = pages.len(), lines = wrapped.len(), "pdf rendered");
    Ok(assemble(&pages, setup))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Line {i}: Pho bo x2   110.000 VND")).collect()
    }

    #[test]
    fn a4_geometry_at_150_dpi() {
        let setup = PageSetup::default();
        assert_eq!(setup.content_px(), (1090, 1604));
        assert_eq!(setup.chars_per_line(), 68);
        assert_eq!(setup.lines_per_page(), 66);
    }

    #[test]
    fn glyph_bits_are_drawn_left_to_right() {
        let setup = PageSetup {
            scale: 1,
            ..Default::default()
        };
        let img = rasterize_page(&["|".to_string()], &setup);
        let dark = (0..8u32)
            .flat_map(|y| (0..8u32).map(move |x| (x, y)))
            .filter(|(x, y)| img.get_pixel(*x, *y).0[0] == 0)
            .count();
        assert!(dark > 0);
        assert_eq!(img.get_pixel(100, 100).0[0], 255);
    }

    #[test]
    fn wraps_on_spaces() {
        let lines = wrap_lines(&["alpha beta gamma".to_string()], 10);
        assert_eq!(lines, vec!["alpha beta", "gamma"]);
        let lines = wrap_lines(&["abcdefghijkl".to_string()], 5);
        assert_eq!(lines, vec!["abcde", "fghij", "kl"]);
    }

    #[test]
    fn long_documents_span_several_pages() {
        let bytes = render_text_pdf(&text(150), &PageSetup::default()).expect("pdf");
        let body = String::from_utf8_lossy(&bytes);
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(body.contains("/Count 3"));
        assert!(body.contains("/Filter /DCTDecode"));
        assert!(body.trim_end().ends_with("%%EOF"));

        let start = body.rfind("startxref\n").expect("startxref") + "startxref\n".len();
        let offset: usize = body[start..]
            .lines()
            .next()
            .and_then(|l| l.parse().ok())
            .expect("xref offset");
        assert!(bytes[offset..].starts_with(b"xref"));
    }

    #[test]
    fn empty_document_still_has_one_page() {
        let bytes = render_text_pdf(&[], &PageSetup::default()).expect("pdf");
        assert!(String::from_utf8_lossy(&bytes).contains("/Count 1"));
    }
}
