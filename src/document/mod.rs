//! Printable quote documents.
//!
//! Renders a saved quote snapshot into a fixed-layout paginated PDF using
//! Typst: the template is an embedded string constant, quote data is
//! injected via string formatting, and the document is compiled in-process
//! against the bundled typst-assets fonts. Output is raw PDF bytes.

use std::collections::HashMap;

use base64::Engine as _;
use chrono::{NaiveDate, Utc};
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source, VirtualPath};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use crate::quote::format_money;
use crate::quote::models::{BillingType, QuotePhoto, QuoteSnapshot};

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document compilation failed: {0}")]
    Compile(String),

    #[error("PDF rendering failed: {0}")]
    Render(String),
}

// ============================================================================
// Typst World Implementation
// ============================================================================

/// A minimal Typst world: one main source plus virtual photo files.
struct PdfWorld {
    /// The main source document
    main: Source,
    /// Font book
    book: LazyHash<FontBook>,
    /// Available fonts
    fonts: Vec<Font>,
    /// Library (standard functions)
    library: LazyHash<Library>,
    /// Virtual files referenced by the document (photo attachments)
    files: HashMap<FileId, Bytes>,
}

impl PdfWorld {
    fn new(source: String, files: HashMap<FileId, Bytes>) -> Self {
        let fonts = Self::load_fonts();
        let book = FontBook::from_fonts(&fonts);

        PdfWorld {
            main: Source::new(main_file_id(), source),
            book: LazyHash::new(book),
            fonts,
            library: LazyHash::new(Library::default()),
            files,
        }
    }

    fn load_fonts() -> Vec<Font> {
        let mut fonts = Vec::new();

        // Bundled fonts from typst-assets
        for font_bytes in typst_assets::fonts() {
            let buffer = Bytes::new(font_bytes.to_vec());
            for font in Font::iter(buffer) {
                fonts.push(font);
            }
        }

        fonts
    }
}

fn main_file_id() -> FileId {
    FileId::new(None, VirtualPath::new("/main.typ"))
}

fn photo_file_id(index: usize, ext: &str) -> (String, FileId) {
    let path = format!("/photo-{index}.{ext}");
    let id = FileId::new(None, VirtualPath::new(&path));
    (path, id)
}

impl World for PdfWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        self.files
            .get(&id)
            .cloned()
            .ok_or_else(|| FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Utc::now();
        Datetime::from_ymd(
            now.format("%Y").to_string().parse().ok()?,
            now.format("%m").to_string().parse().ok()?,
            now.format("%d").to_string().parse().ok()?,
        )
    }
}

// ============================================================================
// Document Template
// ============================================================================

const QUOTE_TEMPLATE: &str = r##"
#set page(
  paper: "us-letter",
  margin: (top: 0.9in, bottom: 0.9in, left: 0.9in, right: 0.9in),
  header: align(right)[
    #text(size: 9pt, fill: gray)[IronClean Services]
  ],
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(4pt)
    #grid(
      columns: (1fr, 1fr, 1fr),
      align(left)[#text(size: 9pt)[Quote {{QUOTE_ID}}]],
      align(center)[#text(size: 9pt)[Page #counter(page).display()]],
      align(right)[#text(size: 9pt)[{{EXPORT_DATE}}]],
    )
  ]
)

#set text(size: 11pt)

// Cover band
#block(width: 100%, fill: rgb("#0a5cff"), inset: 16pt, radius: 4pt)[
  #text(size: 22pt, weight: "bold", fill: white)[Commercial Cleaning Quote]
  #v(4pt)
  #text(size: 12pt, fill: white)[{{TITLE_NAME}}]
  #v(2pt)
  #text(size: 10pt, fill: rgb("#d6e4ff"))[Quote {{QUOTE_ID}} | Prepared {{DATE_CREATED}}]
]

#v(14pt)

#grid(
  columns: (1fr, 1fr),
  gutter: 20pt,
  [
    *Prepared For*
    #v(4pt)
    #table(
      columns: (auto, 1fr),
      stroke: none,
      row-gutter: 4pt,
      [Contact:], [{{CONTACT}}],
      [Business:], [{{BUSINESS}}],
      [Address:], [{{ADDRESS}}],
      [Email:], [{{EMAIL}}],
      [Phone:], [{{PHONE}}],
    )
  ],
  [
    *Service Plan*
    #v(4pt)
    #table(
      columns: (auto, 1fr),
      stroke: none,
      row-gutter: 4pt,
      [Facility:], [{{FACILITY}}],
      [Total Area:], [{{TOTAL_SQ_FT}} sq ft],
      [Frequency:], [{{FREQUENCY}}x per week],
      [Labor Rate:], [{{HOURLY_RATE}} per hour],
      [Hours per Clean:], [{{HOURS_PER_CLEAN}}],
    )
  ]
)

#v(16pt)
#line(length: 100%, stroke: 0.5pt)
#v(8pt)

{{AREAS_SECTION}}
{{SUTM_SECTION}}
{{SERVICES_SECTION}}
== Pricing Summary

#table(
  columns: (1fr, auto),
  inset: 8pt,
  stroke: 0.5pt,
  align: (left, right),
{{PRICING_ROWS}}
)

#v(8pt)
#align(right)[
  #block(fill: rgb("#eef3ff"), inset: 12pt, radius: 4pt)[
    #text(size: 10pt)[Monthly Total]
    #h(12pt)
    #text(size: 18pt, weight: "bold", fill: rgb("#0a5cff"))[{{MONTHLY_TOTAL}}]
  ]
]
{{ONE_TIME_NOTE}}
{{PHOTOS_SECTION}}
#v(24pt)
#line(length: 100%, stroke: 0.5pt)
#v(8pt)

#text(size: 9pt, fill: gray)[
  Generated by IronQuote \
  Pricing includes the 4.33 weekly-to-monthly expansion factor. This quote is valid for 30 days.
]
"##;

/// Escape user-entered text for interpolation into Typst markup.
fn typst_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '#' | '[' | ']' | '*' | '_' | '`' | '$' | '<' | '>' | '@' | '~' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Money formatted for Typst markup (the dollar sign must be escaped or it
/// opens math mode).
fn typst_money(amount: rust_decimal::Decimal) -> String {
    typst_escape(&format_money(amount))
}

fn fallback_label(name: &str, prefix: &str, index: usize) -> String {
    if name.trim().is_empty() {
        format!("{} {}", prefix, index + 1)
    } else {
        typst_escape(name)
    }
}

// ============================================================================
// Section Builders
// ============================================================================

fn areas_section(snapshot: &QuoteSnapshot) -> String {
    let lines = &snapshot.calculations.standard_lines;
    if lines.is_empty() {
        return String::new();
    }

    let mut rows = String::new();
    for (i, line) in lines.iter().enumerate() {
        rows.push_str(&format!(
            "  [{}], [{}], [{}], [{}], [{}], [{:.2}], [{}],\n",
            fallback_label(&line.area.name, "Area", i),
            line.sq_ft.round_dp(0),
            typst_escape(&line.area.floor_type),
            typst_escape(&line.area.soil_level),
            line.area.run_rate.round_dp(0),
            line.hours,
            typst_money(line.monthly_cost),
        ));
    }

    format!(
        "== Standard Areas\n\n#table(\n  columns: (1fr, auto, auto, auto, auto, auto, auto),\n  \
         inset: 8pt,\n  stroke: 0.5pt,\n  align: (left, right, left, left, right, right, right),\n  \
         table.header([*Area*], [*Sq Ft*], [*Floor*], [*Soil*], [*Run Rate*], [*Hours*], [*Monthly*]),\n\
         {rows})\n\n#v(12pt)\n"
    )
}

fn sutm_section(snapshot: &QuoteSnapshot) -> String {
    let lines = &snapshot.calculations.sutm_lines;
    if lines.is_empty() {
        return String::new();
    }

    let mut rows = String::new();
    for (i, line) in lines.iter().enumerate() {
        rows.push_str(&format!(
            "  [{}], [{}], [{}], [{}], [{}], [{}], [{:.1}], [{:.2}], [{}],\n",
            fallback_label(&line.bathroom.name, "Bathroom", i),
            line.sq_ft.round_dp(0),
            typst_escape(&line.bathroom.floor_type),
            typst_escape(&line.bathroom.soil_level),
            line.bathroom.run_rate.round_dp(0),
            line.bathroom.fixture_count,
            line.bathroom.minutes_per_fixture,
            line.total_hours,
            typst_money(line.monthly_cost),
        ));
    }

    format!(
        "== SUTM Bathrooms\n\n#table(\n  columns: (1fr, auto, auto, auto, auto, auto, auto, auto, auto),\n  \
         inset: 8pt,\n  stroke: 0.5pt,\n  align: (left, right, left, left, right, right, right, right, right),\n  \
         table.header([*Bathroom*], [*Sq Ft*], [*Floor*], [*Soil*], [*Run Rate*], [*Fixtures*], [*Min/Fix*], [*Hours*], [*Monthly*]),\n\
         {rows})\n\n#v(12pt)\n"
    )
}

fn services_section(snapshot: &QuoteSnapshot) -> String {
    let checked: Vec<_> = snapshot
        .special_services
        .iter()
        .filter(|s| s.checked)
        .collect();
    if checked.is_empty() {
        return String::new();
    }

    let mut rows = String::new();
    for service in checked {
        let billing = match service.billing_type {
            BillingType::Monthly => "Monthly",
            BillingType::OneTime => "One-time",
        };
        rows.push_str(&format!(
            "  [{}], [{}], [{}],\n",
            typst_escape(&service.name),
            billing,
            typst_money(service.price),
        ));
    }

    format!(
        "== Special Services\n\n#table(\n  columns: (1fr, auto, auto),\n  inset: 8pt,\n  \
         stroke: 0.5pt,\n  align: (left, left, right),\n  \
         table.header([*Service*], [*Billing*], [*Price*]),\n{rows})\n\n#v(12pt)\n"
    )
}

fn pricing_rows(snapshot: &QuoteSnapshot) -> String {
    let calc = &snapshot.calculations;
    let mut rows = String::new();

    rows.push_str(&format!(
        "  [Standard Areas], [{}],\n",
        typst_money(calc.standard_total)
    ));
    rows.push_str(&format!(
        "  [SUTM Bathrooms], [{}],\n",
        typst_money(calc.sutm_total)
    ));
    if calc.special_services_total > rust_decimal::Decimal::ZERO {
        rows.push_str(&format!(
            "  [Special Services], [{}],\n",
            typst_money(calc.special_services_total)
        ));
    }
    rows.push_str(&format!(
        "  [*Subtotal*], [*{}*],\n",
        typst_money(calc.subtotal)
    ));
    if calc.minimum_applied {
        rows.push_str(&format!(
            "  [Minimum applied ({}x weekly)], [+{}],\n",
            snapshot.frequency_rate.frequency,
            typst_money(calc.minimum_difference)
        ));
    }
    if calc.surcharge > rust_decimal::Decimal::ZERO {
        rows.push_str(&format!(
            "  [High-frequency surcharge (20%)], [+{}],\n",
            typst_money(calc.surcharge)
        ));
    }

    rows
}

fn one_time_note(snapshot: &QuoteSnapshot) -> String {
    let calc = &snapshot.calculations;
    if calc.one_time_total <= rust_decimal::Decimal::ZERO {
        return String::new();
    }

    format!(
        "\n#align(right)[#text(size: 10pt, fill: gray)[Plus {} in one-time charges. \
         First month total: {}]]\n",
        typst_money(calc.one_time_total),
        typst_money(calc.first_month_total),
    )
}

fn photos_section(photos: &[QuotePhoto], files: &mut HashMap<FileId, Bytes>) -> String {
    let mut cells = String::new();
    let mut count = 0usize;

    for photo in photos {
        let Some((ext, bytes)) = decode_photo(&photo.data_url) else {
            tracing::warn!(photo_id = %photo.id, "skipping undecodable quote photo");
            continue;
        };
        let (path, id) = photo_file_id(count, ext);
        files.insert(id, Bytes::new(bytes));

        if photo.caption.trim().is_empty() {
            cells.push_str(&format!("  figure(image(\"{path}\", width: 100%)),\n"));
        } else {
            cells.push_str(&format!(
                "  figure(image(\"{path}\", width: 100%), caption: [{}]),\n",
                typst_escape(&photo.caption)
            ));
        }
        count += 1;
    }

    if count == 0 {
        return String::new();
    }

    format!(
        "\n#v(12pt)\n== Site Photos\n\n#grid(\n  columns: (1fr, 1fr),\n  gutter: 12pt,\n{cells})\n"
    )
}

/// Decode a base64 image data URL into an extension and raw bytes. Only PNG
/// and JPEG payloads are accepted.
fn decode_photo(data_url: &str) -> Option<(&'static str, Vec<u8>)> {
    let (meta, payload) = data_url.split_once(',')?;
    if !meta.starts_with("data:image/") {
        return None;
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim().as_bytes())
        .ok()?;

    let ext = match image::guess_format(&bytes).ok()? {
        image::ImageFormat::Png => "png",
        image::ImageFormat::Jpeg => "jpg",
        _ => return None,
    };

    Some((ext, bytes))
}

// ============================================================================
// Rendering
// ============================================================================

fn build_source(snapshot: &QuoteSnapshot, photos: &str) -> String {
    let calc = &snapshot.calculations;
    let customer = &snapshot.customer_info;

    let title_name = if customer.business_name.trim().is_empty() {
        customer.display_name()
    } else {
        customer.business_name.clone()
    };

    let mut address = customer.address.trim().to_string();
    let city_line = [
        customer.city.trim(),
        customer.state.trim(),
        customer.zip.trim(),
    ]
    .iter()
    .filter(|part| !part.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(", ");
    if !city_line.is_empty() {
        if !address.is_empty() {
            address.push_str(", ");
        }
        address.push_str(&city_line);
    }

    let facility = if snapshot.building_type.is_empty() {
        "Commercial".to_string()
    } else {
        snapshot.building_type.clone()
    };

    QUOTE_TEMPLATE
        .replace("{{QUOTE_ID}}", &typst_escape(&snapshot.quote_id))
        .replace("{{EXPORT_DATE}}", &Utc::now().format("%Y-%m-%d").to_string())
        .replace("{{DATE_CREATED}}", &typst_escape(&snapshot.date_created))
        .replace("{{TITLE_NAME}}", &typst_escape(&title_name))
        .replace("{{CONTACT}}", &typst_escape(&customer.display_name()))
        .replace("{{BUSINESS}}", &typst_escape(&customer.business_name))
        .replace("{{ADDRESS}}", &typst_escape(&address))
        .replace("{{EMAIL}}", &typst_escape(&customer.email))
        .replace("{{PHONE}}", &typst_escape(&customer.phone))
        .replace("{{FACILITY}}", &typst_escape(&facility))
        .replace("{{TOTAL_SQ_FT}}", &calc.total_sq_ft.round_dp(0).to_string())
        .replace(
            "{{FREQUENCY}}",
            &snapshot.frequency_rate.frequency.to_string(),
        )
        .replace(
            "{{HOURLY_RATE}}",
            &typst_money(snapshot.frequency_rate.hourly_rate),
        )
        .replace("{{HOURS_PER_CLEAN}}", &format!("{:.2}", calc.total_hours))
        .replace("{{AREAS_SECTION}}", &areas_section(snapshot))
        .replace("{{SUTM_SECTION}}", &sutm_section(snapshot))
        .replace("{{SERVICES_SECTION}}", &services_section(snapshot))
        .replace("{{PRICING_ROWS}}", &pricing_rows(snapshot))
        .replace(
            "{{MONTHLY_TOTAL}}",
            &typst_money(calc.final_total_with_surcharge),
        )
        .replace("{{ONE_TIME_NOTE}}", &one_time_note(snapshot))
        .replace("{{PHOTOS_SECTION}}", photos)
}

/// Render the saved quote as a PDF document.
pub fn render_quote_pdf(snapshot: &QuoteSnapshot) -> Result<Vec<u8>, DocumentError> {
    let mut files = HashMap::new();
    let photos = photos_section(&snapshot.photos, &mut files);
    let source = build_source(snapshot, &photos);

    // Compile the Typst document
    let world = PdfWorld::new(source, files);

    let warned = typst::compile(&world);

    let document = warned.output.map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        DocumentError::Compile(error_msgs.join("; "))
    })?;

    // Render to PDF
    let pdf_bytes = typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        DocumentError::Render(error_msgs.join("; "))
    })?;

    Ok(pdf_bytes)
}

/// Download filename: sanitized business-or-customer name plus the export
/// date, e.g. `smith-medical-center-quote-2026-08-05.pdf`.
pub fn document_filename(snapshot: &QuoteSnapshot, date: NaiveDate) -> String {
    let base = if !snapshot.customer_info.business_name.trim().is_empty() {
        snapshot.customer_info.business_name.clone()
    } else {
        snapshot.customer_info.display_name()
    };

    let mut stem = sanitize_file_stem(&base);
    if stem.is_empty() {
        stem = "quote".to_string();
    }

    format!("{stem}-quote-{}.pdf", date.format("%Y-%m-%d"))
}

fn sanitize_file_stem(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::QuoteInputs;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample_snapshot() -> QuoteSnapshot {
        let mut inputs = QuoteInputs::starter();
        inputs.customer_info.first_name = "John".into();
        inputs.customer_info.last_name = "Smith".into();
        inputs.customer_info.business_name = "Smith Medical Center".into();
        inputs.customer_info.address = "123 Main Street".into();
        inputs.customer_info.city = "Salt Lake City".into();
        inputs.customer_info.state = "UT".into();
        inputs.customer_info.zip = "84101".into();
        inputs.building_type = "Medical".into();
        inputs.standard_areas[0].name = "Lobby".into();
        inputs.standard_areas[0].manual_entry = true;
        inputs.standard_areas[0].total_sq_ft = dec!(500);
        inputs.standard_areas[0].run_rate = dec!(1500);
        inputs.sutm_bathrooms[0].name = "Main Restroom".into();
        inputs.sutm_bathrooms[0].manual_entry = true;
        inputs.sutm_bathrooms[0].total_sq_ft = dec!(150);
        inputs.sutm_bathrooms[0].fixture_count = 4;
        inputs.special_services[1].checked = true;

        let now = chrono::Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        inputs.into_snapshot(now)
    }

    #[test]
    fn sanitize_file_stem_slugs_names() {
        assert_eq!(
            sanitize_file_stem("Smith Medical Center"),
            "smith-medical-center"
        );
        assert_eq!(sanitize_file_stem("  A&B  Cleaning!  "), "a-b-cleaning");
        assert_eq!(sanitize_file_stem("!!!"), "");
    }

    #[test]
    fn filename_uses_business_name_and_date() {
        let snapshot = sample_snapshot();
        let date = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();
        assert_eq!(
            document_filename(&snapshot, date),
            "smith-medical-center-quote-2026-08-05.pdf"
        );
    }

    #[test]
    fn filename_falls_back_to_contact_then_quote() {
        let mut snapshot = sample_snapshot();
        let date = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();

        snapshot.customer_info.business_name.clear();
        assert_eq!(
            document_filename(&snapshot, date),
            "john-smith-quote-2026-08-05.pdf"
        );

        snapshot.customer_info.first_name.clear();
        snapshot.customer_info.last_name.clear();
        assert_eq!(document_filename(&snapshot, date), "quote-2026-08-05.pdf");
    }

    #[test]
    fn escape_neutralizes_markup_characters() {
        assert_eq!(typst_escape("a#b"), "a\\#b");
        assert_eq!(typst_escape("$585 [net]"), "\\$585 \\[net\\]");
        assert_eq!(typst_escape("plain text"), "plain text");
    }

    #[test]
    fn decode_photo_accepts_png_data_urls() {
        let mut png_bytes: Vec<u8> = Vec::new();
        let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([10, 20, 30, 255]));
        image::DynamicImage::ImageRgba8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut png_bytes),
                image::ImageFormat::Png,
            )
            .unwrap();
        let data_url = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png_bytes)
        );

        let (ext, bytes) = decode_photo(&data_url).unwrap();
        assert_eq!(ext, "png");
        assert_eq!(bytes, png_bytes);
    }

    #[test]
    fn decode_photo_rejects_other_payloads() {
        assert!(decode_photo("not a data url").is_none());
        assert!(decode_photo("data:text/plain;base64,aGVsbG8=").is_none());

        let garbage = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(b"not an image")
        );
        assert!(decode_photo(&garbage).is_none());
    }

    #[test]
    fn source_contains_all_sections() {
        let snapshot = sample_snapshot();
        let source = build_source(&snapshot, "");

        assert!(source.contains("Smith Medical Center"));
        assert!(source.contains("== Standard Areas"));
        assert!(source.contains("[Lobby]"));
        assert!(source.contains("== SUTM Bathrooms"));
        assert!(source.contains("[Main Restroom]"));
        assert!(source.contains("== Special Services"));
        assert!(source.contains("== Pricing Summary"));
        // The low subtotal triggers the 3x minimum line.
        assert!(source.contains("Minimum applied (3x weekly)"));
        assert!(!source.contains("{{"));
    }

    #[test]
    fn renders_a_pdf() {
        let pdf = render_quote_pdf(&sample_snapshot()).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }
}
