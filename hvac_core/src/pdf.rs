//! # PDF Generation
//!
//! Generates qualification reports using Typst. Room and test content comes
//! from [`ReportSummary`]; only the cover block (customer, dates, devices)
//! reads the report record directly.
//!
//! ## Example
//!
//! ```rust,no_run
//! use hvac_core::pdf::render_report_pdf;
//! use hvac_core::report::Report;
//!
//! let report = Report::new("RPR-001", "Şehir Hastanesi");
//! let pdf_bytes = render_report_pdf(&report)?;
//! std::fs::write("rapor.pdf", pdf_bytes).unwrap();
//! # Ok::<(), hvac_core::errors::HvacError>(())
//! ```

use chrono::{Datelike, NaiveDate, Utc};
use once_cell::sync::Lazy;
use tracing::{debug, warn};
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use crate::compliance::summary::{summarize_report, ReportSummary, RoomSummary, TestSummary};
use crate::compliance::{ReportOutcome, Verdict};
use crate::devices::MeasuringDevice;
use crate::errors::{HvacError, HvacResult};
use crate::report::Report;

/// Bundled fonts, parsed once per process
static FONTS: Lazy<Vec<Font>> = Lazy::new(|| {
    typst_assets::fonts()
        .flat_map(|data| Font::iter(Bytes::new(data.to_vec())))
        .collect()
});

const PASS_FILL: &str = "rgb(\"#d4edda\")";
const FAIL_FILL: &str = "rgb(\"#f8d7da\")";
const NEUTRAL_FILL: &str = "rgb(\"#f0f0f0\")";

// ============================================================================
// Typst World Implementation
// ============================================================================

/// A minimal Typst world for compiling documents without external files.
struct PdfWorld {
    main: Source,
    book: LazyHash<FontBook>,
    library: LazyHash<Library>,
}

impl PdfWorld {
    fn new(source: String) -> Self {
        PdfWorld {
            main: Source::detached(source),
            book: LazyHash::new(FontBook::from_fonts(FONTS.iter())),
            library: LazyHash::new(Library::default()),
        }
    }
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
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        FONTS.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Utc::now();
        Datetime::from_ymd(
            now.year(),
            u8::try_from(now.month()).ok()?,
            u8::try_from(now.day()).ok()?,
        )
    }
}

// ============================================================================
// Report Template
// ============================================================================

/// Render a full qualification report to PDF bytes.
///
/// Devices whose calibration had lapsed on the test date (today when the
/// report has no test date) are listed in a warning block.
pub fn render_report_pdf(report: &Report) -> HvacResult<Vec<u8>> {
    let summary = summarize_report(report);
    let on = report.test_date.unwrap_or_else(|| Utc::now().date_naive());
    let expired = report.expired_devices(on)?;
    if !expired.is_empty() {
        warn!(
            report = %report.report_number,
            devices = expired.len(),
            "report uses devices with lapsed calibration"
        );
    }

    let source = build_source(report, &summary, &expired, on);
    debug!(report = %report.report_number, bytes = source.len(), "typst source built");
    compile_pdf(source)
}

fn compile_pdf(source: String) -> HvacResult<Vec<u8>> {
    let world = PdfWorld::new(source);
    let warned = typst::compile(&world);

    let document = warned.output.map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        HvacError::render_failed("compile", messages.join("; "))
    })?;

    typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        HvacError::render_failed("pdf", messages.join("; "))
    })
}

fn build_source(
    report: &Report,
    summary: &ReportSummary,
    expired: &[&MeasuringDevice],
    on: NaiveDate,
) -> String {
    let date = on.format("%d.%m.%Y").to_string();
    let mut source = format!(
        r##"
#set page(
  paper: "a4",
  margin: (top: 2cm, bottom: 2cm, left: 2cm, right: 2cm),
  header: align(right)[
    #text(size: 9pt, fill: gray)[HVAC Performans Test Raporu]
  ],
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(4pt)
    #grid(
      columns: (1fr, 1fr, 1fr),
      align(left)[#text(size: 9pt)[Rapor No: {number}]],
      align(center)[#text(size: 9pt)[Sayfa #counter(page).display()]],
      align(right)[#text(size: 9pt)[{date}]],
    )
  ]
)

#set text(font: "Libertinus Serif", size: 10pt, lang: "tr")

#align(center)[
  #block(width: 100%, fill: {neutral}, inset: 16pt, radius: 4pt)[
    #text(size: 20pt, weight: "bold")[HVAC Performans Test Raporu]
    #v(6pt)
    #text(size: 13pt)[{customer}]
  ]
]

#v(12pt)

#grid(
  columns: (auto, 1fr),
  gutter: 6pt,
  [*Rapor No:*], [{number}],
  [*Hastane:*], [{hospital}],
  [*Bölüm:*], [{department}],
  [*Test Tarihi:*], [{date}],
  [*Test Eden:*], [{tester}],
  [*Standart:*], [{standard}],
)
"##,
        number = escape_typst(&report.report_number),
        date = date,
        neutral = NEUTRAL_FILL,
        customer = escape_typst(&report.customer_name),
        hospital = escape_typst(&report.hospital_name),
        department = escape_typst(&report.department),
        tester = escape_typst(&report.tester_name),
        standard = escape_typst(&report.standard),
    );

    if !report.devices.is_empty() {
        source.push_str(&build_device_table(&report.devices));
    }
    if !expired.is_empty() {
        source.push_str(&build_expired_warning(expired));
    }

    for room in &summary.rooms {
        source.push_str(&build_room_section(report, room));
    }

    source.push_str(&format!(
        r##"
#v(16pt)
== Genel Değerlendirme

#block(width: 100%, fill: {fill}, inset: 10pt, radius: 4pt)[
  #text(size: 12pt, weight: "bold")[{assessment}]
]
"##,
        fill = if summary.outcome == ReportOutcome::Compliant {
            PASS_FILL
        } else {
            FAIL_FILL
        },
        assessment = escape_typst(&summary.assessment),
    ));

    source
}

fn build_device_table(devices: &[MeasuringDevice]) -> String {
    let rows = devices
        .iter()
        .map(|d| {
            format!(
                "  [{}], [{}], [{}], [{}],",
                escape_typst(&d.name),
                escape_typst(&d.serial_number),
                d.calibration_date
                    .map(|c| c.format("%d.%m.%Y").to_string())
                    .unwrap_or_default(),
                d.calibration_due_date
                    .map(|c| c.format("%d.%m.%Y").to_string())
                    .unwrap_or_default(),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r##"
#v(12pt)
== Ölçüm Cihazları

#table(
  columns: (2fr, 1.5fr, 1fr, 1fr),
  table.header([*Cihaz*], [*Seri No*], [*Kalibrasyon*], [*Geçerlilik*]),
{rows}
)
"##
    )
}

fn build_expired_warning(expired: &[&MeasuringDevice]) -> String {
    let names = expired
        .iter()
        .map(|d| escape_typst(&d.name))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r##"
#block(width: 100%, fill: {FAIL_FILL}, inset: 8pt, radius: 4pt)[
  *Uyarı:* Kalibrasyon süresi dolmuş cihazlar: {names}
]
"##
    )
}

fn build_room_section(report: &Report, room: &RoomSummary) -> String {
    let attributes = report
        .room(&room.room_id)
        .map(|r| {
            format!(
                "  [*Akış Tipi:*], [{}],\n  [*Test Modu:*], [{}],\n  [*Oda Sınıfı:*], [{}],",
                escape_typst(r.flow_type.display_name()),
                escape_typst(r.test_mode.display_name()),
                escape_typst(r.room_class.display_name()),
            )
        })
        .unwrap_or_default();

    let rows = room
        .selected_tests()
        .map(build_test_row)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r##"
#pagebreak()
== Mahal {number}: {name}

#grid(
  columns: (auto, 1fr),
  gutter: 6pt,
  [*Alan:*], [{area:.2} m²],
  [*Yükseklik:*], [{height:.2} m],
  [*Hacim:*], [{volume:.2} m³],
  [*Örnekleme Noktası:*], [{points}],
{attributes}
)

#v(8pt)
#table(
  columns: (2fr, 2fr, 1.5fr, 1fr),
  table.header([*Test*], [*Ölçülen Değer*], [*Kriter*], [*Sonuç*]),
{rows}
)

#v(8pt)
#block(width: 100%, fill: {fill}, inset: 8pt, radius: 4pt)[
  *Mahal Sonucu:* {label}
]
"##,
        number = escape_typst(&room.room_number),
        name = escape_typst(&room.room_name),
        area = room.surface_area,
        height = room.height,
        volume = room.volume,
        points = room.sampling_points,
        fill = if room.compliant { PASS_FILL } else { FAIL_FILL },
        label = escape_typst(&room.verdict_label),
    )
}

fn build_test_row(test: &TestSummary) -> String {
    let result = match test.verdict {
        Some(Verdict::Pass) => format!("table.cell(fill: {PASS_FILL})[{}]", escape_typst(test.verdict_text())),
        Some(Verdict::Fail) => format!("table.cell(fill: {FAIL_FILL})[{}]", escape_typst(test.verdict_text())),
        None => "[Veri yok]".to_string(),
    };
    format!(
        "  [{}], [{}], [{}], {},",
        escape_typst(&test.test_name),
        escape_typst(&test.display_value),
        escape_typst(&test.criteria_text),
        result
    )
}

/// Escape special Typst characters in user-provided text
fn escape_typst(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(
            c,
            '*' | '_' | '#' | '$' | '@' | '<' | '>' | '\\' | '`' | '[' | ']' | '~' | '/' | '-' | '=' | '+'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
