use std::io::BufWriter;

use printpdf::*;

use crate::error::{Result, SpendError};
use crate::export::{export_row, COLUMNS};
use crate::fmt::{money, month_name, plain};
use crate::models::ExpenseRecord;
use crate::reports::{self, MonthlyAnalysis};

// A4 dimensions (mm)
const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN_TOP: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 20.0;
const MARGIN_LEFT: f32 = 19.05;
const MARGIN_RIGHT: f32 = 19.05;
const ROW_H: f32 = 5.0;
const FONT_SIZE: f32 = 10.0;
const TITLE_SIZE: f32 = 14.0;
const SUBTITLE_SIZE: f32 = 10.0;

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.18
}

/// Cut `text` so it fits in `width` mm, marking the cut with `..`.
fn clip(text: &str, width: f32, size: f32) -> String {
    if approx_text_width(text, size) <= width {
        return text.to_string();
    }
    let max_chars = ((width / (size * 0.18)) as usize).saturating_sub(2);
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("..");
    out
}

fn pdf_err(e: impl std::fmt::Debug) -> SpendError {
    SpendError::Pdf(format!("{e:?}"))
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

struct Col {
    width: f32,
    align: Align,
}

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    current_page: PdfPageIndex,
    current_layer: PdfLayerIndex,
    y: f32,
    pages: usize,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_err)?;
        Ok(Self {
            doc,
            font,
            font_bold,
            current_page: page,
            current_layer: layer,
            y: MARGIN_TOP,
            pages: 1,
        })
    }

    fn pdf_y(&self) -> f32 {
        PAGE_H - self.y
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer");
        self.current_page = page;
        self.current_layer = layer;
        self.y = MARGIN_TOP;
        self.pages += 1;
    }

    /// Returns true when a page break happened.
    fn ensure_space(&mut self, needed: f32) -> bool {
        if self.y + needed > PAGE_H - MARGIN_BOTTOM {
            self.new_page();
            return true;
        }
        false
    }

    fn text(&self, s: &str, x: f32, size: f32, bold: bool) {
        let font = if bold { &self.font_bold } else { &self.font };
        let layer = self
            .doc
            .get_page(self.current_page)
            .get_layer(self.current_layer);
        layer.use_text(s, size, Mm(x), Mm(self.pdf_y()), font);
    }

    fn hline(&self, x1: f32, x2: f32) {
        let layer = self
            .doc
            .get_page(self.current_page)
            .get_layer(self.current_layer);
        layer.set_outline_thickness(0.5);
        let line = Line {
            points: vec![
                (Point::new(Mm(x1), Mm(self.pdf_y())), false),
                (Point::new(Mm(x2), Mm(self.pdf_y())), false),
            ],
            is_closed: false,
        };
        layer.add_line(line);
    }

    fn header(&mut self, title: &str, subtitle: &str) {
        self.text(title, MARGIN_LEFT, TITLE_SIZE, true);
        self.y += 7.0;
        if !subtitle.is_empty() {
            self.text(subtitle, MARGIN_LEFT, SUBTITLE_SIZE, false);
            self.y += 5.0;
        }
        let ts = chrono::Local::now()
            .format("Generated %Y-%m-%d %H:%M")
            .to_string();
        self.text(&ts, MARGIN_LEFT, 8.0, false);
        self.y += 5.0;
        self.hline(MARGIN_LEFT, PAGE_W - MARGIN_RIGHT);
        self.y += 5.0;
    }

    fn table_header(&mut self, cols: &[Col], headers: &[&str]) {
        self.ensure_space(ROW_H * 2.0);
        self.cells(cols, headers, true);
        self.y += ROW_H;
        self.hline(MARGIN_LEFT, PAGE_W - MARGIN_RIGHT);
        self.y += 2.0;
    }

    fn cells(&self, cols: &[Col], values: &[&str], bold: bool) {
        let mut x = MARGIN_LEFT;
        for (col, value) in cols.iter().zip(values) {
            let value = clip(value, col.width - 2.0, FONT_SIZE);
            match col.align {
                Align::Left => self.text(&value, x, FONT_SIZE, bold),
                Align::Right => {
                    let tw = approx_text_width(&value, FONT_SIZE);
                    self.text(&value, x + col.width - tw, FONT_SIZE, bold);
                }
            }
            x += col.width;
        }
    }

    /// A body row. On a page break the column headers are repeated first.
    fn table_row(&mut self, cols: &[Col], headers: &[&str], values: &[&str], bold: bool) {
        if self.ensure_space(ROW_H) {
            self.table_header(cols, headers);
        }
        self.cells(cols, values, bold);
        self.y += ROW_H;
    }

    fn separator(&mut self) {
        self.hline(MARGIN_LEFT, PAGE_W - MARGIN_RIGHT);
        self.y += 2.0;
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc.save(&mut buf).map_err(pdf_err)?;
        buf.into_inner().map_err(|e| SpendError::Pdf(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Render functions
// ---------------------------------------------------------------------------

pub fn expense_title(records: &[ExpenseRecord], currency: &str) -> String {
    let total = plain(reports::total(records));
    format!("Expense Data (Total Amount {currency}:{total}/-)")
}

/// The expense register: date, mode, item, bank, amount.
pub fn render_expenses(records: &[ExpenseRecord], currency: &str, scope: &str) -> Result<Vec<u8>> {
    let title = expense_title(records, currency);
    let mut pdf = PdfWriter::new(&title)?;
    pdf.header(&title, scope);

    let cols = &[
        Col { width: 26.0, align: Align::Left },
        Col { width: 30.0, align: Align::Left },
        Col { width: 62.0, align: Align::Left },
        Col { width: 28.0, align: Align::Left },
        Col { width: 25.9, align: Align::Right },
    ];
    pdf.table_header(cols, &COLUMNS);

    for r in records {
        let row = export_row(r);
        let values: Vec<&str> = row.iter().map(String::as_str).collect();
        pdf.table_row(cols, &COLUMNS, &values, false);
    }

    pdf.separator();
    let total = plain(reports::total(records));
    pdf.table_row(cols, &COLUMNS, &["Total", "", "", "", &total], true);

    tracing::debug!(rows = records.len(), pages = pdf.pages, "rendered expense pdf");
    pdf.to_bytes()
}

/// Category totals for one month, largest first.
pub fn render_monthly(analysis: &MonthlyAnalysis, currency: &str) -> Result<Vec<u8>> {
    let title = format!(
        "Monthly Analysis: {} {}",
        month_name(analysis.month),
        analysis.year
    );
    let mut pdf = PdfWriter::new(&title)?;
    pdf.header(&title, "");

    let headers = ["Category", "Entries", "Amount", "%"];
    let cols = &[
        Col { width: 80.0, align: Align::Left },
        Col { width: 25.0, align: Align::Right },
        Col { width: 45.0, align: Align::Right },
        Col { width: 21.9, align: Align::Right },
    ];
    pdf.table_header(cols, &headers);

    for c in &analysis.categories {
        let count = c.count.to_string();
        let amt = money(c.amount, currency);
        let pct = format!("{:.1}%", c.pct);
        pdf.table_row(cols, &headers, &[&c.category, &count, &amt, &pct], false);
    }

    pdf.separator();
    let total = money(analysis.total, currency);
    pdf.table_row(cols, &headers, &["Total", "", &total, ""], true);

    pdf.to_bytes()
}
