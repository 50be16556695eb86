//! Terminal projections of the view.
//!
//! Pure string builders, kept separate from the state machine so they can
//! be checked without driving a submission.

use std::fmt::Write;

use crate::models::extraction::{AnalysisResult, DetectedItem, ExtractionResult};
use crate::models::progress::ProgressSnapshot;
use crate::view::state::View;

/// Shown when an analysis finds no SKU-bearing products.
pub const NO_ITEMS_MESSAGE: &str = "No products with SKU were found in the PDF.";

const PROGRESS_BAR_WIDTH: usize = 20;

/// Icon shown next to a detected item, keyed by category. The category set
/// is open-ended; anything unrecognized gets the generic box.
pub fn category_icon(category: &str) -> &'static str {
    match category {
        "Gate" | "Door" => "🚪",
        "Fence" => "🔲",
        "Handrail" => "🛡️",
        "Window Protection" => "🪟",
        "Unknown" => "❓",
        _ => "📦",
    }
}

/// ETA label for a snapshot, indeterminate while the service has not
/// estimated one yet.
pub fn eta_label(eta_seconds: Option<u64>) -> String {
    match eta_seconds {
        Some(eta) => format!("Est. {}m {}s remaining", eta / 60, eta % 60),
        None => "Calculating time...".to_string(),
    }
}

pub fn render_progress(snapshot: &ProgressSnapshot) -> String {
    let percentage = usize::from(snapshot.percentage.min(100));
    let filled = percentage * PROGRESS_BAR_WIDTH / 100;

    format!(
        "[{}{}] {}% {} | Processing {} of {} | {}",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled),
        snapshot.percentage,
        snapshot.message,
        snapshot.current,
        snapshot.total,
        eta_label(snapshot.eta_seconds)
    )
}

/// Text panel: the extracted text verbatim, then the file/method badges and
/// the OCR badge only when OCR actually ran.
pub fn render_text_result(result: &ExtractionResult) -> String {
    let mut out = String::new();
    out.push_str(&result.text);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    let _ = writeln!(out, "File: {}", result.filename);
    let _ = writeln!(out, "Method: {}", result.method);
    if result.ocr_used {
        out.push_str("✓ OCR Enabled\n");
    }
    out
}

/// Image panel: summary counts, then one entry per item in delivered order.
pub fn render_analysis_result(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "File: {}", result.filename);
    let _ = writeln!(
        out,
        "{} images found / {} analyzed / {} skipped",
        result.total_images, result.processed, result.skipped
    );

    if result.items.is_empty() {
        out.push_str(NO_ITEMS_MESSAGE);
        out.push('\n');
    } else {
        for item in &result.items {
            out.push_str(&render_item(item));
        }
    }

    if let Some(name) = &result.export_file {
        let _ = writeln!(out, "Export ready: {}", name);
    }
    out
}

pub fn render_item(item: &DetectedItem) -> String {
    let mut line = format!(
        "{} SKU: {} [{}]",
        category_icon(&item.category),
        item.sku,
        item.category
    );
    if let Some(description) = &item.description {
        let _ = write!(line, " {}", description);
    }
    let _ = write!(line, " (Page {})", item.page);
    line.push('\n');
    line
}

/// Paint whichever panel the view currently shows.
pub fn render_view(view: &View) -> String {
    match view {
        View::Idle => String::new(),
        View::Loading => "Extracting text from PDF...".to_string(),
        View::Progress(snapshot) => render_progress(snapshot),
        View::TextResult(result) => render_text_result(result),
        View::ImageResult(result) => render_analysis_result(result),
        View::Error(message) => format!("Error: {}", message),
    }
}
