use garde::Validate;

use crate::models::extraction::ExtractionMethod;
use crate::models::job::{ExtractionMode, SubmissionFile};

/// Document extension accepted for submission, matched case-insensitively.
pub const ACCEPTED_EXTENSION: &str = ".pdf";

const MISSING_FILE_MESSAGE: &str = "Please select a PDF file";

/// A submission as assembled from user input, validated before any request
/// is issued.
#[derive(Debug, Clone, Validate)]
pub struct SubmissionRequest {
    /// The picked document, if any. Garde validates the inner file when
    /// present; a missing file is caught in `selected_file`.
    #[garde(inner(custom(is_pdf_document)))]
    pub file: Option<SubmissionFile>,

    #[garde(skip)]
    pub mode: ExtractionMode,

    /// Text extraction backend. Ignored by the service in image mode.
    #[garde(skip)]
    pub method: ExtractionMethod,

    /// Run OCR on pages without a text layer. Text mode only.
    #[garde(skip)]
    pub use_ocr: bool,
}

impl SubmissionRequest {
    pub fn new(file: Option<SubmissionFile>, mode: ExtractionMode) -> Self {
        Self {
            file,
            mode,
            method: ExtractionMethod::default(),
            use_ocr: false,
        }
    }

    pub fn with_method(mut self, method: ExtractionMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_ocr(mut self, use_ocr: bool) -> Self {
        self.use_ocr = use_ocr;
        self
    }

    /// The validated document, or the message to show the user. A request
    /// that fails here must not produce any outbound traffic.
    pub fn selected_file(&self) -> Result<&SubmissionFile, String> {
        let file = self
            .file
            .as_ref()
            .ok_or_else(|| MISSING_FILE_MESSAGE.to_string())?;
        self.validate().map_err(|report| first_message(&report))?;
        Ok(file)
    }
}

fn is_pdf_document(file: &SubmissionFile, _context: &()) -> garde::Result {
    if file.name.is_empty() {
        return Err(garde::Error::new(MISSING_FILE_MESSAGE));
    }
    if !file.name.to_lowercase().ends_with(ACCEPTED_EXTENSION) {
        return Err(garde::Error::new("Please select a valid PDF file"));
    }
    Ok(())
}

fn first_message(report: &garde::Report) -> String {
    report
        .iter()
        .next()
        .map(|(_, error)| error.to_string())
        .unwrap_or_else(|| "Invalid submission".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str) -> SubmissionRequest {
        SubmissionRequest::new(
            Some(SubmissionFile::new(name, b"%PDF-1.4".to_vec())),
            ExtractionMode::Text,
        )
    }

    #[test]
    fn test_missing_file_rejected() {
        let request = SubmissionRequest::new(None, ExtractionMode::Text);
        assert_eq!(
            request.selected_file().unwrap_err(),
            "Please select a PDF file"
        );
    }

    #[test]
    fn test_empty_name_rejected_like_missing_file() {
        assert_eq!(
            request("").selected_file().unwrap_err(),
            "Please select a PDF file"
        );
    }

    #[test]
    fn test_extension_checked_case_insensitively() {
        assert!(request("report.pdf").selected_file().is_ok());
        assert!(request("A.PDF").selected_file().is_ok());
        assert!(request("scan.Pdf").selected_file().is_ok());
    }

    #[test]
    fn test_wrong_extension_rejected() {
        assert_eq!(
            request("a.txt").selected_file().unwrap_err(),
            "Please select a valid PDF file"
        );
        assert_eq!(
            request("archive.pdf.zip").selected_file().unwrap_err(),
            "Please select a valid PDF file"
        );
    }

    #[test]
    fn test_valid_request_exposes_the_file() {
        let file = request("report.pdf").selected_file().cloned().unwrap();
        assert_eq!(file.name, "report.pdf");
    }
}
