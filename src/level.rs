use crate::error::FormatError;

/// Map a Monolog-style numeric severity code to its CLEF severity name.
///
/// The table is fixed: 100 → Debug, 200/250 → Information, 300 → Warning,
/// 400/500 → Error, 550/600 → Fatal. The doubled codes absorb near-duplicate
/// numbering schemes (notice vs. info, critical vs. error, alert vs.
/// emergency). A code outside the table is rejected rather than mapped to a
/// fallback severity.
pub fn severity_name(code: u16) -> Result<&'static str, FormatError> {
    match code {
        100 => Ok("Debug"),
        200 | 250 => Ok("Information"),
        300 => Ok("Warning"),
        400 | 500 => Ok("Error"),
        550 | 600 => Ok("Fatal"),
        other => Err(FormatError::UnknownLevel(other)),
    }
}
