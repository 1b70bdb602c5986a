//! # Scan Log Export
//!
//! Renders the scan log as CSV for sharing off-device.
//!
//! ```text
//! Token ID,Time,Status
//! TOKEN_0002,2025-09-01T18:04:11.532Z,duplicate
//! TOKEN_0002,2025-09-01T18:03:50.017Z,valid
//! Raw Data,2025-09-01T18:03:12.900Z,invalid
//! ```
//!
//! Rows keep the order they are given in (the stores hand them out newest
//! first). Times are ISO-8601 UTC with millisecond precision.

use chrono::SecondsFormat;

use crate::error::{CoreError, CoreResult};
use crate::types::ScanLogEntry;

/// Header row of the export.
pub const CSV_HEADER: [&str; 3] = ["Token ID", "Time", "Status"];

/// Renders `entries` as CSV text.
///
/// An empty log is refused with [`CoreError::NoData`] so the operator gets a
/// notice instead of an empty file.
pub fn scan_logs_to_csv(entries: &[ScanLogEntry]) -> CoreResult<String> {
    if entries.is_empty() {
        return Err(CoreError::NoData);
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .map_err(|e| CoreError::Export(e.to_string()))?;

    for entry in entries {
        let time = entry.time.to_rfc3339_opts(SecondsFormat::Millis, true);
        writer
            .write_record([entry.token_id.as_str(), time.as_str(), entry.outcome.as_str()])
            .map_err(|e| CoreError::Export(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Export(e.to_string()))?;

    String::from_utf8(bytes).map_err(|e| CoreError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScanOutcome;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_empty_log_is_refused() {
        assert!(matches!(scan_logs_to_csv(&[]), Err(CoreError::NoData)));
    }

    #[test]
    fn test_rows_in_given_order() {
        let newer = Utc.timestamp_millis_opt(1_756_749_851_532).unwrap();
        let older = Utc.timestamp_millis_opt(1_756_749_830_017).unwrap();
        let entries = vec![
            ScanLogEntry::new("TOKEN_0002", newer, ScanOutcome::Duplicate),
            ScanLogEntry::new("Raw Data", older, ScanOutcome::Invalid),
        ];

        let csv = scan_logs_to_csv(&entries).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Token ID,Time,Status");
        assert_eq!(lines[1], "TOKEN_0002,2025-09-01T18:04:11.532Z,duplicate");
        assert_eq!(lines[2], "Raw Data,2025-09-01T18:03:50.017Z,invalid");
    }
}
