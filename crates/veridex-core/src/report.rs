//! Result records and the result log.
//!
//! One row per artifact per run. The streaming log appends whole rows under
//! a lock, so an aborted run still leaves a valid, parseable prefix. The
//! final result set is sorted by source folder for stable presentation.

use std::borrow::Cow;
use std::io::Write;
use std::sync::Mutex;

use crate::error::{CoreError, CoreResult};
use crate::model::{MatchResult, ResultRecord};
use crate::scan::{audit_index_name, ArtifactScan};

/// CSV column order of the result log.
pub const CSV_HEADER: &str = "source_folder,filename,name,version,architecture,hash,match_found,matched_source,matched_index,matched_line,reason";

/// Build the result record for one scanned artifact.
pub fn record_for(scan: &ArtifactScan) -> ResultRecord {
    let artifact = &scan.artifact;
    let mut record = ResultRecord {
        source_folder: artifact.source_folder().to_string_lossy().into_owned(),
        filename: artifact.file_name(),
        name: artifact.name.clone(),
        version: artifact.version.clone(),
        architecture: artifact.architecture.clone(),
        hash: artifact.hash.clone(),
        match_found: false,
        matched_source: String::new(),
        matched_index: String::new(),
        matched_line: None,
        reason: None,
    };

    match &scan.result {
        MatchResult::Matched { source, stanza } => {
            record.match_found = true;
            record.matched_source = source.label();
            record.matched_index = audit_index_name(source);
            record.matched_line = Some(stanza.start_line);
        }
        MatchResult::Unmatched { reason } => {
            record.reason = Some(*reason);
        }
    }

    record
}

/// Render one record as a CSV row (no trailing newline).
pub fn csv_row(record: &ResultRecord) -> String {
    let fields = [
        csv_escape(&record.source_folder),
        csv_escape(&record.filename),
        csv_escape(&record.name),
        csv_escape(&record.version),
        csv_escape(&record.architecture),
        csv_escape(&record.hash),
        Cow::Borrowed(if record.match_found { "yes" } else { "no" }),
        csv_escape(&record.matched_source),
        csv_escape(&record.matched_index),
        Cow::Owned(
            record
                .matched_line
                .map(|l| l.to_string())
                .unwrap_or_default(),
        ),
        Cow::Borrowed(record.reason.map(|r| r.as_str()).unwrap_or("")),
    ];
    fields.join(",")
}

/// Write the full sorted result set: header plus one row per record,
/// ordered by source folder (then filename, for a stable tiebreak).
pub fn write_sorted(records: &[ResultRecord], writer: &mut dyn Write) -> std::io::Result<()> {
    let mut sorted: Vec<&ResultRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        a.source_folder
            .cmp(&b.source_folder)
            .then_with(|| a.filename.cmp(&b.filename))
    });

    writeln!(writer, "{CSV_HEADER}")?;
    for record in sorted {
        writeln!(writer, "{}", csv_row(record))?;
    }
    writer.flush()
}

/// Append-only result log. Appends are serialized; each append writes one
/// complete row and flushes, so cancellation between artifacts never leaves
/// a truncated row.
pub struct ResultLog {
    inner: Mutex<Box<dyn Write + Send>>,
}

impl ResultLog {
    /// Wrap a writer and emit the CSV header immediately.
    pub fn new(mut writer: Box<dyn Write + Send>) -> CoreResult<Self> {
        writeln!(writer, "{CSV_HEADER}").map_err(log_err)?;
        writer.flush().map_err(log_err)?;
        Ok(Self {
            inner: Mutex::new(writer),
        })
    }

    /// Append one record as a whole row.
    pub fn append(&self, record: &ResultRecord) -> CoreResult<()> {
        let row = csv_row(record);
        let mut writer = self.inner.lock().map_err(|_| CoreError::ResultLog {
            message: "result log lock poisoned".to_string(),
        })?;
        writeln!(writer, "{row}").map_err(log_err)?;
        writer.flush().map_err(log_err)
    }
}

fn log_err(e: std::io::Error) -> CoreError {
    CoreError::ResultLog {
        message: e.to_string(),
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn csv_escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReasonCode;

    fn record(folder: &str, file: &str) -> ResultRecord {
        ResultRecord {
            source_folder: folder.to_string(),
            filename: file.to_string(),
            name: "foo".to_string(),
            version: "1.0".to_string(),
            architecture: "amd64".to_string(),
            hash: "aabb".to_string(),
            match_found: false,
            matched_source: String::new(),
            matched_index: String::new(),
            matched_line: None,
            reason: Some(ReasonCode::NotFound),
        }
    }

    #[test]
    fn csv_row_for_unmatched_has_empty_match_columns() {
        let row = csv_row(&record("/pkgs", "foo.pkg"));
        assert_eq!(row, "/pkgs,foo.pkg,foo,1.0,amd64,aabb,no,,,,not_found");
    }

    #[test]
    fn csv_row_for_matched_has_empty_reason() {
        let mut r = record("/pkgs", "foo.pkg");
        r.match_found = true;
        r.matched_source = "stable/main".to_string();
        r.matched_index = "stable_main.index.txt".to_string();
        r.matched_line = Some(42);
        r.reason = None;
        let row = csv_row(&r);
        assert_eq!(
            row,
            "/pkgs,foo.pkg,foo,1.0,amd64,aabb,yes,stable/main,stable_main.index.txt,42,"
        );
    }

    #[test]
    fn fields_with_delimiters_are_quoted() {
        let mut r = record("/pkgs", "weird,name.pkg");
        r.name = "has \"quotes\"".to_string();
        let row = csv_row(&r);
        assert!(row.contains("\"weird,name.pkg\""));
        assert!(row.contains("\"has \"\"quotes\"\"\""));
    }

    #[test]
    fn write_sorted_orders_by_source_folder_then_filename() {
        let records = vec![
            record("/z", "a.pkg"),
            record("/a", "b.pkg"),
            record("/a", "a.pkg"),
        ];
        let mut out = Vec::new();
        write_sorted(&records, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].starts_with("/a,a.pkg"));
        assert!(lines[2].starts_with("/a,b.pkg"));
        assert!(lines[3].starts_with("/z,a.pkg"));
    }

    #[test]
    fn log_appends_whole_rows() {
        // Buffer behind the log; inspect after dropping it.
        let path = tempfile::NamedTempFile::new().unwrap();
        let file = path.reopen().unwrap();
        let log = ResultLog::new(Box::new(file)).unwrap();
        log.append(&record("/pkgs", "one.pkg")).unwrap();
        log.append(&record("/pkgs", "two.pkg")).unwrap();
        drop(log);

        let text = std::fs::read_to_string(path.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(text.ends_with('\n'));
    }
}
