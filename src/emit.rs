//! Emit filter and output sink. Every discovery in the crawler funnels
//! through here: the filter decides whether the kind is wanted, the sink
//! formats one line per record and serializes writes to stdout and the
//! optional per-target file.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

/// The closed set of record kinds the spider can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Url,
    Href,
    Javascript,
    Linkfinder,
    Form,
    UploadForm,
    Robots,
    Sitemap,
    Subdomains,
    Aws,
    Render,
    Network,
    Raw,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Url => "url",
            Kind::Href => "href",
            Kind::Javascript => "javascript",
            Kind::Linkfinder => "linkfinder",
            Kind::Form => "form",
            Kind::UploadForm => "upload-form",
            Kind::Robots => "robots",
            Kind::Sitemap => "sitemap",
            Kind::Subdomains => "subdomains",
            Kind::Aws => "aws",
            Kind::Render => "render",
            Kind::Network => "network",
            Kind::Raw => "raw",
        }
    }
}

/// One output record. Serialized as a single JSON object per line in
/// structured mode.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub input: String,
    pub source: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub output: String,
    pub status: u16,
    pub length: usize,
}

impl Record {
    pub fn new(input: &str, source: &str, kind: &str, output: &str) -> Self {
        Self {
            input: input.to_string(),
            source: source.to_string(),
            kind: kind.to_string(),
            output: output.to_string(),
            status: 0,
            length: 0,
        }
    }

    pub fn with_response(mut self, status: u16, length: usize) -> Self {
        self.status = status;
        self.length = length;
        self
    }
}

/// Allow/deny sets over record kinds, built from two comma-separated lists.
/// An empty include list allows everything; the exclude list is subtracted
/// last.
#[derive(Debug)]
pub struct EmitFilter {
    allow_all: bool,
    allow: HashSet<String>,
    deny: HashSet<String>,
}

impl EmitFilter {
    pub fn new(include_csv: &str, exclude_csv: &str) -> Self {
        let split = |csv: &str| {
            csv.split(',')
                .map(|k| k.trim().to_ascii_lowercase())
                .filter(|k| !k.is_empty())
                .collect::<HashSet<_>>()
        };
        let allow = split(include_csv);
        Self {
            allow_all: allow.is_empty(),
            allow,
            deny: split(exclude_csv),
        }
    }

    pub fn allow_everything() -> Self {
        Self::new("", "")
    }

    pub fn ok(&self, kind: Kind) -> bool {
        let key = kind.as_str();
        if self.deny.contains(key) {
            return false;
        }
        self.allow_all || self.allow.contains(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Plain,
    Quiet,
    Json,
}

/// Line sink for one target. File writes are buffered and serialized under a
/// mutex; the buffer is flushed on close.
pub struct Sink {
    mode: OutputMode,
    length: bool,
    filter: EmitFilter,
    file: Option<Mutex<BufWriter<std::fs::File>>>,
}

impl Sink {
    pub fn new(
        mode: OutputMode,
        length: bool,
        filter: EmitFilter,
        output_dir: Option<&Path>,
        hostname: &str,
    ) -> std::io::Result<Self> {
        let file = match output_dir {
            Some(dir) => {
                let name = hostname.replace('.', "_");
                let f = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(dir.join(name))?;
                Some(Mutex::new(BufWriter::new(f)))
            }
            None => None,
        };
        Ok(Self {
            mode,
            length,
            filter,
            file,
        })
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Emit a pre-formatted line under a kind, subject to the filter.
    pub fn line(&self, kind: Kind, line: &str) {
        if !self.filter.ok(kind) {
            return;
        }
        println!("{}", line);
        self.write_file(line);
    }

    /// Emit a line that bypasses the kind filter (third-party source echo).
    pub fn line_unfiltered(&self, line: &str) {
        println!("{}", line);
        self.write_file(line);
    }

    /// Write only to the file sink, never stdout (raw bodies in quiet mode).
    pub fn file_only(&self, line: &str) {
        self.write_file(line);
    }

    /// Format and emit a record. `label` is the display tag inside the
    /// brackets; `kind` is what the filter matches against. They differ only
    /// for link-finder-discovered assets.
    pub fn record(&self, kind: Kind, label: &str, rec: &Record) {
        let line = match self.mode {
            OutputMode::Json => match serde_json::to_string(rec) {
                Ok(s) => s,
                Err(_) => return,
            },
            OutputMode::Quiet => rec.output.clone(),
            OutputMode::Plain => format!("[{}] - {}", label, rec.output),
        };
        self.line(kind, &line);
    }

    /// Emit a `[url]` record for a fetched response, honoring the length
    /// toggle in plain mode.
    pub fn url_record(&self, rec: &Record) {
        let line = match self.mode {
            OutputMode::Json => match serde_json::to_string(rec) {
                Ok(s) => s,
                Err(_) => return,
            },
            OutputMode::Quiet => rec.output.clone(),
            OutputMode::Plain => {
                if self.length {
                    format!(
                        "[url] - [code-{}] - [len_{}] - {}",
                        rec.status, rec.length, rec.output
                    )
                } else {
                    format!("[url] - [code-{}] - {}", rec.status, rec.output)
                }
            }
        };
        self.line(Kind::Url, &line);
    }

    fn write_file(&self, line: &str) {
        if let Some(file) = &self.file {
            let mut w = file.lock();
            let _ = writeln!(w, "{}", line);
        }
    }

    /// Flush the file buffer. Called once per target at quiescence.
    pub fn close(&self) {
        if let Some(file) = &self.file {
            let _ = file.lock().flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_allows_all_when_include_empty() {
        let f = EmitFilter::new("", "");
        assert!(f.ok(Kind::Url));
        assert!(f.ok(Kind::Aws));
    }

    #[test]
    fn test_filter_include_list() {
        let f = EmitFilter::new("href, url", "");
        assert!(f.ok(Kind::Href));
        assert!(f.ok(Kind::Url));
        assert!(!f.ok(Kind::Javascript));
    }

    #[test]
    fn test_filter_exclude_applied_last() {
        let f = EmitFilter::new("href,url", "url");
        assert!(f.ok(Kind::Href));
        assert!(!f.ok(Kind::Url));

        let f = EmitFilter::new("", "subdomains");
        assert!(f.ok(Kind::Url));
        assert!(!f.ok(Kind::Subdomains));
    }

    #[test]
    fn test_filter_case_insensitive() {
        let f = EmitFilter::new("HREF,Upload-Form", "");
        assert!(f.ok(Kind::Href));
        assert!(f.ok(Kind::UploadForm));
    }

    #[test]
    fn test_record_json_shape() {
        let rec = Record::new("https://a.test/", "body", "href", "https://a.test/x");
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"type\":\"href\""));
        assert!(json.contains("\"status\":0"));
        assert!(json.contains("\"output\":\"https://a.test/x\""));
    }

    #[test]
    fn test_file_sink_writes_and_flushes() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(
            OutputMode::Plain,
            false,
            EmitFilter::allow_everything(),
            Some(dir.path()),
            "a.test",
        )
        .unwrap();
        sink.line(Kind::Href, "[href] - https://a.test/x");
        sink.close();

        let written = std::fs::read_to_string(dir.path().join("a_test")).unwrap();
        assert_eq!(written, "[href] - https://a.test/x\n");
    }

    #[test]
    fn test_filtered_kind_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(
            OutputMode::Plain,
            false,
            EmitFilter::new("url", ""),
            Some(dir.path()),
            "a.test",
        )
        .unwrap();
        sink.line(Kind::Href, "[href] - nope");
        sink.close();
        let written = std::fs::read_to_string(dir.path().join("a_test")).unwrap();
        assert!(written.is_empty());
    }
}
