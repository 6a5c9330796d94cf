//! Loader for headers and cookies saved as a raw HTTP request (e.g. a
//! request copied out of an intercepting proxy). Only the header block is
//! consumed; the request line and body are ignored.

use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parse the header block of a raw request file into ordered (name, value)
/// pairs. Cookies arrive as a plain `Cookie` header like any other.
pub fn load_headers(path: &Path) -> std::io::Result<Vec<(String, String)>> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut headers = Vec::new();
    let mut saw_request_line = false;
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim_end_matches('\r');
        if !saw_request_line {
            saw_request_line = true;
            continue; // request line: METHOD /path HTTP/1.1
        }
        if trimmed.is_empty() {
            break; // end of header block
        }
        if let Some((name, value)) = trimmed.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if !name.is_empty() {
                headers.push((name.to_string(), value.to_string()));
            }
        }
    }
    Ok(headers)
}
