//! Text sampling for content signals.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Bytes inspected for NUL when deciding whether a file is binary.
pub const BINARY_SNIFF_BYTES: usize = 8 * 1024;

/// Read a file as lowercase text for keyword matching.
///
/// Returns `None` when the file is larger than `max_bytes`, cannot be read,
/// contains a NUL byte in its first [`BINARY_SNIFF_BYTES`], or is not valid
/// UTF-8. Callers treat `None` as "no content signal", never as a failure.
pub fn read_text_sample(path: &Path, size: u64, max_bytes: u64) -> Option<String> {
    if size > max_bytes {
        return None;
    }

    let file = File::open(path).ok()?;
    let mut buffer = Vec::with_capacity(size as usize);
    // The file may have grown since it was scanned.
    file.take(max_bytes).read_to_end(&mut buffer).ok()?;

    let sniff = &buffer[..buffer.len().min(BINARY_SNIFF_BYTES)];
    if sniff.contains(&0) {
        return None;
    }

    String::from_utf8(buffer).ok().map(|text| text.to_lowercase())
}
