use std::path::Path;

/// Lunghezza oltre la quale il nome viene abbreviato nella vista
const DISPLAY_NAME_MAX: usize = 25;
const DISPLAY_NAME_KEEP: usize = 22;

pub fn get_mime_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string()
}

/// Size in kilobytes with one decimal, rounding half up.
///
/// Integer arithmetic keeps ties like 256 bytes (0.25 KB) rounding to "0.3".
pub fn format_size_kb(size_bytes: u64) -> String {
    let tenths = (u128::from(size_bytes) * 10 + 512) / 1024;
    format!("{}.{}", tenths / 10, tenths % 10)
}

/// Shorten long names for display: first 22 chars followed by "...".
pub fn display_name(name: &str) -> String {
    if name.chars().count() > DISPLAY_NAME_MAX {
        let head: String = name.chars().take(DISPLAY_NAME_KEEP).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}

/// Keep only the final path component of a filename coming from the user.
pub fn sanitize_filename(name: &str) -> Option<String> {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .map(str::to_string)
}
