//! Upload eligibility rules for discovered files.

/// Substrings that mark editor swap files, temporaries and backups.
const TEMPORARY_MARKERS: &[&str] = &[".tmp", ".swp", "~"];

/// Decide whether a file should be uploaded, based on its name alone.
///
/// Hidden files (leading `.`) and names containing `.tmp`, `.swp` or `~`
/// anywhere are skipped. Everything else is eligible.
pub fn should_upload(file_name: &str) -> bool {
    if file_name.starts_with('.') {
        return false;
    }
    !TEMPORARY_MARKERS
        .iter()
        .any(|marker| file_name.contains(marker))
}
