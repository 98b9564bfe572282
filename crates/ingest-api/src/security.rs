//! Input validation and sanitization for the Upload Control Plane.

/// Maximum title length.
pub const MAX_TITLE_LENGTH: usize = 500;

/// Maximum filename length, per the upload init contract (§6).
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Validate a client-supplied filename: non-empty, within the byte budget,
/// and free of path separators so `storage_key` construction can't escape
/// the video's own prefix.
pub fn validate_filename(filename: &str) -> Result<(), String> {
    if filename.is_empty() {
        return Err("filename must not be empty".to_string());
    }
    if filename.len() > MAX_FILENAME_LENGTH {
        return Err(format!(
            "filename exceeds {MAX_FILENAME_LENGTH} bytes"
        ));
    }
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err("filename must not contain path separators".to_string());
    }
    if filename.chars().any(|c| c.is_control()) {
        return Err("filename must not contain control characters".to_string());
    }
    Ok(())
}

/// Strip anything that could confuse an object-store key from a filename
/// that already passed [`validate_filename`]. Defense in depth, not the
/// primary validation step.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect()
}

/// Sanitize a title or description for safe storage: trims, drops control
/// characters (newlines/tabs excepted), and truncates to `max_len`.
pub fn sanitize_text(input: &str, max_len: usize) -> String {
    let trimmed: String = input
        .trim()
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    if trimmed.chars().count() > max_len {
        trimmed.chars().take(max_len).collect()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_path_separators() {
        assert!(validate_filename("../../etc/passwd").is_err());
        assert!(validate_filename("a/b.mp4").is_err());
        assert!(validate_filename("a\\b.mp4").is_err());
    }

    #[test]
    fn accepts_plain_filename() {
        assert!(validate_filename("my-video.mp4").is_ok());
    }

    #[test]
    fn rejects_oversize_filename() {
        let long = "a".repeat(300);
        assert!(validate_filename(&long).is_err());
    }

    #[test]
    fn sanitize_text_truncates() {
        let long = "a".repeat(600);
        assert_eq!(sanitize_text(&long, MAX_TITLE_LENGTH).len(), MAX_TITLE_LENGTH);
    }
}
