//! Resume upload: validation, forwarding to the extraction service and
//! normalization of what comes back.

pub mod extractor;
pub mod handlers;

/// Upload cap of the extraction endpoint.
pub const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;

pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Lower-cased extension of `file_name` if it is an accepted resume format.
pub fn allowed_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Content type for an accepted extension.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "pdf" => ALLOWED_MIME_TYPES[0],
        "doc" => ALLOWED_MIME_TYPES[1],
        _ => ALLOWED_MIME_TYPES[2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extension_is_case_insensitive() {
        assert_eq!(allowed_extension("CV.PDF").as_deref(), Some("pdf"));
        assert_eq!(allowed_extension("resume.final.docx").as_deref(), Some("docx"));
    }

    #[test]
    fn test_other_extensions_are_refused() {
        assert_eq!(allowed_extension("resume.txt"), None);
        assert_eq!(allowed_extension("resume"), None);
    }

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for_extension("doc"), "application/msword");
    }
}
