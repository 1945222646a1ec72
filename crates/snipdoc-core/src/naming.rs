use std::path::{Component, Path};

use crate::MANAGED_EXTENSION;
use crate::error::DocError;

/// Normalize a caller-supplied document name.
///
/// Appends the managed extension when missing (case-insensitive check) and
/// rejects anything that is not a single plain file name, so a name can never
/// resolve outside the directory it is joined to. Idempotent.
pub fn normalize_file_name(name: &str) -> Result<String, DocError> {
    if name.is_empty() {
        return Err(DocError::validation("File name not provided"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(DocError::validation(format!(
            "Invalid file name: {name}"
        )));
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => {}
        _ => {
            return Err(DocError::validation(format!(
                "Invalid file name: {name}"
            )));
        }
    }

    if name.to_lowercase().ends_with(MANAGED_EXTENSION) {
        Ok(name.to_string())
    } else {
        Ok(format!("{name}{MANAGED_EXTENSION}"))
    }
}

/// Returns true if `name` carries the managed extension exactly as written on disk.
pub fn is_managed(name: &str) -> bool {
    name.ends_with(MANAGED_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_missing_extension() {
        assert_eq!(normalize_file_name("Notes").unwrap(), "Notes.docx");
    }

    #[test]
    fn keeps_existing_extension_any_case() {
        assert_eq!(normalize_file_name("Notes.docx").unwrap(), "Notes.docx");
        assert_eq!(normalize_file_name("Notes.DOCX").unwrap(), "Notes.DOCX");
    }

    #[test]
    fn idempotent() {
        for name in ["a", "a.docx", "report.pdf", "my notes"] {
            let once = normalize_file_name(name).unwrap();
            assert_eq!(normalize_file_name(&once).unwrap(), once);
        }
    }

    #[test]
    fn rejects_empty_and_traversal() {
        assert!(matches!(
            normalize_file_name(""),
            Err(DocError::Validation(_))
        ));
        for bad in ["..", ".", "../x", "dir/x", "dir\\x", "/etc/passwd"] {
            assert!(
                matches!(normalize_file_name(bad), Err(DocError::Validation(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn managed_check_is_case_sensitive() {
        assert!(is_managed("a.docx"));
        assert!(!is_managed("a.DOCX"));
        assert!(!is_managed("a.pdf"));
    }
}
