//! Topic assignment from the documents tree layout.

use docrag_core::GENERAL_TOPIC;
use std::path::Path;

/// Topic of a file: the name of its immediate parent directory, or
/// [`GENERAL_TOPIC`] when the file sits directly under `root` or has no parent.
pub fn resolve_topic(file: &Path, root: &Path) -> String {
    let parent = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return GENERAL_TOPIC.to_string(),
    };

    if parent == root {
        return GENERAL_TOPIC.to_string();
    }

    parent
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| GENERAL_TOPIC.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_under_root_is_general() {
        let root = Path::new("/docs");
        assert_eq!(resolve_topic(Path::new("/docs/notes.txt"), root), "general");
    }

    #[test]
    fn test_immediate_parent_only() {
        let root = Path::new("/docs");
        assert_eq!(
            resolve_topic(Path::new("/docs/tax-law/iva-guide.pdf"), root),
            "tax-law"
        );
        assert_eq!(resolve_topic(Path::new("/docs/tax-law/eu/vat.pdf"), root), "eu");
    }

    #[test]
    fn test_no_parent() {
        let root = Path::new("/docs");
        assert_eq!(resolve_topic(Path::new("notes.txt"), root), "general");
        assert_eq!(resolve_topic(Path::new("/"), root), "general");
    }

    #[test]
    fn test_outside_root_uses_parent_name() {
        let root = Path::new("/docs");
        assert_eq!(resolve_topic(Path::new("/tmp/inbox/a.txt"), root), "inbox");
    }
}
