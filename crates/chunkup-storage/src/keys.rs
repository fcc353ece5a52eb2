//! Shared key generation for the chunk store.

use chunkup_core::DocumentType;

/// Directory under the storage root holding every in-flight upload
pub const TEMP_ROOT: &str = "temp";

/// Key of the temp directory for one upload: `temp/{upload_id}`
pub fn temp_dir_key(upload_id: &str) -> String {
    format!("{}/{}", TEMP_ROOT, upload_id)
}

/// Whether a client-supplied upload identifier is safe to use as a single path segment
pub fn is_valid_upload_id(upload_id: &str) -> bool {
    !upload_id.is_empty()
        && upload_id.len() <= 255
        && upload_id != "."
        && !upload_id.contains("..")
        && !upload_id.contains(['/', '\\', '\0'])
}

/// Key of one chunk file inside an upload's temp directory
pub fn chunk_key(temp_dir: &str, index: u32) -> String {
    format!("{}/chunk_{}", temp_dir.trim_end_matches('/'), index)
}

/// Key of the assembled artifact: `{document_type_lowercase}/{file_name}`
pub fn artifact_key(document_type: DocumentType, file_name: &str) -> String {
    format!("{}/{}", document_type.dir_name(), file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_id_validation() {
        assert!(is_valid_upload_id("report.pdf-3-0f1e2d"));
        assert!(!is_valid_upload_id(""));
        assert!(!is_valid_upload_id("."));
        assert!(!is_valid_upload_id("../etc"));
        assert!(!is_valid_upload_id("a/b"));
        assert!(!is_valid_upload_id("a\\b"));
    }

    #[test]
    fn test_layout() {
        let dir = temp_dir_key("report.pdf-3-abc");
        assert_eq!(dir, "temp/report.pdf-3-abc");
        assert_eq!(chunk_key(&dir, 2), "temp/report.pdf-3-abc/chunk_2");
        assert_eq!(
            artifact_key(DocumentType::Dissertation, "report.pdf"),
            "dissertation/report.pdf"
        );
    }
}
