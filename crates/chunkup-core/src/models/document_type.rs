use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Closed set of document categories an upload can land in.
///
/// The category picks the destination directory (`<storage>/<category>/`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentType {
    Thesis,
    Dissertation,
    Confluence,
    Synergy,
    #[default]
    Hello,
}

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        DocumentType::Thesis,
        DocumentType::Dissertation,
        DocumentType::Confluence,
        DocumentType::Synergy,
        DocumentType::Hello,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Thesis => "THESIS",
            DocumentType::Dissertation => "DISSERTATION",
            DocumentType::Confluence => "CONFLUENCE",
            DocumentType::Synergy => "SYNERGY",
            DocumentType::Hello => "HELLO",
        }
    }

    /// Directory name under the storage root
    pub fn dir_name(&self) -> &'static str {
        match self {
            DocumentType::Thesis => "thesis",
            DocumentType::Dissertation => "dissertation",
            DocumentType::Confluence => "confluence",
            DocumentType::Synergy => "synergy",
            DocumentType::Hello => "hello",
        }
    }

    /// Parse a client-supplied category, falling back to [`DocumentType::Hello`]
    /// for anything outside the closed set.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown document type: {0}")]
pub struct UnknownDocumentType(pub String);

impl FromStr for DocumentType {
    type Err = UnknownDocumentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        DocumentType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownDocumentType(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("thesis".parse::<DocumentType>(), Ok(DocumentType::Thesis));
        assert_eq!(" Synergy ".parse::<DocumentType>(), Ok(DocumentType::Synergy));
        assert_eq!("HELLO".parse::<DocumentType>(), Ok(DocumentType::Hello));
    }

    #[test]
    fn test_unknown_falls_back_to_hello() {
        assert_eq!(DocumentType::parse_or_default(Some("bogus")), DocumentType::Hello);
        assert_eq!(DocumentType::parse_or_default(Some("")), DocumentType::Hello);
        assert_eq!(DocumentType::parse_or_default(None), DocumentType::Hello);
        assert_eq!(
            DocumentType::parse_or_default(Some("dissertation")),
            DocumentType::Dissertation
        );
    }

    #[test]
    fn test_serde_uses_uppercase() {
        let json = serde_json::to_string(&DocumentType::Confluence).unwrap();
        assert_eq!(json, "\"CONFLUENCE\"");
        let parsed: DocumentType = serde_json::from_str("\"THESIS\"").unwrap();
        assert_eq!(parsed, DocumentType::Thesis);
    }

    #[test]
    fn test_dir_name_is_lowercase_of_name() {
        for t in DocumentType::ALL {
            assert_eq!(t.dir_name(), t.as_str().to_lowercase());
        }
    }
}
