//! Strict reader for the link-resolution response.
//!
//! The endpoint answers with a JSON array whose first element is the
//! download URL. Only that shape is accepted; whether the URL may actually
//! be fetched is the caller's decision.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("link response is not a non-empty array: {document}")]
    NotANonEmptyArray { document: String },
    #[error("first element of the link response is not a string: {document}")]
    FirstNotAString { document: String },
}

/// Extract the download URL from a parsed link-resolution response.
pub fn first_download_link(doc: &Value) -> Result<String, LinkError> {
    let items = doc
        .as_array()
        .filter(|items| !items.is_empty())
        .ok_or_else(|| LinkError::NotANonEmptyArray {
            document: doc.to_string(),
        })?;
    items[0]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| LinkError::FirstNotAString {
            document: doc.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn takes_the_first_element() {
        let doc = json!(["https://dl.factorio.com/a.zip", "https://dl.factorio.com/b.zip"]);
        assert_eq!(
            first_download_link(&doc),
            Ok("https://dl.factorio.com/a.zip".to_string())
        );
    }

    #[test]
    fn empty_arrays_are_rejected() {
        let err = first_download_link(&json!([])).unwrap_err();
        assert!(matches!(err, LinkError::NotANonEmptyArray { .. }));
    }

    #[test]
    fn non_arrays_are_rejected() {
        for doc in [json!({"link": "x"}), json!("x"), json!(null)] {
            let err = first_download_link(&doc).unwrap_err();
            assert!(matches!(err, LinkError::NotANonEmptyArray { .. }));
        }
    }

    #[test]
    fn first_element_must_be_a_string() {
        let err = first_download_link(&json!([42, "x"])).unwrap_err();
        assert!(matches!(err, LinkError::FirstNotAString { .. }));
    }
}
