//! Parser module: read analyzer output and decode comment tokens.

pub mod comment;

use crate::error::{Error, Result};
use crate::model::PassInput;
use std::path::Path;

/// Parse one pass from the analyzer's JSON output.
///
/// When the document does not name its source file, the input path is used.
pub fn parse_pass(path: &Path, content: &str) -> Result<PassInput> {
    let mut pass: PassInput = serde_json::from_str(content)?;
    if pass.file.is_empty() {
        pass.file = path.to_string_lossy().to_string();
    }
    Ok(pass)
}

/// Read and parse one pass file.
pub fn read_pass(path: &Path) -> Result<PassInput> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_pass(path, &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_pass() {
        let json = r#"{
            "declarations": [
                { "kind": "class", "name": "Overload", "start": 0, "end": 100 },
                { "kind": "method", "name": "round", "start": 10, "end": 40,
                  "access": "public", "signature": "int (float)" }
            ],
            "comments": [ { "text": "/// Rounds.", "offset": 8 } ]
        }"#;
        let pass = parse_pass(Path::new("overload.json"), json).unwrap();
        assert_eq!(pass.file, "overload.json");
        assert_eq!(pass.file_id, 0);
        assert_eq!(pass.declarations.len(), 2);
        assert_eq!(pass.declarations[1].signature.as_deref(), Some("int (float)"));
        assert_eq!(pass.comments[0].offset, 8);
    }

    #[test]
    fn explicit_file_name_is_kept() {
        let json = r#"{ "file": "simple.h", "file_id": 3 }"#;
        let pass = parse_pass(Path::new("x.json"), json).unwrap();
        assert_eq!(pass.file, "simple.h");
        assert_eq!(pass.file_id, 3);
        assert!(pass.declarations.is_empty());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            parse_pass(Path::new("x.json"), "{"),
            Err(Error::Json(_))
        ));
    }
}
