//! Reading task batches from a file or stdin.

use std::io::Read;
use std::path::Path;

use taskrank_core::api::{self, AnalyzeRequest};
use taskrank_core::Result;

/// Read the whole of `path`, or stdin when `path` is `None` or `-`.
pub fn read_source(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => Ok(std::fs::read_to_string(p)?),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Parse `{tasks, strategy?}` or a bare task array; blank input is an empty batch.
pub fn parse_batch(source: &str) -> Result<AnalyzeRequest> {
    if source.trim().is_empty() {
        return Ok(AnalyzeRequest::default());
    }
    api::parse_batch(source.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskrank_core::CoreError;

    #[test]
    fn accepts_both_batch_shapes() {
        let wrapped = parse_batch(r#"{"tasks": [{"title": "A"}], "strategy": "high_impact"}"#).unwrap();
        assert_eq!(wrapped.tasks.len(), 1);
        assert_eq!(wrapped.strategy.as_deref(), Some("high_impact"));

        let bare = parse_batch(r#"[{"title": "A"}, {"title": "B"}]"#).unwrap();
        assert_eq!(bare.tasks.len(), 2);
        assert!(bare.strategy.is_none());
    }

    #[test]
    fn blank_input_is_an_empty_batch() {
        assert!(parse_batch("  \n").unwrap().tasks.is_empty());
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = parse_batch("{not json").unwrap_err();
        assert!(matches!(err, CoreError::Json(_)));
        assert!(err.to_string().starts_with("JSON error"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_source(Some(&dir.path().join("absent.json"))).unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
