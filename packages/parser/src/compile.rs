//! Compile process definitions into persisted envelopes.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use orkest_model::{HeaderValue, ProcessEnvelope};

use crate::config::COMPILED_FILE_EXTENSION;
use crate::error::{CompileError, Result};
use crate::parse_process;

/// Parse a process document and wrap it in a fresh envelope.
///
/// # Errors
/// Fails on malformed XML or an invalid process definition.
pub fn compile_str(xml: &str, headers: &[(String, HeaderValue)]) -> Result<ProcessEnvelope> {
    let process = parse_process(xml)?;
    let mut envelope = ProcessEnvelope::new(process, Utc::now());
    for (key, value) in headers {
        envelope = envelope.with_header(key.clone(), value.clone());
    }
    Ok(envelope)
}

/// Read and compile a process definition file.
///
/// # Errors
/// Fails if the file cannot be read or does not compile.
pub fn compile_file(path: &Path, headers: &[(String, HeaderValue)]) -> Result<ProcessEnvelope> {
    let xml = fs::read_to_string(path)?;
    let envelope = compile_str(&xml, headers)?;
    tracing::info!(
        file = %path.display(),
        process = %envelope.process.qname(),
        guid = %envelope.guid,
        "Compiled process"
    );
    Ok(envelope)
}

/// Write the framed envelope to `path`.
///
/// # Errors
/// Fails if the envelope is invalid or the file cannot be written.
pub fn write_compiled(envelope: &ProcessEnvelope, path: &Path) -> Result<()> {
    let bytes = envelope.to_bytes()?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Default output path for a compiled definition: same stem, `.cbp`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension(COMPILED_FILE_EXTENSION)
}

/// Parse a `KEY=VALUE` header argument.
///
/// `true`/`false` become booleans and integers become integers; anything
/// else is kept as a string.
///
/// # Errors
/// Fails if there is no `=` or the key is empty.
///
/// # Examples
/// ```
/// use orkest_model::HeaderValue;
/// use orkest_parser::parse_header;
///
/// let (key, value) = parse_header("retries=3").unwrap();
/// assert_eq!(key, "retries");
/// assert_eq!(value, HeaderValue::Integer(3));
/// assert!(parse_header("novalue").is_err());
/// ```
pub fn parse_header(arg: &str) -> Result<(String, HeaderValue)> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| CompileError::InvalidHeader(arg.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CompileError::InvalidHeader(arg.to_string()));
    }

    let value = match value {
        "true" => HeaderValue::Boolean(true),
        "false" => HeaderValue::Boolean(false),
        other => other
            .parse::<i64>()
            .map_or_else(|_| HeaderValue::String(other.to_string()), HeaderValue::Integer),
    };
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use orkest_model::{Activity, SerializationFormat};
    use std::io::Write;

    const MINIMAL: &str = r#"<process name="p" targetNamespace="urn:t"
        xmlns="http://docs.oasis-open.org/wsbpel/2.0/process/executable">
      <sequence><empty name="noop"/></sequence>
    </process>"#;

    #[test]
    fn test_compile_str() {
        let headers = vec![("author".to_string(), HeaderValue::from("ops"))];
        let envelope = compile_str(MINIMAL, &headers).unwrap();

        assert!(envelope.check_valid().is_ok());
        assert_eq!(envelope.format, SerializationFormat::Json);
        assert_eq!(
            envelope.other_headers.get("author"),
            Some(&HeaderValue::String("ops".to_string()))
        );
        assert!(matches!(envelope.process.activity, Activity::Sequence(_)));
    }

    #[test]
    fn test_compile_str_reports_parse_error() {
        let err = compile_str("<process/>", &[]).unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
    }

    #[test]
    fn test_compile_str_reports_xml_error() {
        let err = compile_str("<process", &[]).unwrap_err();
        assert!(matches!(err, CompileError::XmlParse(_)));
    }

    #[test]
    fn test_compile_file_and_write() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("order.bpel");
        let mut file = fs::File::create(&input).unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let envelope = compile_file(&input, &[]).unwrap();
        let output = default_output_path(&input);
        assert_eq!(output, dir.path().join("order.cbp"));

        write_compiled(&envelope, &output).unwrap();
        let read = ProcessEnvelope::from_bytes(&fs::read(&output).unwrap()).unwrap();
        assert_eq!(read.guid, envelope.guid);
        assert_eq!(read.process, envelope.process);
    }

    #[test]
    fn test_compile_file_missing() {
        let err = compile_file(Path::new("/nonexistent/x.bpel"), &[]).unwrap_err();
        assert!(matches!(err, CompileError::Io(_)));
    }

    #[test]
    fn test_parse_header_values() {
        assert_eq!(
            parse_header("debug=true").unwrap(),
            ("debug".to_string(), HeaderValue::Boolean(true))
        );
        assert_eq!(
            parse_header("owner=team=a").unwrap(),
            ("owner".to_string(), HeaderValue::String("team=a".to_string()))
        );
        assert_eq!(
            parse_header("empty=").unwrap(),
            ("empty".to_string(), HeaderValue::String(String::new()))
        );
        assert!(matches!(
            parse_header("=x"),
            Err(CompileError::InvalidHeader(_))
        ));
    }
}
