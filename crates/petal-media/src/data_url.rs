//! `data:` URL reading and writing.
//!
//! Browsers hand selected files over as `data:<mime>;base64,<payload>`; the
//! upload endpoints accept the same shape.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataUrlError {
    #[error("missing data: scheme")]
    NotDataUrl,
    #[error("missing ',' separator")]
    MissingPayload,
    #[error("only base64 payloads are supported")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is empty")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// Read a whole file's bytes into a base64 data URL.
pub fn read_as_data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, B64.encode(bytes))
}

pub fn decode_data_url(input: &str) -> Result<DataUrl, DataUrlError> {
    let rest = input
        .trim()
        .strip_prefix("data:")
        .ok_or(DataUrlError::NotDataUrl)?;
    let (meta, payload) = rest.split_once(',').ok_or(DataUrlError::MissingPayload)?;

    let mut parts = meta.split(';');
    let mime = match parts.next() {
        Some(m) if !m.is_empty() => m.to_ascii_lowercase(),
        _ => "application/octet-stream".to_string(),
    };
    if !parts.any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(DataUrlError::NotBase64);
    }

    let bytes = B64.decode(payload.trim())?;
    if bytes.is_empty() {
        return Err(DataUrlError::Empty);
    }

    Ok(DataUrl { mime, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_what_it_writes() {
        let url = read_as_data_url(&[0xFF, 0xD8, 0xFF, 0x00], "image/jpeg");
        assert!(url.starts_with("data:image/jpeg;base64,"));

        let parsed = decode_data_url(&url).unwrap();
        assert_eq!(parsed.mime, "image/jpeg");
        assert_eq!(parsed.bytes, vec![0xFF, 0xD8, 0xFF, 0x00]);
        assert!(parsed.is_image());
    }

    #[test]
    fn tolerates_extra_parameters() {
        let parsed = decode_data_url("data:Image/PNG;name=a.png;base64,AQID").unwrap();
        assert_eq!(parsed.mime, "image/png");
        assert_eq!(parsed.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(decode_data_url("http://x/y.png"), Err(DataUrlError::NotDataUrl)));
        assert!(matches!(decode_data_url("data:image/png;base64"), Err(DataUrlError::MissingPayload)));
        assert!(matches!(decode_data_url("data:text/plain,hello"), Err(DataUrlError::NotBase64)));
        assert!(matches!(decode_data_url("data:image/png;base64,@@@"), Err(DataUrlError::Base64(_))));
        assert!(matches!(decode_data_url("data:image/png;base64,"), Err(DataUrlError::Empty)));
    }

    #[test]
    fn missing_mime_defaults_to_octet_stream() {
        let parsed = decode_data_url("data:;base64,AQID").unwrap();
        assert_eq!(parsed.mime, "application/octet-stream");
        assert!(!parsed.is_image());
    }
}
