//! IPP printing for finished guide pages.
//!
//! Only the one operation the guide needs is implemented: an IPP/1.1
//! Print-Job request carrying a PDF, POSTed over HTTP as `application/ipp`.

pub mod handlers;

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

const IPP_VERSION: [u8; 2] = [1, 1];
const OP_PRINT_JOB: u16 = 0x0002;
const DEFAULT_IPP_PORT: u16 = 631;

// Delimiter and value tags (RFC 8010 §3.5).
const TAG_OPERATION_ATTRIBUTES: u8 = 0x01;
const TAG_END_OF_ATTRIBUTES: u8 = 0x03;
const TAG_NAME_WITHOUT_LANGUAGE: u8 = 0x42;
const TAG_URI: u8 = 0x45;
const TAG_CHARSET: u8 = 0x47;
const TAG_NATURAL_LANGUAGE: u8 = 0x48;
const TAG_MIME_MEDIA_TYPE: u8 = 0x49;

/// Status codes up to 0x00FF are the "successful" class.
const MAX_SUCCESS_STATUS: u16 = 0x00FF;

#[derive(Debug, Error)]
pub enum PrinterError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid printer URL: {0}")]
    InvalidUrl(String),

    #[error("Printer returned IPP status 0x{0:04x}")]
    Status(u16),

    #[error("Malformed IPP response ({0} bytes)")]
    MalformedResponse(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Operation attributes sent with every job.
#[derive(Debug, Clone)]
pub struct JobAttributes {
    pub user_name: String,
    pub job_name: String,
    pub document_format: String,
}

impl Default for JobAttributes {
    fn default() -> Self {
        Self {
            user_name: "mdw-2018".to_string(),
            job_name: "MDW-2018 Job".to_string(),
            document_format: "application/pdf".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct IppPrinter {
    printer_uri: String,
    endpoint: String,
    attributes: JobAttributes,
    client: Client,
    next_request_id: Arc<AtomicU32>,
}

impl IppPrinter {
    pub fn new(printer_uri: &str) -> Result<Self, PrinterError> {
        Ok(Self {
            printer_uri: printer_uri.to_string(),
            endpoint: http_endpoint(printer_uri)?,
            attributes: JobAttributes::default(),
            client: Client::new(),
            next_request_id: Arc::new(AtomicU32::new(1)),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Submits `document` as a Print-Job. Returns the IPP status code on success.
    pub async fn print(&self, document: &[u8]) -> Result<u16, PrinterError> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let body = encode_print_job(&self.printer_uri, request_id, &self.attributes, document);
        debug!(request_id, bytes = body.len(), "Sending IPP Print-Job");

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/ipp")
            .body(body)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let status = response_status(&response)?;
        info!(request_id, status, "Print job accepted by {}", self.endpoint);
        Ok(status)
    }
}

/// Keeps a copy of a print document on disk, creating its folder if needed.
pub async fn save_document(document: &[u8], path: &Path) -> Result<(), PrinterError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, document).await?;
    info!("Saved print document to {}", path.display());
    Ok(())
}

/// Maps an `ipp://` / `ipps://` printer URI to the HTTP URL it is served on.
pub fn http_endpoint(printer_uri: &str) -> Result<String, PrinterError> {
    let (scheme, rest) = printer_uri
        .split_once("://")
        .ok_or_else(|| PrinterError::InvalidUrl(printer_uri.to_string()))?;

    let (http_scheme, default_port) = match scheme {
        "ipp" => ("http", Some(DEFAULT_IPP_PORT)),
        "ipps" => ("https", Some(DEFAULT_IPP_PORT)),
        "http" | "https" => (scheme, None),
        _ => return Err(PrinterError::InvalidUrl(printer_uri.to_string())),
    };

    let (authority, path) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, "/"),
    };
    if authority.is_empty() {
        return Err(PrinterError::InvalidUrl(printer_uri.to_string()));
    }

    let has_port = authority
        .rsplit_once(':')
        .is_some_and(|(_, port)| port.parse::<u16>().is_ok());
    let authority = match default_port {
        Some(port) if !has_port => format!("{authority}:{port}"),
        _ => authority.to_string(),
    };

    Ok(format!("{http_scheme}://{authority}{path}"))
}

/// Encodes a complete Print-Job request, document included.
pub fn encode_print_job(
    printer_uri: &str,
    request_id: u32,
    attributes: &JobAttributes,
    document: &[u8],
) -> Bytes {
    let mut buf = BytesMut::with_capacity(256 + document.len());
    buf.put_slice(&IPP_VERSION);
    buf.put_u16(OP_PRINT_JOB);
    buf.put_u32(request_id);

    buf.put_u8(TAG_OPERATION_ATTRIBUTES);
    put_attribute(&mut buf, TAG_CHARSET, "attributes-charset", "utf-8");
    put_attribute(&mut buf, TAG_NATURAL_LANGUAGE, "attributes-natural-language", "en");
    put_attribute(&mut buf, TAG_URI, "printer-uri", printer_uri);
    put_attribute(
        &mut buf,
        TAG_NAME_WITHOUT_LANGUAGE,
        "requesting-user-name",
        &attributes.user_name,
    );
    put_attribute(&mut buf, TAG_NAME_WITHOUT_LANGUAGE, "job-name", &attributes.job_name);
    put_attribute(
        &mut buf,
        TAG_MIME_MEDIA_TYPE,
        "document-format",
        &attributes.document_format,
    );
    buf.put_u8(TAG_END_OF_ATTRIBUTES);

    buf.put_slice(document);
    buf.freeze()
}

fn put_attribute(buf: &mut BytesMut, tag: u8, name: &str, value: &str) {
    buf.put_u8(tag);
    buf.put_u16(name.len() as u16);
    buf.put_slice(name.as_bytes());
    buf.put_u16(value.len() as u16);
    buf.put_slice(value.as_bytes());
}

/// Reads the status code from an IPP response and rejects non-success statuses.
pub fn response_status(response: &[u8]) -> Result<u16, PrinterError> {
    if response.len() < 8 {
        return Err(PrinterError::MalformedResponse(response.len()));
    }
    let status = u16::from_be_bytes([response[2], response[3]]);
    if status > MAX_SUCCESS_STATUS {
        return Err(PrinterError::Status(status));
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_http_endpoint() {
        assert_eq!(
            http_endpoint("ipp://printer.local/printers/guide").unwrap(),
            "http://printer.local:631/printers/guide"
        );
        assert_eq!(
            http_endpoint("ipps://10.0.0.5:8631/ipp/print").unwrap(),
            "https://10.0.0.5:8631/ipp/print"
        );
        assert_eq!(
            http_endpoint("http://printer.local:631/ipp").unwrap(),
            "http://printer.local:631/ipp"
        );
        assert_eq!(http_endpoint("ipp://printer").unwrap(), "http://printer:631/");
        assert!(http_endpoint("ftp://printer").is_err());
        assert!(http_endpoint("printer.local").is_err());
        assert!(http_endpoint("ipp:///printers/x").is_err());
    }

    #[test]
    fn test_print_job_header_and_trailer() {
        let body = encode_print_job(
            "ipp://printer.local/printers/guide",
            7,
            &JobAttributes::default(),
            b"%PDF-1.4",
        );
        assert_eq!(&body[..8], &[1, 1, 0x00, 0x02, 0, 0, 0, 7]);
        assert_eq!(body[8], TAG_OPERATION_ATTRIBUTES);
        assert!(body.ends_with(&[TAG_END_OF_ATTRIBUTES, b'%', b'P', b'D', b'F', b'-', b'1', b'.', b'4']));
    }

    #[test]
    fn test_attribute_encoding() {
        let mut buf = BytesMut::new();
        put_attribute(&mut buf, TAG_CHARSET, "attributes-charset", "utf-8");
        let mut expected = vec![TAG_CHARSET, 0, 18];
        expected.extend_from_slice(b"attributes-charset");
        expected.extend_from_slice(&[0, 5]);
        expected.extend_from_slice(b"utf-8");
        assert_eq!(&buf[..], &expected[..]);
    }

    #[test]
    fn test_job_attributes_present() {
        let body = encode_print_job("ipp://p/x", 1, &JobAttributes::default(), b"");
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("requesting-user-name"));
        assert!(text.contains("mdw-2018"));
        assert!(text.contains("MDW-2018 Job"));
        assert!(text.contains("application/pdf"));
    }

    #[test]
    fn test_response_status() {
        assert_eq!(response_status(&[1, 1, 0, 0, 0, 0, 0, 1, 3]).unwrap(), 0);
        assert_eq!(response_status(&[1, 1, 0, 1, 0, 0, 0, 1, 3]).unwrap(), 1);
        assert!(matches!(
            response_status(&[1, 1, 0x04, 0x0A, 0, 0, 0, 1, 3]),
            Err(PrinterError::Status(0x040A))
        ));
        assert!(matches!(
            response_status(&[1, 1, 0]),
            Err(PrinterError::MalformedResponse(3))
        ));
    }

    #[tokio::test]
    async fn test_save_document_creates_folder() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prints").join("page.pdf");

        save_document(b"%PDF-1.4", &path).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
    }
}
