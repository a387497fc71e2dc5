//! `multipart/form-data` encoding for create requests.
//!
//! Scalar fields become text parts in key order. Each image becomes one
//! `images[]` part, in draft order: a text part for a URL, a file part for
//! an upload.

use serde_json::Value;
use uuid::Uuid;

use crate::payload::{Payload, IMAGES};
use crate::types::ImageRef;

/// Form field name used for every image part.
pub const IMAGE_PART: &str = "images[]";

/// A fully encoded multipart body.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    pub boundary: String,
    pub bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

/// Encodes with a fresh random boundary.
pub fn encode(payload: &Payload) -> MultipartBody {
    encode_with_boundary(payload, &format!("market-{}", Uuid::new_v4().simple()))
}

pub fn encode_with_boundary(payload: &Payload, boundary: &str) -> MultipartBody {
    let mut out = Vec::new();

    for (key, value) in payload.fields() {
        if key == IMAGES {
            continue;
        }
        write_text_part(&mut out, boundary, key, &text_value(value));
    }

    for image in payload.images() {
        match image {
            ImageRef::Url(url) => write_text_part(&mut out, boundary, IMAGE_PART, url),
            ImageRef::Upload(upload) => {
                write_boundary(&mut out, boundary);
                out.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        IMAGE_PART,
                        escape_param(&upload.file_name)
                    )
                    .as_bytes(),
                );
                out.extend_from_slice(
                    format!("Content-Type: {}\r\n\r\n", header_value(&upload.content_type)).as_bytes(),
                );
                out.extend_from_slice(&upload.data);
                out.extend_from_slice(b"\r\n");
            }
        }
    }

    out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    MultipartBody {
        boundary: boundary.to_string(),
        bytes: out,
    }
}

fn write_boundary(out: &mut Vec<u8>, boundary: &str) {
    out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
}

fn write_text_part(out: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    write_boundary(out, boundary);
    out.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            escape_param(name),
            value
        )
        .as_bytes(),
    );
}

// Strings go out raw; numbers and everything else in their JSON form.
fn text_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// Quoted header parameters must not end the quote or the header line.
fn escape_param(s: &str) -> String {
    s.replace('"', "%22").replace('\r', "%0D").replace('\n', "%0A")
}

// CR/LF would start a new header; drop them.
fn header_value(s: &str) -> String {
    let cleaned: String = s.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
    if cleaned.trim().is_empty() {
        "application/octet-stream".to_string()
    } else {
        cleaned
    }
}
