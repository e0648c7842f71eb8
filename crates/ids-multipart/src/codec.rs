//! # Multipart Framing
//!
//! Byte-level encoding and decoding of named form-data parts.
//!
//! Boundaries are located by scanning raw bytes. Part contents are only
//! decoded to text (UTF-8, lossy) after they have been cut out, so a
//! payload in any encoding can never shift a boundary.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use ids_types::Message;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::errors::ParseError;
use crate::map::MessageAndPayload;
use crate::resolver::resolve_and_wrap;
use crate::serializer::InfomodelSerializer;
use crate::{HEADER_PART, PAYLOAD_PART};

// =============================================================================
// ENCODING
// =============================================================================

/// An encoded multipart body together with its boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    boundary: String,
    body: Bytes,
}

impl MultipartBody {
    /// Boundary separating the parts.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// `Content-Type` header value for this body.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Encoded bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consumes the body, returning its bytes.
    pub fn into_bytes(self) -> Bytes {
        self.body
    }
}

/// Encodes named parts in the given order under a fresh boundary.
pub fn encode_parts<'a, I>(parts: I) -> MultipartBody
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let boundary = format!("msgpart-{}", Uuid::new_v4().simple());
    let mut out = String::new();

    for (name, content) in parts {
        out.push_str("--");
        out.push_str(&boundary);
        out.push_str("\r\n");
        out.push_str(&format!("Content-Disposition: form-data; name=\"{name}\"\r\n"));
        if name == HEADER_PART {
            out.push_str("Content-Type: application/ld+json\r\n");
        }
        out.push_str("\r\n");
        out.push_str(content);
        out.push_str("\r\n");
    }
    out.push_str("--");
    out.push_str(&boundary);
    out.push_str("--\r\n");

    MultipartBody {
        boundary,
        body: Bytes::from(out),
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Decodes a multipart body into a map of part name to content.
///
/// The boundary is taken from the first line. Parts without a name are
/// skipped; a later part with the same name replaces an earlier one.
///
/// # Errors
///
/// - `TooShort` if the body has two bytes or fewer
/// - `NoBoundary` if the first line is not a `--<boundary>` line
/// - `NoParts` if no named part follows the boundary
pub fn decode(body: &[u8]) -> Result<BTreeMap<String, String>, ParseError> {
    if body.len() <= 2 {
        return Err(ParseError::TooShort { len: body.len() });
    }

    let first_newline = body
        .iter()
        .position(|&b| b == b'\n')
        .ok_or(ParseError::NoBoundary)?;
    let first_line = trim_ascii(&body[..first_newline]);
    let boundary = first_line
        .strip_prefix(b"--")
        .map(trim_ascii)
        .filter(|b| !b.is_empty())
        .ok_or(ParseError::NoBoundary)?;

    let mut delimiter = Vec::with_capacity(boundary.len() + 2);
    delimiter.extend_from_slice(b"--");
    delimiter.extend_from_slice(boundary);

    let mut parts = BTreeMap::new();
    let mut cursor = first_newline + 1;

    loop {
        let next = find_delimiter(body, cursor, &delimiter);
        let segment_end = next.unwrap_or(body.len());
        let segment = strip_trailing_newline(&body[cursor..segment_end]);

        if let Some((name, content)) = parse_part(segment) {
            trace!(part = %name, bytes = content.len(), "Decoded multipart part");
            parts.insert(name, String::from_utf8_lossy(content).into_owned());
        }

        let Some(start) = next else { break };
        let after = start + delimiter.len();
        if body[after..].starts_with(b"--") {
            break;
        }
        cursor = match body[after..].iter().position(|&b| b == b'\n') {
            Some(offset) => after + offset + 1,
            None => break,
        };
    }

    if parts.is_empty() {
        return Err(ParseError::NoParts);
    }
    debug!(parts = parts.len(), "Decoded multipart body");
    Ok(parts)
}

/// Decodes a multipart body given as text.
pub fn decode_str(body: &str) -> Result<BTreeMap<String, String>, ParseError> {
    decode(body.as_bytes())
}

/// Finds the next delimiter at the start of a line, at or after `from`.
fn find_delimiter(body: &[u8], from: usize, delimiter: &[u8]) -> Option<usize> {
    let mut at = from;
    while at + delimiter.len() <= body.len() {
        let offset = body[at..]
            .windows(delimiter.len())
            .position(|w| w == delimiter)?;
        let found = at + offset;
        if found == 0 || body[found - 1] == b'\n' {
            return Some(found);
        }
        at = found + 1;
    }
    None
}

/// Splits a part into its name and content. Returns `None` for parts
/// without a `Content-Disposition` name.
fn parse_part(segment: &[u8]) -> Option<(String, &[u8])> {
    let (headers, content) = split_headers(segment)?;
    let headers = String::from_utf8_lossy(headers);

    let name = headers.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if !key.trim().eq_ignore_ascii_case("content-disposition") {
            return None;
        }
        disposition_name(value)
    })?;
    Some((name, content))
}

/// Splits at the first empty line, CRLF or LF. Later blank lines belong to
/// the content.
fn split_headers(segment: &[u8]) -> Option<(&[u8], &[u8])> {
    let mut line_start = 0;
    loop {
        let rest = &segment[line_start..];
        if rest.starts_with(b"\r\n") {
            return Some((&segment[..line_start], &rest[2..]));
        }
        if rest.starts_with(b"\n") {
            return Some((&segment[..line_start], &rest[1..]));
        }
        let newline = rest.iter().position(|&b| b == b'\n')?;
        line_start += newline + 1;
    }
}

fn disposition_name(value: &str) -> Option<String> {
    value.split(';').find_map(|param| {
        let (key, val) = param.split_once('=')?;
        if key.trim() != "name" {
            return None;
        }
        Some(val.trim().trim_matches('"').to_string())
    })
}

fn strip_trailing_newline(segment: &[u8]) -> &[u8] {
    segment
        .strip_suffix(b"\r\n")
        .or_else(|| segment.strip_suffix(b"\n"))
        .unwrap_or(segment)
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

// =============================================================================
// CODEC
// =============================================================================

/// Message-level codec bound to a header serializer.
#[derive(Clone)]
pub struct MultipartCodec {
    serializer: Arc<dyn InfomodelSerializer>,
}

impl MultipartCodec {
    /// Creates a codec using `serializer` for headers.
    pub fn new(serializer: Arc<dyn InfomodelSerializer>) -> Self {
        Self { serializer }
    }

    /// Header serializer in use.
    pub fn serializer(&self) -> &dyn InfomodelSerializer {
        self.serializer.as_ref()
    }

    /// Encodes a header and an optional payload.
    ///
    /// The `payload` part is written only for `Some`, even if the string is
    /// empty.
    pub fn encode(
        &self,
        header: &Message,
        payload: Option<&str>,
    ) -> Result<MultipartBody, ParseError> {
        let header_text = self.serializer.serialize(header)?;
        let mut parts = vec![(HEADER_PART, header_text.as_str())];
        if let Some(payload) = payload {
            parts.push((PAYLOAD_PART, payload));
        }
        Ok(encode_parts(parts))
    }

    /// Encodes a part map, `header` first.
    pub fn encode_map(&self, map: &BTreeMap<String, String>) -> MultipartBody {
        let header = map
            .get_key_value(HEADER_PART)
            .map(|(k, v)| (k.as_str(), v.as_str()));
        let rest = map
            .iter()
            .filter(|(k, _)| k.as_str() != HEADER_PART)
            .map(|(k, v)| (k.as_str(), v.as_str()));
        encode_parts(header.into_iter().chain(rest))
    }

    /// Decodes a body and resolves it into a typed message.
    pub fn decode_message(&self, body: &[u8]) -> Result<MessageAndPayload, ParseError> {
        let parts = decode(body)?;
        resolve_and_wrap(&parts, self.serializer.as_ref())
    }
}
