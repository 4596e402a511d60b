//! Assertion wire format.
//!
//! An assertion is a block of `name: value` headers, an optional body whose
//! size is given by the `body-length` header, and a base64 signature block.
//! The three parts are separated by blank lines:
//!
//! ```text
//! type: serial
//! brand-id: acme
//! sign-key-sha3-384: <fingerprint>
//! body-length: 5
//!
//! hello
//!
//! <base64 signature>
//! ```
//!
//! A header whose value spans several lines is written as `name:` followed
//! by lines indented with two spaces. Streams are assertions concatenated
//! with a blank line between them.

use crate::{constants::*, errors::*, keys::Ed25519KeyPair, signatures::sign_content};
use base64::{engine::general_purpose::STANDARD, Engine as _};

const SEPARATOR: &[u8] = b"\n\n";

/// A decoded assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    /// Exact bytes covered by the signature
    content: Vec<u8>,
    signature: Vec<u8>,
}

impl Assertion {
    /// Value of the `type` header
    pub fn type_name(&self) -> &str {
        self.header(headers::TYPE).unwrap_or_default()
    }

    /// Look up a header by name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// All headers in document order
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Body bytes (empty when the assertion has no body)
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Fingerprint of the key that signed this assertion
    pub fn sign_key_id(&self) -> Option<&str> {
        self.header(headers::SIGN_KEY)
    }

    /// Bytes covered by the signature
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Raw signature bytes
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

/// Decode a stream of one or more concatenated assertions.
pub fn decode_stream(data: &[u8]) -> Result<Vec<Assertion>> {
    let mut assertions = Vec::new();
    let mut rest = skip_blank_lines(data);

    while !rest.is_empty() {
        let (assertion, remaining) = decode_one(rest)?;
        assertions.push(assertion);
        rest = skip_blank_lines(remaining);
    }

    if assertions.is_empty() {
        return Err(CryptoError::InvalidAssertion(
            "stream contains no assertions".to_string(),
        ));
    }

    Ok(assertions)
}

/// Encode and sign an assertion.
///
/// `sign-key-sha3-384` and `body-length` are derived from `signer` and
/// `body`; any caller-supplied values for them are ignored.
pub fn encode_assertion(
    header_list: &[(&str, &str)],
    body: &[u8],
    signer: &Ed25519KeyPair,
) -> Result<Vec<u8>> {
    let mut content = String::new();
    let sign_key_id = signer.key_id();
    let body_length = body.len().to_string();

    let mut all: Vec<(&str, &str)> = header_list
        .iter()
        .filter(|(name, _)| *name != headers::SIGN_KEY && *name != headers::BODY_LENGTH)
        .copied()
        .collect();
    all.push((headers::SIGN_KEY, sign_key_id.as_str()));
    if !body.is_empty() {
        all.push((headers::BODY_LENGTH, body_length.as_str()));
    }

    for (index, (name, value)) in all.iter().enumerate() {
        validate_header_name(name)?;
        if index > 0 {
            content.push('\n');
        }
        if value.contains('\n') {
            content.push_str(name);
            content.push(':');
            for line in value.split('\n') {
                content.push_str("\n  ");
                content.push_str(line);
            }
        } else {
            content.push_str(name);
            content.push_str(": ");
            content.push_str(value);
        }
    }

    let mut content = content.into_bytes();
    if !body.is_empty() {
        content.extend_from_slice(SEPARATOR);
        content.extend_from_slice(body);
    }

    let signature = sign_content(signer, &content);

    let mut encoded = content;
    encoded.extend_from_slice(SEPARATOR);
    encoded.extend_from_slice(STANDARD.encode(signature).as_bytes());
    encoded.extend_from_slice(SEPARATOR);
    Ok(encoded)
}

fn decode_one(data: &[u8]) -> Result<(Assertion, &[u8])> {
    let header_end = find(data, SEPARATOR)
        .ok_or_else(|| invalid("header block is not terminated by a blank line"))?;
    let parsed = parse_headers(&data[..header_end])?;

    if !parsed.iter().any(|(name, _)| name == headers::TYPE) {
        return Err(invalid("missing 'type' header"));
    }

    let body_length = match parsed.iter().find(|(name, _)| name == headers::BODY_LENGTH) {
        Some((_, value)) => value
            .parse::<usize>()
            .map_err(|_| invalid("'body-length' is not a number"))?,
        None => 0,
    };

    let mut cursor = header_end + SEPARATOR.len();
    let content_end;
    let body;

    if body_length > 0 {
        let body_end = cursor
            .checked_add(body_length)
            .filter(|end| {
                end.checked_add(SEPARATOR.len())
                    .is_some_and(|needed| needed <= data.len())
            })
            .ok_or_else(|| invalid("body is shorter than 'body-length'"))?;
        if &data[body_end..body_end + SEPARATOR.len()] != SEPARATOR {
            return Err(invalid("body is not followed by a blank line"));
        }
        body = data[cursor..body_end].to_vec();
        content_end = body_end;
        cursor = body_end + SEPARATOR.len();
    } else {
        body = Vec::new();
        content_end = header_end;
    }

    let signature_end = find(&data[cursor..], SEPARATOR)
        .map(|offset| cursor + offset)
        .unwrap_or(data.len());
    let signature_text = trim_whitespace(&data[cursor..signature_end]);
    if signature_text.is_empty() {
        return Err(invalid("missing signature"));
    }
    let signature = STANDARD
        .decode(signature_text)
        .map_err(|_| invalid("signature is not valid base64"))?;

    let assertion = Assertion {
        headers: parsed,
        body,
        content: data[..content_end].to_vec(),
        signature,
    };

    Ok((assertion, &data[signature_end..]))
}

fn parse_headers(block: &[u8]) -> Result<Vec<(String, String)>> {
    let text = std::str::from_utf8(block).map_err(|_| invalid("headers are not UTF-8"))?;
    let mut headers: Vec<(String, String)> = Vec::new();

    for line in text.split('\n') {
        if line.starts_with(' ') {
            let (_, value) = headers
                .last_mut()
                .ok_or_else(|| invalid("continuation line before any header"))?;
            if !value.is_empty() {
                value.push('\n');
            }
            value.push_str(line.trim_start());
            continue;
        }

        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| invalid(&format!("malformed header line: {}", line)))?;
        validate_header_name(name)?;
        if headers.iter().any(|(existing, _)| existing == name) {
            return Err(invalid(&format!("duplicate header: {}", name)));
        }
        headers.push((name.to_string(), value.trim_start().to_string()));
    }

    Ok(headers)
}

fn validate_header_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(invalid(&format!("invalid header name: {:?}", name)))
    }
}

fn skip_blank_lines(mut data: &[u8]) -> &[u8] {
    while let Some((first, rest)) = data.split_first() {
        if first.is_ascii_whitespace() {
            data = rest;
        } else {
            break;
        }
    }
    data
}

fn trim_whitespace(data: &[u8]) -> &[u8] {
    let data = skip_blank_lines(data);
    let end = data
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map(|i| i + 1)
        .unwrap_or(0);
    &data[..end]
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn invalid(message: &str) -> CryptoError {
    CryptoError::InvalidAssertion(message.to_string())
}
