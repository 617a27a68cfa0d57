//! Character reference decoding for text and attribute values.

use std::borrow::Cow;

// Longest HTML5 entity name is 31 bytes (`CounterClockwiseContourIntegral`).
const MAX_REF_LEN: usize = 32;

/// Decode `&name;`, `&#NN;` and `&#xHH;` references.
///
/// Named references cover the full HTML5 table. Borrows when the input has
/// no `&`. Invalid code points become U+FFFD.
pub fn decode(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match decode_one(&rest[amp..]) {
            Some((text, consumed)) => {
                out.push_str(&text);
                rest = &after[consumed..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Decode the reference at the start of `s` (starting at the `&`).
/// Returns the decoded text and the number of bytes consumed after the `&`,
/// including `;`.
fn decode_one(s: &str) -> Option<(Cow<'_, str>, usize)> {
    let after = &s[1..];
    let semi = after.as_bytes().iter().take(MAX_REF_LEN + 1).position(|&b| b == b';')?;
    let body = &after[..semi];

    let text = if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        let ch = match char::from_u32(code) {
            Some(c) if code != 0 => c,
            _ => char::REPLACEMENT_CHARACTER,
        };
        Cow::Owned(ch.to_string())
    } else {
        if body.is_empty() || !body.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return None;
        }
        let reference = &s[..semi + 2];
        let decoded = html_escape::decode_html_entities(reference);
        // A real reference maps to one or two code points; anything longer
        // is a shorter legacy prefix (`&ampx;`) that must stay verbatim.
        if decoded == reference || decoded.chars().count() > 2 {
            return None;
        }
        decoded
    };
    Some((text, semi + 1))
}
