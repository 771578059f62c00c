//! Reversible encoding of arbitrary target identifiers into a DNS-safe label.
//!
//! Every character outside `[A-Za-z0-9_.-]` is replaced by the escape
//! sequence `.eNNN.`, where `NNN` is the character's codepoint in decimal,
//! zero-padded to 3 digits. The escape is self-delimiting, so decoding never
//! needs a lookahead beyond the trailing `.`.

/// Encode `s` into a DNS-legal label.
///
/// `decode(encode(s)) == s` holds for every `s` whose characters all have a
/// codepoint `<= 999`; characters outside that range cannot round-trip
/// through the fixed 3-digit escape width and are not expected to appear in
/// target identifiers (hostnames, IPs, ports).
pub fn encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if is_safe(ch) {
            out.push(ch);
        } else {
            out.push_str(&format!(".e{:03}.", ch as u32));
        }
    }
    out
}

/// Decode a label produced by [`encode`] back into the original string.
pub fn decode(s: &str) -> String {
    let bytes: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == '.' && bytes.get(i + 1) == Some(&'e') {
            if let Some(end) = find_escape_end(&bytes, i) {
                let digits: String = bytes[i + 2..end].iter().collect();
                if let Ok(code) = digits.parse::<u32>() {
                    if let Some(ch) = char::from_u32(code) {
                        out.push(ch);
                        i = end + 1;
                        continue;
                    }
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn is_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' || ch == '-'
}

/// Given the index of the `.` that opens a candidate `.eNNN.` escape,
/// return the index of the closing `.` if the next three characters are
/// ASCII digits.
fn find_escape_end(bytes: &[char], start: usize) -> Option<usize> {
    let digits_start = start + 2;
    let digits_end = digits_start + 3;
    if digits_end >= bytes.len() {
        return None;
    }
    if bytes[digits_start..digits_end].iter().all(|c| c.is_ascii_digit()) && bytes[digits_end] == '.' {
        Some(digits_end)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_strings_pass_through_unchanged() {
        for s in ["localhost", "127.0.0.1", "my-service_01", "a.b.c"] {
            assert_eq!(encode(s), s);
        }
    }

    #[test]
    fn colon_is_escaped() {
        assert_eq!(encode("127.0.0.1:3000"), "127.0.0.1.e058.3000");
    }

    #[test]
    fn round_trip_with_multiple_escapes() {
        let s = "my service:8080/foo?bar=baz";
        assert_eq!(decode(&encode(s)), s);
    }

    #[test]
    fn decode_is_inverse_of_encode_for_codepoints_under_1000() {
        let cases = ["", "plain", "a:b:c", "weird!@#$%^&*()chars", "unicode:é"];
        for s in cases {
            assert_eq!(decode(&encode(s)), s, "round trip failed for {s:?}");
        }
    }

    #[test]
    fn decode_ignores_non_escape_dot_e_sequences() {
        assert_eq!(decode("foo.e.bar"), "foo.e.bar");
        assert_eq!(decode("foo.e12.bar"), "foo.e12.bar");
        assert_eq!(decode("foo.e999x.bar"), "foo.e999x.bar");
    }

    #[test]
    fn example_from_spec() {
        let encoded = encode("127.0.0.1:3000");
        assert_eq!(encoded, "127.0.0.1.e058.3000");
        assert_eq!(decode(&encoded), "127.0.0.1:3000");
    }
}
