use csv_core::ReadFieldResult;

pub trait FromU32 {
    fn from_u32(src: u32) -> Self;
}

#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
impl FromU32 for usize {
    #[inline(always)]
    fn from_u32(src: u32) -> Self {
        // Since the pointer width is guaranteed to be 32 or 64,
        // the following process always succeeds.
        unsafe { Self::try_from(src).unwrap_unchecked() }
    }
}

/// Splits a CSV row into fields, unquoting them.
///
/// Reading an empty slice signals EOF to `csv_core::Reader`, which then
/// flushes the last field.
pub fn parse_csv_row(row: &str) -> Vec<String> {
    let mut fields = vec![];
    let mut rdr = csv_core::Reader::new();
    let mut bytes = row.as_bytes();
    let mut output = [0; 4096];
    let mut field = vec![];
    loop {
        let (result, nin, nout) = rdr.read_field(bytes, &mut output);
        field.extend_from_slice(&output[..nout]);
        bytes = &bytes[nin..];
        match result {
            ReadFieldResult::InputEmpty | ReadFieldResult::OutputFull => continue,
            ReadFieldResult::Field { record_end } => {
                fields.push(String::from_utf8_lossy(&field).into_owned());
                field.clear();
                if record_end {
                    break;
                }
            }
            ReadFieldResult::End => break,
        }
    }
    fields
}

/// Decodes the code point at the head of `bytes`.
///
/// Returns `None` as the character for an invalid or truncated sequence, which
/// then occupies a single byte.
#[inline(always)]
pub fn decode_char(bytes: &[u8]) -> (Option<char>, usize) {
    let len = match bytes.first() {
        None => return (None, 0),
        Some(&b) if b < 0x80 => return (Some(char::from(b)), 1),
        Some(&b) if b & 0xE0 == 0xC0 => 2,
        Some(&b) if b & 0xF0 == 0xE0 => 3,
        Some(&b) if b & 0xF8 == 0xF0 => 4,
        Some(_) => return (None, 1),
    };
    bytes
        .get(..len)
        .and_then(|b| std::str::from_utf8(b).ok())
        .and_then(|s| s.chars().next())
        .map_or((None, 1), |c| (Some(c), len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_row() {
        assert_eq!(
            &["名詞", "トスカーナ"],
            parse_csv_row("名詞,トスカーナ").as_slice()
        );
    }

    #[test]
    fn test_parse_csv_row_with_quote() {
        assert_eq!(
            &["名詞", "1,2-ジクロロエタン"],
            parse_csv_row("名詞,\"1,2-ジクロロエタン\"").as_slice()
        );
    }

    #[test]
    fn test_parse_csv_row_empty_fields() {
        assert_eq!(&["a", "", "b", ""], parse_csv_row("a,,b,").as_slice());
    }

    #[test]
    fn test_decode_char() {
        assert_eq!(decode_char("あい".as_bytes()), (Some('あ'), 3));
        assert_eq!(decode_char(b"a"), (Some('a'), 1));
        assert_eq!(decode_char(b"\xff\x61"), (None, 1));
        assert_eq!(decode_char(b"\xe3\x81"), (None, 1));
        assert_eq!(decode_char(b""), (None, 0));
    }
}
