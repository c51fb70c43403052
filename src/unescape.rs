//! Recovery for over-escaped edit strings.
//!
//! Models sometimes send `old_string` with its escape sequences doubled, e.g.
//! the two characters `\n` where the file has a newline. [`unescape`] decodes
//! a string as if it were the body of a double-quoted literal. It refuses
//! anything that could not appear inside such a literal (raw newlines, bare
//! quotes, unknown escapes), so well-formed multi-line input is never touched.

/// Decode escape sequences in `input`.
///
/// Returns `None` when `input` is not a valid literal body or contains no
/// escapes at all.
pub fn unescape(input: &str) -> Option<String> {
    if !input.contains('\\') {
        return None;
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '\n' | '"' => return None,
            '\\' => {
                let escaped = chars.next()?;
                let decoded = match escaped {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    'a' => '\u{07}',
                    'b' => '\u{08}',
                    'f' => '\u{0C}',
                    'v' => '\u{0B}',
                    '\\' => '\\',
                    '"' => '"',
                    'x' => hex_char(&mut chars, 2)?,
                    'u' => hex_char(&mut chars, 4)?,
                    'U' => hex_char(&mut chars, 8)?,
                    '0'..='7' => {
                        let mut value = escaped.to_digit(8)?;
                        for _ in 0..2 {
                            value = value * 8 + chars.next()?.to_digit(8)?;
                        }
                        if value > 0xFF {
                            return None;
                        }
                        char::from_u32(value)?
                    }
                    _ => return None,
                };
                out.push(decoded);
            }
            other => out.push(other),
        }
    }

    Some(out)
}

fn hex_char(chars: &mut impl Iterator<Item = char>, digits: usize) -> Option<char> {
    let mut value = 0u32;
    for _ in 0..digits {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    char::from_u32(value)
}
