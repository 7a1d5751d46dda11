// Semantic values are decoded at point of use: the tokenizer only
// classifies, the compiler turns the raw text into numbers and strings.
use crate::compiler::parser::CompileError;

/// Decode a NUMBER token. The tokenizer guarantees the general shape;
/// the f64 grammar accepts everything it lets through.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    text.parse::<f64>().ok()
}

/// Decode a quoted STRING token (delimiters included in `text`).
pub(crate) fn unescape_string(text: &str, line: usize) -> Result<String, CompileError> {
    // strip the quotes
    let inner = &text[1..text.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0C'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('v') => out.push('\x0B'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('\n') => out.push('\n'),
            Some('\r') => out.push('\n'),
            Some(d) if d.is_ascii_digit() => {
                let mut value = d.to_digit(10).unwrap();
                let mut taken = 0;
                while taken < 2 {
                    let mut look = chars.clone();
                    match look.next() {
                        Some(d2) if d2.is_ascii_digit() => {
                            value = value * 10 + d2.to_digit(10).unwrap();
                            chars = look;
                            taken += 1;
                        }
                        _ => break,
                    }
                }
                if value > 255 {
                    return Err(CompileError::new(
                        format!("decimal escape too large near '\\{}'", value),
                        line,
                    ));
                }
                // bytes above 127 map through their one-byte code point
                out.push(char::from_u32(value).unwrap_or('\u{FFFD}'));
            }
            Some(other) => {
                return Err(CompileError::new(
                    format!("invalid escape sequence near '\\{}'", other),
                    line,
                ));
            }
            None => {
                return Err(CompileError::new("unfinished string", line));
            }
        }
    }
    Ok(out)
}

/// Decode a LONG STRING token (`[[ ... ]]`). A newline directly after
/// the opening delimiter is not part of the value.
pub(crate) fn long_string_value(text: &str) -> &str {
    let inner = &text[2..text.len() - 2];
    if let Some(stripped) = inner.strip_prefix("\r\n") {
        stripped
    } else if let Some(stripped) = inner.strip_prefix('\n') {
        stripped
    } else if let Some(stripped) = inner.strip_prefix('\r') {
        stripped
    } else {
        inner
    }
}
