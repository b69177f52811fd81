//! Symbolic names for enumerated values and flag masks.
//!
//! Tables are plain ordered slices of [`Symbol`]s. Order matters: when two
//! names share a value, the earlier one is printed.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::buffer::BoundedBuffer;

/// One name/value pair in a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub name: &'static str,
    pub value: u64,
}

impl Symbol {
    pub const fn new(name: &'static str, value: u64) -> Self {
        Self { name, value }
    }
}

/// Builds a `&[Symbol]` from `libc` constants of the same name.
#[macro_export]
macro_rules! libc_symbols {
    ($($name:ident),* $(,)?) => {
        &[$($crate::codec::Symbol::new(stringify!($name), libc::$name as u64)),*]
    };
}

/// Failure to turn text into a number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,

    #[error("empty term in \"{0}\"")]
    EmptyTerm(String),

    #[error("number \"{0}\" is out of range")]
    OutOfRange(String),

    #[error("unknown symbol \"{name}\"{}", did_you_mean(.suggestion))]
    UnknownSymbol { name: String, suggestion: Option<String> },
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    suggestion.as_ref().map(|s| format!(", did you mean \"{s}\"?")).unwrap_or_default()
}

static C_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:0[xX][0-9a-fA-F]+|0[0-7]*|[1-9][0-9]*)$")
        .unwrap_or_else(|e| panic!("bad literal pattern: {e}"))
});

/// First symbol with exactly this value.
pub fn find_by_value(value: u64, table: &[Symbol]) -> Option<&Symbol> {
    table.iter().find(|s| s.value == value)
}

/// Case-insensitive exact lookup.
pub fn find_by_name<'t>(name: &str, table: &'t [Symbol]) -> Option<&'t Symbol> {
    table.iter().find(|s| s.name.eq_ignore_ascii_case(name))
}

/// The closest name in `table`, if any is close enough to be a typo.
pub fn fuzzy_find<'t>(name: &str, table: &'t [Symbol]) -> Option<&'t Symbol> {
    let wanted = name.to_ascii_uppercase();
    table
        .iter()
        .map(|s| (similarity(&wanted, &s.name.to_ascii_uppercase()), s))
        .filter(|(score, _)| *score >= 0.6)
        .fold(None, |best: Option<(f64, &Symbol)>, (score, s)| match best {
            Some((b, _)) if b >= score => best,
            _ => Some((score, s)),
        })
        .map(|(_, s)| s)
}

/// 1.0 for identical strings, falling towards 0.0 as edits pile up.
fn similarity(a: &str, b: &str) -> f64 {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    1.0 - prev[b.len()] as f64 / a.len().max(b.len()) as f64
}

/// Render a value that should match exactly one table entry.
pub fn print_value(buf: &mut BoundedBuffer, value: u64, table: &[Symbol]) {
    match find_by_value(value, table) {
        Some(sym) => buf.puts(sym.name),
        None => buf.put_uint(value),
    }
}

/// Render a signed enumerated value, falling back to decimal.
pub fn print_int(buf: &mut BoundedBuffer, value: i64, table: &[Symbol]) {
    match find_by_value(value as u64, table) {
        Some(sym) => buf.puts(sym.name),
        None => buf.put_int(value),
    }
}

/// Render a mask one set bit at a time, lowest first.
///
/// Bits without a name are collected into one trailing number.
pub fn print_bits(buf: &mut BoundedBuffer, value: u64, table: &[Symbol]) {
    if value == 0 {
        print_value(buf, 0, table);
        return;
    }
    let mut rest = value;
    let mut unknown = 0u64;
    let mut first = true;
    while rest != 0 {
        let bit = rest & rest.wrapping_neg();
        rest &= !bit;
        match find_by_value(bit, table) {
            Some(sym) => {
                if !first {
                    buf.puts(" | ");
                }
                buf.puts(sym.name);
                first = false;
            }
            None => unknown |= bit,
        }
    }
    if unknown != 0 {
        if !first {
            buf.puts(" | ");
        }
        buf.put_uint(unknown);
    }
}

/// Mode bits as a C octal literal.
pub fn print_octal(buf: &mut BoundedBuffer, value: u64) {
    if value == 0 {
        buf.puts("0");
    } else {
        write!(buf, "0{value:o}").ok();
    }
}

/// Parse a C integer literal.
pub fn parse_number(text: &str) -> Result<u64, ParseError> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };
    if !C_NUMBER.is_match(digits) {
        return Err(ParseError::UnknownSymbol { name: text.to_string(), suggestion: None });
    }
    let hex = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X"));
    let parsed = if let Some(hex) = hex {
        u64::from_str_radix(hex, 16)
    } else if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8)
    } else {
        digits.parse::<u64>()
    };
    let value = parsed.map_err(|_| ParseError::OutOfRange(text.to_string()))?;
    Ok(if negative { value.wrapping_neg() } else { value })
}

/// Parse `SYM | SYM + 0x10 ...` against a table.
///
/// `|` and `+` both mean union. Each term is a C literal or a name from the
/// table, matched without regard to case.
pub fn parse_bits(text: &str, table: &[Symbol]) -> Result<u64, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let mut value = 0u64;
    for term in text.split(['|', '+']) {
        let term = term.trim();
        if term.is_empty() {
            return Err(ParseError::EmptyTerm(text.to_string()));
        }
        value |= parse_term(term, table)?;
    }
    Ok(value)
}

fn parse_term(term: &str, table: &[Symbol]) -> Result<u64, ParseError> {
    if term.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        return parse_number(term);
    }
    if let Some(sym) = find_by_name(term, table) {
        return Ok(sym.value);
    }
    Err(ParseError::UnknownSymbol {
        name: term.to_string(),
        suggestion: fuzzy_find(term, table).map(|s| s.name.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const AB: &[Symbol] = &[Symbol::new("A", 1), Symbol::new("B", 2)];

    fn render(f: impl FnOnce(&mut BoundedBuffer)) -> String {
        let mut storage = [0u8; 256];
        let mut buf = BoundedBuffer::new(&mut storage);
        f(&mut buf);
        buf.as_str().to_string()
    }

    #[test]
    fn test_residual_bits_printed_numerically() {
        assert_eq!(render(|b| print_bits(b, 5, AB)), "A | 4");
    }

    #[test]
    fn test_all_bits_known() {
        let table = &[Symbol::new("A", 1), Symbol::new("B", 4)];
        assert_eq!(render(|b| print_bits(b, 5, table)), "A | B");
    }

    #[test]
    fn test_zero_mask() {
        assert_eq!(render(|b| print_bits(b, 0, AB)), "0");
        let with_zero = &[Symbol::new("F_OK", 0), Symbol::new("X_OK", 1)];
        assert_eq!(render(|b| print_bits(b, 0, with_zero)), "F_OK");
    }

    #[test]
    fn test_first_alias_wins() {
        let table = &[Symbol::new("EAGAIN", 11), Symbol::new("EWOULDBLOCK", 11)];
        assert_eq!(render(|b| print_value(b, 11, table)), "EAGAIN");
        assert_eq!(render(|b| print_value(b, 12, table)), "12");
    }

    #[test]
    fn test_octal() {
        assert_eq!(render(|b| print_octal(b, 0o644)), "0644");
        assert_eq!(render(|b| print_octal(b, 0)), "0");
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_number("0x541B"), Ok(0x541b));
        assert_eq!(parse_number("0755"), Ok(0o755));
        assert_eq!(parse_number("0"), Ok(0));
        assert_eq!(parse_number("42"), Ok(42));
        assert_eq!(parse_number("-1"), Ok(u64::MAX));
        assert!(matches!(parse_number("099"), Err(ParseError::UnknownSymbol { .. })));
        assert!(matches!(parse_number("0x1ffffffffffffffff"), Err(ParseError::OutOfRange(_))));
    }

    #[test]
    fn test_parse_union() {
        assert_eq!(parse_bits("a | B", AB), Ok(3));
        assert_eq!(parse_bits("A+0x10", AB), Ok(0x11));
        assert_eq!(parse_bits("B|B", AB), Ok(2));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_bits("  ", AB), Err(ParseError::Empty));
        assert!(matches!(parse_bits("A||B", AB), Err(ParseError::EmptyTerm(_))));
        let table = &[Symbol::new("O_RDONLY", 0), Symbol::new("O_CREAT", 0o100)];
        let err = parse_bits("O_CRAET", table).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownSymbol {
                name: "O_CRAET".to_string(),
                suggestion: Some("O_CREAT".to_string())
            }
        );
        assert_eq!(err.to_string(), "unknown symbol \"O_CRAET\", did you mean \"O_CREAT\"?");
        let err = parse_bits("banana", table).unwrap_err();
        assert_eq!(err.to_string(), "unknown symbol \"banana\"");
    }
}
