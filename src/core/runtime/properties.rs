//! Reader and writer for the Java `.properties` format.
//!
//! Output is accepted by `java.util.Properties#load`, and anything that method
//! accepts is read back to the same mapping.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use crate::core::error::{ArchitectError, ArchitectResult};

/// Write `properties` preceded by a `#comment` line and a `#timestamp` line.
pub fn store<W: Write>(
    out: &mut W,
    properties: &BTreeMap<String, String>,
    comment: &str,
) -> std::io::Result<()> {
    for line in comment.lines() {
        writeln!(out, "#{}", escape(line, EscapeMode::Comment))?;
    }
    writeln!(
        out,
        "#{}",
        chrono::Local::now().format("%a %b %d %H:%M:%S %Z %Y")
    )?;
    for (key, value) in properties {
        writeln!(
            out,
            "{}={}",
            escape(key, EscapeMode::Key),
            escape(value, EscapeMode::Value)
        )?;
    }
    out.flush()
}

pub fn write_file(
    path: &Path,
    properties: &BTreeMap<String, String>,
    comment: &str,
) -> ArchitectResult<()> {
    let mut buffer = Vec::new();
    store(&mut buffer, properties, comment).map_err(|e| ArchitectError::io(path, e))?;
    std::fs::write(path, buffer).map_err(|e| ArchitectError::io(path, e))
}

pub fn read_file(path: &Path) -> ArchitectResult<BTreeMap<String, String>> {
    let text = std::fs::read_to_string(path).map_err(|e| ArchitectError::io(path, e))?;
    load(&text)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum EscapeMode {
    Key,
    Value,
    Comment,
}

fn escape(raw: &str, mode: EscapeMode) -> String {
    let mut out = String::with_capacity(raw.len());
    for (index, ch) in raw.chars().enumerate() {
        if mode == EscapeMode::Comment {
            if ch.is_ascii() && !ch.is_ascii_control() {
                out.push(ch);
            } else {
                push_unicode(&mut out, ch);
            }
            continue;
        }

        match ch {
            ' ' if index == 0 || mode == EscapeMode::Key => out.push_str("\\ "),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(ch);
            }
            c if (' '..='~').contains(&c) => out.push(c),
            c => push_unicode(&mut out, c),
        }
    }
    out
}

fn push_unicode(out: &mut String, ch: char) {
    let mut units = [0u16; 2];
    for unit in ch.encode_utf16(&mut units) {
        out.push_str(&format!("\\u{:04X}", unit));
    }
}

/// Parse `.properties` text. Later duplicates of a key win.
pub fn load(text: &str) -> ArchitectResult<BTreeMap<String, String>> {
    let mut properties = BTreeMap::new();
    let mut lines = text.lines().enumerate().peekable();

    while let Some((index, line)) = lines.next() {
        let line_no = index + 1;
        let trimmed = trim_leading(line);
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let mut logical = trimmed.to_string();
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(trim_leading(next)),
                None => break,
            }
        }

        let (key, value) = split_key_value(&logical);
        properties.insert(unescape(key, line_no)?, unescape(value, line_no)?);
    }

    Ok(properties)
}

fn trim_leading(line: &str) -> &str {
    line.trim_start_matches([' ', '\t', '\x0c'])
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    let mut separator = None;

    for (i, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                separator = Some(i + 1);
                break;
            }
            ' ' | '\t' | '\x0c' => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = &line[key_end..];
    if separator.is_some() {
        rest = &rest[1..];
    } else {
        rest = trim_leading(rest);
        if let Some(stripped) = rest.strip_prefix(['=', ':']) {
            rest = stripped;
        }
    }
    (key, trim_leading(rest))
}

fn unescape(raw: &str, line: usize) -> ArchitectResult<String> {
    let mut units: Vec<u16> = Vec::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            let mut buf = [0u16; 2];
            units.extend_from_slice(ch.encode_utf16(&mut buf));
            continue;
        }

        let escaped = match chars.next() {
            Some(c) => c,
            None => break,
        };
        let decoded = match escaped {
            't' => '\t',
            'n' => '\n',
            'r' => '\r',
            'f' => '\x0c',
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                let unit = (hex.len() == 4)
                    .then(|| u16::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .ok_or_else(|| ArchitectError::Properties {
                        line,
                        message: format!("malformed \\uXXXX escape '\\u{}'", hex),
                    })?;
                units.push(unit);
                continue;
            }
            other => other,
        };
        let mut buf = [0u16; 2];
        units.extend_from_slice(decoded.encode_utf16(&mut buf));
    }

    String::from_utf16(&units).map_err(|_| ArchitectError::Properties {
        line,
        message: "unpaired surrogate in \\u escape".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn stored(properties: &BTreeMap<String, String>) -> String {
        let mut out = Vec::new();
        store(&mut out, properties, "Architectury Runtime Transformer Properties").unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn values_survive_a_store_load_cycle() {
        let properties = map(&[
            ("architectury.compile.classpath", "/a/b.jar:/c d/e.jar;C:\\libs\\x.jar"),
            ("architectury.refmap.name", "examplemod-refmap.json"),
            ("architectury.mappings.with.srg", ""),
            ("leading", "  two spaces"),
            ("symbols", "a=b:c#d!e"),
            ("lines", "one\ntwo\r\tthree"),
            ("unicode", "Grüße ✓ 😀"),
            ("key with spaces", "v"),
        ]);

        let text = stored(&properties);
        assert!(text.starts_with("#Architectury Runtime Transformer Properties\n#"));
        assert!(text.is_ascii());
        assert_eq!(load(&text).unwrap(), properties);
    }

    #[test]
    fn load_accepts_every_separator_and_continuations() {
        let text = "\
# comment
! also comment
   indented = padded value
colon:value
space value with spaces
empty
multi = first \\
        second
trailing\\\\
";
        let parsed = load(text).unwrap();

        assert_eq!(parsed["indented"], "padded value");
        assert_eq!(parsed["colon"], "value");
        assert_eq!(parsed["space"], "value with spaces");
        assert_eq!(parsed["empty"], "");
        assert_eq!(parsed["multi"], "first second");
        assert_eq!(parsed["trailing\\"], "");
        assert_eq!(parsed.len(), 6);
    }

    #[test]
    fn malformed_unicode_escape_reports_line() {
        let err = load("ok=1\nbad=\\u12G4\n").unwrap_err();
        assert!(matches!(err, ArchitectError::Properties { line: 2, .. }));
    }

    #[test]
    fn escapes_key_and_value_differently() {
        assert_eq!(escape("a b", EscapeMode::Key), "a\\ b");
        assert_eq!(escape(" a b", EscapeMode::Value), "\\ a b");
        assert_eq!(escape("é", EscapeMode::Value), "\\u00E9");
    }
}
