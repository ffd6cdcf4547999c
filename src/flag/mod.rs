//! Flag specification mini-language.
//!
//! A flag spec is a compact string describing one command-line option:
//!
//! ```text
//! spec        := flagtoken ["+"] [valuepart] [ws ":" ws description]
//! flagtoken   := "-" WORD_CHAR | "--" WORD_CHAR (WORD_CHAR | "-")+
//! valuepart   := "=" ["*"] [values]
//! values      := WORD ("," WORD)*      ; a single WORD unless "*" is present
//! ```
//!
//! `+` enables the option by default, `=` makes it accept a value and `=*`
//! makes it accept many. Examples: `-v`, `--test=`, `--address=*`,
//! `-c= : count`, `--mode+=fast`.

use crate::error::{Result, ShellError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagDescriptor {
    pub flag: String,
    pub enabled_by_default: bool,
    pub can_have_value: bool,
    pub can_have_multiple_values: bool,
    pub initial_values: Vec<String>,
    pub description: Option<String>,
}

impl FlagDescriptor {
    pub fn parse(spec: &str) -> Result<Self> { parse(spec) }
}

impl std::str::FromStr for FlagDescriptor {
    type Err = ShellError;
    fn from_str(s: &str) -> Result<Self> { parse(s) }
}

fn is_word_char(c: u8) -> bool { c.is_ascii_alphanumeric() || c == b'_' }

fn scan_word(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && is_word_char(bytes[i]) { i += 1; }
    i
}

/// Parse a flag spec into a [`FlagDescriptor`].
pub fn parse(spec: &str) -> Result<FlagDescriptor> {
    let input = spec.trim();
    let bytes = input.as_bytes();
    let mut i = 0;

    // flag token
    if bytes.first() != Some(&b'-') {
        return Err(ShellError::parse(input, "flag must start with '-'"));
    }
    if bytes.get(1) == Some(&b'-') {
        i = 2;
        if !bytes.get(i).copied().is_some_and(is_word_char) {
            return Err(ShellError::parse(input, "long flag must start with a word character"));
        }
        i += 1;
        let rest = i;
        while i < bytes.len() && (is_word_char(bytes[i]) || bytes[i] == b'-') { i += 1; }
        if i == rest {
            return Err(ShellError::parse(input, "long flag needs at least two characters"));
        }
    } else {
        i += 1;
        if !bytes.get(i).copied().is_some_and(is_word_char) {
            return Err(ShellError::parse(input, "short flag needs one word character"));
        }
        i += 1;
    }
    let flag = input[..i].to_string();

    let mut enabled_by_default = false;
    if bytes.get(i) == Some(&b'+') {
        enabled_by_default = true;
        i += 1;
    }

    let mut can_have_value = false;
    let mut can_have_multiple_values = false;
    let mut initial_values = Vec::new();
    if bytes.get(i) == Some(&b'=') {
        can_have_value = true;
        i += 1;
        if bytes.get(i) == Some(&b'*') {
            can_have_multiple_values = true;
            i += 1;
        }
        let start = i;
        let end = scan_word(bytes, i);
        if end > start {
            initial_values.push(input[start..end].to_string());
            i = end;
            while can_have_multiple_values && bytes.get(i) == Some(&b',') {
                let next = scan_word(bytes, i + 1);
                if next == i + 1 {
                    return Err(ShellError::parse(input, "empty value in value list"));
                }
                initial_values.push(input[i + 1..next].to_string());
                i = next;
            }
        }
    }

    let description = if i < bytes.len() {
        Some(parse_description(input, i)?)
    } else {
        None
    };

    Ok(FlagDescriptor {
        flag,
        enabled_by_default,
        can_have_value,
        can_have_multiple_values,
        initial_values,
        description,
    })
}

/// `ws ":" ws description`, starting at `i`; anything else is trailing garbage.
fn parse_description(input: &str, i: usize) -> Result<String> {
    let rest = &input[i..];
    let after_ws = rest.trim_start();
    if after_ws.len() == rest.len() || !after_ws.starts_with(':') {
        return Err(ShellError::parse(input, format!("unexpected input [{}]", rest)));
    }
    let after_colon = &after_ws[1..];
    let text = after_colon.trim_start();
    if text.len() == after_colon.len() || text.is_empty() {
        return Err(ShellError::parse(input, "description must follow ' : '"));
    }
    Ok(text.to_string())
}
