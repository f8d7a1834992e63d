//! Header detection rules.
//!
//! DATs catalog headerless dumps, but some dumping tools prepend a header
//! to the image (iNES, FDS, copier headers, ...). A [`HeaderRule`] recognizes
//! such a header from the leading bytes and file size, and says how many
//! bytes to skip before hashing.
//!
//! Rules come from the built-in table (keyed by file extension) or from a
//! ClrMamePro detector XML file:
//!
//! ```text
//! <detector>
//!     <rule start_offset="10" end_offset="EOF" operation="none">
//!         <data offset="0" value="4E45531A" result="true"/>
//!     </rule>
//! </detector>
//! ```
//!
//! Offsets, sizes and values in detector files are hexadecimal.

use std::io::BufRead;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use romset_core::util::{decode_hex, parse_hex_u64};

use crate::error::HeaderRuleError;

/// Bitwise operation applied by a mask test before comparing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskOp {
    And,
    Or,
    Xor,
}

/// Comparison used by a file-size test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeOp {
    Equal,
    Less,
    Greater,
}

/// One condition of a header rule. A test passes when its comparison
/// result equals `expected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderTest {
    /// Bytes at `offset` equal `value`.
    Data {
        offset: u64,
        value: Vec<u8>,
        expected: bool,
    },
    /// `op(mask, bytes at offset) == value`.
    Mask {
        op: MaskOp,
        offset: u64,
        mask: Vec<u8>,
        value: Vec<u8>,
        expected: bool,
    },
    /// Compares the file size with `size`; `None` means "is a power of two".
    FileSize {
        op: SizeOp,
        size: Option<u64>,
        expected: bool,
    },
    /// `file_size % modulo == remainder` (copier headers).
    SizeModulo { modulo: u64, remainder: u64 },
}

impl HeaderTest {
    fn passes(&self, leading: &[u8], file_size: u64) -> bool {
        match self {
            HeaderTest::Data {
                offset,
                value,
                expected,
            } => {
                let found = slice_at(leading, *offset, value.len()) == Some(value.as_slice());
                found == *expected
            }
            HeaderTest::Mask {
                op,
                offset,
                mask,
                value,
                expected,
            } => {
                let found = slice_at(leading, *offset, mask.len()).is_some_and(|bytes| {
                    bytes.len() == value.len()
                        && bytes.iter().zip(mask).zip(value).all(|((b, m), v)| {
                            let masked = match op {
                                MaskOp::And => b & m,
                                MaskOp::Or => b | m,
                                MaskOp::Xor => b ^ m,
                            };
                            masked == *v
                        })
                });
                found == *expected
            }
            HeaderTest::FileSize { op, size, expected } => {
                let found = match (op, size) {
                    (_, None) => file_size.is_power_of_two(),
                    (SizeOp::Equal, Some(s)) => file_size == *s,
                    (SizeOp::Less, Some(s)) => file_size < *s,
                    (SizeOp::Greater, Some(s)) => file_size > *s,
                };
                found == *expected
            }
            HeaderTest::SizeModulo { modulo, remainder } => {
                *modulo != 0 && file_size % modulo == *remainder
            }
        }
    }

    /// Number of leading bytes this test needs to see.
    fn leading_len(&self) -> usize {
        match self {
            HeaderTest::Data { offset, value, .. } => *offset as usize + value.len(),
            HeaderTest::Mask { offset, mask, .. } => *offset as usize + mask.len(),
            HeaderTest::FileSize { .. } | HeaderTest::SizeModulo { .. } => 0,
        }
    }
}

fn slice_at(data: &[u8], offset: u64, len: usize) -> Option<&[u8]> {
    let start = usize::try_from(offset).ok()?;
    data.get(start..start.checked_add(len)?)
}

/// Byte reordering applied to the kept range of a matched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderOperation {
    #[default]
    None,
    /// Reverse the bit order of every byte.
    Bitswap,
    /// Swap each pair of bytes (`AB` → `BA`).
    Byteswap,
    /// Reverse each group of four bytes (`ABCD` → `DCBA`).
    Wordswap,
    /// Swap the two 16-bit halves of each group of four bytes (`ABCD` → `CDAB`).
    WordByteswap,
}

impl HeaderOperation {
    fn parse(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "none" => Self::None,
            "bitswap" => Self::Bitswap,
            "byteswap" => Self::Byteswap,
            "wordswap" => Self::Wordswap,
            "wordbyteswap" => Self::WordByteswap,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bitswap => "bitswap",
            Self::Byteswap => "byteswap",
            Self::Wordswap => "wordswap",
            Self::WordByteswap => "wordbyteswap",
        }
    }

    /// Reorder `data` in place. A trailing partial group is left as is.
    pub fn apply(self, data: &mut [u8]) {
        match self {
            Self::None => {}
            Self::Bitswap => data.iter_mut().for_each(|b| *b = b.reverse_bits()),
            Self::Byteswap => data.chunks_exact_mut(2).for_each(|c| c.swap(0, 1)),
            Self::Wordswap => data.chunks_exact_mut(4).for_each(|c| c.reverse()),
            Self::WordByteswap => data.chunks_exact_mut(4).for_each(|c| c.rotate_left(2)),
        }
    }
}

/// A header recognizer: when every test passes, only the bytes from `skip`
/// up to `end` (or the end of the file) are hashed, after `operation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRule {
    pub name: String,
    /// Lowercase extensions this rule applies to; empty means any file.
    pub extensions: Vec<String>,
    pub tests: Vec<HeaderTest>,
    pub skip: u64,
    /// Exclusive end of the kept range; `None` keeps up to the end of file.
    pub end: Option<u64>,
    pub operation: HeaderOperation,
}

impl HeaderRule {
    /// A rule that drops the first `skip` bytes of matching files.
    pub fn skipping(name: impl Into<String>, skip: u64, tests: Vec<HeaderTest>) -> Self {
        Self {
            name: name.into(),
            extensions: Vec::new(),
            tests,
            skip,
            end: None,
            operation: HeaderOperation::None,
        }
    }

    pub fn for_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    /// Whether the rule only drops a leading header, leaving the rest as is.
    pub fn is_plain_skip(&self) -> bool {
        self.end.is_none() && self.operation == HeaderOperation::None
    }

    /// Cut `data` down to the kept range and reorder it.
    pub fn apply(&self, mut data: Vec<u8>) -> Vec<u8> {
        let len = data.len() as u64;
        let end = self.end.map_or(len, |e| e.min(len));
        let start = self.skip.min(end);
        data.truncate(end as usize);
        data.drain(..start as usize);
        self.operation.apply(&mut data);
        data
    }

    /// Whether this rule should be tried for a file with `extension`.
    pub fn applies_to(&self, extension: Option<&str>) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        extension.is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Whether the header is present, given the file's leading bytes and size.
    pub fn matches(&self, leading: &[u8], file_size: u64) -> bool {
        file_size > self.skip && self.tests.iter().all(|t| t.passes(leading, file_size))
    }

    fn leading_len(&self) -> usize {
        self.tests.iter().map(HeaderTest::leading_len).max().unwrap_or(0)
    }
}

/// An ordered set of header rules.
///
/// [`detect`](Self::detect) finds the first rule matching a file as found
/// on disk; [`transform`](Self::transform) then applies every matching rule
/// in order, each one tested against the output of the previous.
#[derive(Debug, Clone, Default)]
pub struct HeaderRules {
    rules: Vec<HeaderRule>,
}

impl HeaderRules {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: Vec<HeaderRule>) -> Self {
        Self { rules }
    }

    /// The built-in rules for common headered formats.
    pub fn builtin() -> Self {
        fn data(offset: u64, value: &[u8]) -> HeaderTest {
            HeaderTest::Data {
                offset,
                value: value.to_vec(),
                expected: true,
            }
        }

        Self::from_rules(vec![
            HeaderRule::skipping("iNES", 16, vec![data(0, b"NES\x1A")]).for_extensions(&["nes"]),
            HeaderRule::skipping("Famicom Disk System", 16, vec![data(0, b"FDS\x1A")])
                .for_extensions(&["fds"]),
            HeaderRule::skipping("Atari 7800", 128, vec![data(1, b"ATARI7800")])
                .for_extensions(&["a78"]),
            HeaderRule::skipping("Atari Lynx", 64, vec![data(0, b"LYNX")]).for_extensions(&["lnx"]),
            HeaderRule::skipping(
                "SNES copier",
                512,
                vec![HeaderTest::SizeModulo {
                    modulo: 1024,
                    remainder: 512,
                }],
            )
            .for_extensions(&["sfc", "smc", "swc", "fig"]),
        ])
    }

    /// Load rules from a ClrMamePro detector XML file.
    pub fn load_detector(path: &Path) -> Result<Self, HeaderRuleError> {
        let file = std::fs::File::open(path)?;
        let mut rules = Self::parse_detector(std::io::BufReader::new(file))?;
        let label = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("detector")
            .to_string();
        for (i, rule) in rules.rules.iter_mut().enumerate() {
            if rule.name.is_empty() {
                rule.name = format!("{label} #{}", i + 1);
            }
        }
        Ok(rules)
    }

    /// Parse a ClrMamePro detector XML document. Loaded rules apply to
    /// files of any extension.
    pub fn parse_detector<R: BufRead>(reader: R) -> Result<Self, HeaderRuleError> {
        let mut xml = Reader::from_reader(reader);
        xml.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut rules = Vec::new();
        let mut current: Option<HeaderRule> = None;
        let mut saw_detector = false;

        loop {
            match xml.read_event_into(&mut buf)? {
                Event::Start(ref e) => match e.name().as_ref() {
                    b"detector" => saw_detector = true,
                    b"rule" => current = Some(parse_rule_attributes(e)?),
                    _ => push_test(&mut current, e)?,
                },
                Event::Empty(ref e) => match e.name().as_ref() {
                    b"rule" => rules.push(parse_rule_attributes(e)?),
                    _ => push_test(&mut current, e)?,
                },
                Event::End(ref e) => {
                    if e.name().as_ref() == b"rule" {
                        if let Some(rule) = current.take() {
                            rules.push(rule);
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !saw_detector {
            return Err(HeaderRuleError::invalid_rule("missing <detector> element"));
        }
        Ok(Self::from_rules(rules))
    }

    /// Append `other`'s rules after this set's rules.
    pub fn extend(&mut self, other: HeaderRules) {
        self.rules.extend(other.rules);
    }

    /// The first rule that applies to `extension` and matches the data.
    pub fn detect(&self, extension: Option<&str>, leading: &[u8], file_size: u64) -> Option<&HeaderRule> {
        self.rules
            .iter()
            .find(|r| r.applies_to(extension) && r.matches(leading, file_size))
    }

    /// Apply every rule for `extension` that matches, in order.
    pub fn transform(&self, extension: Option<&str>, mut data: Vec<u8>) -> Vec<u8> {
        for rule in self.rules.iter().filter(|r| r.applies_to(extension)) {
            if rule.matches(&data, data.len() as u64) {
                log::debug!("Applying {} header rule", rule.name);
                data = rule.apply(data);
            }
        }
        data
    }

    /// How many leading bytes must be read to evaluate every rule.
    pub fn leading_len(&self) -> usize {
        self.rules.iter().map(HeaderRule::leading_len).max().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn attr_map(e: &BytesStart<'_>) -> Result<Vec<(String, String)>, HeaderRuleError> {
    let mut out = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        out.push((
            String::from_utf8_lossy(attr.key.as_ref()).to_lowercase(),
            attr.unescape_value()?.to_string(),
        ));
    }
    Ok(out)
}

fn get<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn hex_number(attrs: &[(String, String)], key: &str, default: u64) -> Result<u64, HeaderRuleError> {
    match get(attrs, key) {
        None => Ok(default),
        Some(v) => parse_hex_u64(v)
            .ok_or_else(|| HeaderRuleError::invalid_rule(format!("bad {key} \"{v}\""))),
    }
}

fn hex_bytes(attrs: &[(String, String)], key: &str) -> Result<Vec<u8>, HeaderRuleError> {
    let v = get(attrs, key)
        .ok_or_else(|| HeaderRuleError::invalid_rule(format!("missing {key}")))?;
    decode_hex(v).ok_or_else(|| HeaderRuleError::invalid_rule(format!("bad {key} \"{v}\"")))
}

fn result_flag(attrs: &[(String, String)]) -> bool {
    get(attrs, "result").is_none_or(|v| !v.eq_ignore_ascii_case("false"))
}

fn parse_rule_attributes(e: &BytesStart<'_>) -> Result<HeaderRule, HeaderRuleError> {
    let attrs = attr_map(e)?;

    let name = get(&attrs, "operation").unwrap_or("none");
    let operation = HeaderOperation::parse(name)
        .ok_or_else(|| HeaderRuleError::UnsupportedOperation(name.to_string()))?;
    let end = match get(&attrs, "end_offset") {
        None => None,
        Some(v) if v.eq_ignore_ascii_case("EOF") => None,
        Some(_) => Some(hex_number(&attrs, "end_offset", 0)?),
    };

    Ok(HeaderRule {
        end,
        operation,
        ..HeaderRule::skipping(String::new(), hex_number(&attrs, "start_offset", 0)?, Vec::new())
    })
}

fn push_test(current: &mut Option<HeaderRule>, e: &BytesStart<'_>) -> Result<(), HeaderRuleError> {
    let Some(rule) = current.as_mut() else {
        return Ok(());
    };
    let attrs = attr_map(e)?;
    let expected = result_flag(&attrs);

    let test = match e.name().as_ref() {
        b"data" => HeaderTest::Data {
            offset: hex_number(&attrs, "offset", 0)?,
            value: hex_bytes(&attrs, "value")?,
            expected,
        },
        tag @ (b"and" | b"or" | b"xor") => {
            let op = match tag {
                b"and" => MaskOp::And,
                b"or" => MaskOp::Or,
                _ => MaskOp::Xor,
            };
            let mask = hex_bytes(&attrs, "mask")?;
            let value = hex_bytes(&attrs, "value")?;
            if mask.len() != value.len() {
                return Err(HeaderRuleError::invalid_rule(
                    "mask and value must have the same length",
                ));
            }
            HeaderTest::Mask {
                op,
                offset: hex_number(&attrs, "offset", 0)?,
                mask,
                value,
                expected,
            }
        }
        b"file" => {
            let op = match get(&attrs, "operator").unwrap_or("equal") {
                o if o.eq_ignore_ascii_case("less") => SizeOp::Less,
                o if o.eq_ignore_ascii_case("greater") => SizeOp::Greater,
                _ => SizeOp::Equal,
            };
            let size = match get(&attrs, "size") {
                Some(s) if s.eq_ignore_ascii_case("PO2") => None,
                _ => Some(hex_number(&attrs, "size", 0)?),
            };
            HeaderTest::FileSize { op, size, expected }
        }
        _ => return Ok(()),
    };
    rule.tests.push(test);
    Ok(())
}

#[cfg(test)]
#[path = "tests/header_tests.rs"]
mod tests;
