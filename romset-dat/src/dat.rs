use std::io::{BufRead, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::DatError;

/// A parsed Parent/Clone DAT file (Logiqx XML or ClrMamePro format).
#[derive(Debug, Clone, Default)]
pub struct DatFile {
    pub name: String,
    pub description: String,
    pub version: String,
    /// Header-rule file named by `<clrmamepro header="..."/>`, if any.
    pub header: Option<String>,
    pub games: Vec<DatGame>,
}

/// A single game (variant) entry, in file order.
#[derive(Debug, Clone, Default)]
pub struct DatGame {
    pub name: String,
    /// Name of the parent entry when this entry is a clone.
    pub clone_of: Option<String>,
    pub is_bios: bool,
    /// Region string from a ClrMamePro `region` field, if present.
    pub region: Option<String>,
    pub releases: Vec<DatRelease>,
    pub roms: Vec<DatRom>,
}

/// A `<release>` record declaring a region (and optionally a language).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatRelease {
    pub name: String,
    pub region: String,
    pub language: Option<String>,
}

/// A single ROM entry within a game.
#[derive(Debug, Clone, Default)]
pub struct DatRom {
    pub name: String,
    pub size: u64,
    /// CRC32 checksum (lowercase hex)
    pub crc: Option<String>,
    /// SHA1 checksum (lowercase hex)
    pub sha1: Option<String>,
    pub status: RomStatus,
}

/// Dump status declared on a ROM entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RomStatus {
    #[default]
    Good,
    BadDump,
    NoDump,
    Verified,
}

impl RomStatus {
    fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "baddump" => Self::BadDump,
            "nodump" => Self::NoDump,
            "verified" => Self::Verified,
            _ => Self::Good,
        }
    }
}

/// Parse a DAT file, auto-detecting format (XML or ClrMamePro).
pub fn parse_dat<R: BufRead>(mut reader: R) -> Result<DatFile, DatError> {
    // Peek at the first non-whitespace byte to detect the format
    let mut first_bytes = Vec::new();
    let mut buf = [0u8; 1];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            return Err(DatError::invalid_dat("Empty DAT file"));
        }
        first_bytes.push(buf[0]);
        if !buf[0].is_ascii_whitespace() {
            break;
        }
    }

    let chain = std::io::Cursor::new(first_bytes).chain(reader);
    let buffered = std::io::BufReader::new(chain);

    if buf[0] == b'<' {
        parse_xml(buffered)
    } else {
        parse_clrmamepro(buffered)
    }
}

/// Parse a DAT file from a file path.
pub fn parse_dat_file(path: &std::path::Path) -> Result<DatFile, DatError> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    parse_dat(reader)
}

// ---------------------------------------------------------------------------
// Logiqx XML parser
// ---------------------------------------------------------------------------

fn parse_xml<R: BufRead>(reader: R) -> Result<DatFile, DatError> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut dat = DatFile::default();

    let mut in_header = false;
    let mut current_tag = String::new();
    let mut current_game: Option<DatGame> = None;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match tag_name.as_str() {
                    "header" => in_header = true,
                    "game" | "machine" => current_game = Some(parse_xml_game_attributes(e)?),
                    _ => current_tag = tag_name,
                }
            }
            Event::Empty(ref e) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match tag_name.as_str() {
                    "rom" => {
                        if let Some(ref mut game) = current_game {
                            game.roms.push(parse_xml_rom_attributes(e)?);
                        }
                    }
                    "release" => {
                        if let Some(ref mut game) = current_game {
                            if let Some(release) = parse_xml_release_attributes(e)? {
                                game.releases.push(release);
                            }
                        }
                    }
                    "clrmamepro" if in_header => {
                        for attr in e.attributes() {
                            let attr = attr?;
                            if attr.key.as_ref() == b"header" {
                                let value = String::from_utf8_lossy(&attr.value).to_string();
                                if !value.is_empty() {
                                    dat.header = Some(value);
                                }
                            }
                        }
                    }
                    "game" | "machine" => {
                        dat.games.push(parse_xml_game_attributes(e)?);
                    }
                    _ => {}
                }
            }
            Event::Text(ref e) => {
                if in_header {
                    let text = e.unescape()?.to_string();
                    match current_tag.as_str() {
                        "name" => dat.name = text,
                        "description" => dat.description = text,
                        "version" => dat.version = text,
                        _ => {}
                    }
                }
            }
            Event::End(ref e) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match tag_name.as_str() {
                    "header" => in_header = false,
                    "game" | "machine" => {
                        if let Some(game) = current_game.take() {
                            dat.games.push(game);
                        }
                    }
                    _ => current_tag.clear(),
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if dat.name.is_empty() && dat.games.is_empty() {
        return Err(DatError::invalid_dat(
            "No header or games found in XML DAT file",
        ));
    }

    Ok(dat)
}

fn parse_xml_game_attributes(e: &BytesStart<'_>) -> Result<DatGame, DatError> {
    let mut game = DatGame::default();
    for attr in e.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.to_string();
        match attr.key.as_ref() {
            b"name" => game.name = value,
            b"cloneof" if !value.is_empty() => game.clone_of = Some(value),
            b"isbios" => game.is_bios = value.eq_ignore_ascii_case("yes"),
            _ => {}
        }
    }
    if game.name.is_empty() {
        return Err(DatError::invalid_dat("Game entry without a name"));
    }
    Ok(game)
}

fn parse_xml_release_attributes(e: &BytesStart<'_>) -> Result<Option<DatRelease>, DatError> {
    let mut name = String::new();
    let mut region = String::new();
    let mut language = None;
    for attr in e.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.to_string();
        match attr.key.as_ref() {
            b"name" => name = value,
            b"region" => region = value,
            b"language" if !value.is_empty() => language = Some(value),
            _ => {}
        }
    }
    if region.is_empty() {
        return Ok(None);
    }
    Ok(Some(DatRelease {
        name,
        region,
        language,
    }))
}

fn parse_xml_rom_attributes(e: &BytesStart<'_>) -> Result<DatRom, DatError> {
    let mut rom = DatRom::default();

    for attr in e.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.to_string();
        match attr.key.as_ref() {
            b"name" => rom.name = value,
            b"size" => {
                rom.size = value
                    .parse()
                    .map_err(|_| DatError::invalid_dat(format!("Invalid ROM size: {value}")))?;
            }
            b"crc" if !value.is_empty() => rom.crc = Some(value.to_lowercase()),
            b"sha1" if !value.is_empty() => rom.sha1 = Some(value.to_lowercase()),
            b"status" => rom.status = RomStatus::parse(&value),
            _ => {}
        }
    }

    Ok(rom)
}

// ---------------------------------------------------------------------------
// ClrMamePro DAT parser
// ---------------------------------------------------------------------------

/// Parse a ClrMamePro format DAT file.
///
/// Format:
/// ```text
/// clrmamepro (
///     name "System Name"
///     version 20240101-000000
///     header "No-Intro_NES.xml"
/// )
///
/// game (
///     name "Game Name (Region)"
///     cloneof "Parent Name (Region)"
///     rom ( name "Game Name (Region).ext" size 12345 crc AABBCCDD sha1 ... )
/// )
/// ```
fn parse_clrmamepro<R: BufRead>(reader: R) -> Result<DatFile, DatError> {
    let mut dat = DatFile::default();

    let mut in_block: Option<String> = None;
    let mut current_game: Option<DatGame> = None;

    for line_result in reader.lines() {
        let line = line_result?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let Some(block_type) = in_block.as_deref() else {
            if let Some(block_type) = detect_block_start(trimmed) {
                if matches!(block_type.as_str(), "game" | "machine" | "resource") {
                    current_game = Some(DatGame {
                        is_bios: block_type == "resource",
                        ..Default::default()
                    });
                }
                in_block = Some(block_type);
            }
            continue;
        };

        if trimmed == ")" {
            in_block = None;
            if let Some(game) = current_game.take() {
                if game.name.is_empty() {
                    return Err(DatError::invalid_dat("Game entry without a name"));
                }
                dat.games.push(game);
            }
            continue;
        }

        let Some((key, value)) = parse_kv(trimmed) else {
            continue;
        };
        match block_type {
            "clrmamepro" => match key.as_str() {
                "name" => dat.name = value,
                "description" => dat.description = value,
                "version" => dat.version = value,
                "header" if !value.is_empty() => dat.header = Some(value),
                _ => {}
            },
            _ => {
                if let Some(ref mut game) = current_game {
                    match key.as_str() {
                        "name" => game.name = value,
                        "cloneof" if !value.is_empty() => game.clone_of = Some(value),
                        "region" => game.region = Some(value),
                        "rom" => {
                            if let Some(rom) = parse_clr_rom_inline(&value) {
                                game.roms.push(rom);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    if dat.name.is_empty() && dat.games.is_empty() {
        return Err(DatError::invalid_dat(
            "No header or games found in ClrMamePro DAT file",
        ));
    }

    Ok(dat)
}

/// Detect a block start like `clrmamepro (` or `game (`.
fn detect_block_start(line: &str) -> Option<String> {
    let stripped = line.trim_end();
    let block_type = stripped.strip_suffix('(')?.trim();
    if !block_type.is_empty() && block_type.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Some(block_type.to_lowercase());
    }
    None
}

/// Parse a key-value line like `name "Some Value"` or `version 20240101`.
/// For `rom ( ... )` lines, the value is the content inside outer parens.
fn parse_kv(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();

    if let Some(rest) = trimmed.strip_prefix("rom") {
        let rest = rest.trim();
        if rest.starts_with('(') && rest.ends_with(')') && rest.len() >= 2 {
            let inner = rest[1..rest.len() - 1].trim();
            return Some(("rom".to_string(), inner.to_string()));
        }
    }

    let mut parts = trimmed.splitn(2, |c: char| c.is_ascii_whitespace());
    let key = parts.next()?.trim().to_string();
    let raw_value = parts.next()?.trim();

    let value = if raw_value.starts_with('"') && raw_value.ends_with('"') && raw_value.len() >= 2 {
        raw_value[1..raw_value.len() - 1].to_string()
    } else {
        raw_value.to_string()
    };

    Some((key, value))
}

/// Parse an inline ROM entry like:
/// `name "Game (Region).ext" size 12345 crc AABBCCDD sha1 ... flags baddump`
fn parse_clr_rom_inline(inner: &str) -> Option<DatRom> {
    let tokens = tokenize_rom_line(inner);
    let mut rom = DatRom::default();

    for pair in tokens.chunks(2) {
        let [key, value] = pair else {
            break;
        };
        match key.as_str() {
            "name" => rom.name = value.clone(),
            "size" => rom.size = value.parse().unwrap_or(0),
            "crc" => rom.crc = Some(value.to_lowercase()),
            "sha1" => rom.sha1 = Some(value.to_lowercase()),
            "status" | "flags" => rom.status = RomStatus::parse(value),
            _ => {}
        }
    }

    if rom.name.is_empty() {
        return None;
    }
    Some(rom)
}

/// Tokenize a ROM line, respecting quoted strings.
/// `name "Game (Region).ext" size 12345 crc AB` → ["name", "Game (Region).ext", "size", "12345", "crc", "AB"]
fn tokenize_rom_line(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            chars.next();
        }

        if chars.peek().is_none() {
            break;
        }

        let mut token = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            for c in chars.by_ref() {
                if c == '"' {
                    break;
                }
                token.push(c);
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_ascii_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }

    tokens
}

#[cfg(test)]
#[path = "tests/dat_tests.rs"]
mod tests;
