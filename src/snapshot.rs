// 💾 Snapshots - Flat-file form of cards and banned countries
//
// cards.txt             pretty JSON per card, each record closed by a `~`
//                       delimiter line; the empty segment after the last
//                       delimiter is discarded on load
// banned-countries.txt  one comma-joined line of country names, with `,`
//                       `\` and line breaks backslash-escaped
//
// Both files are rewritten in full (temp file + rename) after mutations.
// A missing file loads as an empty collection.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::card::Card;
use crate::countries::BanList;
use crate::error::RegistryError;

pub const CARDS_FILE: &str = "cards.txt";
pub const BANNED_COUNTRIES_FILE: &str = "banned-countries.txt";

const RECORD_DELIMITER: char = '~';

// ============================================================================
// ENCODING
// ============================================================================

pub fn encode_cards(cards: &[Card]) -> serde_json::Result<String> {
    let mut out = String::new();
    for card in cards {
        out.push_str(&serde_json::to_string_pretty(card)?);
        out.push('\n');
        out.push(RECORD_DELIMITER);
        out.push('\n');
    }
    Ok(out)
}

/// Parse a cards snapshot.
///
/// A record ends at a line ending in `~`. Pretty JSON never ends a line with
/// a bare `~` (string values end with a quote), so this also accepts files
/// where the delimiter was appended directly after the closing brace.
pub fn decode_cards(text: &str) -> Result<Vec<Card>> {
    let mut cards = Vec::new();
    let mut segment = String::new();

    for line in text.lines() {
        let trimmed = line.trim_end();
        if let Some(body) = trimmed.strip_suffix(RECORD_DELIMITER) {
            segment.push_str(body);
            finish_record(&mut segment, &mut cards)?;
        } else {
            segment.push_str(line);
            segment.push('\n');
        }
    }
    finish_record(&mut segment, &mut cards)?;

    Ok(cards)
}

fn finish_record(segment: &mut String, cards: &mut Vec<Card>) -> Result<()> {
    if !segment.trim().is_empty() {
        let card: Card = serde_json::from_str(segment)
            .with_context(|| format!("Failed to parse card record #{}", cards.len() + 1))?;
        cards.push(card);
    }
    segment.clear();
    Ok(())
}

const NAME_SEPARATOR: char = ',';
const ESCAPE: char = '\\';

/// Escape the separator, the escape character and line breaks so any name
/// survives the single-line format
fn escape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            ESCAPE | NAME_SEPARATOR => {
                out.push(ESCAPE);
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

pub fn encode_banned(bans: &BanList) -> String {
    let names: Vec<String> = bans.names().iter().map(|n| escape_name(n)).collect();
    format!("{}\n", names.join(","))
}

/// Parse the ban list line, dropping empty segments.
///
/// Unescaped line breaks are ignored; `\,` `\\` `\n` `\r` decode to the
/// escaped character.
pub fn decode_banned(text: &str) -> BanList {
    let mut names = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE => match chars.next() {
                Some('n') => current.push('\n'),
                Some('r') => current.push('\r'),
                Some(other) => current.push(other),
                None => current.push(ESCAPE),
            },
            NAME_SEPARATOR => names.push(std::mem::take(&mut current)),
            '\r' | '\n' => {}
            _ => current.push(c),
        }
    }
    names.push(current);

    BanList::from_names(names.iter().map(|s| s.trim()).filter(|s| !s.is_empty()))
}

// ============================================================================
// SNAPSHOT FILES
// ============================================================================

#[derive(Debug, Clone)]
pub struct SnapshotFiles {
    cards_path: PathBuf,
    banned_path: PathBuf,
}

impl SnapshotFiles {
    pub fn in_dir(dir: &Path) -> Self {
        SnapshotFiles {
            cards_path: dir.join(CARDS_FILE),
            banned_path: dir.join(BANNED_COUNTRIES_FILE),
        }
    }

    pub fn cards_path(&self) -> &Path {
        &self.cards_path
    }

    pub fn banned_path(&self) -> &Path {
        &self.banned_path
    }

    pub fn load_cards(&self) -> Result<Vec<Card>> {
        let Some(text) = read_optional(&self.cards_path)? else {
            return Ok(Vec::new());
        };
        decode_cards(&text)
            .with_context(|| format!("Failed to load cards from {:?}", self.cards_path))
    }

    pub fn load_banned(&self) -> Result<BanList> {
        Ok(read_optional(&self.banned_path)?
            .map(|text| decode_banned(&text))
            .unwrap_or_default())
    }

    pub fn save_cards(&self, cards: &[Card]) -> Result<(), RegistryError> {
        let persist = |source: io::Error| RegistryError::Persistence { what: "cards", source };

        let text = encode_cards(cards).map_err(|e| persist(e.into()))?;
        write_atomic(&self.cards_path, &text).map_err(persist)?;

        debug!(count = cards.len(), path = ?self.cards_path, "cards snapshot written");
        Ok(())
    }

    pub fn save_banned(&self, bans: &BanList) -> Result<(), RegistryError> {
        write_atomic(&self.banned_path, &encode_banned(bans)).map_err(|source| {
            RegistryError::Persistence {
                what: "banned countries",
                source,
            }
        })?;

        debug!(count = bans.len(), path = ?self.banned_path, "ban list snapshot written");
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!(?path, "no snapshot yet, starting empty");
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {:?}", path)),
    }
}

fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CardCreate, IssuerDetails};
    use crate::store::CardStore;
    use tempfile::tempdir;

    fn sample_cards() -> Vec<Card> {
        let mut store = CardStore::new();
        store.ban_countries(&["Mordor"]);
        store.insert_card(
            &CardCreate::new("4111111111111111", "Frodo ~ Baggins"),
            IssuerDetails::for_country("Mordor"),
        );
        store.insert_card(
            &CardCreate::new("4222222222222222", "Lucy Pevensie"),
            IssuerDetails::for_country("Narnia"),
        );
        store.all_cards()
    }

    #[test]
    fn test_cards_round_trip_through_disk() {
        let dir = tempdir().unwrap();
        let files = SnapshotFiles::in_dir(dir.path());
        let cards = sample_cards();

        files.save_cards(&cards).unwrap();
        let loaded = files.load_cards().unwrap();

        assert_eq!(loaded, cards);
    }

    #[test]
    fn test_trailing_segment_discarded() {
        let text = encode_cards(&sample_cards()).unwrap();
        assert!(text.ends_with("~\n"));
        assert_eq!(decode_cards(&text).unwrap().len(), 2);
        assert!(decode_cards("").unwrap().is_empty());
        assert!(decode_cards("\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_decode_inline_delimiter() {
        let json = serde_json::to_string_pretty(&sample_cards()[0]).unwrap();
        let text = format!("{}~\n", json);

        let cards = decode_cards(&text).unwrap();
        assert_eq!(cards.len(), 1);
    }

    #[test]
    fn test_decode_corrupt_record_fails() {
        assert!(decode_cards("{ \"cardNumber\": \n~\n").is_err());
    }

    #[test]
    fn test_banned_round_trip() {
        let dir = tempdir().unwrap();
        let files = SnapshotFiles::in_dir(dir.path());
        let bans = BanList::from_names(["Mordor", "Narnia", "Oz"]);

        files.save_banned(&bans).unwrap();

        assert_eq!(fs::read_to_string(files.banned_path()).unwrap(), "Mordor,Narnia,Oz\n");
        assert_eq!(files.load_banned().unwrap(), bans);
    }

    #[test]
    fn test_decode_banned_filters_empty_segments() {
        let bans = decode_banned("Mordor,,Narnia,\n");
        assert_eq!(bans.names(), &["Mordor", "Narnia"]);
        assert!(decode_banned("\n").is_empty());
        assert!(decode_banned("").is_empty());
    }

    #[test]
    fn test_banned_names_with_separators_round_trip() {
        let bans = BanList::from_names(["Taiwan, Province of China", "Back\\slash", "Two\nLines", "Oz"]);

        let text = encode_banned(&bans);

        assert_eq!(text.lines().count(), 1);
        assert_eq!(decode_banned(&text), bans);
    }

    #[test]
    fn test_missing_files_load_empty() {
        let dir = tempdir().unwrap();
        let files = SnapshotFiles::in_dir(&dir.path().join("not-created-yet"));

        assert!(files.load_cards().unwrap().is_empty());
        assert!(files.load_banned().unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_data_dir() {
        let dir = tempdir().unwrap();
        let files = SnapshotFiles::in_dir(&dir.path().join("nested/data"));

        files.save_banned(&BanList::from_names(["Oz"])).unwrap();
        assert!(files.banned_path().exists());
    }
}
