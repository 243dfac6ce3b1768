//! Scanner for `level_up_learnsets.h`
//!
//! Finds every `s<Species>LevelUpLearnset[] = { ... }` declaration and the
//! `LEVEL_UP_MOVE(level, MOVE_X)` entries inside it. The scan is token based
//! rather than tied to exact whitespace, and it records where each body sits
//! so a rewrite can splice new text in without re-searching the file.

use crate::error::{Error, Result};
use crate::learnset::{LearnsetEntry, LearnsetTable};
use std::fs;
use std::ops::Range;
use std::path::Path;

const DECLARATION_PREFIX: &str = "s";
const DECLARATION_SUFFIX: &str = "LevelUpLearnset";
const ENTRY_MACRO: &str = "LEVEL_UP_MOVE";
const MOVE_PREFIX: &str = "MOVE_";

/// One learnset array found in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Array identifier, e.g. "sBulbasaurLevelUpLearnset"
    pub ident: String,
    /// Upper-cased species part of the identifier, e.g. "BULBASAUR"
    pub species: String,
    /// Byte range of the text between `{` and `}`
    pub body: Range<usize>,
    /// Entries in the order they appear
    pub entries: Vec<LearnsetEntry>,
}

/// The full source text plus the declarations found in it
#[derive(Debug, Clone)]
pub struct SourceDocument {
    text: String,
    declarations: Vec<Declaration>,
}

impl SourceDocument {
    /// Scan `text` for learnset declarations
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        let declarations = scan_declarations(&text);
        Self { text, declarations }
    }

    /// Read and scan a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::SourceNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::parse(text))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Declarations in file order
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// First declaration for a species
    pub fn find(&self, species: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.species == species)
    }

    /// Species name -> learnset. A species declared twice keeps the later one.
    pub fn learnsets(&self) -> LearnsetTable {
        self.declarations
            .iter()
            .map(|d| (d.species.clone(), d.entries.clone()))
            .collect()
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Byte cursor over the source text
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str, pos: usize) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos,
        }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    /// Skip whitespace, then consume `token` if it comes next
    fn eat(&mut self, token: &str) -> bool {
        self.skip_whitespace();
        if self.bytes[self.pos..].starts_with(token.as_bytes()) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a [u8] {
        let start = self.pos;
        while self.pos < self.bytes.len() && pred(self.bytes[self.pos]) {
            self.pos += 1;
        }
        &self.bytes[start..self.pos]
    }

    fn number(&mut self) -> Option<u8> {
        self.skip_whitespace();
        let digits = self.take_while(|b| b.is_ascii_digit());
        std::str::from_utf8(digits).ok()?.parse().ok()
    }

    fn ident(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        let ident = self.take_while(is_ident_byte);
        if ident.is_empty() {
            None
        } else {
            std::str::from_utf8(ident).ok()
        }
    }
}

fn scan_declarations(text: &str) -> Vec<Declaration> {
    let bytes = text.as_bytes();
    let mut declarations = Vec::new();
    let mut search_from = 0;

    while let Some(found) = text[search_from..].find(DECLARATION_SUFFIX) {
        let suffix_start = search_from + found;
        let suffix_end = suffix_start + DECLARATION_SUFFIX.len();
        search_from = suffix_end;

        // Identifier must end exactly at the suffix
        if bytes.get(suffix_end).copied().is_some_and(is_ident_byte) {
            continue;
        }

        let mut ident_start = suffix_start;
        while ident_start > 0 && is_ident_byte(bytes[ident_start - 1]) {
            ident_start -= 1;
        }
        let ident = &text[ident_start..suffix_end];
        let Some(species_part) = text[ident_start..suffix_start].strip_prefix(DECLARATION_PREFIX)
        else {
            continue;
        };
        if species_part.is_empty() {
            continue;
        }

        let mut cursor = Cursor::new(text, suffix_end);
        if !(cursor.eat("[") && cursor.eat("]") && cursor.eat("=") && cursor.eat("{")) {
            continue;
        }
        let body_start = cursor.pos;
        let Some(body_len) = text[body_start..].find('}') else {
            break;
        };
        let body = body_start..body_start + body_len;
        search_from = body.end + 1;

        declarations.push(Declaration {
            ident: ident.to_string(),
            species: species_part.to_uppercase(),
            entries: scan_entries(&text[body.clone()]),
            body,
        });
    }

    declarations
}

/// Extract `LEVEL_UP_MOVE(level, MOVE_X)` entries; anything malformed is skipped
fn scan_entries(body: &str) -> Vec<LearnsetEntry> {
    let mut entries = Vec::new();
    let mut search_from = 0;

    while let Some(found) = body[search_from..].find(ENTRY_MACRO) {
        let start = search_from + found;
        search_from = start + ENTRY_MACRO.len();

        if start > 0 && is_ident_byte(body.as_bytes()[start - 1]) {
            continue;
        }

        let mut cursor = Cursor::new(body, search_from);
        if !cursor.eat("(") {
            continue;
        }
        let Some(level) = cursor.number() else {
            continue;
        };
        if !(cursor.eat(",") && cursor.eat(MOVE_PREFIX)) {
            continue;
        }
        // eat() skipped whitespace before MOVE_, none is allowed after it
        let name = cursor.take_while(is_ident_byte);
        if name.is_empty() || !cursor.eat(")") {
            continue;
        }
        if let Ok(name) = std::str::from_utf8(name) {
            entries.push(LearnsetEntry::new(level, name));
        }
        search_from = cursor.pos;
    }

    entries
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = "\
#define LEVEL_UP_MOVE(lvl, moveLearned) {.move = moveLearned, .level = lvl}

static const u16 sBulbasaurLevelUpLearnset[] = {
    LEVEL_UP_MOVE( 1, MOVE_TACKLE),
    LEVEL_UP_MOVE( 4, MOVE_GROWL),
    LEVEL_UP_MOVE( 7, MOVE_LEECH_SEED),
    LEVEL_UP_END
};

static const u16 sPikachuLevelUpLearnset[] = {
    LEVEL_UP_MOVE( 1, MOVE_THUNDERSHOCK),
    LEVEL_UP_MOVE( 5, MOVE_TAIL_WHIP),
    LEVEL_UP_MOVE(50, MOVE_THUNDER),
    LEVEL_UP_END
};

const u16 *const gLevelUpLearnsets[NUM_SPECIES] =
{
    [SPECIES_BULBASAUR] = sBulbasaurLevelUpLearnset,
    [SPECIES_PIKACHU] = sPikachuLevelUpLearnset,
};
";

    #[test]
    fn test_parse_declarations() {
        let doc = SourceDocument::parse(SAMPLE);
        assert_eq!(doc.declarations().len(), 2);

        let bulbasaur = doc.find("BULBASAUR").unwrap();
        assert_eq!(bulbasaur.ident, "sBulbasaurLevelUpLearnset");
        assert_eq!(
            bulbasaur.entries,
            vec![
                LearnsetEntry::new(1, "TACKLE"),
                LearnsetEntry::new(4, "GROWL"),
                LearnsetEntry::new(7, "LEECH_SEED"),
            ]
        );

        let pikachu = doc.find("PIKACHU").unwrap();
        assert_eq!(pikachu.entries.last(), Some(&LearnsetEntry::new(50, "THUNDER")));
    }

    #[test]
    fn test_body_range_covers_braces_content() {
        let doc = SourceDocument::parse(SAMPLE);
        let decl = doc.find("PIKACHU").unwrap();
        let body = &doc.text()[decl.body.clone()];
        assert!(body.starts_with('\n'));
        assert!(body.trim_end().ends_with("LEVEL_UP_END"));
        assert_eq!(&doc.text()[decl.body.end..decl.body.end + 1], "}");
    }

    #[test]
    fn test_multiword_species_is_just_uppercased() {
        let doc = SourceDocument::parse(
            "static const u16 sMrMimeLevelUpLearnset[] = {\n    LEVEL_UP_MOVE( 1, MOVE_BARRIER),\n    LEVEL_UP_END\n};\n",
        );
        assert_eq!(doc.declarations()[0].species, "MRMIME");
    }

    #[test]
    fn test_references_are_not_declarations() {
        let doc = SourceDocument::parse("[SPECIES_BULBASAUR] = sBulbasaurLevelUpLearnset,\n");
        assert!(doc.declarations().is_empty());
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let doc = SourceDocument::parse(
            "static const u16 sAbraLevelUpLearnset[] = {\n\
             LEVEL_UP_MOVE(abc, MOVE_TELEPORT),\n\
             LEVEL_UP_MOVE( 1, TELEPORT),\n\
             LEVEL_UP_MOVE(300, MOVE_TELEPORT),\n\
             LEVEL_UP_MOVE(  1,   MOVE_TELEPORT  ),\n\
             LEVEL_UP_END\n};\n",
        );
        assert_eq!(doc.learnsets()["ABRA"], vec![LearnsetEntry::new(1, "TELEPORT")]);
    }

    #[test]
    fn test_learnsets_table() {
        let table = SourceDocument::parse(SAMPLE).learnsets();
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["BULBASAUR", "PIKACHU"]);
    }

    #[test]
    fn test_load_missing_file() {
        let result = SourceDocument::load("/definitely/not/here/level_up_learnsets.h");
        assert!(matches!(result, Err(Error::SourceNotFound(_))));
    }
}
