//! Compressed source-map decoding
//!
//! The contract compiler emits one source mapping per instruction in a
//! delta-compressed text format: entries are separated by `;`, fields
//! within an entry by `:`. An entry carries `start:length:file:jump`
//! where every field is optional and an omitted field repeats the value
//! of the previous entry. The jump field is one of `i` (into a function),
//! `o` (out of a function) or `-` (regular instruction).
//!
//! Decoding expands the compressed form into a dense vector indexed by
//! instruction ordinal and precomputes the 1-based source line of every
//! entry so the tracer never rescans the source text at trace time.

use thiserror::Error;

/// Jump classifier attached to each source mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    /// Jump into a function body
    Into,
    /// Jump out of a function body
    Out,
    /// Ordinary instruction
    Regular,
}

impl JumpKind {
    fn parse(field: &str) -> Option<Self> {
        match field {
            "i" => Some(JumpKind::Into),
            "o" => Some(JumpKind::Out),
            "-" => Some(JumpKind::Regular),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            JumpKind::Into => "i",
            JumpKind::Out => "o",
            JumpKind::Regular => "-",
        }
    }
}

/// One decoded source mapping, addressed by instruction ordinal
///
/// `start` and `length` are byte offsets into the contract source text;
/// both can be negative for compiler-generated code that has no source
/// counterpart. `line` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMapping {
    pub start: i64,
    pub length: i64,
    pub file: i64,
    pub jump: JumpKind,
    pub line: usize,
}

impl SourceMapping {
    /// Source span as unsigned offsets, `None` for synthetic mappings.
    pub fn span(&self) -> Option<(usize, usize)> {
        if self.start < 0 || self.length < 0 {
            return None;
        }
        Some((self.start as usize, self.length as usize))
    }
}

/// Decoding failure, naming the offending entry
#[derive(Debug, Error)]
#[error("malformed entry {entry}: {reason}")]
pub struct SourceMapError {
    pub entry: usize,
    pub reason: String,
}

/// Expands a compressed source map into its dense form.
///
/// Line numbers are computed with a cursor that advances monotonically
/// over `source`; entries are not required to be ordered by `start`, and
/// a regressing offset restarts the scan from the beginning (source maps
/// are small, so the occasional rescan is cheap at construction time).
pub fn parse_source_map(compressed: &str, source: &str) -> Result<Vec<SourceMapping>, SourceMapError> {
    let mut mappings = Vec::new();
    let mut prev_start = 0i64;
    let mut prev_length = 0i64;
    let mut prev_file = 0i64;
    let mut prev_jump = JumpKind::Regular;
    let mut cursor = LineCursor::new(source);

    for (entry, raw) in compressed.split(';').enumerate() {
        let mut fields = raw.split(':');
        prev_start = parse_field(fields.next(), prev_start, entry, "start")?;
        prev_length = parse_field(fields.next(), prev_length, entry, "length")?;
        prev_file = parse_field(fields.next(), prev_file, entry, "file")?;
        prev_jump = match fields.next() {
            None | Some("") => prev_jump,
            Some(field) => JumpKind::parse(field).ok_or_else(|| SourceMapError {
                entry,
                reason: format!("invalid jump field {field:?}"),
            })?,
        };
        // Newer compilers append a modifier-depth field; it is not used here.

        mappings.push(SourceMapping {
            start: prev_start,
            length: prev_length,
            file: prev_file,
            jump: prev_jump,
            line: cursor.line_at(prev_start),
        });
    }

    Ok(mappings)
}

/// Re-compresses a dense source map into the delta form.
///
/// Fields equal to the previous entry are omitted, and trailing omitted
/// fields are dropped entirely, so a fully inherited entry encodes as the
/// empty string. Decoding the result reproduces the input.
pub fn encode_source_map(mappings: &[SourceMapping]) -> String {
    let mut entries = Vec::with_capacity(mappings.len());
    let mut prev: Option<&SourceMapping> = None;

    for mapping in mappings {
        let mut fields = match prev {
            None => vec![
                mapping.start.to_string(),
                mapping.length.to_string(),
                mapping.file.to_string(),
                mapping.jump.as_str().to_string(),
            ],
            Some(prev) => vec![
                delta(mapping.start, prev.start),
                delta(mapping.length, prev.length),
                delta(mapping.file, prev.file),
                if mapping.jump == prev.jump {
                    String::new()
                } else {
                    mapping.jump.as_str().to_string()
                },
            ],
        };
        while fields.last().is_some_and(|field| field.is_empty()) {
            fields.pop();
        }
        entries.push(fields.join(":"));
        prev = Some(mapping);
    }

    entries.join(";")
}

fn delta(current: i64, previous: i64) -> String {
    if current == previous {
        String::new()
    } else {
        current.to_string()
    }
}

fn parse_field(field: Option<&str>, previous: i64, entry: usize, name: &str) -> Result<i64, SourceMapError> {
    match field {
        None | Some("") => Ok(previous),
        Some(field) => field.parse().map_err(|_| SourceMapError {
            entry,
            reason: format!("invalid {name} field {field:?}"),
        }),
    }
}

/// Monotone newline counter over the source text
struct LineCursor<'a> {
    source: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> LineCursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    fn line_at(&mut self, start: i64) -> usize {
        let target = usize::try_from(start).unwrap_or(0).min(self.source.len());
        if target < self.pos {
            self.pos = 0;
            self.line = 1;
        }
        while self.pos < target {
            if self.source[self.pos] == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
        self.line
    }
}
