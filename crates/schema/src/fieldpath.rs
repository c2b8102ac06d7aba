//! Field path expressions: `spec.forProvider.tags[0]`, `metadata.labels[crossplane.io/claim-name]`.
//!
//! A path is a non-empty sequence of segments. Dotted components and bracketed
//! non-numeric tokens are field segments (the latter are map keys and may hold
//! dots or slashes); bracketed unsigned integers are index segments.

use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

use crate::PathError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Field(String),
    Index(usize),
}

impl Segment {
    pub fn field(name: impl Into<String>) -> Self { Self::Field(name.into()) }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: SmallVec<[Segment; 8]>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        parse(path)
    }

    /// Build a path from already-typed segments. Returns `None` for an empty sequence.
    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Option<Self> {
        let segments: SmallVec<[Segment; 8]> = segments.into_iter().collect();
        if segments.is_empty() { None } else { Some(Self { segments }) }
    }

    /// `metadata.labels[<key>]`
    pub fn label(key: &str) -> Self {
        Self::metadata_key("labels", key)
    }

    /// `metadata.annotations[<key>]`
    pub fn annotation(key: &str) -> Self {
        Self::metadata_key("annotations", key)
    }

    fn metadata_key(map: &str, key: &str) -> Self {
        let mut segments = SmallVec::new();
        segments.push(Segment::field("metadata"));
        segments.push(Segment::field(map));
        segments.push(bracket_segment(key));
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] { &self.segments }
    pub fn len(&self) -> usize { self.segments.len() }
    pub fn is_empty(&self) -> bool { self.segments.is_empty() }
}

impl FromStr for FieldPath {
    type Err = PathError;
    fn from_str(s: &str) -> Result<Self, Self::Err> { parse(s) }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                Segment::Index(n) => write!(f, "[{}]", n)?,
                Segment::Field(name) if needs_brackets(name) => write!(f, "[{}]", name)?,
                Segment::Field(name) if i == 0 => f.write_str(name)?,
                Segment::Field(name) => write!(f, ".{}", name)?,
            }
        }
        Ok(())
    }
}

fn needs_brackets(name: &str) -> bool {
    name.is_empty() || name.contains(|c: char| c == '.' || c == '[')
}

fn is_delimiter(c: char) -> bool {
    matches!(c, '.' | '[' | ']')
}

fn parse(path: &str) -> Result<FieldPath, PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }
    let malformed = |pos: usize, reason: &'static str| PathError::Malformed { path: path.to_string(), pos, reason };

    let bytes = path.as_bytes();
    let len = bytes.len();
    let mut segments: SmallVec<[Segment; 8]> = SmallVec::new();
    let mut i = 0;
    // true at the start of the path and right after a '.'
    let mut expect_component = true;

    while i < len {
        match bytes[i] {
            b'[' => {
                if expect_component && i > 0 {
                    return Err(malformed(i, "expected field name after '.'"));
                }
                let start = i + 1;
                let end = match path[start..].find(|c: char| c == '[' || c == ']') {
                    Some(off) => start + off,
                    None => return Err(malformed(i, "unterminated '['")),
                };
                if bytes[end] == b'[' {
                    return Err(malformed(end, "nested '['"));
                }
                let token = &path[start..end];
                if token.is_empty() {
                    return Err(malformed(i, "empty brackets"));
                }
                segments.push(bracket_segment(token));
                i = end + 1;
                if i < len && bytes[i] != b'.' && bytes[i] != b'[' {
                    return Err(malformed(i, "expected '.' or '[' after ']'"));
                }
                expect_component = false;
            }
            b'.' => {
                if expect_component {
                    return Err(malformed(i, "empty field name"));
                }
                i += 1;
                if i == len {
                    return Err(malformed(i, "trailing '.'"));
                }
                expect_component = true;
            }
            b']' => return Err(malformed(i, "unexpected ']'")),
            _ => {
                let start = i;
                let end = path[start..].find(is_delimiter).map_or(len, |off| start + off);
                segments.push(Segment::Field(path[start..end].to_string()));
                i = end;
                expect_component = false;
            }
        }
    }
    Ok(FieldPath { segments })
}

fn bracket_segment(token: &str) -> Segment {
    if token.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = token.parse::<usize>() {
            return Segment::Index(n);
        }
    }
    Segment::Field(token.to_string())
}
