//! Dotted/indexed path expressions (`materialList[2].country`, `materialList[item].country`).
//!
//! A path is a list of segments: object keys, concrete array indices, and the `[item]`
//! placeholder that schema keys use for "any index". Stripping every index and placeholder
//! yields the *normalized* path, which is how template and concrete paths are compared.

pub mod access;

use std::{fmt, str::FromStr};

use crate::error::PathError;

/// Bracket contents that stand for "any array index" in template paths.
pub const ITEM_PLACEHOLDER: &str = "item";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
    Item,
}

impl Segment {
    pub fn is_key(&self) -> bool {
        matches!(self, Segment::Key(_))
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(key) => Some(key),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn child_key(&self, key: impl Into<String>) -> Path {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key.into()));
        Path { segments }
    }

    pub fn child_index(&self, index: usize) -> Path {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Path { segments }
    }

    pub fn parent(&self) -> Option<Path> {
        let (_, head) = self.segments.split_last()?;
        Some(Path {
            segments: head.to_vec(),
        })
    }

    /// Proper ancestors, nearest first. The root is not included.
    pub fn ancestors(&self) -> impl Iterator<Item = Path> + '_ {
        (1..self.segments.len()).rev().map(|len| Path {
            segments: self.segments[..len].to_vec(),
        })
    }

    /// Only the key segments, in order.
    pub fn normalized(&self) -> Path {
        Path {
            segments: self
                .segments
                .iter()
                .filter(|segment| segment.is_key())
                .cloned()
                .collect(),
        }
    }

    /// A concrete path carries no `[item]` placeholders and can address a document.
    pub fn is_concrete(&self) -> bool {
        !self.segments.contains(&Segment::Item)
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Replace `[item]` placeholders left to right with `indices`. Placeholders without a
    /// matching index are dropped, which leaves that part of the path in normalized form.
    pub fn with_items(&self, indices: &[usize]) -> Path {
        let mut remaining = indices.iter();
        let segments = self
            .segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Item => remaining.next().map(|index| Segment::Index(*index)),
                other => Some(other.clone()),
            })
            .collect();
        Path { segments }
    }

    /// Fill this template's placeholders with the indices `reference` carries after the same
    /// keys. Keys are matched from the end, so a reference naming only the tail of the template
    /// (`cells[2].v` against `rows[item].cells[item].v`) lands on the right level. Placeholders
    /// with no matching index are dropped.
    pub fn with_indices_from(&self, reference: &Path) -> Path {
        let slots = self.groups();
        let known = reference.groups();
        let mut matched: Vec<Option<&[Segment]>> = vec![None; slots.len()];
        let mut cursor = known.len();
        for (slot, found) in slots.iter().zip(matched.iter_mut()).rev() {
            if let Some(position) = known[..cursor].iter().rposition(|group| group.key == slot.key) {
                *found = Some(known[position].brackets);
                cursor = position;
            }
        }

        let mut segments = Vec::with_capacity(self.segments.len());
        for (slot, found) in slots.iter().zip(matched) {
            if let Some(key) = slot.key {
                segments.push(Segment::Key(key.to_string()));
            }
            let mut indices = found.unwrap_or_default().iter().filter_map(|segment| match segment {
                Segment::Index(index) => Some(*index),
                _ => None,
            });
            for segment in slot.brackets {
                match segment {
                    Segment::Item => segments.extend(indices.next().map(Segment::Index)),
                    other => segments.push(other.clone()),
                }
            }
        }
        Path::from_segments(segments)
    }

    /// Each key with the bracket segments that follow it; brackets at the root get no key.
    fn groups(&self) -> Vec<Group<'_>> {
        let segments = &self.segments;
        let mut groups = Vec::new();
        let mut start = 0;
        while start < segments.len() {
            let key = segments[start].as_key();
            let from = if key.is_some() { start + 1 } else { start };
            let end = segments[from..]
                .iter()
                .position(Segment::is_key)
                .map_or(segments.len(), |offset| from + offset);
            groups.push(Group {
                key,
                brackets: &segments[from..end],
            });
            start = end;
        }
        groups
    }
}

struct Group<'p> {
    key: Option<&'p str>,
    brackets: &'p [Segment],
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) => {
                    if position > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                Segment::Index(index) => write!(f, "[{index}]")?,
                Segment::Item => write!(f, "[{ITEM_PLACEHOLDER}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse(raw)
    }
}

/// Parse a dotted path. The empty string is the root path.
///
/// Every dotted segment may be followed by any number of bracket groups (`a[0][1]`); only the
/// first dotted segment may consist of brackets alone, which addresses a root-level array.
pub fn parse(raw: &str) -> Result<Path, PathError> {
    let mut segments = Vec::new();
    if raw.is_empty() {
        return Ok(Path { segments });
    }

    for (position, dotted) in raw.split('.').enumerate() {
        let (key, mut rest) = match dotted.find('[') {
            Some(open) => dotted.split_at(open),
            None => (dotted, ""),
        };
        if key.contains(']') {
            return Err(PathError::UnbalancedBracket { position });
        }
        if key.is_empty() {
            if position > 0 || rest.is_empty() {
                return Err(PathError::EmptySegment { position });
            }
        } else {
            segments.push(Segment::Key(key.to_string()));
        }

        while !rest.is_empty() {
            let body = rest
                .strip_prefix('[')
                .ok_or(PathError::UnbalancedBracket { position })?;
            let close = body
                .find(']')
                .ok_or(PathError::UnbalancedBracket { position })?;
            let inner = &body[..close];
            if inner.contains('[') {
                return Err(PathError::UnbalancedBracket { position });
            }
            segments.push(parse_bracket(inner)?);
            rest = &body[close + 1..];
        }
    }

    Ok(Path { segments })
}

fn parse_bracket(inner: &str) -> Result<Segment, PathError> {
    if inner == ITEM_PLACEHOLDER {
        return Ok(Segment::Item);
    }
    inner
        .parse::<usize>()
        .map(Segment::Index)
        .map_err(|_| PathError::InvalidIndex {
            raw: inner.to_string(),
        })
}

/// Strip every bracket group (`[2]`, `[item]`) and return the pure dotted key path.
///
/// Total: malformed input is normalized as far as possible instead of rejected, so
/// `normalize(normalize(p)) == normalize(p)` holds for every string.
pub fn normalize(raw: &str) -> String {
    let mut stripped = String::with_capacity(raw.len());
    let mut depth = 0usize;
    for ch in raw.chars() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(ch),
            _ => {}
        }
    }
    stripped
        .split('.')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// `true` when `path` lies strictly below `ancestor` (compared segment-wise, not textually).
pub fn is_strict_descendant(path: &Path, ancestor: &Path) -> bool {
    path.len() > ancestor.len() && path.starts_with(ancestor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_indices_and_placeholders() {
        let path = parse("materialList[2].country").unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("materialList".into()),
                Segment::Index(2),
                Segment::Key("country".into()),
            ]
        );

        let template = parse("materialList[item].country").unwrap();
        assert_eq!(template.segments()[1], Segment::Item);
        assert!(!template.is_concrete());
    }

    #[test]
    fn parses_stacked_brackets_and_root_arrays() {
        let path = parse("grid[0][1]").unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.to_string(), "grid[0][1]");

        let rooted = parse("[3].name").unwrap();
        assert_eq!(rooted.segments()[0], Segment::Index(3));
        assert_eq!(rooted.to_string(), "[3].name");
    }

    #[test]
    fn rejects_malformed_paths() {
        assert_eq!(
            parse("a[0.b"),
            Err(PathError::UnbalancedBracket { position: 0 })
        );
        assert_eq!(parse("a.]b"), Err(PathError::UnbalancedBracket { position: 1 }));
        assert_eq!(parse("a..b"), Err(PathError::EmptySegment { position: 1 }));
        assert_eq!(parse("a[x]"), Err(PathError::InvalidIndex { raw: "x".into() }));
        assert!(parse("a[[0]]").is_err());
        assert!(parse("a[0]b").is_err());
    }

    #[test]
    fn empty_string_is_root() {
        assert!(parse("").unwrap().is_root());
    }

    #[test]
    fn normalize_strips_indices_and_placeholders() {
        assert_eq!(normalize("a[2].b[item].c"), "a.b.c");
        assert_eq!(normalize("materialList[0]"), "materialList");
        assert_eq!(normalize("[0].name"), "name");
        assert_eq!(normalize("plain"), "plain");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in [
            "a[2].b[item].c",
            "a[0][1].b",
            "a[0.b",
            "]]a..b[",
            "",
            "x.y.z",
            "[item]",
        ] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn ancestors_are_nearest_first() {
        let path = parse("a[0].b.c").unwrap();
        let ancestors: Vec<String> = path.ancestors().map(|p| p.to_string()).collect();
        assert_eq!(ancestors, vec!["a[0].b", "a[0]", "a"]);
    }

    #[test]
    fn substitutes_placeholders_in_order() {
        let template = parse("rows[item].cells[item].value").unwrap();
        assert_eq!(template.with_items(&[1, 4]).to_string(), "rows[1].cells[4].value");
        assert_eq!(template.with_items(&[1]).to_string(), "rows[1].cells.value");
        assert_eq!(template.with_items(&[]).to_string(), "rows.cells.value");
    }

    #[test]
    fn indices_follow_their_keys() {
        let template = parse("rows[item].cells[item].v").unwrap();
        let cases = [
            ("cells[2].v", "rows.cells[2].v"),
            ("rows[1].cells[4].v", "rows[1].cells[4].v"),
            ("rows[3].v", "rows[3].cells.v"),
            ("rows[0].extra.cells[5].v", "rows[0].cells[5].v"),
            ("v", "rows.cells.v"),
        ];
        for (reference, expected) in cases {
            let resolved = template.with_indices_from(&parse(reference).unwrap());
            assert_eq!(resolved.to_string(), expected, "reference {reference}");
        }

        let repeated = parse("a[item].a[item].x").unwrap();
        let resolved = repeated.with_indices_from(&parse("a[3].x").unwrap());
        assert_eq!(resolved.to_string(), "a.a[3].x");
    }

    #[test]
    fn strict_descendant_is_segment_wise() {
        let list = parse("list").unwrap();
        let item = parse("list[0].x").unwrap();
        let other = parse("listing.x").unwrap();
        assert!(is_strict_descendant(&item, &list));
        assert!(!is_strict_descendant(&other, &list));
        assert!(!is_strict_descendant(&list, &list));
    }
}
