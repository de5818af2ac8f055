use crate::error::{Error, Result};
use core::str::FromStr;
use std::fmt;

pub const ENGINE_SEGMENT: &str = "engine";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    kind: String,
    value: String,
}

/// Path of `[kind:value]` segments locating a node in the test tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueId {
    segments: Vec<Segment>,
}

impl Segment {
    pub fn new<K, V>(kind: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl UniqueId {
    pub fn for_engine(engine: &str) -> Self {
        Self {
            segments: vec![Segment::new(ENGINE_SEGMENT, engine)],
        }
    }

    pub fn append<K, V>(&self, kind: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut segments = self.segments.clone();
        segments.push(Segment::new(kind, value));
        Self { segments }
    }

    /// Appends every segment of `other` in order.
    pub fn join(&self, other: &UniqueId) -> Self {
        other
            .segments()
            .iter()
            .fold(self.clone(), |id, segment| id.append(segment.kind(), segment.value()))
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn parent(&self) -> Option<UniqueId> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// True when `prefix` equals this id or one of its ancestors.
    pub fn starts_with(&self, prefix: &UniqueId) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    fn parse_segment(input: &str, body: &str) -> Result<Segment> {
        let (kind, value) = match body.find(':') {
            Some(at) => (&body[..at], &body[at + 1..]),
            None => return Err(Error::malformed(input, format!("segment `{}` has no `:`", body))),
        };
        if kind.is_empty() {
            return Err(Error::malformed(input, format!("segment `{}` has an empty type", body)));
        }
        if kind.contains(&['[', ']', '/'][..]) {
            return Err(Error::malformed(
                input,
                format!("segment type `{}` contains `[`, `]` or `/`", kind),
            ));
        }
        if value.is_empty() {
            return Err(Error::malformed(input, format!("segment `{}` has an empty value", body)));
        }
        if value.contains('[') {
            return Err(Error::malformed(input, format!("segment `{}` contains `[`", body)));
        }
        Ok(Segment::new(kind, value))
    }
}

impl FromStr for UniqueId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::malformed(s, "empty identifier"));
        }
        let mut segments = vec![];
        let mut rest = s;
        loop {
            if !rest.starts_with('[') {
                return Err(Error::malformed(s, format!("expected `[` at `{}`", rest)));
            }
            let end = match rest.find(']') {
                Some(end) => end,
                None => return Err(Error::malformed(s, "unterminated segment")),
            };
            segments.push(Self::parse_segment(s, &rest[1..end])?);
            rest = &rest[end + 1..];
            if rest.is_empty() {
                break;
            }
            rest = match rest.strip_prefix('/') {
                Some(next) => next,
                None => return Err(Error::malformed(s, format!("expected `/` at `{}`", rest))),
            };
        }
        Ok(Self { segments })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}:{}]", self.kind, self.value)
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            segment.fmt(f)?;
        }
        Ok(())
    }
}
