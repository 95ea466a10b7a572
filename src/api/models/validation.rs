//! Field paths and the field-path-indexed validation error tree.
//!
//! Paths render the way the form addresses its controls, e.g.
//! `flows[0].flowDetails[1].action`, and parse back from the same text.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a value inside a use case document.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The document root. Whole-payload errors attach here.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Where this path lands after the element `removed` of `array` is deleted.
    ///
    /// Paths inside the removed element vanish (`None`); paths inside later
    /// siblings move up by one index; everything else is unchanged.
    pub fn after_removal(&self, array: &FieldPath, removed: usize) -> Option<FieldPath> {
        if !self.starts_with(array) {
            return Some(self.clone());
        }
        let depth = array.0.len();
        match self.0.get(depth) {
            Some(PathSegment::Index(i)) if *i == removed => None,
            Some(PathSegment::Index(i)) if *i > removed => {
                let mut segments = self.0.clone();
                segments[depth] = PathSegment::Index(i - 1);
                Some(FieldPath(segments))
            }
            _ => Some(self.clone()),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if position == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        for part in s.split('.').filter(|p| !p.is_empty()) {
            let (key, mut rest) = match part.find('[') {
                Some(open) => (&part[..open], &part[open..]),
                None => (part, ""),
            };
            if !key.is_empty() {
                segments.push(PathSegment::Key(key.to_string()));
            }
            while let Some(stripped) = rest.strip_prefix('[') {
                let close = stripped
                    .find(']')
                    .ok_or_else(|| format!("unterminated index in path: {s}"))?;
                let index = stripped[..close]
                    .parse::<usize>()
                    .map_err(|_| format!("invalid index in path: {s}"))?;
                segments.push(PathSegment::Index(index));
                rest = &stripped[close + 1..];
            }
            if !rest.is_empty() {
                return Err(format!("unexpected characters in path: {s}"));
            }
        }
        Ok(FieldPath(segments))
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Validation failures keyed by the field they belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<FieldPath, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single message attached to the document root.
    pub fn single(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(FieldPath::root(), message);
        errors
    }

    pub fn add(&mut self, path: FieldPath, message: impl Into<String>) {
        self.0.entry(path).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields carrying at least one message.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, path: &FieldPath) -> Option<&[String]> {
        self.0.get(path).map(Vec::as_slice)
    }

    /// Lookup by rendered path, e.g. `errors.at("flows[0].frequency")`.
    pub fn at(&self, path: &str) -> Option<&[String]> {
        path.parse::<FieldPath>().ok().and_then(|p| self.get(&p))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.at(path).is_some()
    }

    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &[String])> {
        self.0.iter().map(|(path, messages)| (path, messages.as_slice()))
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Replace every entry at or below `prefix` with the matching entries of `fresh`.
    pub fn replace_subtree(&mut self, prefix: &FieldPath, fresh: &ValidationErrors) {
        self.0.retain(|path, _| !path.starts_with(prefix));
        for (path, messages) in &fresh.0 {
            if path.starts_with(prefix) {
                self.0.insert(path.clone(), messages.clone());
            }
        }
    }

    /// Re-index after the element `removed` of `array` has been deleted.
    pub fn shift_after_removal(&mut self, array: &FieldPath, removed: usize) {
        let entries = std::mem::take(&mut self.0);
        self.0 = entries
            .into_iter()
            .filter_map(|(path, messages)| {
                path.after_removal(array, removed).map(|p| (p, messages))
            })
            .collect();
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .0
            .iter()
            .map(|(path, messages)| {
                if path.is_root() {
                    messages.join("; ")
                } else {
                    format!("{path}: {}", messages.join("; "))
                }
            })
            .collect();
        f.write_str(&rendered.join(", "))
    }
}

/// Deserialize a JSON value, attaching a type error to the field it occurred in.
pub fn decode_json<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, ValidationErrors> {
    serde_path_to_error::deserialize(value).map_err(|e| {
        let path = e
            .path()
            .to_string()
            .parse::<FieldPath>()
            .unwrap_or_else(|_| FieldPath::root());
        let mut errors = ValidationErrors::new();
        errors.add(path, e.into_inner().to_string());
        errors
    })
}

/// Checks a value against the document schema, collecting every failure.
pub trait Validate {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors);

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.validate_at(&FieldPath::root(), &mut errors);
        errors.into_result()
    }
}

/// Required-string rule: non-blank after trimming.
pub(crate) fn require_text(
    value: &str,
    path: FieldPath,
    message: &str,
    errors: &mut ValidationErrors,
) {
    if value.trim().is_empty() {
        errors.add(path, message);
    }
}
