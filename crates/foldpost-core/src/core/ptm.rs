//! Post-translational modification annotations.
//!
//! Annotations arrive as pasted text from modification-site databases, e.g.
//! `S45-p T99-p K12-m1`, and name residues in source numbering. They are parsed
//! once, filtered to a residue window, and mapped to internal indices of a
//! concrete structure before use.

use crate::core::models::structure::Structure;
use phf::phf_map;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

const PHOSPHO_MARKER: &str = "-p";

static SITE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w)(\d+)-(\w+)").expect("static pattern is valid"));

/// token -> (patch name, required residue)
static PATCHES: phf::Map<&'static str, (&'static str, Option<&'static str>)> = phf_map! {
    "p" => ("phosphorylated", None),
    "ac" => ("acetylated", None),
    "m1" => ("monomethylated", Some("LYS")),
    "m2" => ("dimethylated", Some("LYS")),
    "m3" => ("trimethylated", Some("LYS")),
};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModificationKind {
    Phosphorylation,
    Acetylation,
    Monomethylation,
    Dimethylation,
    Trimethylation,
    Ubiquitination,
    Other(String),
}

impl ModificationKind {
    pub fn token(&self) -> &str {
        match self {
            ModificationKind::Phosphorylation => "p",
            ModificationKind::Acetylation => "ac",
            ModificationKind::Monomethylation => "m1",
            ModificationKind::Dimethylation => "m2",
            ModificationKind::Trimethylation => "m3",
            ModificationKind::Ubiquitination => "ub",
            ModificationKind::Other(token) => token,
        }
    }

    /// Chemical patch applied for this kind; `None` for kinds with no patch.
    pub fn patch(&self) -> Option<&'static str> {
        PATCHES.get(self.token()).map(|(patch, _)| *patch)
    }

    /// Residue type the patch requires, if any.
    pub fn restriction(&self) -> Option<&'static str> {
        PATCHES.get(self.token()).and_then(|(_, restriction)| *restriction)
    }

    /// Whether the patch may be applied to a residue of the given type.
    pub fn accepts(&self, residue_name: &str) -> bool {
        match self.restriction() {
            Some(required) => residue_name.eq_ignore_ascii_case(required),
            None => true,
        }
    }
}

impl FromStr for ModificationKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "p" => ModificationKind::Phosphorylation,
            "ac" => ModificationKind::Acetylation,
            "m1" => ModificationKind::Monomethylation,
            "m2" => ModificationKind::Dimethylation,
            "m3" => ModificationKind::Trimethylation,
            "ub" => ModificationKind::Ubiquitination,
            other => ModificationKind::Other(other.to_string()),
        })
    }
}

impl fmt::Display for ModificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl Serialize for ModificationKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

impl<'de> Deserialize<'de> for ModificationKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        let Ok(kind) = token.parse::<ModificationKind>();
        Ok(kind)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("Annotation text has no phosphosite marker ('-p', e.g. 'S45-p'): {0:?}")]
    MissingMarker(String),
}

/// Modification sites in source numbering, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Annotation {
    sites: BTreeMap<ModificationKind, Vec<isize>>,
}

/// Modification sites resolved to 1-based internal residue indices.
pub type ResolvedSites = BTreeMap<ModificationKind, Vec<usize>>;

impl Annotation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: ModificationKind, number: isize) {
        self.sites.entry(kind).or_default().push(number);
    }

    pub fn get(&self, kind: &ModificationKind) -> Option<&[isize]> {
        self.sites.get(kind).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModificationKind, &[isize])> {
        self.sites.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sites.values().map(Vec::len).sum()
    }

    /// Maps source numbering on `chain` to internal indices of `structure`.
    ///
    /// Numbers absent from the structure are dropped.
    pub fn to_internal(&self, structure: &Structure, chain: char) -> ResolvedSites {
        self.sites
            .iter()
            .map(|(kind, numbers)| {
                let indices = numbers
                    .iter()
                    .filter_map(|&n| structure.pdb_to_internal(n, chain))
                    .collect();
                (kind.clone(), indices)
            })
            .collect()
    }
}

/// Extracts `<residue><number>-<modification>` triples from pasted text.
///
/// Sites outside `[minimum, maximum]` are dropped; a `maximum` below 1 means no
/// upper bound. Fails when the text lacks the `-p` phosphosite marker; text with
/// the marker but no parsable site yields an empty annotation.
pub fn parse_annotation(
    raw: &str,
    minimum: isize,
    maximum: isize,
) -> Result<Annotation, AnnotationError> {
    if !raw.contains(PHOSPHO_MARKER) {
        return Err(AnnotationError::MissingMarker(raw.chars().take(80).collect()));
    }
    let mut annotation = Annotation::new();
    for caps in SITE_PATTERN.captures_iter(raw) {
        let Ok(number) = caps[2].parse::<isize>() else {
            continue;
        };
        if number < minimum || (maximum >= 1 && number > maximum) {
            continue;
        }
        let Ok(kind) = caps[3].parse::<ModificationKind>();
        annotation.insert(kind, number);
    }
    Ok(annotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::two_chain_structure;

    #[test]
    fn parse_annotation_filters_window_and_groups_by_kind() {
        let annotation = parse_annotation("S45-p T99-p K12-m1", 1, 50).unwrap();
        assert_eq!(annotation.get(&ModificationKind::Phosphorylation), Some(&[45][..]));
        assert_eq!(annotation.get(&ModificationKind::Monomethylation), Some(&[12][..]));
        assert_eq!(annotation.len(), 2);
    }

    #[test]
    fn parse_annotation_without_upper_bound_keeps_everything() {
        let annotation = parse_annotation("S45-p\tT99-p\nK12-m1", 1, -1).unwrap();
        assert_eq!(annotation.get(&ModificationKind::Phosphorylation), Some(&[45, 99][..]));
    }

    #[test]
    fn parse_annotation_keeps_unknown_tokens() {
        let annotation = parse_annotation("N7-gl S8-p", 1, 0).unwrap();
        assert_eq!(
            annotation.get(&ModificationKind::Other("gl".to_string())),
            Some(&[7][..])
        );
    }

    #[test]
    fn parse_annotation_without_marker_is_a_format_error() {
        for raw in ["nothing to see here", "K12-m1 K20-ac"] {
            assert!(
                matches!(
                    parse_annotation(raw, 1, 0),
                    Err(AnnotationError::MissingMarker(_))
                ),
                "{raw}"
            );
        }
    }

    #[test]
    fn parse_annotation_with_marker_but_no_site_is_empty() {
        let annotation = parse_annotation("xx-p", 1, 0).unwrap();
        assert!(annotation.is_empty());
    }

    #[test]
    fn parse_annotation_with_everything_filtered_is_empty_not_error() {
        let annotation = parse_annotation("S450-p", 1, 50).unwrap();
        assert!(annotation.is_empty());
    }

    #[test]
    fn methylation_is_restricted_to_lysine() {
        assert!(ModificationKind::Trimethylation.accepts("LYS"));
        assert!(!ModificationKind::Monomethylation.accepts("ARG"));
        assert!(ModificationKind::Phosphorylation.accepts("THR"));
        assert_eq!(ModificationKind::Ubiquitination.patch(), None);
        assert_eq!(ModificationKind::Acetylation.patch(), Some("acetylated"));
    }

    #[test]
    fn to_internal_drops_unknown_numbers() {
        let structure = two_chain_structure(3, 2);
        let annotation = parse_annotation("S1-p K2-ac S40-p", 1, 0).unwrap();
        let resolved = annotation.to_internal(&structure, 'B');
        assert_eq!(resolved[&ModificationKind::Phosphorylation], vec![4]);
        assert_eq!(resolved[&ModificationKind::Acetylation], vec![5]);
    }

    #[test]
    fn annotation_serializes_with_tokens_as_keys() {
        let annotation = parse_annotation("S45-p K12-m1", 1, 0).unwrap();
        let json = serde_json::to_string(&annotation).unwrap();
        assert_eq!(json, r#"{"p":[45],"m1":[12]}"#);
        let back: Annotation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, annotation);
    }
}
