//! Name reconciliation across the food-balance, trade and impact-factor
//! vocabularies.
//!
//! Every key that takes part in a join goes through [`normalize_name`] on
//! both sides. Mappings are multi-valued: a source name may resolve to
//! several targets and each target produces its own downstream row.

use std::collections::BTreeMap;

/// Normalize a free-text name for joining.
///
/// Non-breaking spaces become ordinary spaces, runs of whitespace collapse
/// to a single space and the result is trimmed.
///
/// ```
/// use food_footprint::reconcile::normalize_name;
///
/// assert_eq!(normalize_name(" A\u{a0}\u{a0}B "), "A B");
/// assert_eq!(normalize_name("Rice  (Milled Equivalent)"), "Rice (Milled Equivalent)");
/// ```
pub fn normalize_name(value: &str) -> String {
    let replaced = value.replace('\u{a0}', " ");
    let mut out = String::with_capacity(replaced.len());
    for part in replaced.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(part);
    }
    out
}

/// Outcome of a single mapping lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch<'a> {
    /// The key has no entry in the mapping table.
    Unmatched,
    Unique(&'a str),
    /// The table holds several targets for the key; all of them are kept.
    Ambiguous(&'a [String]),
}

impl NameMatch<'_> {
    pub fn is_unmatched(&self) -> bool {
        matches!(self, NameMatch::Unmatched)
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, NameMatch::Ambiguous(_))
    }
}

/// Multi-valued association from one controlled vocabulary to another.
#[derive(Debug, Clone, Default)]
pub struct NameMapping {
    entries: BTreeMap<String, Vec<String>>,
}

impl NameMapping {
    /// Build a mapping from (source, target) pairs.
    ///
    /// Both sides are normalized. Duplicate pairs are kept as-is so that the
    /// fan-out they cause downstream stays visible.
    pub fn from_pairs<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut entries: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (source, target) in pairs {
            let source = normalize_name(source.as_ref());
            let target = normalize_name(target.as_ref());
            if source.is_empty() || target.is_empty() {
                continue;
            }
            entries.entry(source).or_default().push(target);
        }
        Self { entries }
    }

    pub fn lookup(&self, key: &str) -> NameMatch<'_> {
        match self.entries.get(&normalize_name(key)).map(Vec::as_slice) {
            None | Some([]) => NameMatch::Unmatched,
            Some([single]) => NameMatch::Unique(single),
            Some(many) => NameMatch::Ambiguous(many),
        }
    }

    /// All targets for `key`, empty when unmatched.
    pub fn targets(&self, key: &str) -> &[String] {
        self.entries
            .get(&normalize_name(key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The reverse direction of this mapping.
    pub fn inverted(&self) -> Self {
        let mut entries: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (source, targets) in &self.entries {
            for target in targets {
                entries
                    .entry(target.clone())
                    .or_default()
                    .push(source.clone());
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_nbsp_and_runs() {
        assert_eq!(normalize_name(" A\u{a0}\u{a0}B "), "A B");
        assert_eq!(normalize_name("\tBovine   Meat\n"), "Bovine Meat");
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name(" \u{a0} "), "");
    }

    #[test]
    fn test_lookup_outcomes() {
        let mapping = NameMapping::from_pairs([
            ("Wheat and products", "Wheat"),
            ("Maize and products", "Maize"),
            ("Maize and products", "Maize flour"),
        ]);

        assert_eq!(mapping.lookup("Wheat and products"), NameMatch::Unique("Wheat"));
        assert!(mapping.lookup("Barley").is_unmatched());
        assert!(!mapping.lookup("Wheat and products").is_ambiguous());
        assert!(mapping.lookup("Maize and products").is_ambiguous());
        match mapping.lookup("Maize\u{a0}and  products ") {
            NameMatch::Ambiguous(targets) => {
                assert_eq!(targets, ["Maize".to_string(), "Maize flour".to_string()]);
            }
            other => panic!("expected ambiguous match, got {other:?}"),
        }
    }

    #[test]
    fn test_targets_normalizes_both_sides() {
        let mapping = NameMapping::from_pairs([(" Rice\u{a0}(Milled) ", "Rice  paddy")]);
        assert_eq!(mapping.targets("Rice (Milled)"), ["Rice paddy".to_string()]);
        assert!(mapping.targets("Rice").is_empty());
    }

    #[test]
    fn test_duplicate_pairs_fan_out() {
        let mapping = NameMapping::from_pairs([("Oats", "Oats"), ("Oats", "Oats")]);
        assert_eq!(mapping.targets("Oats").len(), 2);
    }

    #[test]
    fn test_inverted() {
        let mapping = NameMapping::from_pairs([("Apples", "Fruit"), ("Pears", "Fruit")]);
        let inverse = mapping.inverted();
        assert_eq!(
            inverse.targets("Fruit"),
            ["Apples".to_string(), "Pears".to_string()]
        );
        assert_eq!(inverse.len(), 1);
    }

    #[test]
    fn test_empty_names_skipped() {
        let mapping = NameMapping::from_pairs([("  ", "Wheat"), ("Wheat", "")]);
        assert!(mapping.is_empty());
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in "\\PC*") {
            let once = normalize_name(&s);
            prop_assert_eq!(normalize_name(&once), once);
        }

        #[test]
        fn normalize_with_nbsp_is_idempotent(parts in prop::collection::vec("[a-z]{0,4}", 0..6)) {
            let s = parts.join("\u{a0} ");
            let once = normalize_name(&s);
            prop_assert!(!once.contains('\u{a0}'), "output still contains NBSP: {:?}", once);
            prop_assert!(!once.contains("  "));
            prop_assert_eq!(normalize_name(&once), once);
        }
    }
}
