//! Source-text to translation lookup.
//!
//! Exact matches on the trimmed detected text win. Otherwise the first entry,
//! in declaration order, whose key contains the text or is contained by it is
//! used. Overlapping keys can therefore shadow each other; callers control the
//! outcome through the order of the table.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Substring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationMatch<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub kind: MatchKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationTable {
    entries: Vec<(String, String)>,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, or replaces the target of an existing source in place.
    pub fn insert(&mut self, source: impl Into<String>, target: impl Into<String>) {
        let source = source.into();
        let target = target.into();
        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| *key == source) {
            entry.1 = target;
        } else {
            self.entries.push((source, target));
        }
    }

    pub fn extend(&mut self, other: TranslationTable) {
        for (source, target) in other.entries {
            self.insert(source, target);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(source, target)| (source.as_str(), target.as_str()))
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == source)
            .map(|(_, target)| target.as_str())
    }

    pub fn lookup(&self, detected: &str) -> Option<TranslationMatch<'_>> {
        let text = detected.trim();
        if text.is_empty() {
            return None;
        }

        if let Some((source, target)) = self.entries.iter().find(|(key, _)| key == text) {
            return Some(TranslationMatch {
                source,
                target,
                kind: MatchKind::Exact,
            });
        }

        self.entries
            .iter()
            .filter(|(key, _)| !key.is_empty())
            .find(|(key, _)| key.contains(text) || text.contains(key.as_str()))
            .map(|(source, target)| TranslationMatch {
                source,
                target,
                kind: MatchKind::Substring,
            })
    }
}

impl<S: Into<String>, T: Into<String>> FromIterator<(S, T)> for TranslationTable {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        let mut table = TranslationTable::new();
        for (source, target) in iter {
            table.insert(source, target);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TranslationTable {
        [
            ("ХАХА", "Haha"),
            ("ХА", "Ha-\nHa-\nHa"),
            ("ПРИВЕТ", "HELLO"),
            ("", "ignored"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn every_key_matches_itself_exactly() {
        let table = table();
        for (key, value) in table.iter().filter(|(key, _)| !key.is_empty()) {
            let found = table.lookup(key).expect("exact match");
            assert_eq!(found.target, value);
            assert_eq!(found.kind, MatchKind::Exact);
        }
    }

    #[test]
    fn exact_match_beats_earlier_substring_entry() {
        // "ХА" is a substring of the earlier "ХАХА" key
        let table = table();
        let found = table.lookup("  ХА ").expect("match");
        assert_eq!(found.target, "Ha-\nHa-\nHa");
        assert_eq!(found.kind, MatchKind::Exact);
    }

    #[test]
    fn first_substring_hit_in_declaration_order_wins() {
        let table = table();

        let found = table.lookup("ХАХАХА").expect("key inside text");
        assert_eq!(found.source, "ХАХА");
        assert_eq!(found.kind, MatchKind::Substring);

        let found = table.lookup("РИВ").expect("text inside key");
        assert_eq!(found.target, "HELLO");
    }

    #[test]
    fn unrelated_or_blank_text_has_no_match() {
        let table = table();
        assert_eq!(table.lookup("МИР"), None);
        assert_eq!(table.lookup("   "), None);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut table = table();
        table.insert("ХАХА", "Hahaha");
        assert_eq!(table.len(), 4);
        assert_eq!(table.iter().next(), Some(("ХАХА", "Hahaha")));
        assert_eq!(table.get("ХАХА"), Some("Hahaha"));
    }
}
