//! Buzzword counting over transcripts
//!
//! A fixed dictionary of category regexes is applied to the transcript text;
//! the per-category counts feed the market matcher and the chat reply table.

use regex::Regex;
use std::fmt::Write as _;

/// One buzzword category and its pattern
struct WordGroup {
    label: &'static str,
    pattern: Regex,
}

/// Compiled buzzword dictionary
pub struct WordCounter {
    groups: Vec<WordGroup>,
}

/// Per-category counts, ordered by category label
#[derive(Debug, Clone)]
pub struct WordCounts {
    entries: Vec<(String, usize)>,
}

impl WordCounter {
    /// The standard buzzword dictionary for the watched channel.
    pub fn standard() -> Self {
        let table: &[(&'static str, &'static str)] = &[
            ("Dollar", r"(?i)\bdollar(s)?\b"),
            ("Thousand/Million", r"(?i)\b(thousand|million)(s)?\b"),
            ("Challenge", r"(?i)\bchallenge(s)?\b"),
            ("Eliminated", r"(?i)\beliminated?\b"),
            ("Trap", r"(?i)\btrap(s)?\b"),
            ("Car/Supercar", r"(?i)\b(car|supercar)(s)?\b"),
            ("Tesla/Lamborghini", r"(?i)\b(tesla|lamborghini)(s)?\b"),
            ("Helicopter/Jet", r"(?i)\b(helicopter|jet)(s)?\b"),
            ("Island", r"(?i)\bisland(s)?\b"),
            ("Mystery Box", r"(?i)\bmystery box(es)?\b"),
            ("Massive", r"(?i)\bmassive\b"),
            ("World's Biggest/Largest", r"(?i)\bworld'?s?\s+(biggest|largest)\b"),
            ("Beast Games", r"(?i)\bbeast games\b"),
            ("Feastables", r"(?i)\bfeastables\b"),
            ("MrBeast", r"(?i)\bmr\.?\s*beast\b"),
            ("Insane", r"(?i)\binsane\b"),
            ("Subscribe", r"(?i)\bsubscrib(e|ed|ing|er|s)?\b"),
        ];

        let groups = table
            .iter()
            .map(|(label, pattern)| WordGroup {
                label,
                pattern: Regex::new(pattern).expect("buzzword pattern is valid"),
            })
            .collect();

        Self { groups }
    }

    /// Count every category against the transcript.
    pub fn count(&self, transcript: &str) -> WordCounts {
        let mut entries: Vec<(String, usize)> = self
            .groups
            .iter()
            .map(|g| (g.label.to_string(), g.pattern.find_iter(transcript).count()))
            .collect();
        entries.sort();

        WordCounts { entries }
    }
}

impl WordCounts {
    pub fn get(&self, label: &str) -> usize {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), *c))
    }

    /// Monospace count table for chat replies and console output.
    pub fn to_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:<30} {:>8}", "Category", "Count");
        let _ = writeln!(out, "{}", "-".repeat(40));
        for (label, count) in &self.entries {
            let _ = writeln!(out, "{:<30} {:>8}", label, count);
        }
        let _ = writeln!(out, "{}", "-".repeat(40));
        let _ = writeln!(out, "{:<30} {:>8}", "TOTAL", self.total());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_fixture_transcript() {
        let counter = WordCounter::standard();
        let counts = counter.count(
            "Today we buried a Lamborghini on a private island. This challenge \
             is insane, one million dollars to the winner! Don't forget to \
             subscribe. MrBeast here, and this is the world's biggest mystery box.",
        );

        assert_eq!(counts.get("Tesla/Lamborghini"), 1);
        assert_eq!(counts.get("Island"), 1);
        assert_eq!(counts.get("Challenge"), 1);
        assert_eq!(counts.get("Insane"), 1);
        assert_eq!(counts.get("Thousand/Million"), 1);
        assert_eq!(counts.get("Dollar"), 1);
        assert_eq!(counts.get("Subscribe"), 1);
        assert_eq!(counts.get("MrBeast"), 1);
        assert_eq!(counts.get("World's Biggest/Largest"), 1);
        assert_eq!(counts.get("Mystery Box"), 1);
        assert_eq!(counts.get("Trap"), 0);
    }

    #[test]
    fn test_word_boundaries() {
        let counter = WordCounter::standard();
        // "scar" must not count as "car", "trapped" must not count as "trap"
        let counts = counter.count("a scar and someone trapped in oscars");
        assert_eq!(counts.get("Car/Supercar"), 0);
        assert_eq!(counts.get("Trap"), 0);

        let counts = counter.count("two cars and a trap");
        assert_eq!(counts.get("Car/Supercar"), 1);
        assert_eq!(counts.get("Trap"), 1);
    }

    #[test]
    fn test_case_insensitive() {
        let counter = WordCounter::standard();
        let counts = counter.count("MASSIVE massive Massive");
        assert_eq!(counts.get("Massive"), 3);
    }

    #[test]
    fn test_mrbeast_variants() {
        let counter = WordCounter::standard();
        let counts = counter.count("mrbeast, Mr Beast and mr. beast walked in");
        assert_eq!(counts.get("MrBeast"), 3);
    }

    #[test]
    fn test_table_has_total() {
        let counter = WordCounter::standard();
        let counts = counter.count("subscribe subscribe");
        let table = counts.to_table();
        assert!(table.contains("Category"));
        assert!(table.contains("TOTAL"));
        assert!(table.contains("Subscribe"));
    }
}
