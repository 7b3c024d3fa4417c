//! Matching market questions to buzzword categories
//!
//! Each open market question is matched against a fixed keyword table that
//! names the buzzword category it resolves on and the count threshold for a
//! YES resolution.

use crate::words::WordCounts;

/// One question-keyword rule
#[derive(Debug, Clone, Copy)]
pub struct MarketRule {
    pub keyword: &'static str,
    pub category: &'static str,
    pub threshold: usize,
}

/// Keyword table mapping market questions to count categories. First match
/// wins; "mrbeast" sits near the end because nearly every question names the
/// channel, and the specific buzzword must win.
const MARKET_RULES: &[MarketRule] = &[
    MarketRule { keyword: "dollar", category: "Dollar", threshold: 10 },
    MarketRule { keyword: "thousand", category: "Thousand/Million", threshold: 10 },
    MarketRule { keyword: "million", category: "Thousand/Million", threshold: 10 },
    MarketRule { keyword: "challenge", category: "Challenge", threshold: 1 },
    MarketRule { keyword: "eliminated", category: "Eliminated", threshold: 1 },
    MarketRule { keyword: "trap", category: "Trap", threshold: 1 },
    MarketRule { keyword: "supercar", category: "Car/Supercar", threshold: 1 },
    MarketRule { keyword: "car", category: "Car/Supercar", threshold: 1 },
    MarketRule { keyword: "tesla", category: "Tesla/Lamborghini", threshold: 1 },
    MarketRule { keyword: "lamborghini", category: "Tesla/Lamborghini", threshold: 1 },
    MarketRule { keyword: "helicopter", category: "Helicopter/Jet", threshold: 1 },
    MarketRule { keyword: "jet", category: "Helicopter/Jet", threshold: 1 },
    MarketRule { keyword: "island", category: "Island", threshold: 1 },
    MarketRule { keyword: "mystery box", category: "Mystery Box", threshold: 1 },
    MarketRule { keyword: "massive", category: "Massive", threshold: 1 },
    MarketRule { keyword: "world's biggest", category: "World's Biggest/Largest", threshold: 1 },
    MarketRule { keyword: "world's largest", category: "World's Biggest/Largest", threshold: 1 },
    MarketRule { keyword: "beast games", category: "Beast Games", threshold: 1 },
    MarketRule { keyword: "feastables", category: "Feastables", threshold: 1 },
    MarketRule { keyword: "mrbeast", category: "MrBeast", threshold: 1 },
    MarketRule { keyword: "insane", category: "Insane", threshold: 1 },
    MarketRule { keyword: "subscribe", category: "Subscribe", threshold: 1 },
];

/// Whether the counted transcript supports a YES on this market question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Count met the rule's threshold
    Yes {
        category: &'static str,
        count: usize,
        threshold: usize,
    },
    /// Rule matched but the count fell short
    No {
        category: &'static str,
        count: usize,
        threshold: usize,
    },
    /// No rule matches this question
    NoRule,
}

/// Match a market question against the rule table and the counted transcript.
pub fn evaluate(question: &str, counts: &WordCounts) -> Verdict {
    let question = question.to_lowercase();

    let Some(rule) = MARKET_RULES.iter().find(|r| question.contains(r.keyword)) else {
        return Verdict::NoRule;
    };

    let count = counts.get(rule.category);
    if count >= rule.threshold {
        Verdict::Yes {
            category: rule.category,
            count,
            threshold: rule.threshold,
        }
    } else {
        Verdict::No {
            category: rule.category,
            count,
            threshold: rule.threshold,
        }
    }
}
