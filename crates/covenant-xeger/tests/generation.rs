//! Integration tests for regex-driven text generation.
//!
//! Generated strings are checked against the `regex` crate, which acts as an
//! independent matcher for the same expressions.

use covenant_xeger::Xeger;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use regex::Regex;

fn full_match(pattern: &str) -> Regex {
    Regex::new(&format!("(?s)^(?:{pattern})$")).unwrap()
}

fn generate_many(xeger: &mut Xeger, count: usize) -> Vec<String> {
    (0..count).map(|_| xeger.generate()).collect()
}

#[test]
fn test_generates_bounded_repetition() {
    let regex = "[ab]{4,6}c";
    let matcher = full_match(regex);
    let mut xeger = Xeger::from_entropy(regex).unwrap();
    for _ in 0..100 {
        let text = xeger.generate();
        assert!(matcher.is_match(&text), "{text:?} does not match {regex}");
        assert!(text.ends_with('c'));
    }
}

#[test]
fn test_iteration_limit_of_one() {
    let mut xeger = Xeger::from_entropy("[ab]{5}")
        .unwrap()
        .with_iteration_limit(1);
    for _ in 0..100 {
        assert_eq!(xeger.generate().len(), 1);
    }
}

#[test]
fn test_digit_shorthand() {
    let matcher = full_match("\\d+");
    let mut xeger = Xeger::from_entropy("\\d+").unwrap();
    for _ in 0..100 {
        let text = xeger.generate();
        assert!(!text.is_empty());
        assert!(matcher.is_match(&text));
    }
}

#[test]
fn test_word_shorthand() {
    let matcher = full_match("\\w+");
    let mut xeger = Xeger::from_entropy("\\w+").unwrap();
    for _ in 0..100 {
        assert!(matcher.is_match(&xeger.generate()));
    }
}

#[test]
fn test_whitespace_shorthand() {
    let matcher = full_match("\\s+");
    let mut xeger = Xeger::from_entropy("\\s+").unwrap();
    for _ in 0..100 {
        assert!(matcher.is_match(&xeger.generate()));
    }
}

#[test]
fn test_same_seed_same_sequence() {
    for seed in 0..50 {
        let mut first = Xeger::new("[ab]{4,6}c", StdRng::seed_from_u64(seed)).unwrap();
        let mut second = Xeger::new("[ab]{4,6}c", StdRng::seed_from_u64(seed)).unwrap();
        assert_eq!(generate_many(&mut first, 100), generate_many(&mut second, 100));
    }
}

#[test]
fn test_real_world_patterns() {
    let patterns = [
        "[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}",
        "[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\\.[a-zA-Z]{2,6}",
        "(\\d\\d\\d\\d)-(0[1-9]|1[012])-(0[1-9]|[12][0-9]|3[01])",
        "-?(\\d*\\.\\d+|\\d+)",
        "(true|false)",
    ];
    for pattern in patterns {
        let matcher = full_match(pattern);
        let mut xeger = Xeger::seeded(pattern, 99).unwrap().with_iteration_limit(10_000);
        for _ in 0..50 {
            let text = xeger.generate();
            assert!(matcher.is_match(&text), "{text:?} does not match {pattern}");
        }
    }
}

#[test]
fn test_negated_class_with_shorthand() {
    let pattern = "((http[s]?|ftp):/)/?([^:/\\s]+)(:[0-9]{1,5})?";
    let mut xeger = Xeger::seeded(pattern, 11).unwrap();
    for _ in 0..50 {
        let text = xeger.generate();
        assert!(text.starts_with("http") || text.starts_with("ftp"));
        assert!(!text.contains(' '));
        assert!(xeger.automaton().accepts(&text));
    }
}

#[test]
fn test_supplementary_literals_and_classes() {
    for pattern in ["a\u{1F600}b", "x[\u{10000}-\u{10FFFF}]+y", "[^a-z]{4}"] {
        let matcher = full_match(pattern);
        let mut xeger = Xeger::seeded(pattern, 5).unwrap();
        for _ in 0..50 {
            let text = xeger.generate();
            assert!(matcher.is_match(&text), "{text:?} does not match {pattern}");
        }
    }
}

fn regex_strategy() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        "[a-e]".prop_map(|s: String| s),
        Just("[a-f]".to_string()),
        Just("[^a-y]".to_string()),
        Just(".".to_string()),
        Just("\\d".to_string()),
        Just("\\w".to_string()),
        Just("\\s".to_string()),
        Just("\\.".to_string()),
    ];
    leaf.prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a}{b}")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("({a}|{b})")),
            inner.clone().prop_map(|a| format!("({a})*")),
            inner.clone().prop_map(|a| format!("({a})+")),
            inner.clone().prop_map(|a| format!("({a})?")),
            (inner, 0u32..3, 0u32..3)
                .prop_map(|(a, min, extra)| format!("({a}){{{min},{}}}", min + extra)),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_generated_text_matches(pattern in regex_strategy(), seed in any::<u64>()) {
        let matcher = full_match(&pattern);
        let mut xeger = Xeger::seeded(&pattern, seed).unwrap().with_iteration_limit(100_000);
        for _ in 0..10 {
            let text = xeger.generate();
            prop_assert!(matcher.is_match(&text), "{:?} does not match {}", text, pattern);
            prop_assert!(xeger.automaton().accepts(&text));
        }
    }

    #[test]
    fn prop_iteration_limit_bounds_length(limit in 0usize..20, seed in any::<u64>()) {
        let mut xeger = Xeger::seeded("[a-z]+", seed).unwrap().with_iteration_limit(limit);
        prop_assert!(xeger.generate().chars().count() <= limit);
    }
}
