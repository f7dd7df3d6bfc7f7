//! Random walks over a compiled automaton.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::automaton::Automaton;
use crate::error::RegexResult;

/// Default number of characters emitted before a walk is cut short.
pub const DEFAULT_ITERATION_LIMIT: usize = 200;

/// Expands the `\d`, `\w` and `\s` shorthands into explicit classes.
///
/// This is a plain textual replacement, so it also applies inside bracket
/// classes (`[\d]` becomes `[[0-9]]`, which the parser reads as a union).
#[must_use]
pub fn translate_shorthand(regex: &str) -> String {
    regex
        .replace("\\d", "[0-9]")
        .replace("\\w", "[A-Za-z0-9_]")
        .replace("\\s", "[ \t\r\n]")
}

/// Draws a uniform integer from `min..=max`.
///
/// # Panics
///
/// Panics if `min > max`.
pub fn random_int<R: Rng>(min: usize, max: usize, rng: &mut R) -> usize {
    rng.random_range(min..=max)
}

/// Generates strings matching a regular expression.
///
/// ```
/// use covenant_xeger::Xeger;
///
/// let mut xeger = Xeger::seeded("[ab]{4,6}c", 42).unwrap();
/// let text = xeger.generate();
/// assert!(text.ends_with('c'));
/// ```
#[derive(Debug, Clone)]
pub struct Xeger<R: Rng = StdRng> {
    automaton: Automaton,
    rng: R,
    iteration_limit: usize,
}

impl Xeger<StdRng> {
    /// Creates a generator seeded from operating system entropy.
    ///
    /// # Errors
    ///
    /// Returns an error when `regex` does not compile.
    pub fn from_entropy(regex: &str) -> RegexResult<Self> {
        Self::new(regex, StdRng::from_os_rng())
    }

    /// Creates a reproducible generator from a fixed seed.
    ///
    /// # Errors
    ///
    /// Returns an error when `regex` does not compile.
    pub fn seeded(regex: &str, seed: u64) -> RegexResult<Self> {
        Self::new(regex, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Xeger<R> {
    /// Compiles `regex` and pairs it with `rng`.
    ///
    /// # Errors
    ///
    /// Returns an error when `regex` does not compile.
    pub fn new(regex: &str, rng: R) -> RegexResult<Self> {
        let pattern = translate_shorthand(regex);
        let automaton = Automaton::from_regex(&pattern)?;
        trace!(
            regex = %regex,
            states = automaton.state_count(),
            "compiled regex automaton"
        );
        Ok(Self {
            automaton,
            rng,
            iteration_limit: DEFAULT_ITERATION_LIMIT,
        })
    }

    /// Overrides the iteration limit for this generator.
    #[must_use]
    pub fn with_iteration_limit(mut self, limit: usize) -> Self {
        self.iteration_limit = limit;
        self
    }

    /// Returns the iteration limit.
    pub fn iteration_limit(&self) -> usize {
        self.iteration_limit
    }

    /// Returns the compiled automaton.
    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    /// Returns the random source.
    pub fn rng(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Replaces the random source.
    pub fn set_rng(&mut self, rng: R) {
        self.rng = rng;
    }

    /// Generates one string.
    ///
    /// The result matches the expression unless the iteration limit cut the
    /// walk short, in which case it is a prefix of a matching string. An
    /// expression that matches nothing yields the empty string.
    pub fn generate(&mut self) -> String {
        let mut out = String::new();
        let mut current = self.automaton.initial_state();
        let mut steps = 0;
        while steps < self.iteration_limit {
            let Some(state) = self.automaton.states().get(current) else {
                break;
            };
            let transitions = state.transitions();
            if transitions.is_empty() {
                break;
            }
            // At an accepting state option 0 means stop.
            let accept = usize::from(state.is_accept());
            let options = transitions.len() - 1 + accept;
            let option = random_int(0, options, &mut self.rng);
            if accept == 1 && option == 0 {
                break;
            }
            let transition = &transitions[option - accept];
            out.push(self.rng.random_range(transition.min()..=transition.max()));
            current = transition.dest();
            steps += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_shorthand() {
        assert_eq!(translate_shorthand("\\d+"), "[0-9]+");
        assert_eq!(translate_shorthand("\\w"), "[A-Za-z0-9_]");
        assert_eq!(translate_shorthand("\\s"), "[ \t\r\n]");
        assert_eq!(translate_shorthand("\\D"), "\\D");
    }

    #[test]
    fn test_random_int_inclusive() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[random_int(0, 2, &mut rng)] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_generate_literal() {
        let mut xeger = Xeger::seeded("hello", 1).unwrap();
        assert_eq!(xeger.generate(), "hello");
    }

    #[test]
    fn test_generate_supplementary_characters() {
        let mut xeger = Xeger::seeded("a\u{1F600}b", 1).unwrap();
        assert_eq!(xeger.generate(), "a\u{1F600}b");
        let mut emoji = Xeger::seeded("[\u{1F600}-\u{1F64F}]{3}", 2).unwrap();
        for _ in 0..20 {
            let text = emoji.generate();
            assert_eq!(text.chars().count(), 3);
            assert!(emoji.automaton().accepts(&text));
        }
    }

    #[test]
    fn test_generate_empty_language() {
        let mut xeger = Xeger::seeded("[^\\d\\D]", 1).unwrap();
        assert_eq!(xeger.generate(), "");
    }

    #[test]
    fn test_iteration_limit_truncates() {
        let mut xeger = Xeger::seeded("[ab]{5}", 3).unwrap().with_iteration_limit(1);
        assert_eq!(xeger.iteration_limit(), 1);
        for _ in 0..100 {
            assert_eq!(xeger.generate().chars().count(), 1);
        }
    }

    #[test]
    fn test_zero_iteration_limit() {
        let mut xeger = Xeger::seeded("abc", 3).unwrap().with_iteration_limit(0);
        assert_eq!(xeger.generate(), "");
    }

    #[test]
    fn test_set_rng_resets_sequence() {
        let mut xeger = Xeger::seeded("[a-z]{8}", 5).unwrap();
        let first = xeger.generate();
        xeger.set_rng(StdRng::seed_from_u64(5));
        assert_eq!(xeger.generate(), first);
    }

    #[test]
    fn test_invalid_regex() {
        assert!(Xeger::seeded("(ab", 1).is_err());
    }

    #[test]
    fn test_exponential_determinization_is_rejected() {
        let err = Xeger::seeded("[ab]*a[ab]{20}", 1).unwrap_err();
        assert!(matches!(err, crate::RegexError::TooComplex { .. }));
    }

    #[test]
    fn test_from_entropy_generates_match() {
        let mut xeger = Xeger::from_entropy("[0-9]{3}").unwrap();
        let text = xeger.generate();
        assert_eq!(text.len(), 3);
        assert!(xeger.automaton().accepts(&text));
    }
}
