//! Sentence probability scoring
//!
//! Gives any sentence a pseudo-random score between 0 and 100 percent

use rand::Rng;

/// Trim, lowercase and collapse whitespace runs into single spaces
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Uniform value in `[0, 100]` rounded to two decimals
pub fn random_probability() -> f64 {
    let value = rand::thread_rng().gen_range(0.0..=100.0_f64);
    (value * 100.0).round() / 100.0
}

/// Build the reply for the probability command
pub fn score_sentence(sentence: &str) -> String {
    format_score(&normalize(sentence), random_probability())
}

fn format_score(normalized: &str, probability: f64) -> String {
    format!(
        "🔍 Probability for: \"{}\"\n🎯 Result: **{:.2}%**",
        normalized, probability
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Will It   RAIN\ttomorrow?\n"), "will it rain tomorrow?");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_random_probability_range() {
        for _ in 0..1_000 {
            let p = random_probability();
            assert!((0.0..=100.0).contains(&p), "out of range: {}", p);
            assert_eq!((p * 100.0).round() / 100.0, p);
        }
    }

    #[test]
    fn test_format_score() {
        let reply = format_score("will it rain", 42.5);
        assert_eq!(reply, "🔍 Probability for: \"will it rain\"\n🎯 Result: **42.50%**");
    }

    #[test]
    fn test_score_sentence_uses_normalized_text() {
        let reply = score_sentence("  Hello   World ");
        assert!(reply.contains("\"hello world\""));
        assert!(reply.ends_with("%**"));
    }
}
