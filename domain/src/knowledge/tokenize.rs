//! Lexical tokenizer shared by indexing and querying.

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be",
    "been", "being", "between", "both", "but", "by", "can", "could", "did", "do", "does", "each",
    "for", "from", "had", "has", "have", "how", "if", "in", "into", "is", "it", "its", "may",
    "more", "most", "no", "not", "of", "on", "or", "other", "our", "over", "such", "than", "that",
    "the", "their", "them", "then", "there", "these", "they", "this", "those", "through", "to",
    "under", "up", "use", "used", "using", "very", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "why", "will", "with", "would", "you", "your",
];

fn is_stopword(token: &str) -> bool {
    STOPWORDS.binary_search(&token).is_ok()
}

/// Lowercase, split on anything that is not alphanumeric or `-`, drop
/// stopwords and single characters (single digits are kept).
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .map(|t| t.trim_matches('-'))
        .filter(|t| !t.is_empty())
        .filter(|t| {
            let mut chars = t.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c.is_ascii_digit(),
                _ => true,
            }
        })
        .filter(|t| !is_stopword(t))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopwords_sorted_for_binary_search() {
        let mut sorted = STOPWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOPWORDS);
    }

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(
            tokenize("The intensity auto-correlation g2(q, t) of a colloid."),
            vec!["intensity", "auto-correlation", "g2", "colloid"]
        );
    }

    #[test]
    fn test_tokenize_keeps_single_digits() {
        assert_eq!(tokenize("8 ID I beamline"), vec!["8", "id", "beamline"]);
    }

    #[test]
    fn test_tokenize_unicode_and_dashes() {
        assert_eq!(tokenize("Grübel -- two-time"), vec!["grübel", "two-time"]);
    }
}
