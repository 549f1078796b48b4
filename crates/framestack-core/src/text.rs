/// Tokenize on whitespace and punctuation, lowercase, drop tokens of length
/// <= 2. Shared by the keyword retrieval strategy and the local embedding
/// oracle so both count words the same way.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(|tok| tok.to_lowercase())
        .filter(|tok| tok.len() > 2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_punctuation_and_lowercases() {
        let tokens = tokenize("Fix the Login-Bug, now!");
        assert_eq!(tokens, vec!["fix", "the", "login", "bug", "now"]);
    }

    #[test]
    fn drops_short_tokens() {
        let tokens = tokenize("a an if db or query");
        assert_eq!(tokens, vec!["query"]);
    }
}
