use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Fold a string into a comparison key.
///
/// Diacritics are stripped (NFD decomposition, combining marks dropped),
/// everything that is not alphanumeric is removed, and the result is
/// lowercased. `"João Silva"`, `"joao silva"` and `"JOAO-SILVA"` all fold to
/// `"joaosilva"`.
pub fn fold_key(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Wrap text at approximately the given width
pub fn wrap_text(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if line_len + word_len + 1 > width && line_len > 0 {
            result.push('\n');
            line_len = 0;
        }
        if line_len > 0 {
            result.push(' ');
            line_len += 1;
        }
        result.push_str(word);
        line_len += word_len;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_key_strips_diacritics_and_case() {
        assert_eq!(fold_key("João"), "joao");
        assert_eq!(fold_key("joao"), "joao");
        assert_eq!(fold_key("JOAO"), "joao");
        assert_eq!(fold_key("Ângela Müller"), "angelamuller");
    }

    #[test]
    fn test_fold_key_drops_punctuation() {
        assert_eq!(fold_key("~ Ana.Paula (Loja) "), "anapaulaloja");
        assert_eq!(fold_key("+55 11 9999-0000"), "5511999990000");
        assert_eq!(fold_key("🙂"), "");
    }

    #[test]
    fn test_wrap_text() {
        let text = "This is a test of the text wrapping function that should wrap at 20 chars";
        let wrapped = wrap_text(text, 20);
        for line in wrapped.lines() {
            assert!(line.len() <= 25);
        }
        assert_eq!(wrapped.split_whitespace().count(), text.split_whitespace().count());
    }
}
