use deunicode::deunicode_char;

/// Canonical form for comparing listing titles with model names.
///
/// Keeps only alphabetic characters, transliterates them to ASCII
/// ("é" -> "e", "ß" -> "ss") and lowercases the result. Digits,
/// punctuation and whitespace are dropped, so "Submarinér (Used)" and
/// "submariner" compare equal. The output only contains `a-z`, which
/// makes the function idempotent.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphabetic())
        .filter_map(deunicode_char)
        .flat_map(str::chars)
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_non_letters_and_lowercases() {
        assert_eq!(normalize("Rolex Submariner 116610LN"), "rolexsubmarinerln");
        assert_eq!(normalize("Seamaster-300 (M)"), "seamasterm");
    }

    #[test]
    fn transliterates_accents() {
        assert_eq!(normalize("Submarinér"), "submariner");
        assert_eq!(normalize("Größe"), "grosse");
        assert_eq!(normalize("ÉCLAT"), "eclat");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  42 - 7 !"), "");
    }

    #[test]
    fn is_idempotent() {
        for input in ["Rolex Submarinér (Used)", "Ωmega Speedmaster", "北京 Tourbillon", "", "A.Lange & Söhne"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }
}
