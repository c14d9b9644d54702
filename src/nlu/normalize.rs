//! Whitespace, case and punctuation canonicalization.

/// Normalize raw user text: trim, collapse runs of whitespace to single
/// spaces, lower-case, and map full-width punctuation to its ASCII form.
///
/// Total - every input produces some output, empty input included.
pub fn normalize(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .to_lowercase()
        .chars()
        .map(|ch| match ch {
            '？' => '?',
            '！' => '!',
            '，' => ',',
            '：' => ':',
            '；' => ';',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace_and_trims() {
        assert_eq!(normalize("  你好   世界  "), "你好 世界");
        assert_eq!(normalize("a\t\nb"), "a b");
    }

    #[test]
    fn test_lowercases_ascii() {
        assert_eq!(normalize("打开VSCode"), "打开vscode");
    }

    #[test]
    fn test_maps_fullwidth_punctuation() {
        assert_eq!(normalize("天气怎么样？"), "天气怎么样?");
        assert_eq!(normalize("太好了！对，就这样"), "太好了!对,就这样");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }
}
