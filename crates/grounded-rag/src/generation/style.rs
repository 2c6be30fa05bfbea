//! Post-processing of the cosmetic rewrite

/// Pick the usable part of a styled answer
///
/// When `delimiter` occurs, the text between its first and second
/// occurrence is kept; otherwise the whole output is used.
pub fn extract_styled_section<'a>(output: &'a str, delimiter: &str) -> &'a str {
    if delimiter.is_empty() || !output.contains(delimiter) {
        return output;
    }

    output.split(delimiter).nth(1).unwrap_or(output)
}

/// Remove markdown emphasis markers (`**` and `*`)
pub fn strip_emphasis(text: &str) -> String {
    text.replace("**", "").replace('*', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_delimiter_uses_whole_output() {
        assert_eq!(extract_styled_section("Just the answer ✨", "\n---"), "Just the answer ✨");
    }

    #[test]
    fn test_delimited_section_is_extracted() {
        let output = "Here is a nicer version:\n---\n🌱 The answer [Document 1]\n---\nLet me know!";
        assert_eq!(
            extract_styled_section(output, "\n---"),
            "\n🌱 The answer [Document 1]"
        );
    }

    #[test]
    fn test_single_delimiter_keeps_tail() {
        assert_eq!(extract_styled_section("intro\n---\nbody", "\n---"), "\nbody");
    }

    #[test]
    fn test_strip_emphasis() {
        assert_eq!(strip_emphasis("**Bold** and *italic*"), "Bold and italic");
    }
}
