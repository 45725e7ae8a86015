//! Save frame name sanitization

const SPACE_REPLACEMENT: char = '_';
const REPLACEMENT: char = '?';

/// Turn free text into a legal save frame or data block name.
///
/// Works on the Latin-1 projection of the text: characters beyond U+00FF,
/// everything non-ASCII and the characters `#`, `"` and `'` become `?`;
/// whitespace and control characters become `_`.
pub fn string_to_framecode(text: &str) -> String {
    text.chars()
        .map(|ch| match u32::from(ch) {
            code if code >= 128 => REPLACEMENT,
            _ if ch.is_ascii_whitespace() || ch.is_ascii_control() => SPACE_REPLACEMENT,
            _ if matches!(ch, '#' | '"' | '\'') => REPLACEMENT,
            _ => ch,
        })
        .collect()
}
