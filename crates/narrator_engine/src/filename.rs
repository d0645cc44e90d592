const MAX_STEM_CHARS: usize = 80;

/// Makes `name` safe to create on any desktop filesystem, keeping a short
/// alphanumeric extension intact. `commentary_a/b_vs_c?.wav` becomes
/// `commentary_a_b_vs_c.wav`.
pub fn sanitize_filename(name: &str) -> String {
    let name = name.trim();
    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 5
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            (stem, Some(ext))
        }
        _ => (name, None),
    };

    let mut cleaned = sanitize_stem(stem);
    if is_reserved_windows_name(&cleaned) {
        cleaned.push('_');
    }
    match extension {
        Some(ext) => format!("{cleaned}.{}", ext.to_ascii_lowercase()),
        None => cleaned,
    }
}

fn sanitize_stem(input: &str) -> String {
    let replaced: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();

    let mut compacted = String::with_capacity(replaced.len());
    let mut prev_underscore = false;
    for c in replaced.trim_matches(&['_', ' ', '.'][..]).chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }

    let truncated: String = compacted.chars().take(MAX_STEM_CHARS).collect();
    if truncated.is_empty() {
        "download".to_string()
    } else {
        truncated
    }
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::sanitize_filename;

    #[test]
    fn keeps_clean_names() {
        assert_eq!(
            sanitize_filename("commentary_Hikaru_vs_Magnus.wav"),
            "commentary_Hikaru_vs_Magnus.wav"
        );
    }

    #[test]
    fn replaces_forbidden_characters_and_collapses_underscores() {
        assert_eq!(
            sanitize_filename("commentary_a/b_vs_c?.WAV"),
            "commentary_a_b_vs_c.wav"
        );
        assert_eq!(sanitize_filename("a::b"), "a_b");
    }

    #[test]
    fn patches_reserved_and_empty_names() {
        assert_eq!(sanitize_filename("CON.wav"), "CON_.wav");
        assert_eq!(sanitize_filename("???"), "download");
    }

    #[test]
    fn truncates_long_names_on_char_boundaries() {
        let long = format!("{}.wav", "é".repeat(200));
        let cleaned = sanitize_filename(&long);
        assert_eq!(cleaned.chars().count(), 80 + 4);
        assert!(cleaned.ends_with(".wav"));
    }
}
