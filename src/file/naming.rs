//! Stored-name generation and validation.

use chrono::Utc;
use uuid::Uuid;

use crate::{FileboxError, Result};

/// Maximum length, in bytes, of the original-name part of a stored name.
pub const MAX_ORIGINAL_NAME_BYTES: usize = 200;

/// Longest extension kept intact when a long name is shortened.
const MAX_KEPT_EXTENSION_BYTES: usize = 16;

/// Name used when the client-supplied name has nothing usable left.
pub const FALLBACK_NAME: &str = "file";

/// Generate a unique stored name for an upload.
///
/// Format: `{unix_nanos}_{token}_{original}` where `token` is the first 8 hex
/// digits of a random v4 UUID and `original` is the sanitized client name.
pub fn generate_stored_name(original_name: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let token = Uuid::new_v4().simple().to_string();
    format!(
        "{nanos}_{}_{}",
        &token[..8],
        sanitize_original_name(original_name)
    )
}

/// Reduce a client-supplied filename to a single safe path component.
///
/// Directory parts (either separator), control characters, surrounding
/// whitespace and leading dots are removed.
pub fn sanitize_original_name(name: &str) -> String {
    let basename = name.rsplit(['/', '\\']).next().unwrap_or("");

    let cleaned: String = basename.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim().trim_start_matches('.').trim();

    if cleaned.is_empty() {
        return FALLBACK_NAME.to_string();
    }

    truncate_name(cleaned, MAX_ORIGINAL_NAME_BYTES)
}

/// Shorten `name` to at most `max_bytes`, keeping a short extension.
fn truncate_name(name: &str, max_bytes: usize) -> String {
    if name.len() <= max_bytes {
        return name.to_string();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(idx) if name.len() - idx <= MAX_KEPT_EXTENSION_BYTES + 1 && idx > 0 => {
            name.split_at(idx)
        }
        _ => (name, ""),
    };

    let budget = max_bytes - ext.len();
    let mut end = 0;
    for (idx, c) in stem.char_indices() {
        if idx + c.len_utf8() > budget {
            break;
        }
        end = idx + c.len_utf8();
    }

    format!("{}{}", &stem[..end], ext)
}

/// Check that a client-supplied stored name is a single, visible path component.
pub fn validate_stored_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0'])
        || name.len() > 255;

    if invalid {
        return Err(FileboxError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_stored_name_format() {
        let name = generate_stored_name("report.pdf");
        let parts: Vec<&str> = name.splitn(3, '_').collect();

        assert_eq!(parts.len(), 3);
        assert!(parts[0].parse::<i64>().is_ok());
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(parts[2], "report.pdf");
    }

    #[test]
    fn test_generate_stored_name_unique() {
        let name1 = generate_stored_name("a.txt");
        let name2 = generate_stored_name("a.txt");
        assert_ne!(name1, name2);
    }

    #[test]
    fn test_generate_stored_name_is_valid() {
        for original in ["a.txt", "../../etc/passwd", "", ".bashrc", "dir\\x.bin"] {
            let name = generate_stored_name(original);
            assert!(validate_stored_name(&name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_original_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_original_name("C:\\Users\\me\\photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_original_name("a/b/c.txt"), "c.txt");
    }

    #[test]
    fn test_sanitize_parent_only() {
        assert_eq!(sanitize_original_name(".."), FALLBACK_NAME);
        assert_eq!(sanitize_original_name("."), FALLBACK_NAME);
        assert_eq!(sanitize_original_name("foo/.."), FALLBACK_NAME);
        assert_eq!(sanitize_original_name(""), FALLBACK_NAME);
        assert_eq!(sanitize_original_name("   "), FALLBACK_NAME);
    }

    #[test]
    fn test_sanitize_control_and_dots() {
        assert_eq!(sanitize_original_name("a\r\nb.txt"), "ab.txt");
        assert_eq!(sanitize_original_name("a\0b.txt"), "ab.txt");
        assert_eq!(sanitize_original_name(".hidden"), "hidden");
        assert_eq!(sanitize_original_name("  spaced name.txt "), "spaced name.txt");
    }

    #[test]
    fn test_sanitize_keeps_unicode() {
        assert_eq!(sanitize_original_name("отчёт.docx"), "отчёт.docx");
        assert_eq!(sanitize_original_name("日本語ファイル.txt"), "日本語ファイル.txt");
    }

    #[test]
    fn test_sanitize_truncates_long_names() {
        let long = format!("{}.txt", "a".repeat(500));
        let result = sanitize_original_name(&long);
        assert_eq!(result.len(), MAX_ORIGINAL_NAME_BYTES);
        assert!(result.ends_with(".txt"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let long = "ж".repeat(300);
        let result = truncate_name(&long, 11);
        assert_eq!(result, "жжжжж");
    }

    #[test]
    fn test_validate_stored_name() {
        assert!(validate_stored_name("123_abcdef12_a.txt").is_ok());
        assert!(validate_stored_name("with space.txt").is_ok());

        for bad in ["", ".", "..", "../x", "a/b", "a\\b", ".part", "a\0b"] {
            assert!(
                matches!(validate_stored_name(bad), Err(FileboxError::InvalidName(_))),
                "{bad:?}"
            );
        }
    }
}
