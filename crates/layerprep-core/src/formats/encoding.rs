//! Attribute text encodings
//!
//! A .cpg file names the code page of the .dbf text values. Tables without
//! one are read as UTF-8 first and as Windows-1252 when that fails; the
//! WHATWG label rules make latin1 and ISO-8859-1 resolve to the same
//! decoder.

use shapefile::dbase::encoding_rs::{self, Encoding};
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Decoder used for undeclared tables that are not valid UTF-8
pub fn fallback_encoding() -> &'static Encoding {
    encoding_rs::WINDOWS_1252
}

/// Read the code page label from a .cpg file; an empty file declares nothing
pub fn read_code_page(path: &Path) -> Result<Option<String>> {
    let bytes = fs::read(path)?;
    let label = String::from_utf8_lossy(&bytes);
    let label = label.trim_start_matches('\u{feff}').trim();
    Ok((!label.is_empty()).then(|| label.to_string()))
}

/// Resolve a code page label to a decoder.
///
/// Accepts encoding names ("UTF-8", "cp1252", "latin1"), bare Windows code
/// page numbers ("1252", "ANSI 1251") and ESRI ISO labels ("8859_1", "88591").
pub fn encoding_for_code_page(label: &str) -> Option<&'static Encoding> {
    let label = label.trim().to_ascii_lowercase();
    let label = label.strip_prefix("ansi ").map(str::trim).unwrap_or(&label);
    if label.is_empty() {
        return None;
    }

    let normalized = if let Some(part) = label.strip_prefix("8859") {
        format!("iso-8859-{}", part.trim_start_matches(['-', '_']))
    } else if label.bytes().all(|b| b.is_ascii_digit()) {
        match label {
            "65001" => "utf-8".to_string(),
            "932" => "shift_jis".to_string(),
            "936" => "gbk".to_string(),
            "949" => "euc-kr".to_string(),
            "950" => "big5".to_string(),
            "866" => "ibm866".to_string(),
            n => format!("windows-{}", n),
        }
    } else {
        label.to_string()
    };

    Encoding::for_label(normalized.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_page_labels() {
        assert_eq!(encoding_for_code_page("UTF-8"), Some(encoding_rs::UTF_8));
        assert_eq!(encoding_for_code_page("65001"), Some(encoding_rs::UTF_8));
        assert_eq!(encoding_for_code_page("1252"), Some(encoding_rs::WINDOWS_1252));
        assert_eq!(encoding_for_code_page("ANSI 1251"), Some(encoding_rs::WINDOWS_1251));
        assert_eq!(encoding_for_code_page("cp1252"), Some(encoding_rs::WINDOWS_1252));
        assert_eq!(encoding_for_code_page("8859_2"), Some(encoding_rs::ISO_8859_2));
        assert_eq!(encoding_for_code_page("88591"), Some(encoding_rs::WINDOWS_1252));
        assert_eq!(encoding_for_code_page("latin1"), Some(encoding_rs::WINDOWS_1252));
    }

    #[test]
    fn test_unknown_code_page() {
        assert_eq!(encoding_for_code_page(""), None);
        assert_eq!(encoding_for_code_page("klingon"), None);
    }

    #[test]
    fn test_read_code_page_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("towns.cpg");

        fs::write(&path, "\u{feff}UTF-8\r\n").unwrap();
        assert_eq!(read_code_page(&path).unwrap().as_deref(), Some("UTF-8"));

        fs::write(&path, "  ").unwrap();
        assert_eq!(read_code_page(&path).unwrap(), None);
    }
}
