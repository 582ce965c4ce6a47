pub mod cli;
pub mod codes;
pub mod normalize;
pub mod table;

/// Loads a file into a string.
///
/// This checks for the UTF-8 BOM and strips it
pub(crate) fn load_file(path: &std::path::Path) -> std::io::Result<String> {
    let mut buffer = std::fs::read_to_string(path)?;

    if buffer.starts_with('\u{feff}') {
        // U+FEFF is 3 bytes
        buffer.drain(..3);
    }

    if buffer.contains("\r\n") {
        buffer = buffer.replace("\r\n", "\n");
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::load_file;

    #[test]
    fn test_load_file_handles_short_files_and_bom() {
        let dir = std::env::temp_dir();

        let empty = dir.join("phone_tools_load_empty.csv");
        std::fs::write(&empty, "").unwrap();
        assert_eq!(load_file(&empty).unwrap(), "");
        std::fs::remove_file(&empty).ok();

        let tiny = dir.join("phone_tools_load_tiny.csv");
        std::fs::write(&tiny, "a").unwrap();
        assert_eq!(load_file(&tiny).unwrap(), "a");
        std::fs::remove_file(&tiny).ok();

        let bom = dir.join("phone_tools_load_bom.csv");
        std::fs::write(&bom, b"\xEF\xBB\xBFid\r\n1\r\n").unwrap();
        assert_eq!(load_file(&bom).unwrap(), "id\n1\n");
        std::fs::remove_file(&bom).ok();
    }
}
