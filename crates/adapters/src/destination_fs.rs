//! Destination channel lookup

use std::path::Path;

/// Resolve the destination channel.
///
/// An explicitly configured channel wins; otherwise the first non-empty line
/// of `channel_file` is used. A missing file means no destination.
pub fn resolve_destination(
    configured: Option<&str>,
    channel_file: &Path,
) -> std::io::Result<Option<String>> {
    if let Some(channel) = configured.map(str::trim).filter(|c| !c.is_empty()) {
        return Ok(Some(channel.to_string()));
    }

    let content = match std::fs::read_to_string(channel_file) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    Ok(content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_configured_channel_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("channel_id.txt");
        std::fs::write(&path, "@from_file").unwrap();

        let destination = resolve_destination(Some(" @configured "), &path).unwrap();
        assert_eq!(destination.as_deref(), Some("@configured"));
    }

    #[test]
    fn test_reads_first_line_of_channel_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("channel_id.txt");
        std::fs::write(&path, "\n  -1001234567890  \n@ignored\n").unwrap();

        let destination = resolve_destination(Some(""), &path).unwrap();
        assert_eq!(destination.as_deref(), Some("-1001234567890"));
    }

    #[test]
    fn test_missing_or_blank_file_is_unset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("channel_id.txt");
        assert!(resolve_destination(None, &path).unwrap().is_none());

        std::fs::write(&path, "  \n").unwrap();
        assert!(resolve_destination(None, &path).unwrap().is_none());
    }
}
