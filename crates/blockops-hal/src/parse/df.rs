//! `df --output=source,fstype`

/// Filesystem type of the first row whose source column equals `source`.
///
/// A matching row without a type column yields an empty string.
pub fn filesystem_for_source(output: &str, source: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        if fields.next()? != source {
            return None;
        }
        Some(fields.next().unwrap_or_default().to_string())
    })
}
