//! Parsing helpers for the mount table as printed by `mount` with no arguments.
//!
//! Line format: `<source> on <target> type <fstype> (<options>)`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub source: String,
    pub target: String,
    pub fstype: Option<String>,
    pub options: Option<String>,
}

pub fn parse_mount_table(content: &str) -> Vec<MountEntry> {
    content.lines().filter_map(parse_mount_line).collect()
}

fn parse_mount_line(line: &str) -> Option<MountEntry> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 || fields[1] != "on" {
        return None;
    }

    let (fstype, options) = match fields.get(3) {
        Some(&"type") => (
            fields.get(4).map(|s| s.to_string()),
            fields
                .get(5)
                .map(|s| s.trim_start_matches('(').trim_end_matches(')').to_string()),
        ),
        _ => (None, None),
    };

    Some(MountEntry {
        source: fields[0].to_string(),
        target: fields[2].to_string(),
        fstype,
        options,
    })
}

/// Target of the first entry mounted from `source`.
pub fn mount_point_for_source(entries: &[MountEntry], source: &str) -> Option<String> {
    entries
        .iter()
        .find(|entry| entry.source == source)
        .map(|entry| entry.target.clone())
}

/// Source of the first entry mounted at `target`.
pub fn source_for_mount_point(entries: &[MountEntry], target: &str) -> Option<String> {
    let target = normalize_path(target);
    entries
        .iter()
        .find(|entry| normalize_path(&entry.target) == target)
        .map(|entry| entry.source.clone())
}

fn normalize_path(path: &str) -> &str {
    if path.len() > 1 && path.ends_with('/') {
        path.trim_end_matches('/')
    } else {
        path
    }
}
