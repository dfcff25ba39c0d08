//! `sgdisk -p <disk>`

const GUID_MARKER: &str = "Disk identifier (GUID)";

/// The disk GUID, taken as the fourth whitespace-separated token of the
/// `Disk identifier (GUID): ...` line.
pub fn disk_guid(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains(GUID_MARKER))
        .and_then(|line| line.split_whitespace().nth(3))
        .map(str::to_string)
}
