//! `lsblk --all -n -l --output PKNAME`

/// Whether any line names `device` as its parent.
pub fn has_parent(output: &str, device: &str) -> bool {
    output.lines().map(str::trim).any(|line| line == device)
}
