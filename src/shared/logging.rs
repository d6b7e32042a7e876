use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn dialogue_log_path(log_root: &Path) -> PathBuf {
    log_root.join("logs/dialogue.log")
}

pub fn append_dialogue_log_line(log_root: &Path, line: &str) -> std::io::Result<()> {
    let path = dialogue_log_path(log_root);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    writeln!(file, "{line}")
}
