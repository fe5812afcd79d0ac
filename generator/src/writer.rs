//! Change-detection writer.
//!
//! Generated units are only rewritten when their bytes change, so a no-op
//! run leaves timestamps alone and the host build does not recompile
//! anything downstream.

use std::fs;
use std::io;
use std::path::Path;

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Write `contents` to `path` unless the file already holds exactly those
/// bytes. A missing or unreadable file counts as different. Parent
/// directories are created as needed.
pub fn write_if_changed(path: &Path, contents: &[u8]) -> io::Result<WriteOutcome> {
    if let Ok(existing) = fs::read(path) {
        if existing == contents {
            debug!("{} unchanged", path.display());
            return Ok(WriteOutcome::Unchanged);
        }
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents)?;
    debug!("wrote {} ({} bytes)", path.display(), contents.len());
    Ok(WriteOutcome::Written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("shadergen_writer_{}", name));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_missing_file_is_written() {
        let dir = scratch("missing");
        let path = dir.join("nested").join("out.hpp");
        let outcome = write_if_changed(&path, b"#include <cstdint>\n").expect("write failed");
        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(fs::read(&path).unwrap(), b"#include <cstdint>\n");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_identical_contents_are_not_rewritten() {
        let dir = scratch("identical");
        let path = dir.join("out.cpp");
        write_if_changed(&path, b"abc").expect("write failed");
        let before = fs::metadata(&path).unwrap().modified().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        let outcome = write_if_changed(&path, b"abc").expect("write failed");
        assert_eq!(outcome, WriteOutcome::Unchanged);
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_changed_contents_are_rewritten() {
        let dir = scratch("changed");
        let path = dir.join("out.cpp");
        write_if_changed(&path, b"abc").expect("write failed");
        assert_eq!(write_if_changed(&path, b"abd").unwrap(), WriteOutcome::Written);
        // a prefix of the old contents is still a change
        assert_eq!(write_if_changed(&path, b"ab").unwrap(), WriteOutcome::Written);
        assert_eq!(fs::read(&path).unwrap(), b"ab");
        fs::remove_dir_all(&dir).ok();
    }
}
