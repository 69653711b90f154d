//! Init scripts: files of shell lines run before interactive input.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Resolve `scripts` against `base_dir` and read them in order.
///
/// Absolute script paths are used as given. Every file is read before
/// anything runs, so a missing script fails the whole launch.
pub fn load(base_dir: &Path, scripts: &[PathBuf]) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for script in scripts {
        let path = base_dir.join(script);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read init script {}", path.display()))?;
        let before = lines.len();
        lines.extend(text.lines().map(str::to_owned));
        log::debug!(
            "loaded {} lines from {}",
            lines.len() - before,
            path.display()
        );
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn scripts_concatenate_in_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.tdm"), "spawn a 0 0 1\n# note\n").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.tdm"), "resume\r\nlist").unwrap();

        let lines = load(dir.path(), &["a.tdm".into(), "sub/b.tdm".into()]).unwrap();
        assert_eq!(lines, ["spawn a 0 0 1", "# note", "resume", "list"]);
    }

    #[test]
    fn absolute_paths_ignore_base_dir() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("abs.tdm");
        fs::write(&script, "status\n").unwrap();

        let lines = load(Path::new("/nonexistent"), &[script]).unwrap();
        assert_eq!(lines, ["status"]);
    }

    #[test]
    fn missing_script_names_the_path() {
        let dir = TempDir::new().unwrap();
        let err = load(dir.path(), &["nope.tdm".into()]).unwrap_err();
        assert!(format!("{err}").contains("nope.tdm"));
    }
}
