//! Init command implementation

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use miette::{IntoDiagnostic, Result};
use tracing::info;
use tsuzufmt_core::Config;
use tsuzufmt_core::config::CONFIG_FILES;

use super::config::render_jsonc;

pub fn run_init(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILES[0]);
    let default_config = render_jsonc(&Config::default(), true);

    loop {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);

        // Refuse to write through a symlink planted at the config path.
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.custom_flags(libc::O_NOFOLLOW);
        }

        match options.open(&config_path) {
            Ok(mut file) => {
                file.write_all(default_config.as_bytes())
                    .into_diagnostic()?;
                info!("Created {}", config_path.display());
                return Ok(());
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if !force {
                    return Err(miette::miette!(
                        "Config file already exists. Use --force to overwrite."
                    ));
                }

                match fs::remove_file(&config_path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e).into_diagnostic(),
                }
            }
            Err(e) => return Err(e).into_diagnostic(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_creates_and_refuses_overwrite() {
        let dir = tempdir().unwrap();
        run_init(dir.path(), false).unwrap();

        let path = dir.path().join(".tsuzufmt.jsonc");
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"max_width\": 100"));

        fs::write(&path, "{}").unwrap();
        assert!(run_init(dir.path(), false).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");

        run_init(dir.path(), true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), content);
    }

    #[cfg(unix)]
    #[test]
    fn test_force_replaces_symlink_without_touching_target() {
        use std::os::unix::fs::symlink;

        let dir = tempdir().unwrap();
        let path = dir.path().join(".tsuzufmt.jsonc");
        let target = dir.path().join("target_file");
        fs::write(&target, "Important Data").unwrap();
        symlink(&target, &path).unwrap();

        assert!(run_init(dir.path(), false).is_err());
        assert_eq!(fs::read_to_string(&target).unwrap(), "Important Data");

        run_init(dir.path(), true).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "Important Data");
        let meta = fs::symlink_metadata(&path).unwrap();
        assert!(meta.is_file());
        assert!(!meta.is_symlink());
    }
}
