use std::collections::HashMap;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::Error;

/// Every regular file under `root`, keyed by its `/`-separated relative
/// path. Symlinks are not followed.
pub fn read_config_dir(root: &Path) -> Result<HashMap<String, String>, Error> {
    let mut configs = HashMap::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };

        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        configs.insert(key, std::fs::read_to_string(entry.path())?);
    }

    debug!("Read {} config file(s) from {}", configs.len(), root.display());
    Ok(configs)
}
