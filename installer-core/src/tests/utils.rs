pub mod defaults {
    use crate::InstallerConfig;
    use tempfile::TempDir;

    /// Installer config rooted in a temporary directory with no settle delay
    pub fn test_config(root: &TempDir) -> InstallerConfig {
        InstallerConfig::default()
            .with_work_root(root.path())
            .without_settle_delay()
    }

    pub fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }
}
