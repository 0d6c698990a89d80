use std::path::PathBuf;

/// `<platform data dir>/astrorules`, or `./.astrorules` when the platform has none
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|base| base.join("astrorules"))
        .unwrap_or_else(|| PathBuf::from(".astrorules"))
}

pub fn default_store_path() -> PathBuf {
    data_dir().join("rules.json")
}

pub fn default_cache_dir() -> PathBuf {
    data_dir().join("cache")
}

pub fn default_sources_path() -> PathBuf {
    data_dir().join("sources.yaml")
}

/// Explicit path if given, otherwise the default
pub fn resolve(explicit: Option<&str>, default: impl FnOnce() -> PathBuf) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_live_under_the_data_dir() {
        assert!(default_store_path().starts_with(data_dir()));
        assert!(default_cache_dir().ends_with("cache"));
        assert!(default_sources_path().starts_with(data_dir()));
    }

    #[test]
    fn explicit_path_wins() {
        assert_eq!(
            resolve(Some("/tmp/rules.json"), default_store_path),
            PathBuf::from("/tmp/rules.json")
        );
        assert_eq!(resolve(None, default_store_path), default_store_path());
    }
}
