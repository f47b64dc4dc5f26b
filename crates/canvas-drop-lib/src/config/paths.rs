use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Filesystem locations resolved once at startup from environment variables.
///
/// Access via `AppPaths::get()` which returns a `&'static AppPaths`.
pub struct AppPaths {
    pub home_dir: PathBuf,
    /// `~/.canvas-drop`, or `$CANVAS_DROP_HOME` when set.
    pub app_dir: PathBuf,
    pub gdrive_token_file: PathBuf,
    pub sharepoint_token_file: PathBuf,
}

static PATHS: OnceLock<AppPaths> = OnceLock::new();

impl AppPaths {
    /// Returns the global `AppPaths` singleton, initializing it on first call.
    pub fn get() -> &'static AppPaths {
        PATHS.get_or_init(AppPaths::from_env)
    }

    fn from_env() -> Self {
        let home_dir = std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir());
        let app_dir = std::env::var("CANVAS_DROP_HOME")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| home_dir.join(".canvas-drop"));
        Self::rooted_at(home_dir, app_dir)
    }

    /// Build the layout under an explicit application directory.
    pub fn rooted_at(home_dir: PathBuf, app_dir: PathBuf) -> Self {
        Self {
            gdrive_token_file: app_dir.join("gdrive-token.json"),
            sharepoint_token_file: app_dir.join("sharepoint-token.json"),
            home_dir,
            app_dir,
        }
    }

    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rooted_at_layout() {
        let paths = AppPaths::rooted_at(PathBuf::from("/home/u"), PathBuf::from("/home/u/.cd"));
        assert_eq!(paths.app_dir(), Path::new("/home/u/.cd"));
        assert_eq!(
            paths.gdrive_token_file,
            PathBuf::from("/home/u/.cd/gdrive-token.json")
        );
        assert_eq!(
            paths.sharepoint_token_file,
            PathBuf::from("/home/u/.cd/sharepoint-token.json")
        );
    }

    #[test]
    fn test_get_is_stable() {
        let a = AppPaths::get() as *const AppPaths;
        let b = AppPaths::get() as *const AppPaths;
        assert_eq!(a, b);
    }
}
