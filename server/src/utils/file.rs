//! File utility functions

use std::path::PathBuf;

/// Expand a path string to an absolute path.
///
/// Handles tilde expansion (`~`, `~/path`), relative paths (`.`, `..`,
/// `./path`, bare names), and passes absolute paths through unchanged.
/// Relative paths resolve against the current working directory.
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }

    let expanded = if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(path))
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            home.join(rest)
        } else {
            PathBuf::from(path)
        }
    } else {
        PathBuf::from(path)
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path_absolute_unchanged() {
        let result = expand_path("/absolute/path");
        assert_eq!(result, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_path_relative_becomes_absolute() {
        let result = expand_path("./data");
        assert!(result.is_absolute());
        assert!(result.ends_with("data"));
    }

    #[test]
    fn test_expand_path_bare_name() {
        let result = expand_path("fusion.db");
        assert!(result.is_absolute());
        assert!(result.ends_with("fusion.db"));
    }

    #[test]
    fn test_expand_path_tilde() {
        let result = expand_path("~/.workfuse");
        assert!(result.is_absolute());
        assert!(!result.to_string_lossy().contains('~'));
        assert!(result.ends_with(".workfuse"));
    }

    #[test]
    fn test_expand_path_tilde_only() {
        let result = expand_path("~");
        assert!(result.is_absolute());
        if let Some(home) = dirs::home_dir() {
            assert_eq!(result, home);
        }
    }

    #[test]
    fn test_expand_path_trims_whitespace() {
        let result = expand_path("  /path/to/dir  ");
        assert_eq!(result, PathBuf::from("/path/to/dir"));
    }

    #[test]
    fn test_expand_path_empty_string_is_cwd() {
        let result = expand_path("");
        assert!(result.is_absolute());
        assert!(!result.as_os_str().is_empty());
    }
}
