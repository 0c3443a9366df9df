use std::{
    env,
    path::{Component, Path, PathBuf},
};

use crate::error::{PathError, PathResult};

pub trait PathResolver {
    /// Resolves a path string that may contain environment variables
    ///
    /// This method expands environment variables in the format `$VAR` or `${VAR}`, resolves tilde
    /// (`~`) to the user's home directory when it appears at the start of the path, and converts
    /// relative paths to absolute paths based on the current working directory.
    ///
    /// # Errors
    ///
    /// * [`PathError::Empty`] if the path is empty
    /// * [`PathError::CurrentDir`] if the current directory cannot be determined
    /// * [`PathError::MissingEnvVar`] if the environment variables are undefined
    ///
    /// # Example
    ///
    /// ```
    /// use boostfeed_utils::error::PathResult;
    /// use boostfeed_utils::path::{PathResolver, SystemPathResolver};
    ///
    /// fn main() -> PathResult<()> {
    ///     let resolved = SystemPathResolver.resolve_path("/srv/feeds")?;
    ///     assert!(resolved.is_absolute());
    ///     Ok(())
    /// }
    /// ```
    fn resolve_path(&self, path: &str) -> PathResult<PathBuf>;

    /// Returns the user's home directory
    ///
    /// Checks `HOME` first and falls back to `/home/$USER`.
    fn home_dir(&self) -> PathBuf;

    /// Returns the user's config directory following XDG Base Directory Specification
    ///
    /// This method checks the `XDG_CONFIG_HOME` environment variable. If not set, it defaults to
    /// `$HOME/.config`
    fn xdg_config_home(&self) -> PathBuf;
}

/// The default [`PathResolver`] implementation using environment variables and filesystem calls.
pub struct SystemPathResolver;

impl PathResolver for SystemPathResolver {
    fn resolve_path(&self, path: &str) -> PathResult<PathBuf> {
        let path = path.trim();

        if path.is_empty() {
            return Err(PathError::Empty);
        }

        let resolved = self.expand_variables(path)?;
        let path_buf = PathBuf::from(resolved);

        if path_buf.is_absolute() {
            Ok(path_buf)
        } else {
            env::current_dir()
                .map(|cwd| cwd.join(path_buf))
                .map_err(|err| PathError::CurrentDir { source: err })
        }
    }

    fn home_dir(&self) -> PathBuf {
        env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| {
            let user = env::var("USER").unwrap_or_else(|_| "nobody".to_string());
            PathBuf::from(format!("/home/{user}"))
        })
    }

    fn xdg_config_home(&self) -> PathBuf {
        env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| self.home_dir().join(".config"))
    }
}

impl SystemPathResolver {
    fn expand_variables(&self, path: &str) -> PathResult<String> {
        let mut result = String::with_capacity(path.len());
        let mut chars = path.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '$' => {
                    if chars.peek() == Some(&'{') {
                        chars.next();
                        let var_name = self.consume_until(&mut chars, '}')?;
                        self.expand_env_var(&var_name, &mut result, path)?;
                    } else {
                        let var_name = self.consume_var_name(&mut chars);
                        if var_name.is_empty() {
                            result.push('$');
                        } else {
                            self.expand_env_var(&var_name, &mut result, path)?;
                        }
                    }
                }
                '~' if result.is_empty() => result.push_str(&self.home_dir().to_string_lossy()),
                _ => result.push(c),
            }
        }

        Ok(result)
    }

    fn consume_until(
        &self,
        chars: &mut std::iter::Peekable<std::str::Chars>,
        delimiter: char,
    ) -> PathResult<String> {
        let mut var_name = String::new();

        for c in chars.by_ref() {
            if c == delimiter {
                return Ok(var_name);
            }
            var_name.push(c);
        }

        Err(PathError::UnclosedVariable {
            input: format!("${{{var_name}"),
        })
    }

    fn consume_var_name(&self, chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
        let mut var_name = String::new();

        while let Some(&c) = chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                var_name.push(c);
                chars.next();
            } else {
                break;
            }
        }

        var_name
    }

    fn expand_env_var(
        &self,
        var_name: &str,
        result: &mut String,
        original: &str,
    ) -> PathResult<()> {
        match var_name {
            "HOME" => result.push_str(&self.home_dir().to_string_lossy()),
            "XDG_CONFIG_HOME" => result.push_str(&self.xdg_config_home().to_string_lossy()),
            _ => {
                let value = env::var(var_name).map_err(|_| PathError::MissingEnvVar {
                    input: original.into(),
                    var: var_name.into(),
                })?;
                result.push_str(&value);
            }
        }
        Ok(())
    }
}

/// Resolves a path string using the system path resolver.
///
/// See [`PathResolver::resolve_path`] for detailed documentation.
pub fn resolve_path(path: &str) -> PathResult<PathBuf> {
    SystemPathResolver.resolve_path(path)
}

/// Returns the user's home directory using the system path resolver.
pub fn home_dir() -> PathBuf {
    SystemPathResolver.home_dir()
}

/// Returns the user's config directory using the system path resolver.
pub fn xdg_config_home() -> PathBuf {
    SystemPathResolver.xdg_config_home()
}

/// Computes the location of `path` relative to `root` as a `/`-separated string.
///
/// The comparison is done component by component, so trailing separators and
/// `.` segments on either side do not matter.
///
/// # Errors
///
/// * [`PathError::NotUnderRoot`] if `path` does not start with `root`, or climbs
///   back out of it through `..`
/// * [`PathError::Empty`] if `path` is `root` itself
///
/// # Example
///
/// ```
/// use boostfeed_utils::path::relative_subdir;
///
/// let subdir = relative_subdir("/root/boost/libs/foo", "/root/boost").unwrap();
/// assert_eq!(subdir, "libs/foo");
/// ```
pub fn relative_subdir<P: AsRef<Path>, R: AsRef<Path>>(path: P, root: R) -> PathResult<String> {
    let path = path.as_ref();
    let root = root.as_ref();

    let relative = path
        .strip_prefix(root)
        .map_err(|_| PathError::NotUnderRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_string_lossy().into_owned()),
            Component::ParentDir => {
                return Err(PathError::NotUnderRoot {
                    path: path.to_path_buf(),
                    root: root.to_path_buf(),
                })
            }
            _ => {}
        }
    }

    if segments.is_empty() {
        return Err(PathError::Empty);
    }

    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn setup_test_env(vars: &[(&str, &str)]) {
        for (var, value) in vars {
            env::set_var(*var, *value);
        }
    }

    fn cleanup_test_env(vars: &[&str]) {
        for key in vars {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_expand_variables_simple() {
        setup_test_env(&[("BOOSTFEED_TEST_VAR", "test_value")]);
        let resolver = SystemPathResolver;
        let result = resolver
            .expand_variables("$BOOSTFEED_TEST_VAR/path")
            .unwrap();
        assert_eq!(result, "test_value/path");
        cleanup_test_env(&["BOOSTFEED_TEST_VAR"]);
    }

    #[test]
    #[serial]
    fn test_expand_variables_braces() {
        setup_test_env(&[("BOOSTFEED_TEST_VAR", "test_value")]);
        let resolver = SystemPathResolver;
        let result = resolver
            .expand_variables("${BOOSTFEED_TEST_VAR}/feeds")
            .unwrap();
        assert_eq!(result, "test_value/feeds");
        cleanup_test_env(&["BOOSTFEED_TEST_VAR"]);
    }

    #[test]
    #[serial]
    fn test_expand_variables_missing_var() {
        cleanup_test_env(&["BOOSTFEED_UNSET_VAR"]);
        let resolver = SystemPathResolver;
        let result = resolver.expand_variables("$BOOSTFEED_UNSET_VAR/path");
        assert!(matches!(result, Err(PathError::MissingEnvVar { .. })));
    }

    #[test]
    #[serial]
    fn test_resolve_path() {
        setup_test_env(&[("HOME", "/tmp/home")]);
        let resolver = SystemPathResolver;

        assert!(matches!(resolver.resolve_path("  "), Err(PathError::Empty)));

        assert_eq!(
            resolver.resolve_path("/absolute/path").unwrap(),
            PathBuf::from("/absolute/path")
        );

        let expected_relative = env::current_dir().unwrap().join("relative/path");
        assert_eq!(
            resolver.resolve_path("relative/path").unwrap(),
            expected_relative
        );

        assert_eq!(
            resolver.resolve_path("~/src/ryppl").unwrap(),
            PathBuf::from("/tmp/home/src/ryppl")
        );

        assert!(matches!(
            resolver.resolve_path("${VAR"),
            Err(PathError::UnclosedVariable { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_xdg_config_home() {
        setup_test_env(&[("HOME", "/tmp/home")]);
        cleanup_test_env(&["XDG_CONFIG_HOME"]);
        assert_eq!(xdg_config_home(), PathBuf::from("/tmp/home/.config"));

        setup_test_env(&[("XDG_CONFIG_HOME", "/tmp/config")]);
        assert_eq!(xdg_config_home(), PathBuf::from("/tmp/config"));
        cleanup_test_env(&["XDG_CONFIG_HOME"]);
    }

    #[test]
    fn test_relative_subdir() {
        assert_eq!(
            relative_subdir("/root/boost/libs/foo", "/root/boost").unwrap(),
            "libs/foo"
        );
        assert_eq!(
            relative_subdir("/root/boost/libs/numeric/conversion/", "/root/boost/").unwrap(),
            "libs/numeric/conversion"
        );
        assert_eq!(
            relative_subdir("/root/boost/./libs/foo", "/root/boost").unwrap(),
            "libs/foo"
        );
    }

    #[test]
    fn test_relative_subdir_outside_root() {
        let result = relative_subdir("/elsewhere/libs/foo", "/root/boost");
        assert!(matches!(result, Err(PathError::NotUnderRoot { .. })));

        // Prefix matching is per component, not per character.
        let result = relative_subdir("/root/boost-extra/libs/foo", "/root/boost");
        assert!(matches!(result, Err(PathError::NotUnderRoot { .. })));
    }

    #[test]
    fn test_relative_subdir_rejects_parent_segments() {
        let result = relative_subdir("/root/boost/../evil/libs/foo", "/root/boost");
        assert!(matches!(result, Err(PathError::NotUnderRoot { .. })));

        let result = relative_subdir("/root/boost/libs/foo/../../..", "/root/boost");
        assert!(matches!(result, Err(PathError::NotUnderRoot { .. })));
    }

    #[test]
    fn test_relative_subdir_root_itself() {
        let result = relative_subdir("/root/boost", "/root/boost");
        assert!(matches!(result, Err(PathError::Empty)));
    }
}
