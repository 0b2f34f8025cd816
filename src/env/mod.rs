//! The shell-state seam consumed by the completion engine.
//!
//! The engine never touches process state directly; everything it needs
//! from the surrounding shell (variables, functions, builtins, subshells,
//! users) goes through [`ShellHost`]. [`SystemHost`] implements it against
//! the real environment and `/bin/sh`; tests substitute their own host.

pub mod users;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;
use std::sync::RwLock;

use tracing::debug;

use crate::error::{ExecError, Result, ShellError};

/// Everything the completion engine needs from the surrounding shell.
pub trait ShellHost: Send + Sync {
    /// Names of all set variables.
    fn variable_names(&self) -> Vec<String>;

    /// Value of one variable, if set.
    fn variable(&self, name: &str) -> Option<String>;

    /// Names of defined shell functions. Names starting with `_` are
    /// conventionally hidden and only listed when `include_hidden` is set.
    fn function_names(&self, include_hidden: bool) -> Vec<String>;

    /// Description of a function, if it has one.
    fn function_description(&self, name: &str) -> Option<String>;

    /// Names of shell builtins.
    fn builtin_names(&self) -> Vec<String>;

    /// Description of a builtin.
    fn builtin_description(&self, name: &str) -> Option<String>;

    /// Run `script` in a subshell, returning its exit status and stdout
    /// lines. Only ever called on the main thread; autosuggestion requests
    /// are answered without subshells.
    fn exec_subshell(&self, script: &str) -> Result<(i32, Vec<String>)>;

    /// Enumerate system user names. The caller bounds the enumeration with
    /// a wall-clock budget, so the iterator should be lazy.
    fn users(&self) -> Box<dyn Iterator<Item = String> + '_>;

    /// Working directory for relative path expansion.
    fn cwd(&self) -> PathBuf;
}

/// Builtins of the tidesh front end itself.
const BUILTINS: &[(&str, &str)] = &[
    ("complete", "Edit command-specific tab completions"),
    ("source", "Run a script in the current shell"),
    ("cd", "Change the working directory"),
    ("exit", "Leave the shell"),
    ("help", "Show help"),
];

/// [`ShellHost`] backed by the process environment and a POSIX shell.
pub struct SystemHost {
    /// Shell used for subshell evaluation
    shell: PathBuf,
    /// Function registry: name to description
    functions: RwLock<BTreeMap<String, String>>,
}

impl SystemHost {
    pub fn new() -> Self {
        Self::with_shell(PathBuf::from("/bin/sh"))
    }

    pub fn with_shell(shell: PathBuf) -> Self {
        Self {
            shell,
            functions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a shell function so completion can offer it.
    pub fn define_function(&self, name: impl Into<String>, description: impl Into<String>) {
        self.functions
            .write()
            .unwrap()
            .insert(name.into(), description.into());
    }
}

impl Default for SystemHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellHost for SystemHost {
    fn variable_names(&self) -> Vec<String> {
        std::env::vars().map(|(name, _)| name).collect()
    }

    fn variable(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn function_names(&self, include_hidden: bool) -> Vec<String> {
        self.functions
            .read()
            .unwrap()
            .keys()
            .filter(|name| include_hidden || !name.starts_with('_'))
            .cloned()
            .collect()
    }

    fn function_description(&self, name: &str) -> Option<String> {
        self.functions.read().unwrap().get(name).cloned()
    }

    fn builtin_names(&self) -> Vec<String> {
        BUILTINS.iter().map(|(name, _)| name.to_string()).collect()
    }

    fn builtin_description(&self, name: &str) -> Option<String> {
        BUILTINS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, desc)| desc.to_string())
    }

    fn exec_subshell(&self, script: &str) -> Result<(i32, Vec<String>)> {
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(script)
            .output()
            .map_err(|e| {
                debug!("subshell spawn failed: {}", e);
                ShellError::Exec(ExecError::SpawnFailed(e.to_string()))
            })?;

        let status = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let lines = stdout.lines().map(str::to_string).collect();
        Ok((status, lines))
    }

    fn users(&self) -> Box<dyn Iterator<Item = String> + '_> {
        Box::new(users::system_users())
    }

    fn cwd(&self) -> PathBuf {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_lookup() {
        let host = SystemHost::new();
        std::env::set_var("TIDESH_TEST_VAR", "42");
        assert_eq!(host.variable("TIDESH_TEST_VAR").as_deref(), Some("42"));
        assert!(host.variable_names().contains(&"TIDESH_TEST_VAR".to_string()));
    }

    #[test]
    fn test_function_hidden_filter() {
        let host = SystemHost::new();
        host.define_function("greet", "Say hello");
        host.define_function("_helper", "Internal");

        let visible = host.function_names(false);
        assert!(visible.contains(&"greet".to_string()));
        assert!(!visible.contains(&"_helper".to_string()));

        let all = host.function_names(true);
        assert!(all.contains(&"_helper".to_string()));
    }

    #[test]
    fn test_builtins_listed() {
        let host = SystemHost::new();
        assert!(host.builtin_names().contains(&"complete".to_string()));
        assert!(host.builtin_description("complete").is_some());
        assert!(host.builtin_description("nope").is_none());
    }

    #[test]
    fn test_exec_subshell_status() {
        let host = SystemHost::new();
        let (status, _) = host.exec_subshell("true").unwrap();
        assert_eq!(status, 0);
        let (status, _) = host.exec_subshell("false").unwrap();
        assert_ne!(status, 0);
    }

    #[test]
    fn test_exec_subshell_output_lines() {
        let host = SystemHost::new();
        let (_, lines) = host.exec_subshell("printf 'a\\nb\\n'").unwrap();
        assert_eq!(lines, vec!["a".to_string(), "b".to_string()]);
    }
}
