//! Lazy loading of per-command completion definition files.
//!
//! A command's completions live in `<dir>/<cmd>.tish` somewhere on the
//! search path, as a script of `complete` lines. The default request type
//! loads synchronously on the main thread; autosuggestion requests may not
//! block or run user code, so they queue a load request that the main
//! thread drains between inputs.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::SystemTime;

use tracing::{debug, warn};

use super::builtin::run_complete_builtin;
use super::registry::Registry;
use crate::parser::tokenizer;

#[derive(Debug, Default)]
struct AutoloadState {
    /// Commands a load has been attempted for, successful or not
    tried: HashSet<String>,
    /// Commands with a sourced file, plus the file identity that was loaded
    loaded: HashMap<String, (PathBuf, Option<SystemTime>)>,
    /// Loads requested from autosuggestion threads, not yet performed
    pending: Vec<String>,
}

/// Loader of completion definition files.
#[derive(Debug, Default)]
pub struct Autoloader {
    search_path: Vec<PathBuf>,
    state: Mutex<AutoloadState>,
}

impl Autoloader {
    pub fn new(search_path: Vec<PathBuf>) -> Self {
        Self {
            search_path,
            state: Mutex::new(AutoloadState::default()),
        }
    }

    /// Load completions for `cmd` into `registry`.
    ///
    /// With `reload` unset, a command that has already been tried is left
    /// alone. With it set, the file is re-sourced when its identity changed,
    /// and a vanished file erases the rules it once defined.
    pub fn load(&self, registry: &Registry, cmd: &str, reload: bool) {
        if cmd.is_empty() || cmd.contains('/') {
            return;
        }

        let mut state = self.state.lock().unwrap();
        if !reload && state.tried.contains(cmd) {
            return;
        }
        state.tried.insert(cmd.to_string());

        let file = self.find_file(cmd);
        match (file, state.loaded.get(cmd).cloned()) {
            (None, Some(_)) => {
                // Definition file disappeared: its rules go with it
                state.loaded.remove(cmd);
                registry.remove(cmd, false, None, None);
            }
            (None, None) => {}
            (Some(path), previous) => {
                let mtime = fs::metadata(&path).and_then(|m| m.modified()).ok();
                if previous.as_ref() == Some(&(path.clone(), mtime)) {
                    return;
                }
                if previous.is_some() {
                    registry.remove(cmd, false, None, None);
                }
                source_file(registry, &path);
                state.loaded.insert(cmd.to_string(), (path, mtime));
            }
        }
    }

    /// Whether a load has ever been attempted for `cmd`.
    pub fn has_tried(&self, cmd: &str) -> bool {
        self.state.lock().unwrap().tried.contains(cmd)
    }

    /// Ask the main thread to load `cmd` once. Safe to call from any
    /// thread; already-tried and already-queued commands are ignored.
    pub fn request_load(&self, cmd: &str) {
        let mut state = self.state.lock().unwrap();
        if state.tried.contains(cmd) || state.pending.iter().any(|p| p == cmd) {
            return;
        }
        state.pending.push(cmd.to_string());
    }

    /// Perform the loads queued by autosuggestion threads. Main thread only.
    pub fn service_pending(&self, registry: &Registry) {
        let pending = std::mem::take(&mut self.state.lock().unwrap().pending);
        for cmd in pending {
            self.load(registry, &cmd, false);
        }
    }

    fn find_file(&self, cmd: &str) -> Option<PathBuf> {
        let file_name = format!("{}.tish", cmd);
        self.search_path
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|path| path.is_file())
    }
}

/// Source one definition file: every non-comment line must be a `complete`
/// invocation. Failures are absorbed; completion proceeds with whatever
/// rules did parse.
fn source_file(registry: &Registry, path: &PathBuf) {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!("cannot read completion file {:?}: {}", path, err);
            return;
        }
    };

    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens = tokenizer::tokenize(line);
        let mut words = tokens
            .iter()
            .map(|t| tokenizer::unescape(&t.text, false))
            .collect::<Option<Vec<String>>>()
            .unwrap_or_default();

        if words.first().map(String::as_str) != Some("complete") {
            debug!("{:?}:{}: not a complete command, skipped", path, lineno + 1);
            continue;
        }
        words.remove(0);

        if let Err(err) = run_complete_builtin(registry, &words) {
            debug!("{:?}:{}: {}", path, lineno + 1, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &std::path::Path, name: &str, content: &str) {
        let mut f = fs::File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_load_sources_definitions() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(
            tmp.path(),
            "foo.tish",
            "# completions for foo\ncomplete -c foo -s v -l verbose\n",
        );

        let reg = Registry::new();
        let loader = Autoloader::new(vec![tmp.path().to_path_buf()]);
        loader.load(&reg, "foo", true);

        let snap = reg.snapshot_matching("foo", "");
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].rules[0].short, Some('v'));
        assert!(loader.has_tried("foo"));
    }

    #[test]
    fn test_load_without_reload_tries_once() {
        let tmp = tempfile::tempdir().unwrap();
        let reg = Registry::new();
        let loader = Autoloader::new(vec![tmp.path().to_path_buf()]);

        loader.load(&reg, "foo", false);
        assert!(loader.has_tried("foo"));

        // File appears after the first attempt; without reload it stays
        // invisible
        write_file(tmp.path(), "foo.tish", "complete -c foo -s v\n");
        loader.load(&reg, "foo", false);
        assert!(reg.is_empty());

        loader.load(&reg, "foo", true);
        assert_eq!(reg.snapshot_matching("foo", "").len(), 1);
    }

    #[test]
    fn test_vanished_file_erases_rules() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "foo.tish", "complete -c foo -s v\n");

        let reg = Registry::new();
        let loader = Autoloader::new(vec![tmp.path().to_path_buf()]);
        loader.load(&reg, "foo", true);
        assert!(!reg.is_empty());

        fs::remove_file(tmp.path().join("foo.tish")).unwrap();
        loader.load(&reg, "foo", true);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_request_load_queues_once() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "foo.tish", "complete -c foo -s v\n");

        let reg = Registry::new();
        let loader = Autoloader::new(vec![tmp.path().to_path_buf()]);
        loader.request_load("foo");
        loader.request_load("foo");
        assert!(!loader.has_tried("foo"));
        assert!(reg.is_empty());

        loader.service_pending(&reg);
        assert!(loader.has_tried("foo"));
        assert_eq!(reg.snapshot_matching("foo", "").len(), 1);
    }

    #[test]
    fn test_request_load_after_tried_is_noop() {
        let reg = Registry::new();
        let loader = Autoloader::new(vec![]);
        loader.load(&reg, "foo", false);
        loader.request_load("foo");
        assert!(loader.state.lock().unwrap().pending.is_empty());
    }

    #[test]
    fn test_bad_lines_are_absorbed() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(
            tmp.path(),
            "foo.tish",
            "complete --bogus nonsense\ncomplete -c foo -s v\nnot-a-complete-line\n",
        );

        let reg = Registry::new();
        let loader = Autoloader::new(vec![tmp.path().to_path_buf()]);
        loader.load(&reg, "foo", true);
        assert_eq!(reg.snapshot_matching("foo", "").len(), 1);
    }

    #[test]
    fn test_commands_with_slashes_rejected() {
        let reg = Registry::new();
        let loader = Autoloader::new(vec![]);
        loader.load(&reg, "../evil", true);
        assert!(!loader.has_tried("../evil"));
    }
}
