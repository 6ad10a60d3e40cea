// crates/input_core/src/hot_reload.rs
//! Watches the definitions file and hands back a fresh [`InputConfig`] once
//! edits settle.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use input_shared::InputConfig;

use crate::error::InputError;

pub const RELOAD_DEBOUNCE: Duration = Duration::from_millis(500);

pub struct DefinitionWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher, // keep the OS watch alive while polling
    events: Receiver<notify::Result<Event>>,
    pending_since: Option<Instant>,
    debounce: Duration,
}

impl DefinitionWatcher {
    /// Starts watching `path`. The parent directory is watched so that
    /// editors replacing the file still trigger a reload.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, InputError> {
        let path = path.into();
        let (tx, rx) = unbounded();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if let Err(err) = tx.send(res) {
                debug!("Definition watcher channel closed: {err}");
            }
        })?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        debug!("Watching {} for definition changes", path.display());

        Ok(Self {
            path,
            _watcher: watcher,
            events: rx,
            pending_since: None,
            debounce: RELOAD_DEBOUNCE,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drains file events. Returns the reloaded definitions once no change
    /// has arrived for the debounce window. Parse failures are logged and
    /// the previous definitions stay in effect.
    pub fn poll(&mut self) -> Option<InputConfig> {
        while let Ok(res) = self.events.try_recv() {
            match res {
                Ok(event) if self.is_relevant(&event) => self.pending_since = Some(Instant::now()),
                Ok(_) => {}
                Err(err) => warn!("Definition watcher error: {err}"),
            }
        }

        if !self.take_ready(Instant::now()) {
            return None;
        }

        match InputConfig::load_from(&self.path) {
            Ok(config) => {
                info!(
                    "Reloaded {} input definitions from {}",
                    config.inputs.len(),
                    self.path.display()
                );
                Some(config)
            }
            Err(err) => {
                warn!("Ignoring edited definitions in {}: {err}", self.path.display());
                None
            }
        }
    }

    fn is_relevant(&self, event: &Event) -> bool {
        matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
            && event
                .paths
                .iter()
                .any(|changed| changed.file_name() == self.path.file_name())
    }

    fn take_ready(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) if now.duration_since(since) >= self.debounce => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn changes_settle_before_reloading() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("inputs.json");
        InputConfig::default().save_to(&path).unwrap();

        let mut watcher = DefinitionWatcher::new(&path).unwrap();
        let start = Instant::now();
        watcher.pending_since = Some(start);

        assert!(!watcher.take_ready(start + Duration::from_millis(100)));
        assert!(watcher.take_ready(start + RELOAD_DEBOUNCE));
        assert!(!watcher.take_ready(start + RELOAD_DEBOUNCE * 2));
    }

    #[test]
    fn unrelated_files_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("inputs.json");
        let watcher = DefinitionWatcher::new(&path).unwrap();

        let other = Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
            .add_path(tmp.path().join("notes.txt"));
        let ours = Event::new(EventKind::Modify(notify::event::ModifyKind::Any)).add_path(path.clone());
        let removal = Event::new(EventKind::Remove(notify::event::RemoveKind::Any)).add_path(path);

        assert!(!watcher.is_relevant(&other));
        assert!(watcher.is_relevant(&ours));
        assert!(!watcher.is_relevant(&removal));
    }
}
