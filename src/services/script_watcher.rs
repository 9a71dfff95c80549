// src/services/script_watcher.rs
//
// Watches the scene script for changes so the host can live-reload it.
// The notify watcher pushes events onto a channel; the UI update loop
// drains it once per tick via take_change(). Editors that save through
// an atomic rename replace the file, so we watch the parent directory
// and match on file name.

use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::sync::mpsc::{channel, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::{AnimakeError, Result};

const DEBOUNCE: Duration = Duration::from_millis(250);

pub struct ScriptWatcher {
    // Held for its Drop; dropping it stops the watch.
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    file_name: OsString,
    debounce: Debounce,
}

/// Collapses change bursts: the first change fires immediately, changes
/// inside the window are held back and fire once it has elapsed.
#[derive(Default)]
struct Debounce {
    pending: bool,
    last_trigger: Option<Instant>,
}

impl Debounce {
    fn note(&mut self) {
        self.pending = true;
    }

    fn take(&mut self, window: Duration) -> bool {
        if !self.pending {
            return false;
        }
        if let Some(last) = self.last_trigger {
            if last.elapsed() < window {
                return false;
            }
        }
        self.pending = false;
        self.last_trigger = Some(Instant::now());
        true
    }
}

impl ScriptWatcher {
    pub fn watch(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .ok_or_else(|| {
                AnimakeError::script(format!("cannot watch '{}': no file name", path.display()))
            })?
            .to_os_string();

        let (tx, rx) = channel();
        let mut watcher = notify::recommended_watcher(tx)
            .map_err(|e| AnimakeError::script(format!("script watcher: {e}")))?;

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| {
                AnimakeError::script(format!("cannot watch '{}': {e}", dir.display()))
            })?;

        Ok(Self {
            _watcher: watcher,
            rx,
            file_name,
            debounce: Debounce::default(),
        })
    }

    /// Drains pending filesystem events. Returns true when the watched
    /// script changed; bursts inside the debounce window collapse to one
    /// reload. A change seen during the window is deferred, never lost.
    pub fn take_change(&mut self) -> bool {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(event) if event_touches(&event, &self.file_name) => self.debounce.note(),
                Ok(_) => {}
                Err(e) => eprintln!("Script watcher error: {e}"),
            }
        }
        self.debounce.take(DEBOUNCE)
    }
}

fn event_touches(event: &Event, file_name: &OsStr) -> bool {
    let kind_matters = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    kind_matters
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};
    use std::path::PathBuf;

    fn modify_event(path: &str) -> Event {
        Event::new(EventKind::Modify(ModifyKind::Any)).add_path(PathBuf::from(path))
    }

    #[test]
    fn matching_file_is_relevant() {
        let event = modify_event("/tmp/scenes/example.rhai");
        assert!(event_touches(&event, OsStr::new("example.rhai")));
    }

    #[test]
    fn sibling_files_are_filtered_out() {
        let event = modify_event("/tmp/scenes/other.rhai");
        assert!(!event_touches(&event, OsStr::new("example.rhai")));
    }

    #[test]
    fn atomic_save_rename_counts_as_create() {
        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("scenes/example.rhai"));
        assert!(event_touches(&event, OsStr::new("example.rhai")));
    }

    #[test]
    fn access_events_are_ignored() {
        let event = Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("scenes/example.rhai"));
        assert!(!event_touches(&event, OsStr::new("example.rhai")));
    }

    #[test]
    fn save_shortly_after_a_reload_is_deferred_not_lost() {
        let window = Duration::from_millis(30);
        let mut debounce = Debounce::default();

        debounce.note();
        assert!(debounce.take(window));

        // A second save lands right behind the first reload.
        debounce.note();
        assert!(!debounce.take(window));

        std::thread::sleep(window + Duration::from_millis(10));
        assert!(debounce.take(window), "deferred change must still fire");
    }

    #[test]
    fn bursts_collapse_to_one_trigger() {
        let window = Duration::from_millis(30);
        let mut debounce = Debounce::default();

        debounce.note();
        debounce.note();
        debounce.note();
        assert!(debounce.take(window));
        assert!(!debounce.take(window));
    }
}
