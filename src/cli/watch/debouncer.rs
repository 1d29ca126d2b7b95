//! Coalesce bursts of file events into one rebuild.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use rustc_hash::FxHashSet;

pub(super) const DEBOUNCE_MS: u64 = 300;
pub(super) const REBUILD_COOLDOWN_MS: u64 = 800;

/// Timing and dedup only; the watch loop decides what a change means.
pub(super) struct Debouncer {
    changed: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    last_pass: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self {
            changed: FxHashSet::default(),
            last_event: None,
            last_pass: None,
        }
    }

    /// Record a notify event. Metadata-only and access events are ignored.
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;
        use notify::event::ModifyKind;

        match event.kind {
            EventKind::Create(_) | EventKind::Remove(_) => {}
            EventKind::Modify(ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => {}
            _ => return,
        }

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            crate::debug!("watch"; "{:?}: {}", event.kind, path.display());
            self.changed.insert(path.clone());
            self.last_event = Some(Instant::now());
        }
    }

    /// Changed paths once the burst has settled and the cooldown passed.
    pub(super) fn take_if_ready(&mut self) -> Option<Vec<PathBuf>> {
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;
        self.last_pass = Some(Instant::now());
        let mut paths: Vec<_> = self.changed.drain().collect();
        paths.sort();
        Some(paths)
    }

    fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };
        if last_event.elapsed() < Duration::from_millis(DEBOUNCE_MS) {
            return false;
        }
        if let Some(last_pass) = self.last_pass
            && last_pass.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS)
        {
            return false;
        }
        !self.changed.is_empty()
    }

    /// How long the watch loop may block before checking again.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_millis(500);
        };
        let debounce = Duration::from_millis(DEBOUNCE_MS).saturating_sub(last_event.elapsed());
        let cooldown = self
            .last_pass
            .map(|t| Duration::from_millis(REBUILD_COOLDOWN_MS).saturating_sub(t.elapsed()))
            .unwrap_or(Duration::ZERO);
        debounce.max(cooldown).max(Duration::from_millis(1))
    }
}

/// Editor swap files and similar noise.
fn is_temp_file(path: &std::path::Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return true;
    };
    name.starts_with(".#")
        || name.ends_with('~')
        || name.ends_with(".swp")
        || name.ends_with(".tmp")
        || name == "4913"
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, MetadataKind, ModifyKind};
    use notify::{Event, EventKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_burst_is_coalesced() {
        let mut debouncer = Debouncer::new();
        debouncer.add_event(&event(EventKind::Create(CreateKind::File), "dist/img/a.png"));
        debouncer.add_event(&event(EventKind::Modify(ModifyKind::Any), "dist/img/a.png"));
        debouncer.add_event(&event(EventKind::Modify(ModifyKind::Any), "dist/main.js"));
        assert_eq!(debouncer.changed.len(), 2);
        // still inside the debounce window
        assert!(debouncer.take_if_ready().is_none());

        debouncer.last_event = Some(Instant::now() - Duration::from_millis(DEBOUNCE_MS + 10));
        let paths = debouncer.take_if_ready().unwrap();
        assert_eq!(paths, vec![PathBuf::from("dist/img/a.png"), PathBuf::from("dist/main.js")]);
        assert!(debouncer.take_if_ready().is_none());
    }

    #[test]
    fn test_noise_is_ignored() {
        let mut debouncer = Debouncer::new();
        debouncer.add_event(&event(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)), "dist/a.png"));
        debouncer.add_event(&event(EventKind::Create(CreateKind::File), "dist/.a.png.swp"));
        debouncer.add_event(&event(EventKind::Create(CreateKind::File), "dist/a.png~"));
        assert!(debouncer.changed.is_empty());
        assert!(debouncer.last_event.is_none());
    }

    #[test]
    fn test_cooldown_after_pass() {
        let mut debouncer = Debouncer::new();
        debouncer.last_pass = Some(Instant::now());
        debouncer.add_event(&event(EventKind::Create(CreateKind::File), "dist/b.png"));
        debouncer.last_event = Some(Instant::now() - Duration::from_millis(DEBOUNCE_MS + 10));
        assert!(debouncer.take_if_ready().is_none());
        assert!(debouncer.sleep_duration() > Duration::ZERO);
    }
}
