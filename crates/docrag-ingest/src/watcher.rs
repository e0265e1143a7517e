//! File system watcher feeding the ingestion queue.
//!
//! The watcher registers the documents root and every sub-directory
//! individually, so directories created later are picked up as they appear.
//! Each file that settles after a create or modify is posted to the caller's
//! channel as [`WatchEvent::FileReady`]; ingestion happens on the consumer
//! side of that channel.

use crate::error::{IngestError, IngestResult};
use glob::Pattern;
use notify::{Event, EventHandler, RecommendedWatcher, RecursiveMode, Watcher, WatcherKind};
use notify_debouncer_mini::{new_debouncer_opt, DebouncedEvent, DebouncedEventKind, Debouncer};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Events emitted by the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A regular file was created or modified and has been quiet for the
    /// debounce interval.
    FileReady(PathBuf),
}

/// Lifecycle of a [`PathWatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Stopped,
    Starting,
    Running,
}

/// Configuration for the watcher.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Root of the documents tree.
    pub root: PathBuf,
    /// File name patterns to ignore.
    pub ignore_patterns: Vec<Pattern>,
    /// Quiet period before a changed file is reported.
    pub debounce: Duration,
}

impl WatcherConfig {
    /// Create from config.
    pub fn from_config(root: PathBuf, config: &docrag_config::WatchConfig) -> Self {
        let ignore_patterns = config
            .ignore_patterns
            .iter()
            .filter_map(|p| match Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!("Invalid ignore pattern '{}': {}", p, e);
                    None
                }
            })
            .collect();

        Self {
            root,
            ignore_patterns,
            debounce: config.debounce(),
        }
    }
}

const OVERFLOW_MESSAGE: &str = "event queue overflowed";

/// Turn a queue-overflow notice into an error. The notice carries no paths,
/// and the debouncer drops path-less events.
fn flag_overflow(event: notify::Result<Event>) -> notify::Result<Event> {
    match event {
        Ok(event) if event.need_rescan() => Err(notify::Error::generic(OVERFLOW_MESSAGE)),
        other => other,
    }
}

/// Platform watcher whose overflow notices reach the event loop as errors.
struct OverflowAwareWatcher(RecommendedWatcher);

impl Watcher for OverflowAwareWatcher {
    fn new<F: EventHandler>(
        mut event_handler: F,
        config: notify::Config,
    ) -> notify::Result<Self> {
        let inner = RecommendedWatcher::new(
            move |event: notify::Result<Event>| event_handler.handle_event(flag_overflow(event)),
            config,
        )?;
        Ok(Self(inner))
    }

    fn watch(&mut self, path: &Path, recursive_mode: RecursiveMode) -> notify::Result<()> {
        self.0.watch(path, recursive_mode)
    }

    fn unwatch(&mut self, path: &Path) -> notify::Result<()> {
        self.0.unwatch(path)
    }

    fn configure(&mut self, option: notify::Config) -> notify::Result<bool> {
        self.0.configure(option)
    }

    fn kind() -> WatcherKind {
        RecommendedWatcher::kind()
    }
}

/// Directory registrations shared between the watcher handle and its loop.
struct WatchTree {
    debouncer: Option<Debouncer<OverflowAwareWatcher>>,
    registered: BTreeSet<PathBuf>,
    ignore_patterns: Vec<Pattern>,
}

impl WatchTree {
    /// Register `dir` and every directory below it. Returns the regular files
    /// found along the way.
    fn register_tree(&mut self, dir: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let walker = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Cannot read directory entry under {:?}: {}", dir, e);
                    continue;
                }
            };

            let path = entry.path();
            if entry.file_type().is_dir() {
                self.register(path);
            } else if entry.file_type().is_file()
                && !should_ignore_path(path, &self.ignore_patterns)
            {
                files.push(path.to_path_buf());
            }
        }

        files
    }

    fn register(&mut self, dir: &Path) {
        if self.registered.contains(dir) {
            return;
        }
        let Some(debouncer) = self.debouncer.as_mut() else {
            return;
        };

        match debouncer.watcher().watch(dir, RecursiveMode::NonRecursive) {
            Ok(()) => {
                debug!("Watching directory: {:?}", dir);
                self.registered.insert(dir.to_path_buf());
            }
            Err(e) => warn!("Failed to watch directory {:?}: {}", dir, e),
        }
    }

    /// Drop registrations for a directory that no longer exists, and its descendants.
    fn unregister_tree(&mut self, dir: &Path) {
        let gone: Vec<PathBuf> = self
            .registered
            .iter()
            .filter(|p| p.starts_with(dir))
            .cloned()
            .collect();

        for path in gone {
            self.registered.remove(&path);
            if let Some(debouncer) = self.debouncer.as_mut() {
                // The OS usually drops the watch itself when the directory goes
                if let Err(e) = debouncer.watcher().unwatch(&path) {
                    debug!("Unwatch {:?}: {}", path, e);
                }
            }
            info!("Directory removed, no longer watching: {:?}", path);
        }
    }
}

/// Watches a documents tree and reports settled files.
pub struct PathWatcher {
    config: WatcherConfig,
    state: WatcherState,
    tree: Option<Arc<Mutex<WatchTree>>>,
    handle: Option<JoinHandle<()>>,
}

impl PathWatcher {
    /// Create a stopped watcher.
    pub fn new(config: WatcherConfig) -> Self {
        Self {
            config,
            state: WatcherState::Stopped,
            tree: None,
            handle: None,
        }
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    /// Directories currently registered.
    pub fn watched_directories(&self) -> Vec<PathBuf> {
        match &self.tree {
            Some(tree) => lock(tree).registered.iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Register the tree and start the event loop on a background thread.
    ///
    /// Fails, leaving the watcher stopped, when the root directory does not exist.
    pub fn start(&mut self, events: Sender<WatchEvent>) -> IngestResult<()> {
        if self.state != WatcherState::Stopped {
            return Err(IngestError::WatchError("watcher already running".to_string()));
        }
        self.state = WatcherState::Starting;

        match self.spawn(events) {
            Ok(()) => {
                self.state = WatcherState::Running;
                Ok(())
            }
            Err(e) => {
                error!("Watcher failed to start: {}", e);
                self.state = WatcherState::Stopped;
                self.tree = None;
                Err(e)
            }
        }
    }

    fn spawn(&mut self, events: Sender<WatchEvent>) -> IngestResult<()> {
        if !self.config.root.is_dir() {
            return Err(IngestError::RootNotFound(self.config.root.clone()));
        }
        let root = self.config.root.canonicalize()?;

        let (tx, rx) = channel();
        let debouncer = new_debouncer_opt::<_, OverflowAwareWatcher>(
            notify_debouncer_mini::Config::default().with_timeout(self.config.debounce),
            tx,
        )?;

        let tree = Arc::new(Mutex::new(WatchTree {
            debouncer: Some(debouncer),
            registered: BTreeSet::new(),
            ignore_patterns: self.config.ignore_patterns.clone(),
        }));

        {
            let mut tree = lock(&tree);
            tree.register_tree(&root);
            if !tree.registered.contains(&root) {
                return Err(IngestError::WatchError(format!(
                    "could not register root {:?}",
                    root
                )));
            }
            info!(
                "Watching {:?} ({} directories)",
                root,
                tree.registered.len()
            );
        }

        let loop_tree = Arc::clone(&tree);
        let handle = std::thread::Builder::new()
            .name("docrag-watcher".to_string())
            .spawn(move || event_loop(loop_tree, rx, events))?;

        self.tree = Some(tree);
        self.handle = Some(handle);
        Ok(())
    }

    /// Stop the event loop and release the OS watches. No-op when not running.
    pub fn stop(&mut self) {
        if let Some(tree) = self.tree.take() {
            // Dropping the debouncer closes the loop's channel
            lock(&tree).debouncer = None;
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Watcher thread panicked");
            }
            info!("Watcher stopped");
        }
        self.state = WatcherState::Stopped;
    }
}

impl Drop for PathWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn event_loop(
    tree: Arc<Mutex<WatchTree>>,
    rx: Receiver<Result<Vec<DebouncedEvent>, notify::Error>>,
    events: Sender<WatchEvent>,
) {
    // Blocks until a batch arrives; ends when the debouncer is dropped
    while let Ok(result) = rx.recv() {
        let batch = match result {
            Ok(batch) => batch,
            Err(e) => {
                error!("Watch error, events may have been lost: {}", e);
                continue;
            }
        };

        let mut ready = Vec::new();
        {
            let mut tree = lock(&tree);
            for event in batch {
                handle_event(&mut tree, event, &mut ready);
            }
        }

        for path in ready {
            debug!("File ready: {:?}", path);
            if events.send(WatchEvent::FileReady(path)).is_err() {
                info!("Ingestion queue closed, watcher loop exiting");
                return;
            }
        }
    }
}

fn handle_event(tree: &mut WatchTree, event: DebouncedEvent, ready: &mut Vec<PathBuf>) {
    let path = event.path;

    if path.is_dir() {
        if !tree.registered.contains(&path) && !is_hidden(&path) {
            info!("New directory: {:?}", path);
            // Files may have landed before the watch was in place
            ready.extend(tree.register_tree(&path));
        }
    } else if path.is_file() {
        // Still being written
        if matches!(event.kind, DebouncedEventKind::AnyContinuous) {
            return;
        }
        if should_ignore_path(&path, &tree.ignore_patterns) {
            debug!("Ignoring file: {:?}", path);
            return;
        }
        if !ready.contains(&path) {
            ready.push(path);
        }
    } else if tree.registered.contains(&path) {
        tree.unregister_tree(&path);
    }
}

fn lock(tree: &Mutex<WatchTree>) -> std::sync::MutexGuard<'_, WatchTree> {
    tree.lock().unwrap_or_else(|e| e.into_inner())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// Whether a file should never be reported: hidden files and ignore-pattern matches.
pub fn should_ignore_path(path: &Path, patterns: &[Pattern]) -> bool {
    if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
        if filename.starts_with('.') {
            return true;
        }

        for pattern in patterns {
            if pattern.matches(filename) {
                return true;
            }
        }
    }

    false
}
