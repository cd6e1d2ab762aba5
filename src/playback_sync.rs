/*!
 * Playback synchronizer keeping a transcript view aligned with a player.
 *
 * A background task polls the player position on a fixed interval, binary
 * searches the sorted segment list for the active line, and tells the view
 * to move the highlight only when the active line actually changes. Gaps
 * between segments deactivate the highlight entirely.
 */

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::segment::Segment;

/// Default polling interval
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(200);

/// Abstract media player the synchronizer reads from and drives
pub trait PlayerHandle: Send + Sync {
    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Jump to an absolute position in seconds
    fn seek(&self, seconds: f64);

    /// Resume playback
    fn play(&self);
}

/// Abstract transcript rendering surface
pub trait TranscriptView: Send + Sync {
    /// Highlight the line at `index`
    fn activate(&self, index: usize);

    /// Remove the highlight from the line at `index`
    fn deactivate(&self, index: usize);
}

/// Binary search the sorted segment list for the one covering `time`.
///
/// A segment is active while `start <= time < end`; positions in gaps or
/// outside the list yield None.
pub fn find_active_index(segments: &[Segment], time: f64) -> Option<usize> {
    let mut low = 0usize;
    let mut high = segments.len();

    while low < high {
        let mid = low + (high - low) / 2;
        let segment = &segments[mid];

        if time < segment.start {
            high = mid;
        } else if time >= segment.end {
            low = mid + 1;
        } else {
            return Some(mid);
        }
    }

    None
}

/// One synchronizer instance per view.
pub struct PlaybackSync {
    player: Arc<dyn PlayerHandle>,
    view: Arc<dyn TranscriptView>,
    segments: Vec<Segment>,
    interval: Duration,
    active: Mutex<Option<usize>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackSync {
    /// Create a stopped synchronizer polling at the default interval
    pub fn new(
        player: Arc<dyn PlayerHandle>,
        view: Arc<dyn TranscriptView>,
        segments: Vec<Segment>,
    ) -> Self {
        Self::with_interval(player, view, segments, DEFAULT_TICK_INTERVAL)
    }

    /// Create a stopped synchronizer with a custom polling interval
    pub fn with_interval(
        player: Arc<dyn PlayerHandle>,
        view: Arc<dyn TranscriptView>,
        segments: Vec<Segment>,
        interval: Duration,
    ) -> Self {
        Self {
            player,
            view,
            segments,
            interval,
            active: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    /// Currently highlighted line, if any
    pub fn active_index(&self) -> Option<usize> {
        *self.active.lock()
    }

    /// Whether the polling task is running
    pub fn is_running(&self) -> bool {
        self.task.lock().is_some()
    }

    /// Start the polling task. Idempotent: a running synchronizer is left
    /// alone.
    pub fn start(self: &Arc<Self>) {
        let mut task = self.task.lock();
        if task.is_some() {
            return;
        }

        let sync = Arc::clone(self);
        debug!("Starting playback sync over {} segments", self.segments.len());
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sync.interval);
            loop {
                ticker.tick().await;
                sync.tick_once();
            }
        }));
    }

    /// Stop the polling task. Safe to call repeatedly or when never
    /// started; the highlight keeps its last state.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            debug!("Stopped playback sync");
        }
    }

    /// Jump the player to the start of the line at `index` and resume
    /// playback. The highlight is left for the next tick to observe.
    pub fn seek_to(&self, index: usize) {
        if let Some(segment) = self.segments.get(index) {
            self.player.seek(segment.start);
            self.player.play();
        }
    }

    /// One synchronization step: read the position, resolve the active
    /// line, and move the highlight if it changed
    pub fn tick_once(&self) {
        let time = self.player.current_time();
        let next = find_active_index(&self.segments, time);

        let mut active = self.active.lock();
        if *active == next {
            return;
        }

        if let Some(previous) = *active {
            self.view.deactivate(previous);
        }
        if let Some(index) = next {
            self.view.activate(index);
        }
        *active = next;
    }
}

impl Drop for PlaybackSync {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}
