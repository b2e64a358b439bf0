//! Hover debounce and decision handling.
//!
//! A `Detector` arms one single-shot timer per hover session. The timer task
//! and `pointer_leave` both resolve against the same session slot under a
//! lock: whichever takes the pending session first wins, so a timer that was
//! cancelled never dispatches.

use crate::config::VisionSaveConfig;
use crate::detector::candidate::{CandidateResolver, ElementPath};
use crate::detector::filter::is_logo;
use crate::detector::rewrite::rewrite_high_res;
use crate::domain::{Decision, DownloadIntent};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Receives download intents and answers with a decision.
#[async_trait]
pub trait IntentSink: Send + Sync {
    async fn submit(&self, intent: DownloadIntent) -> Decision;
}

/// Visual side effects on the page.
pub trait PageEffects: Send + Sync {
    fn highlight(&self, target: &ElementPath);
    fn unhighlight(&self, target: &ElementPath);
    /// A notice the user must dismiss.
    fn notify_blocking(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverSettings {
    pub hover_delay: Duration,
    pub highlight_hold: Duration,
    /// Shown in the quota notice.
    pub daily_limit: u32,
}

impl Default for HoverSettings {
    fn default() -> Self {
        Self {
            hover_delay: Duration::from_millis(1000),
            highlight_hold: Duration::from_millis(1500),
            daily_limit: 10,
        }
    }
}

impl HoverSettings {
    pub fn from_config(config: &VisionSaveConfig) -> Self {
        Self {
            hover_delay: config.hover_delay(),
            highlight_hold: config.highlight_hold(),
            daily_limit: config.daily_limit,
        }
    }
}

/// What `pointer_enter` did with the hovered element.
#[derive(Debug)]
pub enum HoverOutcome {
    /// No image URL could be resolved.
    NoCandidate,
    /// The candidate was rejected by the logo filter.
    Filtered,
    /// A timer was armed for this session.
    Armed(HoverTicket),
}

/// Completion handle for one armed hover session.
#[derive(Debug)]
pub struct HoverTicket {
    generation: u64,
    done_rx: oneshot::Receiver<Decision>,
}

impl HoverTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Waits for the session to finish, including the highlight hold.
    ///
    /// Returns `None` when the session was cancelled before dispatch.
    pub async fn wait(self) -> Option<Decision> {
        self.done_rx.await.ok()
    }
}

struct PendingHover {
    generation: u64,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct SessionSlot {
    next_generation: u64,
    pending: Option<PendingHover>,
}

/// Per-page hover detector.
pub struct Detector {
    sink: Arc<dyn IntentSink>,
    effects: Arc<dyn PageEffects>,
    settings: HoverSettings,
    slot: Arc<Mutex<SessionSlot>>,
}

impl Detector {
    pub fn new(
        sink: Arc<dyn IntentSink>,
        effects: Arc<dyn PageEffects>,
        settings: HoverSettings,
    ) -> Self {
        Self {
            sink,
            effects,
            settings,
            slot: Arc::new(Mutex::new(SessionSlot::default())),
        }
    }

    /// Handles the pointer entering `element`.
    ///
    /// Must be called from within a tokio runtime. Entering a new candidate
    /// replaces any pending session.
    pub fn pointer_enter<E: CandidateResolver>(&self, element: &E) -> HoverOutcome {
        let Some(candidate) = element.resolve_candidate() else {
            return HoverOutcome::NoCandidate;
        };
        if is_logo(
            &candidate.url,
            candidate.class.as_deref(),
            candidate.id.as_deref(),
        ) {
            return HoverOutcome::Filtered;
        }

        let intent = DownloadIntent::new(rewrite_high_res(&candidate.url));
        let target = candidate.highlight;
        let fire_at = Instant::now() + self.settings.hover_delay;
        let (done_tx, done_rx) = oneshot::channel();

        let mut slot = lock_slot(&self.slot);
        if let Some(previous) = slot.pending.take() {
            previous.task.abort();
        }
        slot.next_generation += 1;
        let generation = slot.next_generation;

        let session = Session {
            generation,
            fire_at,
            intent,
            target,
            settings: self.settings,
            slot: Arc::clone(&self.slot),
            sink: Arc::clone(&self.sink),
            effects: Arc::clone(&self.effects),
            done_tx,
        };
        let task = tokio::spawn(session.run());
        slot.pending = Some(PendingHover { generation, task });

        HoverOutcome::Armed(HoverTicket {
            generation,
            done_rx,
        })
    }

    /// Handles the pointer leaving the hovered element or a nested image.
    ///
    /// Returns true if a pending timer was cancelled.
    pub fn pointer_leave(&self) -> bool {
        let mut slot = lock_slot(&self.slot);
        match slot.pending.take() {
            Some(pending) => {
                pending.task.abort();
                true
            }
            None => false,
        }
    }

    /// True while a hover timer is armed and has not fired.
    pub fn has_pending(&self) -> bool {
        lock_slot(&self.slot).pending.is_some()
    }
}

impl Drop for Detector {
    fn drop(&mut self) {
        self.pointer_leave();
    }
}

fn lock_slot(slot: &Mutex<SessionSlot>) -> MutexGuard<'_, SessionSlot> {
    // The slot holds no invariant a panicking holder could break.
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Claims the session if it is still the pending one.
fn claim(slot: &Mutex<SessionSlot>, generation: u64) -> bool {
    let mut slot = lock_slot(slot);
    let current = slot
        .pending
        .as_ref()
        .is_some_and(|pending| pending.generation == generation);
    if current {
        slot.pending = None;
    }
    current
}

struct Session {
    generation: u64,
    fire_at: Instant,
    intent: DownloadIntent,
    target: ElementPath,
    settings: HoverSettings,
    slot: Arc<Mutex<SessionSlot>>,
    sink: Arc<dyn IntentSink>,
    effects: Arc<dyn PageEffects>,
    done_tx: oneshot::Sender<Decision>,
}

impl Session {
    async fn run(self) {
        tokio::time::sleep_until(self.fire_at).await;
        if !claim(&self.slot, self.generation) {
            return;
        }

        let target = &self.target;
        self.effects.highlight(target);
        let url = self.intent.url.clone();
        let decision = self.sink.submit(self.intent).await;

        match decision {
            Decision::DenyQuota => {
                self.effects.unhighlight(target);
                self.effects.notify_blocking(&format!(
                    "VisionSave: Daily free limit ({}) reached. Upgrade to Premium for unlimited downloads!",
                    self.settings.daily_limit
                ));
            }
            Decision::DenyCooldown => {
                self.effects.unhighlight(target);
                tracing::info!(url = %url, "Waiting between downloads");
            }
            Decision::Allow { .. } | Decision::Error => {
                tokio::time::sleep(self.settings.highlight_hold).await;
                self.effects.unhighlight(target);
            }
        }

        if self.done_tx.send(decision).is_err() {
            tracing::debug!("Hover ticket dropped before completion");
        }
    }
}

#[cfg(test)]
#[path = "tests/hover_tests.rs"]
mod tests;
