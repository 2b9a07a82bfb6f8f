use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use foodfight_core::{Action, FieldState, Symbol};
use tracing::{debug, warn};

use crate::controller::{Canceller, Controller, ControllerError};

fn to_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

// ── Chess clock ─────────────────────────────────────────────

/// Match-long time budget shared by every call of one controller.
#[derive(Debug)]
pub struct ChessClock {
    remaining_nanos: AtomicU64,
    dead: AtomicBool,
    grace: Duration,
}

impl ChessClock {
    pub fn new(budget: Duration, grace: Duration) -> Self {
        Self {
            remaining_nanos: AtomicU64::new(to_nanos(budget)),
            dead: AtomicBool::new(false),
            grace,
        }
    }

    pub fn remaining(&self) -> Duration {
        Duration::from_nanos(self.remaining_nanos.load(Ordering::SeqCst))
    }

    pub fn is_dead(&self) -> bool {
        self.dead.load(Ordering::SeqCst)
    }

    pub fn kill(&self) {
        self.dead.store(true, Ordering::SeqCst);
    }

    /// How long the next call may take, or `None` once the controller is out.
    pub fn begin(&self) -> Option<Duration> {
        if self.is_dead() {
            return None;
        }
        let remaining = self.remaining();
        if remaining.is_zero() {
            self.kill();
            return None;
        }
        Some(remaining + self.grace)
    }

    /// Deduct `elapsed` from the budget. Returns what is left; an exhausted
    /// budget kills the controller.
    pub fn charge(&self, elapsed: Duration) -> Duration {
        let spent = to_nanos(elapsed);
        let previous = self
            .remaining_nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                Some(left.saturating_sub(spent))
            })
            .unwrap_or(0);
        let left = previous.saturating_sub(spent);
        if left == 0 {
            self.kill();
        }
        Duration::from_nanos(left)
    }
}

// ── Clocked controller ──────────────────────────────────────

struct Request {
    field: Arc<FieldState>,
    team: Symbol,
    player: Symbol,
}

struct Reply {
    result: Result<Option<Action>, ControllerError>,
    elapsed: Duration,
}

/// A call that has been dispatched but not yet collected.
#[derive(Debug)]
#[must_use]
pub struct PendingAction {
    player: Symbol,
    started: Instant,
    allowance: Duration,
}

/// Runs a controller on its own worker thread and enforces its chess clock.
pub struct ClockedController {
    label: String,
    clock: ChessClock,
    requests: Option<Sender<Request>>,
    replies: Receiver<Reply>,
    canceller: Option<Canceller>,
    worker: Option<JoinHandle<()>>,
}

impl ClockedController {
    pub fn spawn(
        label: impl Into<String>,
        controller: Box<dyn Controller>,
        clock: ChessClock,
    ) -> Self {
        let label = label.into();
        let canceller = controller.canceller();
        let (request_tx, request_rx) = mpsc::channel::<Request>();
        let (reply_tx, reply_rx) = mpsc::channel::<Reply>();

        let mut controller = controller;
        let worker = thread::Builder::new()
            .name(format!("controller-{label}"))
            .spawn(move || {
                for request in request_rx {
                    let start = Instant::now();
                    let result =
                        controller.play_action(&request.field, request.team, request.player);
                    let reply = Reply {
                        result,
                        elapsed: start.elapsed(),
                    };
                    if reply_tx.send(reply).is_err() {
                        break;
                    }
                }
            });

        let (worker, requests) = match worker {
            Ok(handle) => (Some(handle), Some(request_tx)),
            Err(e) => {
                warn!(controller = %label, error = %e, "could not start controller worker");
                (None, None)
            }
        };
        if requests.is_none() {
            clock.kill();
        }

        Self {
            label,
            clock,
            requests,
            replies: reply_rx,
            canceller,
            worker,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn clock(&self) -> &ChessClock {
        &self.clock
    }

    pub fn is_dead(&self) -> bool {
        self.clock.is_dead()
    }

    fn retire(&mut self, reason: &ControllerError) {
        warn!(
            controller = %self.label,
            %reason,
            remaining_ms = self.clock.remaining().as_millis() as u64,
            "controller retired"
        );
        self.clock.kill();
    }

    /// Hand a call to the worker without waiting for it.
    pub fn request(
        &mut self,
        field: &Arc<FieldState>,
        team: Symbol,
        player: Symbol,
    ) -> Option<PendingAction> {
        let allowance = self.clock.begin()?;
        let sender = self.requests.as_ref()?;
        let request = Request {
            field: Arc::clone(field),
            team,
            player,
        };
        if sender.send(request).is_err() {
            self.retire(&ControllerError::Worker);
            return None;
        }
        Some(PendingAction {
            player,
            started: Instant::now(),
            allowance,
        })
    }

    /// Collect a dispatched call, waiting at most until its deadline.
    pub fn wait(&mut self, pending: PendingAction) -> Option<Action> {
        let waited = pending.started.elapsed();
        let timeout = pending.allowance.saturating_sub(waited);
        match self.replies.recv_timeout(timeout) {
            Ok(reply) => {
                let left = self.clock.charge(reply.elapsed);
                match reply.result {
                    Ok(action) => {
                        // Answered in time but drained the budget: the action stands.
                        if self.clock.is_dead() {
                            self.retire(&ControllerError::Timeout);
                        }
                        debug!(
                            controller = %self.label,
                            player = %pending.player,
                            ?action,
                            left_ms = left.as_millis() as u64,
                            "action received"
                        );
                        action
                    }
                    Err(e) => {
                        self.retire(&e);
                        None
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                self.clock.charge(pending.started.elapsed());
                if let Some(cancel) = &self.canceller {
                    cancel();
                }
                self.retire(&ControllerError::Timeout);
                None
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.retire(&ControllerError::Worker);
                None
            }
        }
    }

    /// Dispatch and wait in one step.
    pub fn play(
        &mut self,
        field: &Arc<FieldState>,
        team: Symbol,
        player: Symbol,
    ) -> Option<Action> {
        let pending = self.request(field, team, player)?;
        self.wait(pending)
    }
}

impl Drop for ClockedController {
    fn drop(&mut self) {
        // Closing the channel ends an idle worker; a hung one is left detached.
        self.requests = None;
        if let Some(handle) = self.worker.take() {
            if self.clock.is_dead() {
                if let Some(cancel) = &self.canceller {
                    cancel();
                }
            } else {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use foodfight_core::{generate_field, seeded, MatchConfig};

    struct Sleepy {
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    impl Controller for Sleepy {
        fn play_action(
            &mut self,
            _field: &FieldState,
            _team: Symbol,
            _player: Symbol,
        ) -> Result<Option<Action>, ControllerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            Ok(Some(Action::Duck))
        }
    }

    struct Broken;

    impl Controller for Broken {
        fn play_action(
            &mut self,
            _field: &FieldState,
            _team: Symbol,
            _player: Symbol,
        ) -> Result<Option<Action>, ControllerError> {
            Err(ControllerError::Closed)
        }
    }

    fn field() -> Arc<FieldState> {
        Arc::new(generate_field(&MatchConfig::default(), &mut seeded(1)))
    }

    #[test]
    fn charge_saturates_and_kills() {
        let clock = ChessClock::new(Duration::from_millis(10), Duration::ZERO);
        assert_eq!(clock.begin(), Some(Duration::from_millis(10)));
        assert_eq!(clock.charge(Duration::from_millis(4)), Duration::from_millis(6));
        assert!(!clock.is_dead());
        assert_eq!(clock.charge(Duration::from_secs(1)), Duration::ZERO);
        assert!(clock.is_dead());
        assert_eq!(clock.begin(), None);
    }

    #[test]
    fn grace_extends_the_deadline() {
        let clock = ChessClock::new(Duration::from_millis(10), Duration::from_millis(5));
        assert_eq!(clock.begin(), Some(Duration::from_millis(15)));
    }

    #[test]
    fn fast_controller_answers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sleepy = Sleepy {
            delay: Duration::from_millis(1),
            calls: Arc::clone(&calls),
        };
        let clock = ChessClock::new(Duration::from_secs(5), Duration::from_millis(50));
        let mut clocked = ClockedController::spawn("fast", Box::new(sleepy), clock);
        let field = field();
        for _ in 0..3 {
            assert_eq!(clocked.play(&field, 'A', 'a'), Some(Action::Duck));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(clocked.clock().remaining() < Duration::from_secs(5));
    }

    #[test]
    fn overrun_kills_controller() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sleepy = Sleepy {
            delay: Duration::from_millis(400),
            calls: Arc::clone(&calls),
        };
        let clock = ChessClock::new(Duration::from_millis(50), Duration::from_millis(10));
        let mut clocked = ClockedController::spawn("slow", Box::new(sleepy), clock);
        let field = field();

        let started = Instant::now();
        assert_eq!(clocked.play(&field, 'A', 'a'), None);
        assert!(started.elapsed() < Duration::from_millis(300));
        assert!(clocked.is_dead());

        assert_eq!(clocked.play(&field, 'A', 'a'), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn controller_error_retires() {
        let clock = ChessClock::new(Duration::from_secs(5), Duration::ZERO);
        let mut clocked = ClockedController::spawn("broken", Box::new(Broken), clock);
        let field = field();
        assert_eq!(clocked.play(&field, 'A', 'a'), None);
        assert!(clocked.is_dead());
        assert!(clocked.request(&field, 'A', 'a').is_none());
    }
}
