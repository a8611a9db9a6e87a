#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Serialized action queue that runs gameplay mutations one at a time.
//!
//! The queue holds pending actions plus a single active slot. Draining pops the
//! head, marks it active, awaits its handler and repeats until nothing is left,
//! then reports the whole run to the handler once. Actions may enqueue further
//! actions while they execute; those run after the current one finishes.
//!
//! A drain that is dropped part way, or an action body that panics, leaves the
//! queue usable: the drain bookkeeping is reset when the drain ends, however it
//! ends.

use std::{
    any::Any,
    collections::VecDeque,
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use candy_quest_core::PlayMode;
use futures_util::FutureExt as _;
use thiserror::Error;
use tokio::sync::Notify;

/// Receipt identifying an enqueued action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionTicket(u64);

impl ActionTicket {
    /// Sequence number assigned at enqueue time.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Returned by [`ActionQueue::enqueue_if_idle`] while work is pending or active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("action queue is busy")]
pub struct QueueBusy;

/// Summary of one full drain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchReport {
    /// One-based sequence number of the batch.
    pub batch: u64,
    /// Actions started during the drain.
    pub executed: usize,
    /// Actions whose handler returned an error or panicked.
    pub failed: usize,
}

/// Executes dequeued actions and observes completed batches.
#[async_trait]
pub trait ActionHandler<A>: Send
where
    A: Send + 'static,
{
    /// Runs a single action.
    ///
    /// The queue handle may be used to enqueue follow-up actions. Errors are
    /// logged by the drain loop and the action counts as complete.
    async fn execute(&mut self, action: A, queue: &ActionQueue<A>) -> anyhow::Result<()>;

    /// Called exactly once after a drain empties the queue.
    ///
    /// No other drain can start until this returns, so the handler observes
    /// the state the batch left behind. New intake is accepted meanwhile and
    /// runs in the next batch.
    async fn batch_complete(&mut self, report: BatchReport);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Executing,
    Reporting,
}

struct QueueState<A> {
    pending: VecDeque<(ActionTicket, A)>,
    active: Option<ActionTicket>,
    phase: Phase,
    closed: bool,
    next_ticket: u64,
    batches: u64,
}

impl<A> QueueState<A> {
    fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.active.is_none() && self.phase != Phase::Executing
    }

    fn push(&mut self, action: A) -> ActionTicket {
        let ticket = ActionTicket(self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.pending.push_back((ticket, action));
        ticket
    }
}

struct Inner<A> {
    state: Mutex<QueueState<A>>,
    wake: Notify,
}

/// Cloneable handle to a shared action queue.
pub struct ActionQueue<A> {
    inner: Arc<Inner<A>>,
}

impl<A> Clone for ActionQueue<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> Default for ActionQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> std::fmt::Debug for ActionQueue<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ActionQueue")
            .field("pending", &state.pending.len())
            .field("active", &state.active)
            .field("phase", &state.phase)
            .field("batches", &state.batches)
            .finish()
    }
}

impl<A> ActionQueue<A> {
    /// Creates an empty, idle queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState {
                    pending: VecDeque::new(),
                    active: None,
                    phase: Phase::Idle,
                    closed: false,
                    next_ticket: 0,
                    batches: 0,
                }),
                wake: Notify::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<A>> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an action to the tail and wakes the worker.
    pub fn enqueue(&self, action: A) -> ActionTicket {
        let ticket = self.lock().push(action);
        self.inner.wake.notify_one();
        ticket
    }

    /// Appends an action only when nothing is pending or active.
    pub fn enqueue_if_idle(&self, action: A) -> Result<ActionTicket, QueueBusy> {
        let ticket = {
            let mut state = self.lock();
            if !state.is_idle() {
                return Err(QueueBusy);
            }
            state.push(action)
        };
        self.inner.wake.notify_one();
        Ok(ticket)
    }

    /// Drops every action that has not started yet and returns how many were
    /// removed. The active action keeps running.
    pub fn clear(&self) -> usize {
        let removed = {
            let mut state = self.lock();
            let removed = state.pending.len();
            state.pending.clear();
            removed
        };
        if removed > 0 {
            tracing::debug!(removed, "cleared pending actions");
        }
        removed
    }

    /// Reports whether nothing is pending or executing.
    ///
    /// A drain that is only reporting its finished batch counts as idle.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.lock().is_idle()
    }

    /// Input mode implied by the queue state.
    #[must_use]
    pub fn mode(&self) -> PlayMode {
        if self.is_idle() {
            PlayMode::Playable
        } else {
            PlayMode::Working
        }
    }

    /// Ticket of the action currently executing.
    #[must_use]
    pub fn active(&self) -> Option<ActionTicket> {
        self.lock().active
    }

    /// Number of actions waiting to start.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Number of drains completed so far.
    #[must_use]
    pub fn batches_completed(&self) -> u64 {
        self.lock().batches
    }

    /// Stops the worker started by [`ActionQueue::run`] once it is between
    /// batches.
    pub fn close(&self) {
        self.lock().closed = true;
        self.inner.wake.notify_one();
    }

    /// Reports whether [`ActionQueue::close`] was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl<A> ActionQueue<A>
where
    A: Send + 'static,
{
    /// Executes pending actions until the queue is empty.
    ///
    /// Returns `None` without doing anything when another drain is already
    /// running or nothing is pending. Otherwise the handler's
    /// [`ActionHandler::batch_complete`] is awaited exactly once before the
    /// report is returned.
    ///
    /// An action that panics is logged and counted in [`BatchReport::failed`].
    /// Dropping the returned future abandons the rest of the batch without a
    /// report; pending actions stay queued for the next drain.
    pub async fn drain<H>(&self, handler: &mut H) -> Option<BatchReport>
    where
        H: ActionHandler<A> + ?Sized,
    {
        {
            let mut state = self.lock();
            if state.phase != Phase::Idle || state.pending.is_empty() {
                return None;
            }
            state.phase = Phase::Executing;
        }
        let _guard = DrainGuard { queue: self };

        let mut executed = 0_usize;
        let mut failed = 0_usize;
        let batch = loop {
            let next = {
                let mut state = self.lock();
                state.active = None;
                match state.pending.pop_front() {
                    Some((ticket, action)) => {
                        state.active = Some(ticket);
                        Ok((ticket, action))
                    }
                    None => {
                        state.phase = Phase::Reporting;
                        state.batches = state.batches.saturating_add(1);
                        Err(state.batches)
                    }
                }
            };
            let (ticket, action) = match next {
                Ok(started) => started,
                Err(batch) => break batch,
            };

            executed += 1;
            match AssertUnwindSafe(handler.execute(action, self))
                .catch_unwind()
                .await
            {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    failed += 1;
                    tracing::error!(
                        ticket = ticket.get(),
                        error = ?error,
                        "action failed; treating it as complete"
                    );
                }
                Err(payload) => {
                    failed += 1;
                    tracing::error!(
                        ticket = ticket.get(),
                        panic = panic_message(payload.as_ref()),
                        "action panicked; treating it as complete"
                    );
                }
            }
        };

        let report = BatchReport {
            batch,
            executed,
            failed,
        };
        tracing::debug!(batch, executed, failed, "action batch drained");
        handler.batch_complete(report).await;
        Some(report)
    }

    /// Worker loop that drains whenever actions arrive until the queue is
    /// closed.
    pub async fn run<H>(self, mut handler: H)
    where
        H: ActionHandler<A>,
    {
        tracing::info!("action queue worker started");
        loop {
            let _ = self.drain(&mut handler).await;
            if self.is_closed() {
                break;
            }
            self.inner.wake.notified().await;
        }
        tracing::info!("action queue worker stopped");
    }
}

/// Resets the drain bookkeeping when a drain finishes, is dropped or unwinds.
struct DrainGuard<'a, A> {
    queue: &'a ActionQueue<A>,
}

impl<A> Drop for DrainGuard<'_, A> {
    fn drop(&mut self) {
        let leftover = {
            let mut state = self.queue.lock();
            if let Some(ticket) = state.active.take() {
                tracing::warn!(ticket = ticket.get(), "drain abandoned mid-action");
            }
            state.phase = Phase::Idle;
            !state.pending.is_empty()
        };
        if leftover {
            self.queue.inner.wake.notify_one();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        seen: Vec<u32>,
        reports: Vec<BatchReport>,
    }

    #[async_trait]
    impl ActionHandler<u32> for Recorder {
        async fn execute(&mut self, action: u32, queue: &ActionQueue<u32>) -> anyhow::Result<()> {
            assert_eq!(queue.mode(), PlayMode::Working);
            self.seen.push(action);
            if action == 13 {
                anyhow::bail!("unlucky action");
            }
            Ok(())
        }

        async fn batch_complete(&mut self, report: BatchReport) {
            self.reports.push(report);
        }
    }

    fn recorder() -> Recorder {
        Recorder {
            seen: Vec::new(),
            reports: Vec::new(),
        }
    }

    #[tokio::test]
    async fn tickets_increase_and_idle_intake_is_exclusive() {
        let queue = ActionQueue::new();
        let first = queue.enqueue_if_idle(1).expect("idle");
        assert_eq!(queue.enqueue_if_idle(2), Err(QueueBusy));
        let second = queue.enqueue(3);

        assert!(first < second);
        assert_eq!(queue.pending_len(), 2);
        assert_eq!(queue.mode(), PlayMode::Working);

        let mut handler = recorder();
        let report = queue.drain(&mut handler).await.expect("work pending");
        assert_eq!(handler.seen, vec![1, 3]);
        assert_eq!(report.executed, 2);
        assert!(queue.is_idle());
        assert_eq!(queue.mode(), PlayMode::Playable);
    }

    #[tokio::test]
    async fn failures_are_counted_and_draining_continues() {
        let queue = ActionQueue::new();
        for action in [12, 13, 14] {
            let _ = queue.enqueue(action);
        }

        let mut handler = recorder();
        let report = queue.drain(&mut handler).await.expect("work pending");
        assert_eq!(handler.seen, vec![12, 13, 14]);
        assert_eq!(
            report,
            BatchReport {
                batch: 1,
                executed: 3,
                failed: 1
            }
        );
        assert_eq!(handler.reports, vec![report]);
    }

    #[tokio::test]
    async fn empty_drain_reports_nothing() {
        let queue: ActionQueue<u32> = ActionQueue::new();
        let mut handler = recorder();
        assert_eq!(queue.drain(&mut handler).await, None);
        assert!(handler.reports.is_empty());
        assert_eq!(queue.batches_completed(), 0);
    }

    struct Sluggish {
        delay: std::time::Duration,
        seen: Vec<u32>,
    }

    #[async_trait]
    impl ActionHandler<u32> for Sluggish {
        async fn execute(&mut self, action: u32, _queue: &ActionQueue<u32>) -> anyhow::Result<()> {
            tokio::time::sleep(self.delay).await;
            self.seen.push(action);
            Ok(())
        }

        async fn batch_complete(&mut self, _report: BatchReport) {}
    }

    #[tokio::test]
    async fn cancelled_drain_leaves_the_queue_usable() {
        let queue = ActionQueue::new();
        let _ = queue.enqueue(1);
        let _ = queue.enqueue(2);

        let mut handler = Sluggish {
            delay: std::time::Duration::from_millis(200),
            seen: Vec::new(),
        };
        let cancelled = tokio::time::timeout(
            std::time::Duration::from_millis(5),
            queue.drain(&mut handler),
        )
        .await;
        assert!(cancelled.is_err(), "drain should outlive the timeout");
        assert!(handler.seen.is_empty());
        assert_eq!(queue.active(), None);
        assert_eq!(queue.pending_len(), 1);
        assert_eq!(queue.batches_completed(), 0);

        handler.delay = std::time::Duration::ZERO;
        let report = queue.drain(&mut handler).await.expect("leftover work");
        assert_eq!(handler.seen, vec![2]);
        assert_eq!((report.batch, report.executed), (1, 1));
        assert!(queue.is_idle());
        let _ = queue.enqueue_if_idle(3).expect("idle after recovery");
    }

    struct Reporter {
        queue: ActionQueue<u32>,
        mode_while_reporting: Option<PlayMode>,
        nested_drain: Option<Option<BatchReport>>,
    }

    #[async_trait]
    impl ActionHandler<u32> for Reporter {
        async fn execute(&mut self, _action: u32, _queue: &ActionQueue<u32>) -> anyhow::Result<()> {
            Ok(())
        }

        async fn batch_complete(&mut self, _report: BatchReport) {
            self.mode_while_reporting = Some(self.queue.mode());
            let _ = self.queue.enqueue_if_idle(99).expect("intake open while reporting");
            let mut other = recorder();
            self.nested_drain = Some(self.queue.drain(&mut other).await);
        }
    }

    #[tokio::test]
    async fn no_second_drain_starts_while_a_batch_is_reported() {
        let queue = ActionQueue::new();
        let _ = queue.enqueue(1);
        let mut handler = Reporter {
            queue: queue.clone(),
            mode_while_reporting: None,
            nested_drain: None,
        };

        let first = queue.drain(&mut handler).await.expect("work pending");
        assert_eq!(first.batch, 1);
        assert_eq!(handler.mode_while_reporting, Some(PlayMode::Playable));
        assert_eq!(handler.nested_drain, Some(None));
        assert_eq!(queue.pending_len(), 1);

        let mut follow_up = recorder();
        let second = queue.drain(&mut follow_up).await.expect("queued while reporting");
        assert_eq!(follow_up.seen, vec![99]);
        assert_eq!(second.batch, 2);
    }

    #[test]
    fn clear_drops_only_pending_work() {
        let queue = ActionQueue::new();
        for action in 0..4 {
            let _ = queue.enqueue(action);
        }
        assert_eq!(queue.clear(), 4);
        assert_eq!(queue.clear(), 0);
        assert!(queue.is_idle());
    }
}
