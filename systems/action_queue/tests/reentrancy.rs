use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use candy_quest_core::PlayMode;
use candy_quest_system_action_queue::{ActionHandler, ActionQueue, BatchReport};
use tokio::sync::mpsc;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Step {
    Leaf(u32),
    Spawn(u32, Vec<u32>),
    ClearRest(u32),
}

impl Step {
    fn label(&self) -> u32 {
        match self {
            Step::Leaf(label) | Step::Spawn(label, _) | Step::ClearRest(label) => *label,
        }
    }
}

#[derive(Clone, Default)]
struct Gauge {
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

struct Tracker {
    gauge: Gauge,
    order: Vec<u32>,
    reports: Vec<BatchReport>,
}

impl Tracker {
    fn new(gauge: Gauge) -> Self {
        Self {
            gauge,
            order: Vec::new(),
            reports: Vec::new(),
        }
    }
}

#[async_trait]
impl ActionHandler<Step> for Tracker {
    async fn execute(&mut self, action: Step, queue: &ActionQueue<Step>) -> anyhow::Result<()> {
        let running = self.gauge.running.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.gauge.peak.fetch_max(running, Ordering::SeqCst);
        assert!(queue.active().is_some());

        self.order.push(action.label());
        match action {
            Step::Leaf(_) => {}
            Step::Spawn(_, children) => {
                for child in children {
                    let _ = queue.enqueue(Step::Leaf(child));
                    tokio::task::yield_now().await;
                }
            }
            Step::ClearRest(_) => {
                let _ = queue.clear();
            }
        }
        tokio::time::sleep(Duration::from_millis(1)).await;

        let _ = self.gauge.running.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    async fn batch_complete(&mut self, report: BatchReport) {
        self.reports.push(report);
    }
}

#[tokio::test]
async fn reentrant_enqueues_run_after_current_work() {
    let queue = ActionQueue::new();
    let _ = queue.enqueue(Step::Spawn(1, vec![10, 11]));
    let _ = queue.enqueue(Step::Leaf(2));

    let gauge = Gauge::default();
    let mut tracker = Tracker::new(gauge.clone());
    let report = queue.drain(&mut tracker).await.expect("work pending");

    assert_eq!(tracker.order, vec![1, 2, 10, 11]);
    assert_eq!(report.executed, 4);
    assert_eq!(tracker.reports.len(), 1);
    assert_eq!(gauge.peak.load(Ordering::SeqCst), 1);
    assert_eq!(queue.mode(), PlayMode::Playable);
}

#[tokio::test]
async fn clear_from_inside_keeps_the_active_action() {
    let queue = ActionQueue::new();
    for step in [Step::Leaf(1), Step::ClearRest(2), Step::Leaf(3), Step::Leaf(4)] {
        let _ = queue.enqueue(step);
    }

    let mut tracker = Tracker::new(Gauge::default());
    let report = queue.drain(&mut tracker).await.expect("work pending");

    assert_eq!(tracker.order, vec![1, 2]);
    assert_eq!(report.executed, 2);
    assert!(queue.is_idle());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_drains_never_overlap() {
    let queue = ActionQueue::new();
    for label in 0..8 {
        let _ = queue.enqueue(Step::Spawn(label, vec![100 + label]));
    }

    let gauge = Gauge::default();
    let mut tasks = Vec::new();
    for _ in 0..4 {
        let queue = queue.clone();
        let gauge = gauge.clone();
        tasks.push(tokio::spawn(async move {
            let mut tracker = Tracker::new(gauge);
            let report = queue.drain(&mut tracker).await;
            (report, tracker)
        }));
    }

    let mut reports = Vec::new();
    let mut executed = 0;
    for task in tasks {
        let (report, tracker) = task.await.expect("drain task");
        executed += tracker.order.len();
        reports.extend(report);
        assert!(tracker.reports.len() <= 1);
    }

    assert_eq!(gauge.peak.load(Ordering::SeqCst), 1);
    assert_eq!(executed, 16);
    assert_eq!(reports.iter().map(|report| report.executed).sum::<usize>(), 16);
    assert!(queue.is_idle());
}

struct Forwarder {
    reports: mpsc::UnboundedSender<BatchReport>,
}

#[async_trait]
impl ActionHandler<Step> for Forwarder {
    async fn execute(&mut self, action: Step, queue: &ActionQueue<Step>) -> anyhow::Result<()> {
        if let Step::Spawn(_, children) = action {
            for child in children {
                let _ = queue.enqueue(Step::Leaf(child));
            }
        }
        Ok(())
    }

    async fn batch_complete(&mut self, report: BatchReport) {
        let _ = self.reports.send(report);
    }
}

#[tokio::test]
async fn worker_reports_each_batch_once_and_stops_on_close() {
    let queue = ActionQueue::new();
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let worker = tokio::spawn(queue.clone().run(Forwarder { reports: sender }));

    let _ = queue.enqueue(Step::Spawn(1, vec![2, 3]));
    let first = receiver.recv().await.expect("first batch");
    assert_eq!((first.batch, first.executed), (1, 3));

    let _ = queue.enqueue_if_idle(Step::Leaf(4)).expect("idle after batch");
    let second = receiver.recv().await.expect("second batch");
    assert_eq!((second.batch, second.executed), (2, 1));

    queue.close();
    worker.await.expect("worker stops");
    assert!(receiver.try_recv().is_err());
}

struct Fragile {
    reports: mpsc::UnboundedSender<BatchReport>,
}

#[async_trait]
impl ActionHandler<Step> for Fragile {
    async fn execute(&mut self, action: Step, _queue: &ActionQueue<Step>) -> anyhow::Result<()> {
        let empty: Vec<u32> = Vec::new();
        if action.label() == 3 {
            let _ = empty[action.label() as usize];
        }
        Ok(())
    }

    async fn batch_complete(&mut self, report: BatchReport) {
        let _ = self.reports.send(report);
    }
}

#[tokio::test]
async fn worker_survives_a_panicking_action() {
    let queue = ActionQueue::new();
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let worker = tokio::spawn(queue.clone().run(Fragile { reports: sender }));

    let _ = queue.enqueue(Step::Leaf(3));
    let _ = queue.enqueue(Step::Leaf(4));
    let first = receiver.recv().await.expect("batch despite the panic");
    assert_eq!((first.executed, first.failed), (2, 1));

    let _ = queue.enqueue_if_idle(Step::Leaf(5)).expect("idle after the panic");
    let second = receiver.recv().await.expect("worker still running");
    assert_eq!((second.batch, second.executed, second.failed), (2, 1, 0));

    queue.close();
    worker.await.expect("worker did not panic");
}
