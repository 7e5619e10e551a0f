//! Concurrency tests for the notification dispatcher
//!
//! **Coverage:**
//! - Many passes racing over the same queue deliver each reminder once
//! - The running worker pool drains every queue and stops cleanly
//! - Stopping twice reports `NotRunning`

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use gardenwise_common::Clock;
use gardenwise_domain::{DispatcherConfig, TaskType};
use gardenwise_infra::dispatch::DispatcherError;
use support::{request, Stack};

const TASKS_PER_TYPE: usize = 20;

async fn schedule_many(stack: &Stack) -> usize {
    let mut created = 0;
    for task_type in TaskType::ALL {
        for bed in 0..TASKS_PER_TYPE {
            stack
                .scheduler
                .create_schedule(request(task_type, &format!("bed-{bed}")))
                .await
                .expect("schedule created");
            created += 1;
        }
    }
    // every reminder is now due
    stack.clock.advance_by(TimeDelta::hours(3));
    created
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_passes_deliver_each_reminder_once() {
    let stack = Stack::new();
    let created = schedule_many(&stack).await;

    let config = DispatcherConfig { claim_batch_size: 7, ..DispatcherConfig::default() };
    let dispatcher = Arc::new(stack.dispatcher(config));

    let mut passes = Vec::new();
    for _ in 0..8 {
        let dispatcher = Arc::clone(&dispatcher);
        passes.push(tokio::spawn(async move {
            let mut delivered = 0;
            loop {
                let summary = dispatcher.tick_once().await;
                if summary.handled() == 0 {
                    break delivered;
                }
                delivered += summary.delivered;
            }
        }));
    }

    let mut delivered = 0;
    for pass in passes {
        delivered += pass.await.expect("pass completed");
    }

    assert_eq!(delivered, created);
    let counts = stack.channel.counts();
    assert_eq!(counts.len(), created);
    assert!(counts.values().all(|count| *count == 1), "duplicate delivery: {counts:?}");
    for task_type in TaskType::ALL {
        assert_eq!(stack.queue.pending_count(task_type).await.unwrap(), 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn worker_pool_drains_queues_and_stops() {
    let stack = Stack::new();
    let created = schedule_many(&stack).await;

    let config = DispatcherConfig {
        workers: 3,
        tick_interval_secs: 1,
        claim_batch_size: 5,
        ..DispatcherConfig::default()
    };
    let mut dispatcher = stack.dispatcher(config).with_join_timeout(Duration::from_secs(2));
    dispatcher.start().expect("dispatcher started");

    let drained = tokio::time::timeout(Duration::from_secs(30), async {
        while stack.channel.delivered().len() < created {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;
    dispatcher.stop().await.expect("dispatcher stopped");

    assert!(drained.is_ok(), "only {} of {created} delivered", stack.channel.delivered().len());
    assert!(stack.channel.counts().values().all(|count| *count == 1));
    assert_eq!(stack.metrics.snapshot().delivered, created as u64);
    assert!(matches!(dispatcher.stop().await, Err(DispatcherError::NotRunning)));
}

#[tokio::test]
async fn reminders_due_later_are_left_for_later_passes() {
    let stack = Stack::new();
    stack.scheduler.create_schedule(request(TaskType::Water, "bed-1")).await.unwrap();

    let dispatcher = stack.dispatcher(DispatcherConfig::default());
    assert_eq!(dispatcher.tick_once().await.handled(), 0);

    stack.clock.advance_by(TimeDelta::hours(2));
    assert!(stack.clock.now() > support::start_time());
    assert_eq!(dispatcher.tick_once().await.delivered, 1);
}
