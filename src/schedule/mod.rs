//! Named periodic tasks with minimum-wait sleep across the task set.
//!
//! Each collector worker owns one schedule and clocks itself with it; the
//! supervisor keeps a separate schedule for the self-monitor. A task that
//! overruns its interval does not stack ticks: the next run is the first
//! one due after `stop()`.

use std::time::Duration;

use indexmap::IndexMap;
use tokio::time::Instant;

use crate::error::Error;

#[derive(Debug)]
pub struct Task {
    name: String,
    interval: Duration,
    last_run: Option<Instant>,
    next_run: Instant,
    running: bool,
}

impl Task {
    fn new(name: &str, interval: Duration) -> Self {
        Self {
            name: name.to_string(),
            interval,
            last_run: None,
            // a fresh task is due immediately
            next_run: Instant::now(),
            running: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_due(&self) -> bool {
        Instant::now() >= self.next_run
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stamps `last_run = now` and advances the due time by one interval.
    pub fn start(&mut self) {
        let now = Instant::now();
        self.last_run = Some(now);
        self.next_run = now + self.interval;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    fn next_run(&self) -> Instant {
        self.next_run
    }
}

#[derive(Debug, Default)]
pub struct Schedule {
    tasks: IndexMap<String, Task>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named task with an interval given as a duration string
    /// ("60s", "1m30s", "500ms").
    pub fn add_task(&mut self, name: &str, interval: &str) -> Result<(), Error> {
        let parsed = humantime::parse_duration(interval)
            .map_err(|e| Error::Config(format!("task [{name}]: invalid interval [{interval}]: {e}")))?;
        if parsed.is_zero() {
            return Err(Error::Config(format!("task [{name}]: zero interval")));
        }
        if self.tasks.contains_key(name) {
            return Err(Error::Config(format!("task [{name}] already scheduled")));
        }
        self.tasks.insert(name.to_string(), Task::new(name, parsed));
        Ok(())
    }

    pub fn get_task(&mut self, name: &str) -> Option<&mut Task> {
        self.tasks.get_mut(name)
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    /// Blocks until the earliest due time across all tasks; returns
    /// promptly if any task is already due.
    pub async fn sleep(&self) {
        let Some(next) = self.tasks.values().map(Task::next_run).min() else {
            return;
        };
        tokio::time::sleep_until(next).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_task_rejects_duplicate_name() {
        let mut schedule = Schedule::new();
        schedule.add_task("data", "10s").unwrap();
        assert!(schedule.add_task("data", "20s").is_err());
    }

    #[test]
    fn test_add_task_rejects_bad_interval() {
        let mut schedule = Schedule::new();
        assert!(schedule.add_task("data", "soon").is_err());
        assert!(schedule.add_task("data", "0s").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_task_is_due() {
        let mut schedule = Schedule::new();
        schedule.add_task("data", "10s").unwrap();
        assert!(schedule.get_task("data").unwrap().is_due());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_advances_next_run() {
        let mut schedule = Schedule::new();
        schedule.add_task("data", "10s").unwrap();
        let task = schedule.get_task("data").unwrap();
        task.start();
        assert!(task.is_running());
        assert!(!task.is_due());
        task.stop();
        assert!(!task.is_running());

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(schedule.get_task("data").unwrap().is_due());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_until_earliest_task() {
        let mut schedule = Schedule::new();
        schedule.add_task("fast", "5s").unwrap();
        schedule.add_task("slow", "1h").unwrap();
        schedule.get_task("fast").unwrap().start();
        schedule.get_task("slow").unwrap().start();

        let before = Instant::now();
        schedule.sleep().await;
        assert_eq!((Instant::now() - before).as_secs(), 5);
        assert!(schedule.get_task("fast").unwrap().is_due());
        assert!(!schedule.get_task("slow").unwrap().is_due());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_returns_promptly_when_due() {
        let mut schedule = Schedule::new();
        schedule.add_task("data", "10s").unwrap();
        // never started: still due from creation
        let before = Instant::now();
        schedule.sleep().await;
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrun_does_not_stack() {
        let mut schedule = Schedule::new();
        schedule.add_task("data", "5s").unwrap();
        let task = schedule.get_task("data").unwrap();
        task.start();
        // tick takes 12s, three intervals late
        tokio::time::advance(Duration::from_secs(12)).await;
        let task = schedule.get_task("data").unwrap();
        task.stop();
        assert!(task.is_due());
        task.start();
        // a single start consumes the backlog
        assert!(!schedule.get_task("data").unwrap().is_due());
    }
}
