//! Due-time reminders
//!
//! Every task that is due in the future gets a one-shot timer. When it fires, a [`Reminder`] is sent on a channel,
//! so that a firing reminder never blocks anything: it is up to the receiver to display it whenever it can.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::task::{format_due, Task, TaskId};


/// A reminder that has fired
#[derive(Clone, Debug, PartialEq)]
pub struct Reminder {
    pub id: TaskId,
    pub text: String,
    pub due: NaiveDateTime,
}

impl Display for Reminder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Reminder: {}", self.text)
    }
}

/// See [`reminder_channel`]
pub type ReminderSender = mpsc::UnboundedSender<Reminder>;
/// See [`reminder_channel`]
pub type ReminderReceiver = mpsc::UnboundedReceiver<Reminder>;

/// Create the channel fired reminders are delivered on
pub fn reminder_channel() -> (ReminderSender, ReminderReceiver) {
    mpsc::unbounded_channel()
}


/// Returns how long to wait from `now` until `due`, or `None` if `due` is not strictly in the future
pub fn time_until(due: &NaiveDateTime, now: &NaiveDateTime) -> Option<Duration> {
    (*due - *now).to_std()
        .ok()
        .filter(|delay| *delay > Duration::from_secs(0))
}

/// The tasks that are still due in the future, in list order
pub fn upcoming<'a>(tasks: &'a [Task], now: &NaiveDateTime) -> Vec<&'a Task> {
    tasks.iter()
        .filter(|t| t.is_due_after(now))
        .collect()
}

/// The reminder log: one line for every task still due in the future.
///
/// This is recomputed from scratch at every call
pub fn reminder_log(tasks: &[Task], now: &NaiveDateTime) -> Vec<String> {
    upcoming(tasks, now).iter()
        .map(|t| format!("Reminder: {} (Due: {})", t.text(), format_due(t.due_date_time())))
        .collect()
}


/// Arms and cancels one-shot reminder timers.
///
/// Timers run as Tokio tasks, so scheduling must happen within a Tokio runtime.
/// They only live in memory: dropping the scheduler cancels all of them.
#[derive(Debug)]
pub struct Scheduler {
    timers: HashMap<TaskId, JoinHandle<()>>,
    sender: ReminderSender,
}

impl Scheduler {
    pub fn new(sender: ReminderSender) -> Self {
        Self { timers: HashMap::new(), sender }
    }

    /// Arm a timer for a task, replacing any timer this task already had.
    ///
    /// Tasks that are not due strictly after `now` are not scheduled (and their previous timer, if any, is cancelled).
    /// Returns whether a timer has been armed.
    pub fn schedule(&mut self, task: &Task, now: &NaiveDateTime) -> bool {
        self.cancel(task.id());

        let delay = match time_until(task.due_date_time(), now) {
            None => {
                log::debug!("Not scheduling a reminder for past task {:?}", task.text());
                return false;
            },
            Some(delay) => delay,
        };

        let reminder = Reminder {
            id: task.id().clone(),
            text: task.text().to_string(),
            due: *task.due_date_time(),
        };
        let sender = self.sender.clone();
        log::debug!("Reminder for {:?} armed in {:?}", reminder.text, delay);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            log::info!("Reminder fired for {:?}", reminder.text);
            if sender.send(reminder).is_err() {
                log::debug!("Nobody is listening to reminders anymore");
            }
        });
        self.timers.insert(task.id().clone(), handle);
        true
    }

    /// Schedule every task of a list. Returns how many timers have been armed
    pub fn schedule_all(&mut self, tasks: &[Task], now: &NaiveDateTime) -> usize {
        tasks.iter()
            .filter(|task| self.schedule(task, now))
            .count()
    }

    /// Cancel the timer of a task. Returns whether a timer was pending
    pub fn cancel(&mut self, id: &TaskId) -> bool {
        match self.timers.remove(id) {
            None => false,
            Some(handle) => {
                let was_pending = handle.is_finished() == false;
                handle.abort();
                was_pending
            },
        }
    }

    /// Whether a timer is pending for this task
    pub fn is_armed(&self, id: &TaskId) -> bool {
        self.timers.get(id)
            .map(|handle| handle.is_finished() == false)
            .unwrap_or(false)
    }

    /// How many timers are still pending
    pub fn armed_count(&self) -> usize {
        self.timers.values()
            .filter(|handle| handle.is_finished() == false)
            .count()
    }

    /// Forget about the timers that have already fired
    pub fn prune_fired(&mut self) {
        self.timers.retain(|_, handle| handle.is_finished() == false);
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use crate::task::parse_due;

    fn now() -> NaiveDateTime {
        parse_due("2024-05-01", "12:00").unwrap()
    }

    fn task_due_in(text: &str, delta: ChronoDuration) -> Task {
        Task::new(text.to_string(), now() + delta)
    }

    #[test]
    fn test_time_until() {
        assert_eq!(time_until(&(now() + ChronoDuration::hours(1)), &now()), Some(Duration::from_secs(3600)));
        assert_eq!(time_until(&now(), &now()), None);
        assert_eq!(time_until(&(now() - ChronoDuration::minutes(1)), &now()), None);
    }

    #[test]
    fn test_reminder_log_only_lists_future_tasks() {
        let tasks = vec![
            task_due_in("Past", -ChronoDuration::hours(1)),
            task_due_in("Future", ChronoDuration::hours(1)),
            task_due_in("Now", ChronoDuration::zero()),
        ];
        assert_eq!(reminder_log(&tasks, &now()), vec!["Reminder: Future (Due: 5/1/2024, 1:00:00 PM)".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_the_interval() {
        let (sender, mut receiver) = reminder_channel();
        let mut scheduler = Scheduler::new(sender);
        let task = task_due_in("Take the cake out", ChronoDuration::hours(1));

        let start = tokio::time::Instant::now();
        assert!(scheduler.schedule(&task, &now()));
        assert!(scheduler.is_armed(task.id()));

        let reminder = receiver.recv().await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(3600));
        assert_eq!(reminder.id, *task.id());
        assert_eq!(reminder.to_string(), "Reminder: Take the cake out");
    }

    #[tokio::test(start_paused = true)]
    async fn test_past_tasks_are_never_scheduled() {
        let (sender, mut receiver) = reminder_channel();
        let mut scheduler = Scheduler::new(sender);
        let tasks = vec![
            task_due_in("Past", -ChronoDuration::hours(1)),
            task_due_in("Now", ChronoDuration::zero()),
        ];
        assert_eq!(scheduler.schedule_all(&tasks, &now()), 0);
        assert_eq!(scheduler.armed_count(), 0);

        tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timers_never_fire() {
        let (sender, mut receiver) = reminder_channel();
        let mut scheduler = Scheduler::new(sender);
        let cancelled = task_due_in("Cancelled", ChronoDuration::minutes(10));
        let kept = task_due_in("Kept", ChronoDuration::minutes(20));
        assert_eq!(scheduler.schedule_all(&[cancelled.clone(), kept.clone()], &now()), 2);

        assert!(scheduler.cancel(cancelled.id()));
        assert!(scheduler.cancel(cancelled.id()) == false);

        let reminder = receiver.recv().await.unwrap();
        assert_eq!(reminder.id, *kept.id());
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_replaces_the_timer() {
        let (sender, mut receiver) = reminder_channel();
        let mut scheduler = Scheduler::new(sender);
        let mut task = task_due_in("Old text", ChronoDuration::minutes(10));
        scheduler.schedule(&task, &now());

        task.set_text("New text".to_string());
        scheduler.schedule(&task, &now());
        assert_eq!(scheduler.armed_count(), 1);

        let reminder = receiver.recv().await.unwrap();
        assert_eq!(reminder.text, "New text");
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(receiver.try_recv().is_err());

        scheduler.prune_fired();
        assert_eq!(scheduler.armed_count(), 0);
        assert!(scheduler.is_armed(task.id()) == false);
    }
}
