//! Reminder scenarios, run with a paused Tokio clock

use std::time::Duration;

use chrono::{Duration as ChronoDuration, NaiveDateTime};

use kitchen_timer::reminder::{reminder_channel, ReminderReceiver};
use kitchen_timer::storage::{MemoryStore, Persistence};
use kitchen_timer::task::parse_due;
use kitchen_timer::View;

fn now() -> NaiveDateTime {
    parse_due("2024-05-01", "12:00").unwrap()
}

fn in_one_hour() -> (String, String) {
    let due = now() + ChronoDuration::hours(1);
    (due.format("%Y-%m-%d").to_string(), due.format("%H:%M").to_string())
}

fn new_view() -> (View<MemoryStore>, ReminderReceiver) {
    let (sender, receiver) = reminder_channel();
    let view = View::load(Persistence::with_key(MemoryStore::new(), "todos".to_string()), sender, &now());
    (view, receiver)
}

#[tokio::test(start_paused = true)]
async fn test_future_task_is_logged_then_reminded() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (mut view, mut receiver) = new_view();
    let (date, time) = in_one_hour();

    let start = tokio::time::Instant::now();
    view.add("Take the cake out", &date, &time, &now()).unwrap();
    assert_eq!(view.reminder_log(&now()).len(), 1);

    let reminder = receiver.recv().await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(3600));
    assert!(view.on_reminder(reminder));
    assert_eq!(view.take_toasts(), vec!["Reminder: Take the cake out".to_string()]);

    // Once its due time has passed, the task leaves the reminder log
    let after = now() + ChronoDuration::hours(1);
    assert!(view.reminder_log(&after).is_empty());
    assert_eq!(view.scheduler().armed_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_past_task_is_never_reminded() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (mut view, mut receiver) = new_view();

    view.add("Yesterday's chore", "2024-04-30", "12:00", &now()).unwrap();
    assert!(view.reminder_log(&now()).is_empty());
    assert_eq!(view.scheduler().armed_count(), 0);

    tokio::time::sleep(Duration::from_secs(7 * 24 * 3600)).await;
    assert!(receiver.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_deleted_task_is_never_reminded() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (mut view, mut receiver) = new_view();
    let (date, time) = in_one_hour();

    let deleted = view.add("Deleted", &date, &time, &now()).unwrap();
    view.add("Kept", &date, &time, &now()).unwrap();
    view.delete(&deleted).unwrap();

    let reminder = receiver.recv().await.unwrap();
    assert_eq!(reminder.text, "Kept");
    tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
    assert!(receiver.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_edited_task_is_reminded_with_its_new_text() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (mut view, mut receiver) = new_view();
    let (date, time) = in_one_hour();

    let id = view.add("Old text", &date, &time, &now()).unwrap();
    view.toggle_edit(&id, &now()).unwrap();
    view.set_input(&id, "New text").unwrap();
    view.toggle_edit(&id, &now()).unwrap();

    let reminder = receiver.recv().await.unwrap();
    assert_eq!(reminder.text, "New text");
    tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
    assert!(receiver.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_reminder_of_a_task_deleted_after_firing_is_dropped() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (mut view, mut receiver) = new_view();
    let (date, time) = in_one_hour();

    let id = view.add("Too late", &date, &time, &now()).unwrap();
    let reminder = receiver.recv().await.unwrap();
    view.delete(&id).unwrap();

    assert!(view.on_reminder(reminder) == false);
    assert!(view.take_toasts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reminder_handled_after_an_edit_shows_the_new_text() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (mut view, mut receiver) = new_view();
    let (date, time) = in_one_hour();

    let id = view.add("Old text", &date, &time, &now()).unwrap();
    // The reminder has fired, but the host handles an edit before it
    let reminder = receiver.recv().await.unwrap();
    view.toggle_edit(&id, &now()).unwrap();
    view.set_input(&id, "New text").unwrap();
    view.toggle_edit(&id, &now()).unwrap();

    assert!(view.on_reminder(reminder));
    assert_eq!(view.take_toasts(), vec!["Reminder: New text".to_string()]);
}
