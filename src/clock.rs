//! A ticking clock display. It is purely cosmetic

use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// See [`spawn_clock`]
pub type ClockReceiver = watch::Receiver<String>;

/// The current local time, as a naive timestamp comparable to due dates
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// How the clock shows a time, e.g. `2:30:05 PM`
pub fn format_time(dt: &NaiveDateTime) -> String {
    dt.format("%-I:%M:%S %p").to_string()
}

/// Start a clock that refreshes the current local time every `period`.
///
/// The returned task stops by itself once every receiver has been dropped
pub fn spawn_clock(period: Duration) -> (ClockReceiver, JoinHandle<()>) {
    let (sender, receiver) = watch::channel(format_time(&now()));
    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            if sender.send(format_time(&now())).is_err() {
                log::debug!("Clock display is gone, stopping the clock");
                return;
            }
        }
    });
    (receiver, handle)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::parse_due;

    #[test]
    fn test_format() {
        assert_eq!(format_time(&parse_due("2024-05-01", "14:30:05").unwrap()), "2:30:05 PM");
        assert_eq!(format_time(&parse_due("2024-05-01", "00:01").unwrap()), "12:01:00 AM");
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_ticks() {
        let (mut receiver, handle) = spawn_clock(Duration::from_millis(1000));
        receiver.changed().await.unwrap();
        receiver.changed().await.unwrap();
        assert!(receiver.borrow().is_empty() == false);

        drop(receiver);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(handle.is_finished());
    }
}
