//! Completion statistics

use crate::task::Task;

/// The share of completed tasks, as a percentage rounded to the nearest integer (halves round up).
///
/// An empty list has a performance of 0
pub fn performance(tasks: &[Task]) -> u32 {
    let total = tasks.len() as u64;
    if total == 0 {
        return 0;
    }
    let completed = tasks.iter().filter(|t| t.completed()).count() as u64;
    ((200 * completed + total) / (2 * total)) as u32
}

/// How the performance is displayed, e.g. `25%`
pub fn performance_label(tasks: &[Task]) -> String {
    format!("{}%", performance(tasks))
}
