//! Some utility functions

use crate::task::Task;

/// A debug utility that pretty-prints a task list, with the IDs of the tasks
pub fn print_task_list(tasks: &[Task]) {
    for task in tasks {
        print_task(task);
    }
}

pub fn print_task(task: &Task) {
    println!("{}", describe_task(task));
}

/// One line describing a task, e.g. `    ✓ Buy milk (due 5/1/2024, 2:30:00 PM)\t<id>`
pub fn describe_task(task: &Task) -> String {
    let completion = if task.completed() { "✓" } else { " " };
    format!("    {} {} (due {})\t{}", completion, task.text(), task.due_label(), task.id())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{parse_due, TaskId};

    #[test]
    fn test_describe_task() {
        let id: TaskId = "an-id".parse().unwrap();
        let task = Task::new_with_parameters("Buy milk".to_string(), parse_due("2024-05-01", "14:30").unwrap(), true, id);
        assert_eq!(describe_task(&task), "    ✓ Buy milk (due 5/1/2024, 2:30:00 PM)\tan-id");
    }
}
