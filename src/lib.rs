//! This crate provides a local to-do list, with due-time reminders.
//!
//! Tasks are kept in a [`TaskList`](list::TaskList), that persists itself into a key-value store (see the [`storage`] module) after every change.
//!
//! A [`View`] projects this list into rows the user can edit, check, delete and filter. \
//! It also arms a [reminder](reminder) for every task that is due in the future, and computes completion statistics (see [`stats`]).

pub mod config;
pub mod storage;
pub mod list;
pub mod stats;
pub mod reminder;
pub mod clock;
pub mod view;
pub use view::{EditState, View};

pub mod task;
pub use task::{Task, TaskId};

pub mod utils;
