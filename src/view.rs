//! The view: it projects a [`TaskList`] into interactive rows, and handles what the user does with them
//!
//! Rows are bound to tasks by [`TaskId`], never by position, so that deleting a task never makes another row point to the wrong task.
//! Whenever the list changes, rows are reconciled against it (see [`View::refresh`]).

use std::collections::{HashMap, VecDeque};
use std::error::Error;
use std::fmt::Write;

use bitflags::bitflags;
use chrono::NaiveDateTime;

use crate::clock;
use crate::list::{ChangeReceiver, TaskList};
use crate::reminder::{self, Reminder, ReminderSender, Scheduler};
use crate::stats;
use crate::storage::{KeyValueStore, Persistence};
use crate::task::{Task, TaskId};

bitflags! {
    /// Which optional parts of the view are shown
    pub struct Panels: u8 {
        /// The list of upcoming reminders
        const REMINDER_LOG = 1;
        /// The performance report
        const PERFORMANCE_REPORT = 2;
        /// Not a panel per se, but the view is displayed with a dark theme
        const DARK_MODE = 4;
    }
}

impl Default for Panels {
    fn default() -> Self {
        Panels::REMINDER_LOG
    }
}


/// The state of the edit/save control of a row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditState {
    /// The text field is disabled
    Viewing,
    /// The text field is enabled and focused
    Editing,
}

impl EditState {
    /// The label of the control that toggles the edit state
    pub fn label(&self) -> &'static str {
        match self {
            EditState::Viewing => "Edit",
            EditState::Editing => "Save",
        }
    }
}

/// The UI element that displays a task
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    id: TaskId,
    edit: EditState,
    /// The content of the text field. While editing, this may differ from the task text
    input: String,
    visible: bool,
}

impl Row {
    fn new(task: &Task) -> Self {
        Self {
            id: task.id().clone(),
            edit: EditState::Viewing,
            input: task.text().to_string(),
            visible: true,
        }
    }

    pub fn id(&self) -> &TaskId           { &self.id     }
    pub fn edit_state(&self) -> EditState { self.edit    }
    pub fn input(&self) -> &str           { &self.input  }
    pub fn is_visible(&self) -> bool      { self.visible }

    /// Whether the text field can be typed into
    pub fn is_input_enabled(&self) -> bool {
        self.edit == EditState::Editing
    }

    fn matches(&self, query: &str) -> bool {
        self.input.to_lowercase().contains(&query.to_lowercase())
    }
}


/// The values currently typed into the "add task" form
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Form {
    pub text: String,
    pub date: String,
    pub time: String,
}


/// The whole to-do view: task list, rows, reminders and report panels
#[derive(Debug)]
pub struct View<S: KeyValueStore> {
    list: TaskList<S>,
    changes: ChangeReceiver,
    scheduler: Scheduler,
    rows: Vec<Row>,
    query: String,
    panels: Panels,
    form: Form,
    toasts: VecDeque<String>,
}

impl<S: KeyValueStore> View<S> {
    /// Load the persisted tasks, render them, and arm reminders for the ones that are due after `now`.
    ///
    /// Fired reminders are sent to `reminders`, and should be given back to [`View::on_reminder`].
    /// This must be called within a Tokio runtime.
    pub fn load(persistence: Persistence<S>, reminders: ReminderSender, now: &NaiveDateTime) -> Self {
        let list = TaskList::load(persistence);
        let changes = list.subscribe();
        let mut scheduler = Scheduler::new(reminders);
        let n_armed = scheduler.schedule_all(list.all(), now);
        log::info!("{} reminders armed", n_armed);

        let mut view = Self {
            list,
            changes,
            scheduler,
            rows: Vec::new(),
            query: String::new(),
            panels: Panels::default(),
            form: Form::default(),
            toasts: VecDeque::new(),
        };
        view.rebuild_rows();
        view
    }

    pub fn list(&self) -> &TaskList<S>    { &self.list      }
    pub fn tasks(&self) -> &[Task]        { self.list.all() }
    pub fn rows(&self) -> &[Row]          { &self.rows      }
    pub fn scheduler(&self) -> &Scheduler { &self.scheduler }
    pub fn query(&self) -> &str           { &self.query     }
    pub fn panels(&self) -> Panels        { self.panels     }
    pub fn form(&self) -> &Form           { &self.form      }
    pub fn form_mut(&mut self) -> &mut Form { &mut self.form }

    pub fn row(&self, id: &TaskId) -> Option<&Row> {
        self.rows.iter().find(|r| &r.id == id)
    }

    fn row_mut(&mut self, id: &TaskId) -> Result<&mut Row, Box<dyn Error>> {
        self.rows.iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| format!("No row for task {}", id).into())
    }

    /// The IDs of the rows that are not hidden by the search filter, in display order
    pub fn visible_ids(&self) -> Vec<TaskId> {
        self.rows.iter()
            .filter(|r| r.visible)
            .map(|r| r.id.clone())
            .collect()
    }

    /// Whether the text field of a row has the "checked" style
    pub fn is_checked(&self, id: &TaskId) -> bool {
        self.list.get(id).map(|t| t.completed()).unwrap_or(false)
    }

    /// Reconcile the rows with the task list, if the list has changed since the last call.
    ///
    /// Rows of tasks that still exist keep their state (edit state, text being typed), rows of removed tasks are dropped, and new tasks get a new row.
    /// Visibility is recomputed against the current search query, so a row whose new text no longer matches gets hidden.
    /// Returns whether anything had changed.
    pub fn refresh(&mut self) -> bool {
        match self.changes.has_changed() {
            Ok(true) => (),
            Ok(false) => return false,
            Err(err) => {
                log::warn!("Task list notifications are gone: {}", err);
                return false;
            },
        }
        let change = self.changes.borrow_and_update().clone();
        log::trace!("Refreshing the view after {:?}", change);
        self.rebuild_rows();
        true
    }

    fn rebuild_rows(&mut self) {
        let mut previous: HashMap<TaskId, Row> = self.rows.drain(..)
            .map(|row| (row.id.clone(), row))
            .collect();
        let query = &self.query;
        let rows: Vec<Row> = self.list.all().iter()
            .map(|task| {
                let mut row = previous.remove(task.id()).unwrap_or_else(|| Row::new(task));
                if row.edit == EditState::Viewing {
                    row.input = task.text().to_string();
                }
                row.visible = row.matches(query);
                row
            })
            .collect();
        self.rows = rows;
    }

    /// Pop the notifications that have not been displayed yet
    pub fn take_toasts(&mut self) -> Vec<String> {
        self.toasts.drain(..).collect()
    }

    fn toast_save_failure(&mut self, err: Box<dyn Error>) {
        self.toasts.push_back(format!("Unable to save your tasks: {}", err));
    }


    /// Add a task from the content of the form. On success, the form is cleared.
    ///
    /// Nothing happens if a field is missing or invalid.
    pub fn submit_form(&mut self, now: &NaiveDateTime) -> Option<TaskId> {
        let task = Task::from_form(&self.form.text, &self.form.date, &self.form.time)?;
        self.form = Form::default();
        Some(self.add_task(task, now))
    }

    /// Fill the form, then submit it
    pub fn add(&mut self, text: &str, date: &str, time: &str, now: &NaiveDateTime) -> Option<TaskId> {
        self.form = Form { text: text.to_string(), date: date.to_string(), time: time.to_string() };
        let added = self.submit_form(now);
        if added.is_none() {
            log::debug!("Incomplete form, no task added");
        }
        added
    }

    fn add_task(&mut self, task: Task, now: &NaiveDateTime) -> TaskId {
        let id = task.id().clone();
        self.scheduler.schedule(&task, now);
        if let Err(err) = self.list.append(task) {
            self.toast_save_failure(err);
        }
        self.refresh();
        id
    }

    /// Activate the edit/save control of a row.
    ///
    /// The first activation enables the text field. The second one disables it and commits its content to the task (there is no way to cancel).
    /// Committing re-arms the reminder of the task, so that it shows the new text.
    pub fn toggle_edit(&mut self, id: &TaskId, now: &NaiveDateTime) -> Result<EditState, Box<dyn Error>> {
        let row = self.row_mut(id)?;
        match row.edit {
            EditState::Viewing => {
                row.edit = EditState::Editing;
                Ok(EditState::Editing)
            },
            EditState::Editing => {
                row.edit = EditState::Viewing;
                let new_text = row.input.clone();
                if let Err(err) = self.list.update_text(id, new_text) {
                    self.toast_save_failure(err);
                }
                if let Some(task) = self.list.get(id) {
                    let task = task.clone();
                    self.scheduler.schedule(&task, now);
                }
                self.refresh();
                Ok(EditState::Viewing)
            },
        }
    }

    /// Type into the text field of a row. This is only possible while the row is being edited
    pub fn set_input(&mut self, id: &TaskId, text: &str) -> Result<(), Box<dyn Error>> {
        let row = self.row_mut(id)?;
        if row.is_input_enabled() == false {
            return Err(format!("Task {} is not being edited", id).into());
        }
        row.input = text.to_string();
        Ok(())
    }

    /// Check or uncheck the completion checkbox of a row
    pub fn set_completed(&mut self, id: &TaskId, completed: bool) -> Result<(), Box<dyn Error>> {
        self.row_mut(id)?;
        if let Err(err) = self.list.set_completed(id, completed) {
            self.toast_save_failure(err);
        }
        self.refresh();
        Ok(())
    }

    /// Delete a task, its row, and its pending reminder
    pub fn delete(&mut self, id: &TaskId) -> Result<(), Box<dyn Error>> {
        self.row_mut(id)?;
        if self.scheduler.cancel(id) {
            log::debug!("Cancelled the reminder of deleted task {}", id);
        }
        if let Err(err) = self.list.remove(id) {
            self.toast_save_failure(err);
        }
        self.refresh();
        Ok(())
    }

    /// Show only the rows whose text contains `query` (case-insensitive).
    ///
    /// This only changes which rows are visible: the task list is left untouched
    pub fn search(&mut self, query: &str) {
        self.query = query.to_string();
        for row in self.rows.iter_mut() {
            row.visible = row.matches(query);
        }
    }

    /// Handle a reminder that has fired.
    ///
    /// The toast shows the current text of the task, which may have been edited since the timer fired.
    /// Returns whether it has been shown: reminders of tasks that have been deleted in the meantime are dropped
    pub fn on_reminder(&mut self, reminder: Reminder) -> bool {
        self.scheduler.prune_fired();
        match self.list.get(&reminder.id) {
            None => {
                log::debug!("Dropping the reminder of deleted task {}", reminder.id);
                false
            },
            Some(task) => {
                let current = Reminder { text: task.text().to_string(), ..reminder };
                self.toasts.push_back(current.to_string());
                true
            },
        }
    }

    pub fn toggle_reminder_log(&mut self) -> bool {
        self.panels.toggle(Panels::REMINDER_LOG);
        self.panels.contains(Panels::REMINDER_LOG)
    }

    pub fn toggle_performance_report(&mut self) -> bool {
        self.panels.toggle(Panels::PERFORMANCE_REPORT);
        self.panels.contains(Panels::PERFORMANCE_REPORT)
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.panels.toggle(Panels::DARK_MODE);
        self.panels.contains(Panels::DARK_MODE)
    }

    /// The reminder log (see [`reminder::reminder_log`])
    pub fn reminder_log(&self, now: &NaiveDateTime) -> Vec<String> {
        reminder::reminder_log(self.list.all(), now)
    }

    pub fn performance(&self) -> u32 {
        stats::performance(self.list.all())
    }

    /// The content of the performance report panel, if it is shown
    pub fn performance_report(&self) -> Option<String> {
        if self.panels.contains(Panels::PERFORMANCE_REPORT) {
            Some(format!("Performance: {}", stats::performance_label(self.list.all())))
        } else {
            None
        }
    }

    /// A plain text projection of the whole view
    pub fn render(&self, now: &NaiveDateTime) -> String {
        let mut out = String::new();
        if let Err(err) = self.render_to(&mut out, now) {
            log::warn!("Unable to render the view: {}", err);
        }
        out
    }

    /// Write the plain text projection of the whole view. The header shows the time of `now`
    pub fn render_to<W: Write>(&self, out: &mut W, now: &NaiveDateTime) -> std::fmt::Result {
        let theme = if self.panels.contains(Panels::DARK_MODE) { "dark" } else { "light" };
        writeln!(out, "==== To-do ({} theme) ==== {}", theme, clock::format_time(now))?;
        if self.query.is_empty() == false {
            writeln!(out, "Search: {:?}", self.query)?;
        }

        let visible: Vec<&Row> = self.rows.iter().filter(|r| r.visible).collect();
        if visible.is_empty() {
            writeln!(out, "  (nothing to show)")?;
        }
        for (i_row, row) in visible.iter().enumerate() {
            let task = match self.list.get(&row.id) {
                Some(task) => task,
                None => continue,
            };
            let check = if task.completed() { "x" } else { " " };
            let text = match (row.edit, task.completed()) {
                (EditState::Editing, _) => format!("<{}>", row.input),
                (EditState::Viewing, true) => format!("~{}~", row.input),
                (EditState::Viewing, false) => row.input.clone(),
            };
            writeln!(out, "  {}. [{}] {}  Due: {}  [{}] [Delete]", i_row + 1, check, text, task.due_label(), row.edit.label())?;
        }

        if self.panels.contains(Panels::REMINDER_LOG) {
            writeln!(out, "---- Upcoming ----")?;
            for line in self.reminder_log(now) {
                writeln!(out, "  {}", line)?;
            }
        }
        writeln!(out, "Completed: {}", stats::performance_label(self.list.all()))?;
        if let Some(report) = self.performance_report() {
            writeln!(out, "{}", report)?;
        }
        Ok(())
    }
}
