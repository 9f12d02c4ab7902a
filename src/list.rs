//! The in-memory task list, which is the source of truth during a session
//!
//! Every mutation is immediately persisted, and announced to the subscribers of [`TaskList::subscribe`]

use std::error::Error;

use tokio::sync::watch;

use crate::storage::{KeyValueStore, Persistence};
use crate::task::{Task, TaskId};


/// What the last mutation of a [`TaskList`] was
#[derive(Clone, Debug, PartialEq)]
pub enum ChangeKind {
    /// The list has just been loaded from the storage
    Loaded,
    Added(TaskId),
    Removed(TaskId),
    TextChanged(TaskId),
    CompletionChanged(TaskId),
}

/// A change notification. `revision` increases by one at every mutation
#[derive(Clone, Debug, PartialEq)]
pub struct ListChange {
    pub revision: u64,
    pub kind: ChangeKind,
}

/// See [`TaskList::subscribe`]
pub type ChangeReceiver = watch::Receiver<ListChange>;


/// An ordered list of tasks, backed by a [`Persistence`]
#[derive(Debug)]
pub struct TaskList<S: KeyValueStore> {
    tasks: Vec<Task>,
    persistence: Persistence<S>,
    revision: u64,
    changes: watch::Sender<ListChange>,
}

impl<S: KeyValueStore> TaskList<S> {
    /// Load the list that has previously been persisted (an empty list if there is none)
    pub fn load(persistence: Persistence<S>) -> Self {
        let tasks = persistence.load();
        log::info!("Loaded {} tasks", tasks.len());
        let (changes, _) = watch::channel(ListChange { revision: 0, kind: ChangeKind::Loaded });
        Self { tasks, persistence, revision: 0, changes }
    }

    /// Get notified whenever this list changes
    pub fn subscribe(&self) -> ChangeReceiver {
        self.changes.subscribe()
    }

    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    /// The current position of a task in this list
    pub fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id() == id)
    }

    /// Returns the ID of the task currently at `index`
    pub fn id_at(&self, index: usize) -> Option<&TaskId> {
        self.tasks.get(index).map(|t| t.id())
    }

    /// Add a task at the end of the list
    pub fn append(&mut self, task: Task) -> Result<TaskId, Box<dyn Error>> {
        let id = task.id().clone();
        self.tasks.push(task);
        self.commit(ChangeKind::Added(id.clone()))?;
        Ok(id)
    }

    /// Remove a task. This shifts the position of every later task by one
    pub fn remove(&mut self, id: &TaskId) -> Result<Task, Box<dyn Error>> {
        let index = self.position(id).ok_or_else(|| format!("No task with ID {}", id))?;
        self.remove_at(index)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Task, Box<dyn Error>> {
        if index >= self.tasks.len() {
            return Err(format!("No task at position {} (the list has {} tasks)", index, self.tasks.len()).into());
        }
        let removed = self.tasks.remove(index);
        self.commit(ChangeKind::Removed(removed.id().clone()))?;
        Ok(removed)
    }

    pub fn update_text(&mut self, id: &TaskId, text: String) -> Result<(), Box<dyn Error>> {
        let index = self.position(id).ok_or_else(|| format!("No task with ID {}", id))?;
        self.update_text_at(index, text)
    }

    pub fn update_text_at(&mut self, index: usize, text: String) -> Result<(), Box<dyn Error>> {
        let task = self.tasks.get_mut(index).ok_or_else(|| format!("No task at position {}", index))?;
        task.set_text(text);
        let id = task.id().clone();
        self.commit(ChangeKind::TextChanged(id))
    }

    pub fn set_completed(&mut self, id: &TaskId, completed: bool) -> Result<(), Box<dyn Error>> {
        let index = self.position(id).ok_or_else(|| format!("No task with ID {}", id))?;
        self.set_completed_at(index, completed)
    }

    pub fn set_completed_at(&mut self, index: usize, completed: bool) -> Result<(), Box<dyn Error>> {
        let task = self.tasks.get_mut(index).ok_or_else(|| format!("No task at position {}", index))?;
        task.set_completed(completed);
        let id = task.id().clone();
        self.commit(ChangeKind::CompletionChanged(id))
    }

    /// Persist the whole list, then notify subscribers.
    ///
    /// Subscribers are notified even if saving fails, since the in-memory list has changed anyway
    fn commit(&mut self, kind: ChangeKind) -> Result<(), Box<dyn Error>> {
        self.revision += 1;
        let saved = self.persistence.save(&self.tasks);
        if let Err(err) = &saved {
            log::warn!("Unable to save tasks: {}", err);
        }
        self.changes.send_replace(ListChange { revision: self.revision, kind });
        saved
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::task::parse_due;

    fn task(text: &str) -> Task {
        Task::new(text.to_string(), parse_due("2024-05-01", "14:30").unwrap())
    }

    fn new_list() -> TaskList<MemoryStore> {
        TaskList::load(Persistence::with_key(MemoryStore::new(), "todos".to_string()))
    }

    #[test]
    fn test_every_mutation_is_saved() {
        let mut list = new_list();
        let a = list.append(task("A")).unwrap();
        let b = list.append(task("B")).unwrap();
        assert_eq!(list.persistence().load(), list.all());

        list.update_text(&a, "A'".to_string()).unwrap();
        assert_eq!(list.persistence().load()[0].text(), "A'");

        list.set_completed(&b, true).unwrap();
        assert_eq!(list.persistence().load()[1].completed(), true);

        list.remove(&a).unwrap();
        let saved = list.persistence().load();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id(), &b);
    }

    #[test]
    fn test_remove_at_shifts_later_tasks() {
        let mut list = new_list();
        let ids: Vec<TaskId> = ["A", "B", "C", "D"].iter()
            .map(|t| list.append(task(t)).unwrap())
            .collect();

        let removed = list.remove_at(1).unwrap();
        assert_eq!(removed.id(), &ids[1]);
        assert_eq!(list.position(&ids[0]), Some(0));
        assert_eq!(list.position(&ids[2]), Some(1));
        assert_eq!(list.position(&ids[3]), Some(2));
        assert_eq!(list.position(&ids[1]), None);

        // Addressing by ID still reaches the right task after the shift
        list.update_text(&ids[3], "D'".to_string()).unwrap();
        assert_eq!(list.all()[2].text(), "D'");
    }

    #[test]
    fn test_unknown_targets_are_errors() {
        let mut list = new_list();
        list.append(task("A")).unwrap();
        let ghost = TaskId::random();

        assert!(list.remove_at(1).is_err());
        assert!(list.update_text_at(3, "x".to_string()).is_err());
        assert!(list.set_completed_at(1, true).is_err());
        assert!(list.remove(&ghost).is_err());
        assert!(list.update_text(&ghost, "x".to_string()).is_err());
        assert_eq!(list.revision(), 1);
        assert_eq!(list.all()[0].text(), "A");
    }

    #[test]
    fn test_subscribers_are_notified() {
        let mut list = new_list();
        let rx = list.subscribe();
        assert_eq!(rx.borrow().kind, ChangeKind::Loaded);

        let a = list.append(task("A")).unwrap();
        assert_eq!(*rx.borrow(), ListChange { revision: 1, kind: ChangeKind::Added(a.clone()) });

        list.set_completed(&a, true).unwrap();
        assert_eq!(*rx.borrow(), ListChange { revision: 2, kind: ChangeKind::CompletionChanged(a) });
    }

    #[test]
    fn test_failed_save_keeps_the_change_in_memory() {
        let mut list = TaskList::load(Persistence::with_key(MemoryStore::with_quota(16), "todos".to_string()));
        assert!(list.append(task("A task that does not fit")).is_err());
        assert_eq!(list.len(), 1);
        assert_eq!(list.persistence().load(), Vec::new());
    }
}
