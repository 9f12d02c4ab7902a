//! To-do tasks

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// The format of the `dueDateTime` field, as produced by an HTML `date` input and a `time` input joined by a `T`
const DUE_FORMAT: &str = "%Y-%m-%dT%H:%M";
/// Same as [`DUE_FORMAT`], for timestamps that carry seconds
const DUE_FORMAT_WITH_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";
/// Same as [`DUE_FORMAT_WITH_SECONDS`], for timestamps that carry a fraction of a second
const DUE_FORMAT_WITH_FRACTION: &str = "%Y-%m-%dT%H:%M:%S%.f";
/// How a due date is displayed to the user (what `toLocaleString()` gives in an `en-US` browser)
const DISPLAY_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";


/// A stable identifier for a task.
///
/// It is generated once, when the task is created, and never changes afterwards (unlike the position of the task in its list)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaskId {
    content: String,
}

impl TaskId {
    /// Generate a random TaskId.
    pub fn random() -> Self {
        let random = Uuid::new_v4().to_hyphenated().to_string();
        Self { content: random }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }
}

impl FromStr for TaskId {
    type Err = Box<dyn Error>;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("A task ID cannot be empty".into());
        }
        Ok(Self { content: s.to_string() })
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.content)
    }
}

/// Used to support serde
impl Serialize for TaskId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.content)
    }
}
/// Used to support serde
impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> Result<TaskId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}



/// A to-do task
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// The display text of the task
    text: String,

    /// When this task is due, in local time
    #[serde(with = "due_format")]
    due_date_time: NaiveDateTime,

    /// Whether this task has been done
    #[serde(default)]
    completed: bool,

    /// Tasks saved by versions that had no IDs get a new one when they are loaded
    #[serde(default = "TaskId::random")]
    id: TaskId,
}

impl Task {
    /// Create a brand new, uncompleted Task.
    /// This will pick a new (random) task ID.
    pub fn new(text: String, due_date_time: NaiveDateTime) -> Self {
        Self::new_with_parameters(text, due_date_time, false, TaskId::random())
    }

    /// Create a new Task instance, with a known ID
    pub fn new_with_parameters(text: String, due_date_time: NaiveDateTime, completed: bool, id: TaskId) -> Self {
        Self { text, due_date_time, completed, id }
    }

    /// Build a task from the raw values of the "add task" form.
    ///
    /// Returns `None` if any of the fields is empty, or if the date and time do not make a valid timestamp.
    pub fn from_form(text: &str, date: &str, time: &str) -> Option<Self> {
        if text.is_empty() || date.is_empty() || time.is_empty() {
            return None;
        }
        match parse_due(date, time) {
            Ok(due) => Some(Self::new(text.to_string(), due)),
            Err(err) => {
                log::debug!("Ignoring task {:?}: {}", text, err);
                None
            }
        }
    }

    pub fn id(&self) -> &TaskId                  { &self.id            }
    pub fn text(&self) -> &str                   { &self.text          }
    pub fn completed(&self) -> bool              { self.completed      }
    pub fn due_date_time(&self) -> &NaiveDateTime { &self.due_date_time }

    /// Whether the due time of this task is strictly after `now`
    pub fn is_due_after(&self, now: &NaiveDateTime) -> bool {
        self.due_date_time > *now
    }

    /// The due date, as displayed to the user
    pub fn due_label(&self) -> String {
        format_due(&self.due_date_time)
    }

    pub fn set_text(&mut self, new_text: String) {
        self.text = new_text;
    }

    pub fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }
}


/// Combine a `YYYY-MM-DD` date and a `HH:MM[:SS]` time into a local timestamp
pub fn parse_due(date: &str, time: &str) -> Result<NaiveDateTime, Box<dyn Error>> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|err| format!("Invalid date {:?}: {}", date, err))?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time.trim(), "%H:%M:%S"))
        .map_err(|err| format!("Invalid time {:?}: {}", time, err))?;
    Ok(NaiveDateTime::new(date, time))
}

/// Format a timestamp the way it is displayed in due labels and in the reminder log
pub fn format_due(dt: &NaiveDateTime) -> String {
    dt.format(DISPLAY_FORMAT).to_string()
}

/// (De)serializes due timestamps as `YYYY-MM-DDTHH:MM`, with seconds (and their fraction) only when they are non-zero
mod due_format {
    use super::*;

    pub fn serialize<S>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let format = match (dt.second(), dt.nanosecond()) {
            (0, 0) => DUE_FORMAT,
            (_, 0) => DUE_FORMAT_WITH_SECONDS,
            _ => DUE_FORMAT_WITH_FRACTION,
        };
        serializer.serialize_str(&dt.format(format).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, DUE_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(&s, DUE_FORMAT_WITH_SECONDS))
            .or_else(|_| NaiveDateTime::parse_from_str(&s, DUE_FORMAT_WITH_FRACTION))
            .map_err(serde::de::Error::custom)
    }
}
