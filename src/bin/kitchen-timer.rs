//! A terminal front-end for the to-do list.
//!
//! It reads one command per line on stdin, and prints the view after every change.
//! The current time ticks in the terminal title.
//! Set `KITCHEN_TIMER_DIR` to choose where tasks are saved, and `RUST_LOG` to see more details.

use std::error::Error;
use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use kitchen_timer::clock::{self, ClockReceiver};
use kitchen_timer::config;
use kitchen_timer::reminder::reminder_channel;
use kitchen_timer::storage::{FileStore, KeyValueStore, Persistence};
use kitchen_timer::utils::print_task_list;
use kitchen_timer::{EditState, TaskId, View};

const HELP: &str = "\
Commands (<n> is the position of a row, as displayed):
  add <YYYY-MM-DD> <HH:MM> <text>   add a task
  edit <n>                          enable the text field of a row
  type <n> <text>                   replace the content of an enabled text field
  save <n>                          commit the text field of a row
  check <n> | uncheck <n>           mark a task as completed or not
  delete <n>                        delete a task
  search [text]                     only show the rows that contain this text
  report                            show/hide upcoming reminders
  performance                       show/hide the performance report
  dark                              toggle dark mode
  clock                             show the current time
  list                              dump every task, including hidden ones
  help                              show this help
  quit                              exit";

enum Flow {
    Continue,
    Quit,
}


#[tokio::main]
async fn main() {
    env_logger::init();

    if let Ok(folder) = std::env::var(config::DATA_FOLDER_ENV) {
        config::set_data_folder(folder.into());
    }
    let store = FileStore::from_config();
    log::info!("Using tasks from {:?}", store.folder());

    let (sender, mut reminders) = reminder_channel();
    let mut view = View::load(Persistence::new(store), sender, &clock::now());
    let (mut clock, _clock_handle) = clock::spawn_clock(config::clock_period());

    println!("{}", view.render(&clock::now()));
    println!("Type 'help' to list the available commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => match run_command(&mut view, &line, &clock) {
                        Ok(Flow::Continue) => (),
                        Ok(Flow::Quit) => break,
                        Err(err) => println!("Error: {}", err),
                    },
                    Ok(None) => break,
                    Err(err) => {
                        log::error!("Unable to read commands: {}", err);
                        break;
                    },
                }
            },
            Ok(()) = clock.changed() => {
                show_clock(&clock.borrow());
            },
            Some(reminder) = reminders.recv() => {
                if view.on_reminder(reminder) {
                    println!("{}", view.render(&clock::now()));
                }
            },
        }

        for toast in view.take_toasts() {
            println!("*** {} ***", toast);
        }
    }
}

/// The clock is displayed in the terminal title, so that it can tick without scrolling the view away
fn show_clock(time: &str) {
    print!("\x1b]0;kitchen-timer {}\x07", time);
    if let Err(err) = std::io::stdout().flush() {
        log::debug!("Unable to refresh the clock: {}", err);
    }
}

fn run_command<S: KeyValueStore>(view: &mut View<S>, line: &str, clock: &ClockReceiver) -> Result<Flow, Box<dyn Error>> {
    let mut words = line.trim().splitn(2, ' ');
    let command = words.next().unwrap_or("");
    let args = words.next().unwrap_or("").trim();
    let now = clock::now();

    match command {
        "" => return Ok(Flow::Continue),
        "add" => {
            let mut fields = args.splitn(3, ' ');
            let date = fields.next().unwrap_or("");
            let time = fields.next().unwrap_or("");
            let text = fields.next().unwrap_or("").trim();
            view.add(text, date, time, &now);
        },
        "edit" => {
            let id = resolve_row(view, args)?;
            expect_edit_state(view, &id, EditState::Viewing)?;
            view.toggle_edit(&id, &now)?;
        },
        "type" => {
            let mut fields = args.splitn(2, ' ');
            let id = resolve_row(view, fields.next().unwrap_or(""))?;
            view.set_input(&id, fields.next().unwrap_or(""))?;
        },
        "save" => {
            let id = resolve_row(view, args)?;
            expect_edit_state(view, &id, EditState::Editing)?;
            view.toggle_edit(&id, &now)?;
        },
        "check" => {
            let id = resolve_row(view, args)?;
            view.set_completed(&id, true)?;
        },
        "uncheck" => {
            let id = resolve_row(view, args)?;
            view.set_completed(&id, false)?;
        },
        "delete" => {
            let id = resolve_row(view, args)?;
            view.delete(&id)?;
        },
        "search" => view.search(args),
        "report" => { view.toggle_reminder_log(); },
        "performance" => { view.toggle_performance_report(); },
        "dark" => { view.toggle_dark_mode(); },
        "clock" => {
            println!("{}", *clock.borrow());
            return Ok(Flow::Continue);
        },
        "list" => {
            print_task_list(view.tasks());
            return Ok(Flow::Continue);
        },
        "help" => {
            println!("{}", HELP);
            return Ok(Flow::Continue);
        },
        "quit" | "exit" => return Ok(Flow::Quit),
        other => return Err(format!("Unknown command {:?}. Type 'help' to list the available commands", other).into()),
    }

    println!("{}", view.render(&now));
    Ok(Flow::Continue)
}

/// Find the task shown at a 1-based position. This is resolved at every command, since positions change as rows are deleted or filtered
fn resolve_row<S: KeyValueStore>(view: &View<S>, arg: &str) -> Result<TaskId, Box<dyn Error>> {
    let position: usize = arg.trim().parse()
        .map_err(|_| format!("Expected a row number, got {:?}", arg))?;
    let visible = view.visible_ids();
    if position == 0 || position > visible.len() {
        return Err(format!("There is no row {} ({} rows are shown)", position, visible.len()).into());
    }
    Ok(visible[position - 1].clone())
}

fn expect_edit_state<S: KeyValueStore>(view: &View<S>, id: &TaskId, expected: EditState) -> Result<(), Box<dyn Error>> {
    match view.row(id).map(|row| row.edit_state()) {
        Some(state) if state == expected => Ok(()),
        Some(EditState::Editing) => Err("This row is already being edited".into()),
        Some(EditState::Viewing) => Err("This row is not being edited. Use 'edit' first".into()),
        None => Err(format!("No row for task {}", id).into()),
    }
}
