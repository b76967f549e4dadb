use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use taskboard::app::{self, App};
use taskboard::config::DEFAULT_CONFIG_FILE;
use taskboard::{
    logging, Assignee, Config, DashboardStats, JsonFileStore, NewTask, Priority, TaskId, TaskStore,
};

#[derive(Parser)]
#[command(name = "taskboard", version, about = "Terminal kanban board")]
struct Cli {
    /// Config file (JSON)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Task store file, overrides the config
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Only show tasks assigned to this email
    #[arg(long, global = true)]
    user: Option<String>,

    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the board (default)
    Board,
    /// Write a default config and an empty task store
    Init,
    /// Add a new task
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Due date, YYYY-MM-DD
        #[arg(long, value_parser = parse_date)]
        due: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = PriorityArg::Normal)]
        priority: PriorityArg,
        #[arg(long = "assignee")]
        assignees: Vec<String>,
    },
    /// List all tasks
    List,
    /// Show task statistics
    Stats,
    /// Add a comment to a task
    Comment {
        task: TaskId,
        content: String,
        /// Author email, defaults to --user
        #[arg(long)]
        author: Option<String>,
    },
    /// Show a task's comments, oldest first
    Comments { task: TaskId },
    /// Change a task's priority
    Priority {
        task: TaskId,
        #[arg(value_enum)]
        priority: PriorityArg,
    },
    /// Take a task off the board without deleting it
    Archive { task: TaskId },
    /// Delete a task and its comments
    Delete { task: TaskId },
}

#[derive(Clone, Copy, ValueEnum)]
enum PriorityArg {
    Normal,
    Fast,
    Urgent,
}

impl From<PriorityArg> for Priority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::Normal => Priority::Normal,
            PriorityArg::Fast => Priority::Fast,
            PriorityArg::Urgent => Priority::Urgent,
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|err| format!("expected YYYY-MM-DD: {err}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;
    if let Some(store) = cli.store {
        config.store_path = store;
    }
    if let Some(user) = cli.user {
        config.user = Some(user);
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    let command = cli.command.unwrap_or(Commands::Board);
    let log_file = matches!(command, Commands::Board).then_some(config.log_file.as_path());
    logging::init_logging(&config.log_level, log_file)?;

    let store = JsonFileStore::new(&config.store_path);
    match command {
        Commands::Board => run_board(Arc::new(store), &config),
        Commands::Init => {
            if cli.config.exists() {
                println!("Config already exists at {}", cli.config.display());
            } else {
                config.save(&cli.config)?;
                println!("Wrote {}", cli.config.display());
            }
            if store.init()? {
                println!("Created task store {}", store.path().display());
            }
            Ok(())
        }
        Commands::Add {
            title,
            description,
            due,
            priority,
            assignees,
        } => {
            let id = store.create_task(NewTask {
                title,
                description,
                priority: priority.into(),
                due_date: due,
                assignees: assignees.into_iter().map(Assignee::new).collect(),
            })?;
            println!("Created task {id}");
            Ok(())
        }
        Commands::List => {
            for task in store.list_tasks(config.user.as_deref())? {
                let due = task
                    .due_date
                    .map_or_else(|| "no due date".to_string(), |d| d.to_string());
                println!("- [{}] {} ({}, {}, due {due})", task.id, task.title, task.status, task.priority);
            }
            Ok(())
        }
        Commands::Stats => {
            let tasks = store.list_tasks(config.user.as_deref())?;
            let stats = DashboardStats::compute(&tasks, Local::now().date_naive());
            println!("Open tasks:      {}", stats.open);
            println!("Overdue:         {}", stats.overdue);
            println!("Due today:       {}", stats.due_today);
            println!("Completed:       {}", stats.completed);
            Ok(())
        }
        Commands::Comment {
            task,
            content,
            author,
        } => {
            let author = author.or(config.user);
            store.add_comment(task, author.as_deref(), &content)?;
            println!("Added comment to {task}");
            Ok(())
        }
        Commands::Comments { task } => {
            let comments = store.list_comments(task)?;
            if comments.is_empty() {
                println!("No comments yet");
            }
            for comment in comments {
                println!(
                    "{} {}: {}",
                    comment.created_at.format("%Y-%m-%d %H:%M"),
                    comment.author_label(),
                    comment.content
                );
            }
            Ok(())
        }
        Commands::Priority { task, priority } => {
            let priority = Priority::from(priority);
            store.update_task_priority(task, priority)?;
            println!("Task {task} is now {priority}");
            Ok(())
        }
        Commands::Archive { task } => {
            store.archive_task(task)?;
            println!("Archived task {task}");
            Ok(())
        }
        Commands::Delete { task } => {
            store.delete_task(task)?;
            println!("Deleted task {task}");
            Ok(())
        }
    }
}

fn run_board(store: Arc<dyn TaskStore>, config: &Config) -> Result<()> {
    let mut app = App::mount(store, config).context("failed to load the board")?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app::run(&mut terminal, &mut app, Duration::from_millis(config.tick_ms));

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result.context("board event loop failed")
}
