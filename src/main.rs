//! taskwise CLI: task intelligence over a local workspace.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use taskwise::config::EngineConfig;
use taskwise::error::{InputError, TaskwiseResult};
use taskwise::insight::InsightEngine;
use taskwise::model::{SourceType, Task, TaskDraft, TaskStatus};
use taskwise::paths::TaskwisePaths;
use taskwise::store::Workspace;

#[derive(Parser)]
#[command(name = "taskwise", version, about = "Task intelligence engine")]
struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/taskwise/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory holding workspace.json.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config and data directories and a default config file.
    Init,

    /// Record and list context notes.
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// Create, list and complete tasks.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Suggest deadline, category and priority for a task without saving it.
    Suggest {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Score a task's priority without saving it.
    Priority {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Deadline as YYYY-MM-DD or RFC 3339.
        #[arg(long)]
        deadline: Option<String>,
    },

    /// Productivity, burnout and focus areas over all tasks.
    Insights {
        /// Also store the result as an analytics snapshot.
        #[arg(long, conflicts_with = "latest")]
        save: bool,
        /// Show the most recently saved snapshot instead of recomputing.
        #[arg(long)]
        latest: bool,
    },

    /// Categories and how often tasks use them.
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ContextAction {
    /// Analyze a note and store it with its insights.
    Add {
        content: String,
        /// email, message, note or other.
        #[arg(long, default_value = "note")]
        source: String,
    },
    /// Show the most recent contexts.
    List {
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Create a task; its priority is always scored.
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Deadline as YYYY-MM-DD or RFC 3339.
        #[arg(long)]
        deadline: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Ask for suggestions and fill in a missing deadline or category.
        #[arg(long)]
        suggest: bool,
    },
    /// List tasks, optionally filtered by status.
    List {
        #[arg(long)]
        status: Option<String>,
    },
    /// Mark a task completed.
    Done { id: u64 },
    /// Counters over all tasks.
    Stats,
    /// Tasks past their deadline.
    Overdue,
    /// Open urgent tasks.
    Urgent,
}

#[derive(Subcommand)]
enum CategoryAction {
    /// All categories in creation order.
    List,
    /// The most used categories.
    Popular {
        #[arg(long, default_value = "5")]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (file plus environment).
    Show,
}

struct Session {
    paths: TaskwisePaths,
    config_file: PathBuf,
    config: EngineConfig,
}

impl Session {
    fn resolve(cli: &Cli) -> TaskwiseResult<Self> {
        let mut paths = TaskwisePaths::resolve()?;
        if let Some(dir) = &cli.data_dir {
            paths.data_dir = dir.clone();
        }
        let config_file = cli.config.clone().unwrap_or_else(|| paths.config_file());
        let config = EngineConfig::resolve(&config_file)?;
        Ok(Self {
            paths,
            config_file,
            config,
        })
    }

    fn engine(&self) -> InsightEngine {
        InsightEngine::from_config(&self.config)
    }

    fn workspace(&self) -> TaskwiseResult<Workspace> {
        Ok(Workspace::open(self.paths.workspace_file())?)
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let session = Session::resolve(&cli)?;

    match cli.command {
        Commands::Init => {
            session.paths.ensure_dirs()?;
            if session.config_file.exists() {
                println!("Config already present at {}", session.config_file.display());
            } else {
                EngineConfig::default().save(&session.config_file)?;
                println!("Wrote default config to {}", session.config_file.display());
            }
            let ws = session.workspace()?;
            ws.save()?;
            println!("Workspace at {}", ws.path().display());
        }

        Commands::Context { action } => match action {
            ContextAction::Add { content, source } => {
                if content.trim().is_empty() {
                    return Err(InputError::Missing { field: "content" }.into());
                }
                let source_type: SourceType = source.parse()?;
                let engine = session.engine();
                let insights = engine.process_context(&content, source_type);
                let mut ws = session.workspace()?;
                let entry = ws.add_context(content, source_type, insights, engine.now());
                println!(
                    "Context {} ({}) urgency={:.2} sentiment={}",
                    entry.id,
                    entry.source_type,
                    entry.urgency(),
                    entry.sentiment()
                );
                for task in &entry.processed_insights.extracted_tasks {
                    println!("  task: {task}");
                }
                ws.save()?;
            }
            ContextAction::List { limit } => {
                let ws = session.workspace()?;
                let recent = ws.recent_contexts(limit);
                if recent.is_empty() {
                    println!("No contexts recorded.");
                }
                for entry in recent {
                    println!(
                        "  {}. [{}] {} (urgency {:.2}, {})",
                        entry.id,
                        entry.source_type,
                        taskwise::prompt::excerpt(&entry.content, 60),
                        entry.urgency(),
                        entry.sentiment()
                    );
                }
            }
        },

        Commands::Task { action } => {
            let mut ws = session.workspace()?;
            match action {
                TaskAction::Add {
                    title,
                    description,
                    deadline,
                    category,
                    suggest,
                } => {
                    let engine = session.engine();
                    let mut draft = TaskDraft {
                        title,
                        description,
                        deadline,
                    };
                    draft.validate()?;
                    if draft.deadline.is_some() && draft.parsed_deadline().is_none() {
                        tracing::warn!(deadline = ?draft.deadline, "deadline not understood, ignoring");
                        draft.deadline = None;
                    }

                    let mut category = category;
                    let suggestions = if suggest {
                        let window = engine.windows().suggestion_source;
                        let bundle = engine.get_task_suggestions(
                            &draft.title,
                            &draft.description,
                            ws.recent_contexts(window),
                        );
                        if category.is_none() {
                            category = Some(bundle.suggested_category.clone());
                        }
                        if draft.deadline.is_none() {
                            draft.deadline = Some(bundle.suggested_deadline.to_string());
                        }
                        Some(bundle)
                    } else {
                        None
                    };

                    let assessment = engine.assess_priority(&draft, ws.contexts());
                    let task = Task {
                        id: 0,
                        deadline: draft.parsed_deadline(),
                        title: draft.title,
                        description: draft.description,
                        priority: assessment.priority,
                        priority_score: assessment.priority_score,
                        status: TaskStatus::Todo,
                        category,
                        created_at: engine.now(),
                        ai_suggestions: suggestions,
                    };
                    let id = ws.add_task(task);
                    ws.save()?;
                    println!(
                        "Task {id} created: {} priority (score {:.2})",
                        assessment.priority, assessment.priority_score
                    );
                    println!("  {}", assessment.reasoning);
                }
                TaskAction::List { status } => {
                    let filter: Option<TaskStatus> = status.map(|s| s.parse()).transpose()?;
                    let now = Utc::now();
                    let tasks: Vec<&Task> = ws
                        .tasks_by_priority()
                        .into_iter()
                        .filter(|t| filter.is_none_or(|f| t.status == f))
                        .collect();
                    if tasks.is_empty() {
                        println!("No tasks.");
                    }
                    for task in tasks {
                        print_task(task, now);
                    }
                }
                TaskAction::Done { id } => {
                    ws.set_status(id, TaskStatus::Completed)?;
                    ws.save()?;
                    println!("Task {id} completed.");
                }
                TaskAction::Stats => {
                    let stats = session.engine().task_stats(ws.tasks());
                    println!("{}", serde_json::to_string_pretty(&stats).into_diagnostic()?);
                }
                TaskAction::Overdue => {
                    let now = Utc::now();
                    let overdue = ws.overdue_tasks(now);
                    if overdue.is_empty() {
                        println!("Nothing overdue.");
                    }
                    for task in overdue {
                        print_task(task, now);
                    }
                }
                TaskAction::Urgent => {
                    let now = Utc::now();
                    let urgent = ws.urgent_tasks();
                    if urgent.is_empty() {
                        println!("No open urgent tasks.");
                    }
                    for task in urgent {
                        print_task(task, now);
                    }
                }
            }
        }

        Commands::Suggest { title, description } => {
            let engine = session.engine();
            let ws = session.workspace()?;
            let window = engine.windows().suggestion_source;
            let bundle = engine.get_task_suggestions(&title, &description, ws.recent_contexts(window));
            println!("{}", serde_json::to_string_pretty(&bundle).into_diagnostic()?);
        }

        Commands::Priority {
            title,
            description,
            deadline,
        } => {
            let draft = TaskDraft {
                title,
                description,
                deadline,
            };
            draft.validate()?;
            let ws = session.workspace()?;
            let assessment = session.engine().assess_priority(&draft, ws.contexts());
            println!("{}", serde_json::to_string_pretty(&assessment).into_diagnostic()?);
        }

        Commands::Insights { latest: true, .. } => {
            let ws = session.workspace()?;
            match ws.latest_snapshot() {
                Some(snapshot) => {
                    println!("# generated {}", snapshot.generated_at.to_rfc3339());
                    println!("{}", serde_json::to_string_pretty(snapshot).into_diagnostic()?);
                }
                None => println!("No snapshots saved. Run `taskwise insights --save` first."),
            }
        }

        Commands::Insights { save, .. } => {
            let engine = session.engine();
            let mut ws = session.workspace()?;
            let snapshot = engine.snapshot(ws.tasks(), ws.contexts());
            println!(
                "{}",
                serde_json::to_string_pretty(&snapshot.summary).into_diagnostic()?
            );
            if save {
                ws.record_snapshot(snapshot);
                ws.save()?;
                println!("Snapshot saved.");
            }
        }

        Commands::Category { action } => {
            let ws = session.workspace()?;
            let categories: Vec<_> = match action {
                CategoryAction::List => ws.categories().iter().collect(),
                CategoryAction::Popular { limit } => ws.popular_categories(limit),
            };
            if categories.is_empty() {
                println!("No categories yet.");
            }
            for category in categories {
                println!(
                    "  {} {} (used {} times)",
                    category.color, category.name, category.usage_frequency
                );
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("# {}", session.config_file.display());
                println!("{}", session.config.to_toml_string()?);
            }
        },
    }

    Ok(())
}

fn print_task(task: &Task, now: DateTime<Utc>) {
    let due = match task.days_until_deadline(now) {
        Some(days) if task.is_overdue(now) => format!(", overdue by {}d", -days),
        Some(days) => format!(", due in {days}d"),
        None => String::new(),
    };
    println!(
        "  {}. [{}] {} ({} {:.2}{}{})",
        task.id,
        task.status,
        task.title,
        task.priority,
        task.priority_score,
        task.category
            .as_deref()
            .map(|c| format!(", {c}"))
            .unwrap_or_default(),
        due
    );
}
