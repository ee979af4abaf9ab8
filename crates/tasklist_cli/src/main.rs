use clap::{CommandFactory, Parser};
use std::io::{self, BufRead, Write};
use std::rc::Rc;
use tasklist_cli::cli::{Cli, Command, collect_overrides, init_tracing};
use tasklist_cli::render;
use tasklist_core::config::{Config, Palette, load_config_with_fallback, merge_overrides};
use tasklist_core::dates::{parse_due_date, to_iso};
use tasklist_core::error::AppError;
use tasklist_core::ids::TimestampIds;
use tasklist_core::importer::HttpTaskSource;
use tasklist_core::model::Filter;
use tasklist_core::notify::{Notifier, import_summary, notifier_from_env, notify_quietly};
use tasklist_core::session::Session;
use tasklist_core::storage::{JsonFileStore, store_path};
use time::OffsetDateTime;
use tracing::{info, warn};

struct App {
    session: Session<HttpTaskSource>,
    palette: Palette,
    notifier: Box<dyn Notifier>,
}

fn open_app(config: &Config) -> Result<App, AppError> {
    let path = store_path()?;
    let store = Rc::new(JsonFileStore::open(&path)?);
    let source = HttpTaskSource::new(&config.resolved_import_url(), config.import_timeout())?;
    let session = Session::open(store, Box::new(TimestampIds::new()), source)?;
    info!(store = %path.display(), "session ready");

    Ok(App {
        session,
        palette: config.theme().palette(),
        notifier: notifier_from_env(),
    })
}

fn resolve_config(raw_overrides: &[String]) -> Result<Config, AppError> {
    let loaded = load_config_with_fallback();
    if let Some(err) = loaded.error.as_ref() {
        warn!(error = %err, "config could not be loaded, using defaults");
    }
    let overrides = collect_overrides(raw_overrides)?;
    Ok(merge_overrides(&loaded.config, &overrides))
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn confirm(input: &mut dyn BufRead, prompt: &str) -> Result<bool, AppError> {
    print!("{prompt} [y/N] ");
    io::stdout()
        .flush()
        .map_err(|err| AppError::io(err.to_string()))?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .map_err(|err| AppError::io(err.to_string()))?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn run_command(app: &mut App, cli: Cli, input: &mut dyn BufRead) -> Result<(), AppError> {
    match cli.command {
        Command::Add { text, due } => {
            let text = text.ok_or_else(|| AppError::invalid_input("text is required"))?;
            let offset = app.session.offset();
            let due_date = match due {
                Some(raw) => parse_due_date(&raw, offset)?,
                None => to_iso(OffsetDateTime::now_utc())?,
            };

            match app.session.on_add_task(&text, Some(due_date))? {
                Some(id) => {
                    let task = app
                        .session
                        .tasks()
                        .iter()
                        .find(|task| task.id == id)
                        .cloned()
                        .ok_or_else(|| AppError::invalid_data("added task is missing"))?;
                    if cli.json {
                        render::print_task_json(&task);
                    } else {
                        println!(
                            "Added task: {}",
                            app.palette.accentize(&render::describe(&task))
                        );
                    }
                }
                None => {
                    if cli.json {
                        println!("null");
                    } else {
                        println!("Nothing added: task text is empty.");
                    }
                }
            }
        }
        Command::Toggle { id } => {
            if !app.session.on_toggle_task_completion(id)? {
                return Err(AppError::invalid_input("task not found"));
            }
            let task = app
                .session
                .tasks()
                .iter()
                .find(|task| task.id == id)
                .cloned()
                .ok_or_else(|| AppError::invalid_input("task not found"))?;
            if cli.json {
                render::print_task_json(&task);
            } else if task.completed {
                println!("Completed task: {}", render::describe(&task));
            } else {
                println!("Reopened task: {}", render::describe(&task));
            }
        }
        Command::Delete { id, yes } => {
            app.session.on_confirm_delete_task(id);
            let staged = match app.session.pending_deletion() {
                Some(task) => task.clone(),
                None => {
                    app.session.on_cancel_delete();
                    return Err(AppError::invalid_input("task not found"));
                }
            };

            let confirmed = yes || confirm(input, &format!("Delete task \"{}\"?", staged.text))?;
            if !confirmed {
                app.session.on_cancel_delete();
                if cli.json {
                    println!("null");
                } else {
                    println!("Kept task: {}", render::describe(&staged));
                }
                return Ok(());
            }

            if let Some(task) = app.session.on_confirmed_delete()? {
                if cli.json {
                    render::print_task_json(&task);
                } else {
                    println!("Deleted task: {}", render::describe(&task));
                }
            }
        }
        Command::Filter { filter } => {
            let filter: Filter = filter.parse()?;
            app.session.on_filter_change(filter)?;
            if cli.json {
                println!("{}", serde_json::json!({ "filter": filter }));
            } else {
                println!("Filter set to {filter}");
            }
        }
        Command::List { filter } => {
            if let Some(raw) = filter {
                app.session.on_filter_change(raw.parse()?)?;
            }
            print_list(app, cli.json);
        }
        Command::Import { force } => {
            if app.session.has_fetched_previous() && !force {
                return Err(AppError::invalid_input(
                    "previous tasks were already imported (use --force to import again)",
                ));
            }

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|err| AppError::io(err.to_string()))?;
            let count = runtime.block_on(app.session.on_load_previous_tasks())?;
            let error = app.session.import_error();
            notify_quietly(
                app.notifier.as_ref(),
                "tasklist",
                &import_summary(count, error.as_deref()),
            );

            if let Some(message) = error {
                return Err(AppError::network(message));
            }

            if cli.json {
                println!("{}", serde_json::json!({ "imported": count }));
            } else {
                println!("{}", import_summary(count, None));
            }
        }
    }

    Ok(())
}

fn print_list(app: &App, json: bool) {
    if json {
        render::print_groups_json(&app.session);
    } else {
        render::print_groups_plain(&app.session, &app.palette);
    }
}

fn run_interactive() -> Result<(), AppError> {
    let config = resolve_config(&[])?;
    let mut app = open_app(&config)?;
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("tasklist".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if !cli.config_override.is_empty() {
            eprintln!(
                "ERROR: {}",
                AppError::invalid_input("config overrides are only accepted on the command line")
            );
            continue;
        }

        if let Err(err) = run_command(&mut app, cli, &mut stdin_lock) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn run_once(cli: Cli) -> Result<(), AppError> {
    let config = resolve_config(&cli.config_override)?;
    let mut app = open_app(&config)?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    run_command(&mut app, cli, &mut input)
}

fn main() {
    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = init_tracing(0, 0) {
            eprintln!("ERROR: {}", err);
        }
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if !err.use_stderr() {
                let _ = err.print();
                return;
            }
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = init_tracing(cli.verbose, cli.quiet) {
        eprintln!("ERROR: {}", err);
    }

    if let Err(err) = run_once(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
