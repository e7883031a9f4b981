use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use smartshop_core::config::Config;
use smartshop_core::{Classification, ItemId, OrganizedList, Result, Session, ShopError, ViewFilter};

mod args;
use args::{Cli, Commands, ConfigAction, Shell};

const PROGRESS_WIDTH: usize = 20;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let base_dir = match resolve_base_dir(cli.base_dir) {
        Ok(dir) => dir,
        Err(e) => return report(e),
    };

    let result = match cli.command {
        Some(Commands::Add { text }) => handle_add(&base_dir, &text.join(" "), cli.quiet),
        Some(Commands::Smart { text }) => handle_smart(&base_dir, &text, cli.quiet).await,
        Some(Commands::List {
            pending,
            view,
            json,
        }) => {
            let view = if pending { ViewFilter::Pending } else { view };
            handle_list(&base_dir, view, json)
        }
        Some(Commands::Toggle { id }) => handle_toggle(&base_dir, &id, cli.quiet),
        Some(Commands::Delete { id }) => handle_delete(&base_dir, &id, cli.quiet),
        Some(Commands::ClearCompleted { yes }) => {
            handle_clear_completed(&base_dir, yes, cli.quiet)
        }
        Some(Commands::Reset { yes }) => handle_reset(&base_dir, yes, cli.quiet),
        Some(Commands::Config { action }) => handle_config(action, &base_dir),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(e),
    }
}

fn report(e: ShopError) -> ExitCode {
    eprintln!("{} {}", "[ERROR]".red().bold(), e);
    ExitCode::from(e.exit_code() as u8)
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "smartshop", &mut io::stdout());
}

fn resolve_base_dir(cli_base: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(base) = cli_base {
        return Ok(base);
    }

    if let Ok(base) = std::env::var("SMARTSHOP_BASE") {
        return Ok(PathBuf::from(base));
    }

    dirs::home_dir()
        .map(|h| h.join(".smartshop"))
        .ok_or(ShopError::HomeNotFound)
}

fn open_session(base_dir: &Path) -> Result<Session> {
    let config = Config::load(base_dir)?;
    debug!(
        base_dir = %base_dir.display(),
        provider = config.classifier.provider.as_str(),
        "loaded config"
    );
    Session::open(&config, base_dir)
}

/// Resolve an id prefix; an unknown id is reported and treated as a no-op.
fn lookup(session: &Session, prefix: &str, quiet: bool) -> Result<Option<ItemId>> {
    let id = session.resolve(prefix)?;
    if id.is_none() && !quiet {
        println!("{} no matching item for '{}'", "[WARN]".yellow(), prefix);
    }
    Ok(id)
}

/// Ask a y/N question on stdin.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{} {} [y/N]: ", "[WARN]".yellow(), prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn handle_add(base_dir: &Path, text: &str, quiet: bool) -> Result<()> {
    let mut session = open_session(base_dir)?;
    let added = session.add_simple(text);
    if !quiet {
        print_added(&session, &added);
    }
    session.close()
}

async fn handle_smart(base_dir: &Path, text: &[String], quiet: bool) -> Result<()> {
    let text = if text.len() == 1 && text[0] == "-" {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        input
    } else {
        text.join(" ")
    };

    let mut session = open_session(base_dir)?;
    if !quiet {
        if let Some(backend) = session.classifier().backend_name() {
            println!("{} via {}...", "Classifying".cyan(), backend);
        }
    }

    let (classification, added) = session.add_smart(&text).await;
    if !quiet {
        print_classification(&classification);
        print_added(&session, &added);
    }
    session.close()
}

fn print_classification(classification: &Classification) {
    let outcome = if classification.outcome.is_fallback() {
        classification.outcome.to_string().yellow()
    } else {
        classification.outcome.to_string().green()
    };
    println!("{} {}", "Outcome:".cyan(), outcome);
    for warning in &classification.warnings {
        println!("{} {}", "[WARN]".yellow(), warning);
    }
}

fn print_added(session: &Session, added: &[ItemId]) {
    if added.is_empty() {
        println!("Nothing to add.");
        return;
    }
    for id in added {
        if let Some(item) = session.store().get(id) {
            println!(
                "{} {} {} {}",
                "Added:".green(),
                id.short().dimmed(),
                item.name,
                format!("[{}]", item.display_category()).cyan()
            );
        }
    }
}

fn handle_list(base_dir: &Path, filter: ViewFilter, json: bool) -> Result<()> {
    let session = open_session(base_dir)?;
    let view = session.view(filter);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_list(&view);
    }
    Ok(())
}

fn print_list(view: &OrganizedList) {
    let stats = &view.stats;
    println!();
    println!(
        "{} {}/{} bought ({}%)",
        progress_bar(stats.progress_percent),
        stats.bought_count,
        stats.total_count,
        stats.progress_percent
    );
    println!();

    if view.is_empty() {
        if stats.total_count == 0 {
            println!("  List is empty. Add items with: smartshop add \"Milk, Eggs\"");
        } else {
            println!("  Everything is bought.");
        }
        println!();
        return;
    }

    for (category, items) in &view.groups {
        println!("{} ({})", category.bold(), items.len());
        for item in items {
            let id = item.id.short();
            if item.is_bought {
                println!(
                    "  {} {} {}",
                    "[x]".green(),
                    id.dimmed(),
                    item.name.strikethrough().dimmed()
                );
            } else {
                println!("  [ ] {} {}", id.dimmed(), item.name);
            }
        }
        println!();
    }
}

fn progress_bar(percent: u8) -> String {
    let filled = (percent as usize * PROGRESS_WIDTH + 50) / 100;
    format!(
        "[{}{}]",
        "#".repeat(filled).green(),
        "-".repeat(PROGRESS_WIDTH - filled)
    )
}

fn handle_toggle(base_dir: &Path, prefix: &str, quiet: bool) -> Result<()> {
    let mut session = open_session(base_dir)?;
    let Some(id) = lookup(&session, prefix, quiet)? else {
        return Ok(());
    };
    session.toggle(&id);

    if !quiet {
        if let Some(item) = session.store().get(&id) {
            let state = if item.is_bought {
                "bought".green()
            } else {
                "not bought".yellow()
            };
            println!("{} {} is {}", "Toggled:".cyan(), item.name, state);
        }
    }
    session.close()
}

fn handle_delete(base_dir: &Path, prefix: &str, quiet: bool) -> Result<()> {
    let mut session = open_session(base_dir)?;
    let Some(id) = lookup(&session, prefix, quiet)? else {
        return Ok(());
    };
    let name = session
        .store()
        .get(&id)
        .map(|item| item.name.clone())
        .unwrap_or_default();
    session.delete(&id);

    if !quiet {
        println!("{} {}", "Deleted:".red(), name);
    }
    session.close()
}

fn handle_clear_completed(base_dir: &Path, yes: bool, quiet: bool) -> Result<()> {
    let mut session = open_session(base_dir)?;
    let bought = session.view(ViewFilter::All).stats.bought_count;
    if bought == 0 {
        if !quiet {
            println!("No bought items to clear.");
        }
        return Ok(());
    }

    if !yes && !confirm(&format!("Remove all {} bought item(s)?", bought))? {
        println!("Aborted.");
        return Ok(());
    }

    let removed = session.clear_completed();
    if !quiet {
        println!("{} {} bought item(s)", "Cleared:".green(), removed);
    }
    session.close()
}

fn handle_reset(base_dir: &Path, yes: bool, quiet: bool) -> Result<()> {
    let mut session = open_session(base_dir)?;
    let count = session.items().len();
    if count == 0 {
        if !quiet {
            println!("List is already empty.");
        }
        return Ok(());
    }

    if !yes && !confirm(&format!("Delete all {} item(s)?", count))? {
        println!("Aborted.");
        return Ok(());
    }

    let removed = session.reset_all();
    if !quiet {
        println!("{} {} item(s)", "Reset:".red(), removed);
    }
    session.close()
}

fn handle_config(action: ConfigAction, base_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load(base_dir)?;
            match config.get(&key) {
                Some(value) => println!("{}", value),
                None => return Err(ShopError::ConfigKeyNotFound { key }),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(base_dir)?;
            config.set(&key, &value)?;
            config.save(base_dir)?;
            let shown = if key == "classifier.api_key" {
                "********"
            } else {
                value.as_str()
            };
            println!("{} {} = {}", "Set:".green(), key, shown);
        }
        ConfigAction::List => {
            let config = Config::load(base_dir)?;
            println!();
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            println!();
        }
        ConfigAction::Path => {
            println!("{}", Config::path(base_dir).display());
        }
        ConfigAction::Init => {
            let path = Config::init(base_dir)?;
            println!("{} {}", "Initialized:".green(), path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_progress_bar_bounds() {
        colored::control::set_override(false);
        assert_eq!(progress_bar(0), format!("[{}]", "-".repeat(PROGRESS_WIDTH)));
        assert_eq!(progress_bar(100), format!("[{}]", "#".repeat(PROGRESS_WIDTH)));
        assert_eq!(progress_bar(50), format!("[{}{}]", "#".repeat(10), "-".repeat(10)));
    }

    #[test]
    fn test_confirmation_answers() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES \n"));
        assert!(!is_yes("\n"));
        assert!(!is_yes("no\n"));
    }

    #[test]
    fn test_list_view_flag() {
        let parse = |args: &[&str]| match Cli::try_parse_from(args).unwrap().command {
            Some(Commands::List { pending, view, .. }) => (pending, view),
            _ => panic!("expected list command"),
        };
        assert_eq!(parse(&["smartshop", "list"]), (false, ViewFilter::All));
        assert_eq!(
            parse(&["smartshop", "list", "--view", "pending"]),
            (false, ViewFilter::Pending)
        );
        assert_eq!(parse(&["smartshop", "list", "-p"]), (true, ViewFilter::All));
        assert!(Cli::try_parse_from(["smartshop", "list", "--view", "done"]).is_err());
        assert!(Cli::try_parse_from(["smartshop", "list", "-p", "--view", "all"]).is_err());
    }

    #[test]
    fn test_clear_completed_accepts_yes() {
        let cli = Cli::try_parse_from(["smartshop", "clear-completed", "--yes"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::ClearCompleted { yes: true })));
    }

    #[test]
    fn test_unknown_id_is_a_noop() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut session = open_session(temp.path()).unwrap();
        session.add_simple("Milk");
        session.close().unwrap();

        handle_toggle(temp.path(), "ffffffff", true).unwrap();
        handle_delete(temp.path(), "ffffffff", true).unwrap();

        let session = open_session(temp.path()).unwrap();
        assert_eq!(session.items().len(), 1);
        assert!(!session.items()[0].is_bought);
    }

    #[test]
    fn test_resolve_base_dir_prefers_flag() {
        let dir = resolve_base_dir(Some(PathBuf::from("/tmp/shop"))).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/shop"));
    }

    #[test]
    fn test_smart_reads_multiple_words() {
        let cli = Cli::try_parse_from(["smartshop", "smart", "spaghetti", "bolognese"]).unwrap();
        match cli.command {
            Some(Commands::Smart { text }) => assert_eq!(text.join(" "), "spaghetti bolognese"),
            _ => panic!("expected smart command"),
        }
    }
}
