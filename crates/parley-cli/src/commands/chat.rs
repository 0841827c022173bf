//! Interactive chat REPL.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use parley_core::conversation::TurnRole;
use parley_core::model::ModelSelector;
use parley_infrastructure::ingest::SelectedFile;
use parley_interaction::{ChatSession, SubmitOutcome};
use rustyline::Editor;
use rustyline::error::ReadlineError;

use super::setup::{SessionArgs, open_session};
use crate::helper::CliHelper;
use crate::render::render_markdown;

/// Slash commands offered for completion.
pub const REPL_COMMANDS: &[&str] = &[
    "/attach", "/detach", "/files", "/model", "/history", "/help",
];

/// One parsed line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Quit,
    Attach(Vec<PathBuf>),
    Detach(String),
    Files,
    Model(Option<String>),
    History,
    Help,
    Message(String),
}

impl ReplCommand {
    /// Lines starting with an unlisted `/word` are messages, not commands.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed == "quit" || trimmed == "exit" {
            return Self::Quit;
        }
        if !trimmed.starts_with('/') {
            return Self::Message(line.to_string());
        }

        let mut parts = trimmed.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match command {
            "/attach" => Self::Attach(args.into_iter().map(PathBuf::from).collect()),
            "/detach" => Self::Detach(args.join(" ")),
            "/files" => Self::Files,
            "/model" => Self::Model(args.first().map(|s| s.to_string())),
            "/history" => Self::History,
            "/help" => Self::Help,
            _ => Self::Message(line.to_string()),
        }
    }
}

pub async fn run(args: SessionArgs) -> Result<()> {
    let setup = open_session(&args)?;
    let mut session = setup.session;

    if let Err(err) = setup.paths.ensure_secret_file() {
        tracing::warn!(error = %err, "Could not create secret file template");
    }

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== Parley ===".bright_magenta().bold());
    println!(
        "{}",
        format!(
            "{} via {}. Type '/help' for commands or 'quit' to exit.",
            session.model().display_name(),
            setup.config.provider
        )
        .bright_black()
    );
    warn_if_key_missing(&session, &setup.paths.secret_file());
    println!();
    print_turn(TurnRole::Assistant, session.transcript()[0].text());

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                if line.trim().is_empty() && session.pending_attachments().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());

                match ReplCommand::parse(&line) {
                    ReplCommand::Quit => {
                        println!("{}", "Auf Wiedersehen!".bright_green());
                        break;
                    }
                    ReplCommand::Attach(paths) => attach(&mut session, paths).await,
                    ReplCommand::Detach(reference) => detach(&mut session, &reference),
                    ReplCommand::Files => list_files(&session),
                    ReplCommand::Model(None) => {
                        println!("{}", format!("Model: {}", session.model()).bright_black())
                    }
                    ReplCommand::Model(Some(id)) => switch_model(&mut session, &id, &setup.paths.secret_file()),
                    ReplCommand::History => {
                        for turn in session.transcript() {
                            print_turn(turn.role(), turn.text());
                        }
                    }
                    ReplCommand::Help => print_help(),
                    ReplCommand::Message(text) => send(&mut session, &text).await,
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}

async fn send(session: &mut ChatSession, text: &str) {
    print!("{}", "Denkt nach...".bright_black());
    let _ = std::io::stdout().flush();

    let outcome = session.submit(text).await;

    // Clear the indicator line
    print!("\r\x1b[2K");
    match outcome {
        SubmitOutcome::Ignored => {}
        SubmitOutcome::Replied { reply } => print_turn(TurnRole::Assistant, &reply),
        SubmitOutcome::Failed { .. } => {
            if let Some(turn) = session.transcript().last() {
                println!("{}", turn.text().red());
                println!();
            }
        }
    }
}

/// Reads every path, then hands the readable ones to the session.
pub async fn attach(session: &mut ChatSession, paths: Vec<PathBuf>) {
    if paths.is_empty() {
        println!("{}", "Usage: /attach <path>...".bright_black());
        return;
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match SelectedFile::from_path(&path).await {
            Ok(file) => files.push(file),
            Err(err) => eprintln!("{}", err.to_string().red()),
        }
    }

    let before = session.pending_attachments().len();
    for notice in session.attach(files).await {
        println!("{}", notice.to_string().yellow());
    }
    for attachment in &session.pending_attachments()[before..] {
        println!(
            "{}",
            format!("+ {} ({}, {} Bytes)", attachment.file_name, attachment.kind.as_str(), attachment.size)
                .green()
        );
    }
}

/// Accepts an attachment id or its 1-based position in `/files`.
fn detach(session: &mut ChatSession, reference: &str) {
    let id = match reference.parse::<usize>() {
        Ok(index) if index >= 1 => session
            .pending_attachments()
            .get(index - 1)
            .map(|a| a.id.clone()),
        _ => Some(reference.to_string()),
    };

    match id {
        Some(id) if session.remove_attachment(&id) => {
            println!("{}", format!("- {id}").green())
        }
        _ => println!("{}", format!("No pending attachment '{reference}'").yellow()),
    }
}

fn list_files(session: &ChatSession) {
    let pending = session.pending_attachments();
    if pending.is_empty() {
        println!("{}", "No pending attachments.".bright_black());
        return;
    }
    for (i, attachment) in pending.iter().enumerate() {
        println!(
            "{} {} {}",
            format!("{:>2}.", i + 1).bright_black(),
            attachment.file_name,
            format!("[{}, {} Bytes] {}", attachment.kind.as_str(), attachment.size, attachment.id).bright_black()
        );
    }
}

fn switch_model(session: &mut ChatSession, id: &str, secret_file: &std::path::Path) {
    match id.parse::<ModelSelector>() {
        Ok(model) if model == session.model() => {
            println!("{}", format!("Already using {}", model.display_name()).bright_black())
        }
        Ok(model) => {
            session.switch_model(model);
            warn_if_key_missing(session, secret_file);
            print_turn(TurnRole::Assistant, session.transcript()[0].text());
        }
        Err(err) => println!("{}", err.to_string().yellow()),
    }
}

fn warn_if_key_missing(session: &ChatSession, secret_file: &std::path::Path) {
    let model = session.model();
    if !session.has_credential() {
        println!(
            "{}",
            format!(
                "No API key for {}. Set {} or add it to {}.",
                model.display_name(),
                model.credential_key(),
                secret_file.display()
            )
            .yellow()
        );
    }
}

fn print_turn(role: TurnRole, text: &str) {
    match role {
        TurnRole::User => println!("{}", format!("> {text}").green()),
        TurnRole::Assistant => println!("{}", render_markdown(text)),
    }
    println!();
}

fn print_help() {
    let lines = [
        ("/attach <path>...", "Attach images, PDF, DOCX or text files"),
        ("/detach <id|n>", "Remove a pending attachment"),
        ("/files", "List pending attachments"),
        ("/model [v3|r1]", "Show or switch the model (starts a new conversation)"),
        ("/history", "Show the conversation"),
        ("quit", "Exit"),
    ];
    for (command, description) in lines {
        println!("  {:<20} {}", command.bright_cyan(), description);
    }
}
