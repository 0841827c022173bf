//! One-shot question: send a single message and print the reply.

use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};
use parley_interaction::SubmitOutcome;

use super::chat::attach;
use super::setup::{SessionArgs, open_session};
use crate::render::render_markdown;

pub async fn run(args: SessionArgs, attachments: Vec<PathBuf>, text: Vec<String>) -> Result<()> {
    let mut session = open_session(&args)?.session;

    if !attachments.is_empty() {
        attach(&mut session, attachments).await;
    }

    let text = text.join(" ");
    match session.submit(&text).await {
        SubmitOutcome::Replied { reply } => {
            println!("{}", render_markdown(&reply));
            Ok(())
        }
        SubmitOutcome::Failed { error } => Err(anyhow!("Fehler: {error}")),
        SubmitOutcome::Ignored => bail!("Nothing to send: give a message or at least one attachment"),
    }
}
