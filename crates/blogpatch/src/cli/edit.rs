//! `blogpatch edit`: an interactive session over one field.
//!
//! After pulling the draft, every line read from stdin becomes the field's new
//! value and goes through the edit session. `\n` in a line is read as a
//! newline, so `para one\n\npara two` edits two paragraphs. Lines starting
//! with `:` are commands (`:pull`, `:push`, `:show`, `:quit`).

use log::{debug, info};
use tokio::io::{AsyncBufReadExt, BufReader};

use blogpatch_core::config::SyncConfig;
use blogpatch_core::error::{PatchError, Result};
use blogpatch_core::transport::{HttpDocumentApi, OperationChannel, WebSocketChannel};
use blogpatch_core::{
    DispatchOutcome, EditSession, Field, FieldValue, SensitiveSpan, TransmissionStatus,
};

use super::runtime;

pub fn handle_edit(config: &SyncConfig, field: &str, blog_id: Option<i64>) -> Result<()> {
    let field: Field = field.parse()?;
    let mut config = config.clone();
    if blog_id.is_some() {
        config.blog_id = blog_id;
    }

    runtime()?.block_on(run_session(&config, field))
}

async fn run_session(config: &SyncConfig, field: Field) -> Result<()> {
    let api = HttpDocumentApi::new(config)?;
    let channel = WebSocketChannel::connect(config).await?;

    let mut session =
        EditSession::new(Default::default(), channel, api).with_blog_id(config.blog_id);
    session.pull().await?;
    println!(
        "Editing '{}' of blog {:?} at version {}. Ctrl+C or :quit to stop.",
        field,
        session.document().id,
        session.version()
    );
    print_value(&session.document().value(field));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("[blogpatch] interrupted");
                None
            }
        };
        let Some(line) = line else { break };

        match line.trim() {
            ":quit" | ":q" => break,
            ":pull" => {
                session.pull().await?;
                println!("Pulled version {}", session.version());
                print_value(&session.document().value(field));
            }
            ":push" => {
                let outcome = session.push_all().await?;
                report(&outcome, session.status(), session.version());
            }
            ":show" => print_value(&session.document().value(field)),
            _ => match parse_value(field, &line) {
                Ok(value) => {
                    let outcome = session.set_field(field, value).await?;
                    report(&outcome, session.status(), session.version());
                }
                Err(e) => eprintln!("✗ {}", e),
            },
        }

        for frame in session.channel().receive_messages() {
            debug!("[blogpatch] received: {}", frame);
        }
    }

    println!("Stopped at version {}", session.version());
    Ok(())
}

/// Turn one input line into a value for `field`.
fn parse_value(field: Field, line: &str) -> Result<FieldValue> {
    match field {
        Field::Status => line
            .trim()
            .parse::<i32>()
            .map(FieldValue::Status)
            .map_err(|_| PatchError::InvalidOperation(format!("'{}' is not a status code", line))),
        Field::SensitiveContentList => {
            let spans: Vec<SensitiveSpan> = serde_json::from_str(line)?;
            Ok(FieldValue::Spans(spans))
        }
        _ => Ok(FieldValue::Text(line.replace("\\n", "\n"))),
    }
}

fn print_value(value: &FieldValue) {
    match value {
        FieldValue::Text(text) => println!("{}", text.replace('\n', "\\n")),
        FieldValue::Status(code) => println!("{}", code),
        FieldValue::Spans(spans) => match serde_json::to_string(spans) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("✗ {}", e),
        },
    }
}

fn indicator(status: TransmissionStatus) -> &'static str {
    match status {
        TransmissionStatus::Unset => "·",
        TransmissionStatus::Success => "✓",
        TransmissionStatus::Warning => "!",
        TransmissionStatus::Danger => "✗",
    }
}

fn report(outcome: &DispatchOutcome, status: TransmissionStatus, version: i64) {
    let detail = match outcome {
        DispatchOutcome::Gated(decision) => format!("not sent ({:?})", decision),
        DispatchOutcome::Incremental { operations, .. } => {
            format!("sent {} operation(s)", operations)
        }
        DispatchOutcome::FullPush { .. } => "pushed full draft".to_string(),
        DispatchOutcome::Dropped => "channel closed, will resync".to_string(),
    };
    println!("{} {} [version {}]", indicator(status), detail, version);
}
