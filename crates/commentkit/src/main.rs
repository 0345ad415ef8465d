//! Headless comment submission.
//!
//! Loads a saved page, fills its comment form, optionally relocates it as a
//! reply, then submits it to the form's endpoint and prints the outcome as
//! JSON.
//!
//! ```text
//! commentkit --page post.html --url https://blog.example/post/ \
//!     --field 'fields[name]=Ada' --field 'fields[message]=Hello' \
//!     --reply comment-42:42 --post hello-world
//! ```

use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use commentkit::{http_client, load_page, CommentKitConfig, CommentPage, Result};
use commentkit_common::{init_logging, CommentKitError, LogConfig, LogFormat};
use commentkit_dom::LoggingDialogs;
use commentkit_form::SubmitOutcome;
use serde_json::json;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "commentkit")]
#[command(about = "Submit a saved page's comment form")]
struct Args {
    /// Saved HTML page
    #[arg(long)]
    page: String,

    /// URL the page was served from
    #[arg(long)]
    url: String,

    /// JSON configuration file
    #[arg(long)]
    config: Option<String>,

    /// Form field to fill, as name=value (repeatable)
    #[arg(long = "field", value_parser = parse_field)]
    fields: Vec<Field>,

    /// Reply to a comment, as comment-id:parent-id
    #[arg(long, value_parser = parse_reply)]
    reply: Option<ReplyTarget>,

    /// Id of the reply container
    #[arg(long, default_value = "respond")]
    respond: String,

    /// Post identifier written with a reply
    #[arg(long)]
    post: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormatArg::Compact)]
    log_format: LogFormatArg,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Debug, Clone)]
struct Field {
    name: String,
    value: String,
}

#[derive(Debug, Clone)]
struct ReplyTarget {
    comment: String,
    parent: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

fn parse_field(s: &str) -> std::result::Result<Field, String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok(Field {
            name: name.to_string(),
            value: value.to_string(),
        }),
        _ => Err(format!("expected name=value, got '{}'", s)),
    }
}

fn parse_reply(s: &str) -> std::result::Result<ReplyTarget, String> {
    match s.split_once(':') {
        Some((comment, parent)) if !comment.is_empty() && !parent.is_empty() => Ok(ReplyTarget {
            comment: comment.to_string(),
            parent: parent.to_string(),
        }),
        _ => Err(format!("expected comment-id:parent-id, got '{}'", s)),
    }
}

fn outcome_json(outcome: &SubmitOutcome) -> serde_json::Value {
    match outcome {
        SubmitOutcome::Accepted => json!({ "outcome": "accepted" }),
        SubmitOutcome::Rejected {
            error_code,
            message,
        } => json!({
            "outcome": "rejected",
            "errorCode": error_code,
            "message": message,
        }),
        SubmitOutcome::Failed(e) => json!({
            "outcome": "failed",
            "category": e.category(),
            "error": e.to_string(),
        }),
    }
}

async fn run(args: Args) -> Result<SubmitOutcome> {
    let config = match &args.config {
        Some(path) => CommentKitConfig::load(path)?,
        None => CommentKitConfig::default(),
    };

    let document = load_page(&args.page, &args.url)?;
    let client = http_client(&config.http)?;
    let page = CommentPage::builder(document, config, client)
        .dialogs(LoggingDialogs)
        .attach()?;

    if let Some(target) = &args.reply {
        let outcome = page.move_form(
            &target.comment,
            &target.parent,
            &args.respond,
            args.post.as_deref(),
        );
        info!(?outcome, comment = %target.comment, "Reply relocation");
    }
    for field in &args.fields {
        page.set_field(&field.name, &field.value)?;
    }

    page.submit()
        .await
        .ok_or_else(|| CommentKitError::InvalidArgument("submission was not started".to_string()))
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let log_config = if args.verbose {
        LogConfig::debug()
    } else {
        LogConfig::default()
    }
    .with_format(args.log_format.into());
    init_logging(log_config);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to start runtime");
            return ExitCode::from(2);
        }
    };

    match runtime.block_on(run(args)) {
        Ok(outcome) => {
            println!("{}", outcome_json(&outcome));
            if outcome.is_accepted() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            error!(error = %e, category = e.category(), "commentkit failed");
            ExitCode::from(2)
        }
    }
}
