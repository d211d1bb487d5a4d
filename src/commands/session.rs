use crate::commands::classifier::prepare_model;
use crate::commands::AppState;
use crate::error::AppError;
use crate::models::view_types::PageView;
use crate::services::classifier::ImageClassifier;
use crate::services::content::catalog::ContentCatalog;
use crate::services::media;
use crate::services::session::SessionContext;
use crate::services::view;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const HELP: &str = "commands: image <path> | label <name> | labels | show | help | quit";

#[derive(Debug, PartialEq)]
pub enum SessionCommand {
    Image(PathBuf),
    Label(String),
    Labels,
    Show,
    Help,
    Quit,
}

impl SessionCommand {
    pub fn parse(line: &str) -> Result<Option<Self>, AppError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match (word, rest.is_empty()) {
            ("image", false) => SessionCommand::Image(PathBuf::from(rest)),
            ("label", false) => SessionCommand::Label(rest.to_string()),
            ("labels", true) => SessionCommand::Labels,
            ("show", true) => SessionCommand::Show,
            ("help", true) => SessionCommand::Help,
            ("quit" | "exit", true) => SessionCommand::Quit,
            _ => return Err(format!("Unrecognized command `{}` ({})", line, HELP).into()),
        };
        Ok(Some(command))
    }
}

/// Load the model and run the session loop on `input`, rendering to stdout.
pub async fn start_session<R>(state: &mut AppState, input: R) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
{
    let vocabulary = prepare_model(state).await?;
    let mut stdout = std::io::stdout();
    run_session(&vocabulary, &state.catalog, &state.model_manager, input, &mut stdout).await
}

/// Read commands until `quit` or end of input, re-rendering after each one.
pub async fn run_session<R, C, W>(
    vocabulary: &[String],
    catalog: &ContentCatalog,
    classifier: &C,
    input: R,
    out: &mut W,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    C: ImageClassifier + Clone + Send + 'static,
    W: Write,
{
    let mut session = SessionContext::new();
    let mut lines = input.lines();

    writeln!(out, "{}", HELP)?;
    while let Some(line) = lines.next_line().await? {
        let command = match SessionCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "{}", e)?;
                continue;
            }
        };

        match command {
            SessionCommand::Quit => break,
            SessionCommand::Help => {
                writeln!(out, "{}", HELP)?;
                continue;
            }
            SessionCommand::Labels => {
                writeln!(out, "{}", vocabulary.join(", "))?;
                continue;
            }
            SessionCommand::Image(path) => match media::read_upload(&path).await {
                Ok(bytes) => {
                    session.submit_image(bytes);
                }
                Err(e) => {
                    writeln!(out, "{}", e)?;
                    continue;
                }
            },
            SessionCommand::Label(label) => {
                if !vocabulary.contains(&label) {
                    writeln!(out, "`{}` is not a label this model produces", label)?;
                    continue;
                }
                session.select_label(label);
            }
            SessionCommand::Show => {}
        }

        if let Err(e) = session.evaluate_blocking(classifier).await {
            tracing::error!(error = %e, "classification failed");
            writeln!(out, "{}", e)?;
            continue;
        }
        write!(out, "{}", view::render_text(&PageView::build(&session, vocabulary, catalog)))?;
    }

    Ok(())
}
