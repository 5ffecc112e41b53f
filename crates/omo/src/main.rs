//! An interactive coding assistant in the terminal.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use omo::SessionBuilder;
use omo::core::AgentEvent;
use omo_responses_model::{ResponsesConfigBuilder, ResponsesProvider};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::select;
use tokio::sync::mpsc;

const BAR_CHAR: &str = "▎";
const PREVIEW_CHARS: usize = 100;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Ok(access_token) = env::var("OMO_ACCESS_TOKEN") else {
        eprintln!("OMO_ACCESS_TOKEN environment variable is not set");
        return;
    };

    let mut config_builder = ResponsesConfigBuilder::with_access_token(access_token);
    if let Ok(account_id) = env::var("OMO_ACCOUNT_ID") {
        config_builder = config_builder.with_account_id(account_id);
    }
    if let Ok(model) = env::var("OMO_MODEL") {
        config_builder = config_builder.with_model(model);
    }
    if let Ok(base_url) = env::var("OMO_BASE_URL") {
        config_builder = config_builder.with_base_url(base_url);
    }
    let config = match config_builder.build() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            return;
        }
    };
    info!("using model {}", config.model());
    let model_provider = ResponsesProvider::new(config);

    let working_dir = match env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("Cannot determine the current directory: {err}");
            return;
        }
    };
    let home_dir = env::var_os("OMO_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| working_dir.clone());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let mut session_builder =
        SessionBuilder::with_model_provider(model_provider)
            .with_working_dir(working_dir)
            .with_home_dir(home_dir)
            .on_event(move |event| {
                event_tx.send(event.clone()).ok();
            });
    if let Some(max_rounds) = env::var("OMO_MAX_ROUNDS")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        session_builder = session_builder.with_max_rounds(max_rounds);
    }
    let mut session = session_builder.build();

    let mut renderer = Renderer::new();
    let mut input = BufReader::new(io::stdin()).lines();

    println!("\n🤖 OMO Agent\n");
    println!("Type a message or /help for commands.\n");

    loop {
        print!("{} ", "You:".bright_green().bold());
        std::io::stdout().flush().ok();

        let Some(line) = read_line(&mut input).await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.to_ascii_lowercase().as_str() {
            "/exit" | "/quit" => break,
            "/help" => {
                println!("\nCommands:");
                println!("  /clear   - Start a new conversation");
                println!("  /exit    - Quit");
                println!("  /help    - Show this help\n");
                continue;
            }
            "/clear" => {
                session.clear();
                println!("Started a new conversation.\n");
                continue;
            }
            _ => {}
        }

        let result = {
            let chat = session.send_message(line);
            tokio::pin!(chat);
            loop {
                select! {
                    result = &mut chat => break result,
                    Some(event) = event_rx.recv() => renderer.render(event),
                }
            }
        };
        // Events emitted right before the turn ended.
        while let Ok(event) = event_rx.try_recv() {
            renderer.render(event);
        }
        renderer.finish_turn();

        if let Err(err) = result {
            println!("{}{}\n", BAR_CHAR.bright_red(), format!("Error: {err}").red());
        }
    }

    println!("\nGoodbye!");
}

/// Prints agent events as they arrive.
struct Renderer {
    progress_style: ProgressStyle,
    progress_bar: Option<ProgressBar>,
    printed_label: bool,
}

impl Renderer {
    fn new() -> Self {
        let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
            .expect("the template is valid")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        Self {
            progress_style,
            progress_bar: None,
            printed_label: false,
        }
    }

    fn render(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::Thinking { status: true } => {
                let progress_bar = ProgressBar::new_spinner();
                progress_bar.set_style(self.progress_style.clone());
                progress_bar.set_message("🤔 Thinking...");
                progress_bar.enable_steady_tick(Duration::from_millis(100));
                self.progress_bar = Some(progress_bar);
            }
            AgentEvent::Thinking { status: false } => self.stop_spinner(),
            AgentEvent::Token { text } => {
                if !self.printed_label {
                    print!("{}🤖 ", BAR_CHAR.bright_cyan());
                    self.printed_label = true;
                }
                print!("{}", text.bright_white());
                std::io::stdout().flush().ok();
            }
            AgentEvent::ToolStart { name, .. } => {
                println!("\n{}", format!("[Tool: {name}]").bright_black());
            }
            AgentEvent::ToolEnd { error: Some(error), .. } => {
                println!("{}", format!("[Error: {error}]").red());
            }
            AgentEvent::ToolEnd { result, .. } => {
                println!(
                    "{}",
                    format!("[Result: {}]", preview(&result, PREVIEW_CHARS))
                        .bright_black()
                );
            }
            AgentEvent::ResponseEnd { .. } => {
                println!("\n");
                self.printed_label = false;
            }
        }
    }

    fn finish_turn(&mut self) {
        self.stop_spinner();
        if self.printed_label {
            println!();
            self.printed_label = false;
        }
    }

    fn stop_spinner(&mut self) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }
}

/// Cuts `text` down to `max_chars` characters, marking the cut with `...`.
fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_owned(),
    }
}

async fn read_line<R>(input: &mut Lines<R>) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    match input.next_line().await {
        Ok(line) => line,
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 100), "short");
        assert_eq!(preview(&"a".repeat(100), 100), "a".repeat(100));
        assert_eq!(preview(&"a".repeat(101), 100), format!("{}...", "a".repeat(100)));
        assert_eq!(preview("héllo", 2), "hé...");
    }

    #[tokio::test]
    async fn test_pasted_lines_are_read_one_by_one() {
        let mut input = BufReader::new(&b"first\nsecond\n"[..]).lines();
        assert_eq!(read_line(&mut input).await.as_deref(), Some("first"));
        assert_eq!(read_line(&mut input).await.as_deref(), Some("second"));
        assert_eq!(read_line(&mut input).await, None);
    }
}
