//! An interactive console for asking questions about U.S. public debt.

#[macro_use]
extern crate tracing;

use std::io::{self as std_io, Write as _};
use std::time::Duration;

use debt_chat::console::{Command, Prompt, next_prompt};
use debt_chat::core::{CancellationToken, Error, FALLBACK_RESPONSE};
use debt_chat::fiscal_data::FiscalDataClient;
use debt_chat::{Config, SessionBuilder};
use debt_chat_openai_model::OpenAIProvider;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::signal;

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std_io::stderr)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    debug!("starting with {config:?}");

    let mut session = SessionBuilder::with_model_provider(OpenAIProvider::new(
        config.openai,
    ))
    .with_fiscal_data_client(FiscalDataClient::with_base_url(
        &config.fiscal_data_base_url,
    ))
    .build();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    print_banner();
    let mut input = BufReader::new(io::stdin()).lines();

    loop {
        print!("{} ", ">".bright_green().bold());
        std_io::stdout().flush().ok();

        // At the prompt, Ctrl-C ends the session.
        let line = match next_prompt(&mut input, signal::ctrl_c()).await {
            Prompt::Line(line) => line,
            Prompt::Interrupted => {
                println!();
                break;
            }
            Prompt::Closed => break,
        };
        let message = match Command::parse(&line) {
            Command::Exit => break,
            Command::Empty => continue,
            Command::Reset => {
                session.reset();
                println!("{}", "Conversation cleared.".dimmed());
                continue;
            }
            Command::Message(message) => message,
        };

        // Ctrl-C abandons the answer in progress, not the whole session.
        let cancel = CancellationToken::new();
        let ctrl_c = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            }
        });

        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style.clone());
        progress_bar.set_message("🤔 Thinking...");
        progress_bar.enable_steady_tick(Duration::from_millis(100));

        let mut started = false;
        let result = session
            .send_message_streaming(message, &cancel, |chunk| {
                if !started {
                    progress_bar.finish_and_clear();
                    print!("{}🤖 ", BAR_CHAR.bright_cyan());
                    started = true;
                }
                print!("{}", chunk.bright_white());
                std_io::stdout().flush().ok();
            })
            .await;
        ctrl_c.abort();
        progress_bar.finish_and_clear();

        match result {
            Ok(_) if started => println!("\n"),
            Ok(_) => println!(
                "{}🤖 {}\n",
                BAR_CHAR.bright_cyan(),
                FALLBACK_RESPONSE.bright_white()
            ),
            Err(Error::Cancelled) => {
                if started {
                    println!();
                }
                println!("{}\n", "Cancelled.".dimmed());
            }
            Err(err) => {
                if started {
                    println!();
                }
                println!("{}{} {err}\n", BAR_CHAR.bright_red(), "Error:".bright_red());
            }
        }
    }
}

fn print_banner() {
    println!(
        "{}",
        "U.S. Public Debt Assistant".bright_cyan().bold()
    );
    println!(
        "{}",
        "Ask about the national debt. Type `reset` to start over, `exit` to quit."
            .dimmed()
    );
    println!();
}
