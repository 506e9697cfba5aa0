use std::error::Error;
use std::io::IsTerminal;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use liquid_helper::capture::{
    CaptureSession, DEFAULT_ENDPOINT, HttpAskTransport, PointerButton, Tooltip, TooltipStatus,
    TooltipSurface, TriggerEvent, TriggerOutcome, Viewport, MIN_QUERY_CHARS,
};
use liquid_helper::completion::{DEFAULT_API_BASE, DEFAULT_MODEL};
use liquid_helper::config::{DEFAULT_PORT, DEFAULT_PROMPT_PATH};
use liquid_helper::{PromptTemplate, ServerConfig, web};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "liquid-helper",
    about = "Option+click lookups answered by a language model",
    version
)]
pub struct Cli {
    /// Emit JSON instead of human-readable output.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server that answers `POST /ask`.
    Serve(ServeArgs),
    /// Send text through the page client pipeline and print the tooltip result.
    Ask {
        /// Text to look up; joined with spaces.
        #[arg(required = true)]
        text: Vec<String>,
        /// Server endpoint.
        #[arg(long, env = "ASK_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
        endpoint: String,
    },
    /// Print the prompt document the server would send for some text.
    Prompt {
        #[arg(required = true)]
        text: Vec<String>,
        /// Prompt template file.
        #[arg(long, env = "PROMPT_PATH", default_value = DEFAULT_PROMPT_PATH)]
        prompt: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: IpAddr,
    /// Prompt template file containing `{{TEXT}}`.
    #[arg(long, env = "PROMPT_PATH", default_value = DEFAULT_PROMPT_PATH)]
    prompt: PathBuf,
    #[arg(long, env = "MODEL_NAME", default_value = DEFAULT_MODEL)]
    model: String,
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// OpenAI-compatible API base URL.
    #[arg(long, env = "GROQ_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,
    /// Do not mount `/openapi.json` and `/docs`.
    #[arg(long)]
    no_openapi: bool,
}

impl ServeArgs {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            addr: SocketAddr::new(self.host, self.port),
            prompt_path: self.prompt,
            model: self.model,
            api_key: self.api_key.filter(|key| !key.trim().is_empty()),
            api_base: self.api_base,
            enable_openapi: !self.no_openapi,
        }
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => handle_serve(args),
        Command::Ask { text, endpoint } => handle_ask(text.join(" "), endpoint, cli.json),
        Command::Prompt { text, prompt } => handle_prompt(text.join(" "), prompt, cli.json),
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn runtime() -> Result<tokio::runtime::Runtime, Box<dyn Error>> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

fn handle_serve(args: ServeArgs) -> Result<(), Box<dyn Error>> {
    init_tracing("info");
    let config = args.into_config();
    runtime()?.block_on(web::serve(config))?;
    Ok(())
}

fn handle_ask(text: String, endpoint: String, as_json: bool) -> Result<(), Box<dyn Error>> {
    init_tracing("warn");
    let session = CaptureSession::new(
        HttpAskTransport::new(endpoint),
        TerminalSurface {
            verbose: !as_json && std::io::stderr().is_terminal(),
        },
    );
    let click = TriggerEvent::new(0.0, 0.0, true, PointerButton::Primary);
    let viewport = Viewport::new(1280.0, 800.0);
    let outcome = runtime()?.block_on(session.trigger(&click, &text, viewport));
    if outcome == TriggerOutcome::TooShort {
        return Err(format!("text must be at least {MIN_QUERY_CHARS} characters").into());
    }

    let (status, answer) = session
        .with_controller(|ctl| ctl.tooltip().map(|t| (t.status, t.answer.clone())))
        .ok_or("no result was shown")?;
    if as_json {
        let payload = json!({ "status": status.label(), "answer": answer });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{answer}");
    }
    if status == TooltipStatus::Error {
        return Err(format!("lookup failed: {answer}").into());
    }
    Ok(())
}

fn handle_prompt(text: String, path: PathBuf, as_json: bool) -> Result<(), Box<dyn Error>> {
    let template = PromptTemplate::load(&path)?;
    let rendered = template.render(&text);
    if as_json {
        let payload = json!({ "template": path.display().to_string(), "prompt": rendered });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{rendered}");
    }
    Ok(())
}

/// Prints tooltip status transitions on stderr.
struct TerminalSurface {
    verbose: bool,
}

impl TooltipSurface for TerminalSurface {
    fn mount(&mut self, tooltip: &Tooltip) {
        if self.verbose {
            eprintln!("Status: {}", tooltip.status);
        }
    }

    fn update(&mut self, tooltip: &Tooltip) {
        if self.verbose {
            eprintln!("Status: {}", tooltip.status);
        }
    }

    fn unmount(&mut self) {}
}
