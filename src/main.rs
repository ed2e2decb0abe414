//! MindSpace CLI
//!
//! Usage:
//!   mindspace                              # Interactive chat
//!   mindspace --text "your message"        # Single message
//!   mindspace --text "message" --json      # JSON output
//!   mindspace --serve                      # HTTP API server

use clap::Parser;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use mindspace::config::GatewayConfig;
use mindspace::core::{
    build_crisis_card, run_server, ChatGateway, ChatSession, ExchangeTicket, GeminiGateway, Submission,
    TranscriptRenderer, TypingEffect,
};
use mindspace::error::{ChatError, GatewayError};
use mindspace::types::Exchange;
use mindspace::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE, REQUEST_TIMEOUT_SECS, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "mindspace",
    version = VERSION,
    about = "MindSpace - a peer-support chat for PolyU students",
    long_about = "MindSpace forwards your messages to a hosted language model acting as a\n\
                  warm peer counselor, and watches for crisis language along the way.\n\n\
                  Commands in interactive mode:\n  \
                  /reset           Start over\n  \
                  /export [path]   Save the transcript as text\n  \
                  /mood            Show the mood trend\n  \
                  /history         Redraw the conversation\n  \
                  /retry           Re-send a message that failed\n  \
                  /quit            Leave"
)]
struct Args {
    /// Message to send (single mode)
    #[arg(short, long)]
    text: Option<String>,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Output as JSON (single mode)
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Show replies at once instead of typing them out
    #[arg(long)]
    no_typing: bool,

    /// Do not ask the model for a mood score
    #[arg(long)]
    no_score: bool,

    /// API key for the Generative Language API
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Outbound forward proxy
    #[arg(long, env = "PROXY_URL")]
    proxy: Option<String>,

    /// Model id
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// API base url
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Sampling temperature
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f32,

    /// Request timeout in seconds
    #[arg(long, default_value_t = REQUEST_TIMEOUT_SECS)]
    timeout: u64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.serve);

    if args.no_color {
        colored::control::set_override(false);
    }

    let gateway = match build_gateway(&args) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("{} {}", "Startup failed:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let scoring = !args.no_score;

    let result = if args.serve {
        run_serve(&args, gateway, scoring).await;
        Ok(())
    } else if let Some(ref text) = args.text {
        run_single(text, &args, gateway.as_ref(), scoring).await
    } else {
        run_interactive(&args, gateway.as_ref(), scoring).await
    };

    if let Err(e) = result {
        eprintln!("I/O error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so the chat on stdout stays clean
fn init_tracing(serving: bool) {
    let default = if serving { "mindspace=info" } else { "mindspace=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .init();
}

fn build_gateway(args: &Args) -> Result<Arc<dyn ChatGateway>, ChatError> {
    let config = GatewayConfig::new(args.api_key.clone())?
        .with_base_url(&args.base_url)
        .with_model(&args.model)
        .with_temperature(args.temperature)
        .with_timeout(Duration::from_secs(args.timeout))
        .with_proxy(args.proxy.clone())
        .with_scoring(!args.no_score);
    tracing::debug!(?config, "gateway configured");
    Ok(Arc::new(GeminiGateway::new(config)?))
}

fn renderer(args: &Args) -> TranscriptRenderer {
    let typing = if args.no_typing || args.json {
        TypingEffect::instant()
    } else {
        TypingEffect::default()
    };
    TranscriptRenderer::new(!args.no_color, typing)
}

/// Send one message and print the outcome
async fn run_single(text: &str, args: &Args, gateway: &dyn ChatGateway, scoring: bool) -> io::Result<()> {
    let mut session = ChatSession::new(scoring);
    let render = renderer(args);
    let mut stdout = io::stdout();

    match mindspace::core::run_exchange(&mut session, gateway, text).await {
        Ok(exchange) if args.json => {
            let json = serde_json::to_string_pretty(&exchange).map_err(io::Error::other)?;
            println!("{}", json);
        }
        Ok(exchange) => print_exchange(&exchange, &render, args.no_color, &mut stdout)?,
        Err(e) => {
            print_error(&e, args.no_color);
            std::process::exit(2);
        }
    }
    Ok(())
}

/// Run interactive chat
async fn run_interactive(args: &Args, gateway: &dyn ChatGateway, scoring: bool) -> io::Result<()> {
    let mut session = ChatSession::new(scoring);
    let render = renderer(args);

    print_header(args.no_color);
    println!("Type a message and press Enter. /help lists commands, /quit leaves.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    render.render_history(session.turns(), &mut stdout)?;

    loop {
        print!("{} ", ">".bold());
        stdout.flush()?;

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") || line == "/quit" {
            println!("\nTake care. Messages this session: {}", session.turns().len());
            break;
        }

        if let Some(command) = line.strip_prefix('/') {
            handle_command(command, &mut session, gateway, &render, args.no_color, &mut stdout).await?;
            continue;
        }

        match session.submit(line) {
            Ok(Submission::Crisis(exchange)) => print_exchange(&exchange, &render, args.no_color, &mut stdout)?,
            Ok(Submission::AwaitingReply(ticket)) => {
                await_reply(&mut session, ticket, gateway, &render, args.no_color, &mut stdout).await?;
            }
            Err(e) => print_error(&ChatError::from(e), args.no_color),
        }
    }

    Ok(())
}

/// Call the model for the pending exchange and show the result
async fn await_reply(
    session: &mut ChatSession,
    ticket: ExchangeTicket,
    gateway: &dyn ChatGateway,
    render: &TranscriptRenderer,
    no_color: bool,
    stdout: &mut io::Stdout,
) -> io::Result<()> {
    render.thinking(stdout)?;
    let result = gateway.reply(session.turns()).await;
    render.clear_thinking(stdout)?;

    match session.complete(ticket, result) {
        Ok(exchange) => print_exchange(&exchange, render, no_color, stdout),
        Err(e) => {
            print_error(&e, no_color);
            println!("Your message is kept. Type /retry to send it again.");
            Ok(())
        }
    }
}

async fn handle_command(
    command: &str,
    session: &mut ChatSession,
    gateway: &dyn ChatGateway,
    render: &TranscriptRenderer,
    no_color: bool,
    stdout: &mut io::Stdout,
) -> io::Result<()> {
    let mut parts = command.splitn(2, ' ');
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|s| !s.is_empty());

    match name {
        "reset" => {
            session.reset();
            println!("Chat cleared.\n");
            render.render_history(session.turns(), stdout)?;
        }
        "history" => render.render_history(session.turns(), stdout)?,
        "export" => {
            let path = arg.map(PathBuf::from).unwrap_or_else(|| {
                PathBuf::from(format!(
                    "mindspace_transcript_{}.txt",
                    chrono::Utc::now().format("%Y%m%d_%H%M%S")
                ))
            });
            match std::fs::write(&path, session.export()) {
                Ok(()) => println!("Transcript saved to {}", path.display()),
                Err(e) => println!("Could not save transcript: {}", e),
            }
        }
        "mood" => print_mood(session, no_color),
        "retry" => match session.retry() {
            Ok(ticket) => await_reply(session, ticket, gateway, render, no_color, stdout).await?,
            Err(e) => print_error(&ChatError::from(e), no_color),
        },
        "help" => {
            println!("/reset  /export [path]  /mood  /history  /retry  /quit");
        }
        other => println!("Unknown command /{}. Try /help.", other),
    }
    Ok(())
}

fn print_exchange(
    exchange: &Exchange,
    render: &TranscriptRenderer,
    no_color: bool,
    stdout: &mut io::Stdout,
) -> io::Result<()> {
    let card = build_crisis_card().to_terminal_string(!no_color);

    if exchange.crisis {
        println!("{}\n", card);
        return Ok(());
    }

    if let Some(reply) = &exchange.reply {
        render.stream_reply(reply, stdout)?;
    }
    let status = if no_color {
        exchange.to_parseable_string()
    } else {
        exchange.to_terminal_string()
    };
    if let Some(line) = status {
        println!("{}\n", line);
    }
    if exchange.escalated {
        println!("{}\n", card);
    }
    Ok(())
}

fn print_mood(session: &ChatSession, no_color: bool) {
    let mood = session.mood();
    if !session.scoring() {
        println!("Mood tracking is off (--no-score).");
        return;
    }
    let band = mood.band();
    let line = format!(
        "{} {} ({:+.2})  trend: {}",
        band.emoji(),
        band,
        mood.current(),
        mood.sparkline()
    );
    if no_color {
        println!("{}", line);
    } else {
        println!("{}", line.color(band.color()));
    }
}

/// Report failures verbatim; nothing is retried automatically
fn print_error(err: &ChatError, no_color: bool) {
    let headline = match err {
        ChatError::Gateway(GatewayError::RemoteRejected { status, .. }) => {
            format!("The model service rejected the request (Status {})", status)
        }
        ChatError::Gateway(GatewayError::EmptyContent { .. }) => {
            "The model returned no content, possibly blocked by its safety filter.".to_string()
        }
        ChatError::Gateway(GatewayError::Transport { message }) => format!("Network connection failed: {}", message),
        other => other.to_string(),
    };

    if no_color {
        println!("! {}", headline);
    } else {
        println!("{} {}", "!".red().bold(), headline.red());
    }

    if let ChatError::Gateway(GatewayError::RemoteRejected { body, .. } | GatewayError::EmptyContent { body }) = err {
        println!("{}", body);
    }
    println!();
}

/// Print header
fn print_header(no_color: bool) {
    let title = format!("MindSpace v{}", VERSION);
    if no_color {
        println!("========================================");
        println!("  {}", title);
        println!("========================================");
    } else {
        println!("{}", "╔════════════════════════════════════════╗".bold());
        println!("{}", format!("║  🧠 {:<35}║", title).bold());
        println!("{}", "╚════════════════════════════════════════╝".bold());
    }
    println!();
}

/// Run HTTP API server
async fn run_serve(args: &Args, gateway: Arc<dyn ChatGateway>, scoring: bool) {
    println!();
    println!("MindSpace API Server v{}", VERSION);
    println!("  POST /session/new          - Create session");
    println!("  GET  /session/:id          - Transcript and mood");
    println!("  POST /session/:id/message  - Send a message");
    println!("  POST /session/:id/retry    - Re-send failed message");
    println!("  POST /session/:id/reset    - Start over");
    println!("  GET  /session/:id/export   - Text transcript");
    println!("  WS   /ws/:id               - Live updates");
    println!("  GET  /health               - Health check");
    println!();

    if let Err(e) = run_server(&args.addr, gateway, scoring).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
