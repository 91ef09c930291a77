//! lineshell - A Line-Oriented Remote Command Server
//!
//! This is the main entry point for the lineshell server.
//! It binds the listening socket, registers the stock commands, and ticks
//! the server until Ctrl+C.

use lineshell::commands::{EchoCommand, SleepCommand, UptimeCommand};
use lineshell::protocol::EOF_BYTE;
use lineshell::server::{Server, ServerConfig};
use lineshell::transport::{MemoryPeer, MemoryTransport};
use std::io::{BufRead, Write};
use std::time::Duration;
use tokio::signal;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Command-line configuration
#[derive(Default)]
struct Config {
    /// Server settings
    server: ServerConfig,
    /// Also serve the local terminal
    console: bool,
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    config.server.host = required_value(&args, i, "--host").to_string();
                    i += 2;
                }
                "--port" | "-p" => {
                    config.server.port = required_value(&args, i, "--port")
                        .parse()
                        .unwrap_or_else(|_| {
                            eprintln!("Error: invalid port number");
                            std::process::exit(1);
                        });
                    i += 2;
                }
                "--welcome" | "-w" => {
                    config.server.welcome = required_value(&args, i, "--welcome").to_string();
                    i += 2;
                }
                "--tick-ms" => {
                    let ms: u64 = required_value(&args, i, "--tick-ms")
                        .parse()
                        .unwrap_or_else(|_| {
                            eprintln!("Error: invalid tick interval");
                            std::process::exit(1);
                        });
                    config.server.tick_interval = Duration::from_millis(ms.max(1));
                    i += 2;
                }
                "--console" => {
                    config.console = true;
                    i += 1;
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("lineshell version {}", lineshell::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }
}

/// Returns the value following the flag at `i`, or exits.
fn required_value<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i + 1) {
        Some(value) => value,
        None => {
            eprintln!("Error: {} requires a value", flag);
            std::process::exit(1);
        }
    }
}

fn print_help() {
    println!(
        r#"
lineshell - A Line-Oriented Remote Command Server

USAGE:
    lineshell [OPTIONS]

OPTIONS:
    -h, --host <HOST>       Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>       Port to listen on (default: 2323)
    -w, --welcome <TEXT>    Banner shown to every new client
        --tick-ms <MS>      Pause between update ticks (default: 10)
        --console           Also accept commands from this terminal
    -v, --version           Print version information
        --help              Print this help message

EXAMPLES:
    lineshell                              # Start on 127.0.0.1:2323
    lineshell --port 2424                  # Start on port 2424
    lineshell --host 0.0.0.0 -w "node-7"   # Listen on all interfaces

CONNECTING:
    $ nc 127.0.0.1 2323
    You can type your commands, type 'help' for a list of commands
    ===========
    > uptime; echo hello
    Uptime: 0 days, 00:00:12
    hello
    >
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args();

    // Set up logging (stderr, so the console session stays readable)
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    // Bind the listener and register commands
    let mut server = Server::bind(&config.server)?;
    server.register_command("uptime", UptimeCommand::new());
    server.register_command("echo", EchoCommand);
    server.register_command_with_parameters("sleep", SleepCommand::parameters(), SleepCommand);
    info!(
        version = lineshell::VERSION,
        commands = server.commands().len(),
        "lineshell started"
    );

    let console = config.console.then(|| attach_console(&mut server));

    // Set up graceful shutdown
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    // Main update loop
    tokio::select! {
        _ = update_loop(server, config.server.tick_interval, console) => {}
        _ = shutdown => {}
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Ticks the server forever
async fn update_loop(mut server: Server, tick_interval: Duration, console: Option<MemoryPeer>) {
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        server.update();

        if let Some(console) = &console {
            forward_console_output(console);
        }
    }
}

/// Serves the local terminal through an in-memory transport.
///
/// A reader thread forwards stdin lines; end of input is sent as the EOF byte.
fn attach_console(server: &mut Server) -> MemoryPeer {
    let (transport, peer) = MemoryTransport::pair_named("console");
    server.add_custom_client(Box::new(transport));

    let input = peer.clone();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            input.send_str(&line);
            input.send(b"\n");
        }
        input.send(&[EOF_BYTE]);
    });

    forward_console_output(&peer);
    peer
}

fn forward_console_output(console: &MemoryPeer) {
    let output = console.take_output();
    if output.is_empty() {
        return;
    }

    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(&output);
    let _ = stdout.flush();
}
