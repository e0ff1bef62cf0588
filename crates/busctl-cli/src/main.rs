//! `busctl-codec` CLI: marshal, unmarshal and invoke busctl from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Encode JSON into busctl argument text
//! echo '{"id": "eth0"}' | busctl-codec encode --signature 'a{sv}'
//!
//! # Decode a busctl reply into pretty-printed JSON
//! busctl get-property org.freedesktop.hostname1 /org/freedesktop/hostname1 \
//!     org.freedesktop.hostname1 Hostname | busctl-codec decode
//!
//! # Call a method and print the decoded reply
//! busctl-codec call org.freedesktop.DBus /org/freedesktop/DBus org.freedesktop.DBus ListNames
//!
//! # Read a property with sudo and a timeout
//! busctl-codec --sudo --option timeout=5 get-property \
//!     org.freedesktop.NetworkManager /org/freedesktop/NetworkManager \
//!     org.freedesktop.NetworkManager Devices
//! ```

use anyhow::{Context, Result};
use busctl_core::client::{CallOptions, Dbus};
use busctl_core::{DataObject, Value};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read};
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "busctl-codec",
    version,
    about = "Typed D-Bus values for busctl: encode, decode and invoke"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// busctl binary to run
    #[arg(long, global = true, env = "BUSCTL_PATH", default_value = "busctl")]
    busctl: String,

    /// Run busctl through sudo
    #[arg(long, global = true, env = "BUSCTL_SUDO")]
    sudo: bool,

    /// busctl option as NAME or NAME=VALUE (repeatable), e.g. --option timeout=5
    #[arg(long = "option", global = true, value_name = "NAME[=VALUE]")]
    options: Vec<String>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG overrides it
    #[arg(long, global = true, env = "BUSCTL_CODEC_LOG", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a JSON value into busctl argument text
    Encode {
        /// Type signature of the value, e.g. "a{sv}" or "ss"
        #[arg(short, long)]
        signature: String,
        /// Input JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Decode busctl output into JSON
    Decode {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Invoke a method and print the decoded reply
    Call {
        #[command(flatten)]
        target: Target,
        /// Method name
        method: String,
        #[command(flatten)]
        payload: PayloadArgs,
    },
    /// Emit a signal
    Emit {
        #[command(flatten)]
        target: Target,
        /// Signal name
        signal: String,
        #[command(flatten)]
        payload: PayloadArgs,
    },
    /// Read a property and print its decoded value
    GetProperty {
        #[command(flatten)]
        target: Target,
        /// Property name
        name: String,
    },
    /// Write a property
    SetProperty {
        #[command(flatten)]
        target: Target,
        /// Property name
        name: String,
        #[command(flatten)]
        payload: PayloadArgs,
    },
}

#[derive(Args)]
struct Target {
    /// D-Bus service name
    service: String,
    /// Object path
    object_path: String,
    /// Interface name
    interface: String,
}

#[derive(Args)]
struct PayloadArgs {
    /// Type signature of the arguments
    #[arg(long, requires = "args")]
    signature: Option<String>,
    /// Arguments as JSON (an array when the signature has several types)
    #[arg(long, requires = "signature")]
    args: Option<String>,
}

impl PayloadArgs {
    fn build(&self) -> Result<Vec<DataObject>> {
        match (&self.signature, &self.args) {
            (Some(signature), Some(args)) => {
                let json: serde_json::Value =
                    serde_json::from_str(args).context("Failed to parse --args as JSON")?;
                busctl_core::from_json_args(signature, &json)
                    .with_context(|| format!("Failed to build arguments for '{signature}'"))
            }
            _ => Ok(Vec::new()),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let call_options = CallOptions {
        use_sudo: cli.sudo,
        options: cli.options.iter().map(|raw| parse_option(raw)).collect(),
    };
    let dbus = |service: &str| Dbus::new(service).with_program(cli.busctl.as_str());

    match &cli.command {
        Commands::Encode {
            signature,
            input,
            output,
        } => {
            let raw = read_input(input.as_deref())?;
            let json: serde_json::Value =
                serde_json::from_str(&raw).context("Failed to parse input as JSON")?;
            let objects = busctl_core::from_json_args(signature, &json)
                .with_context(|| format!("Failed to encode JSON as '{signature}'"))?;
            let text = busctl_core::marshal(&objects)
                .context("Failed to marshal value")?
                .unwrap_or_default();
            write_output(output.as_deref(), &text)?;
        }
        Commands::Decode { input, output } => {
            let raw = read_input(input.as_deref())?;
            let value = busctl_core::unmarshal_response(raw.trim())
                .context("Failed to decode busctl output")?;
            write_output(output.as_deref(), &to_pretty_json(&value)?)?;
        }
        Commands::Call {
            target,
            method,
            payload,
        } => {
            let args = payload.build()?;
            debug!(service = %target.service, %method, args = args.len(), "calling method");
            let value = dbus(&target.service)
                .call(
                    &target.object_path,
                    &target.interface,
                    method,
                    optional(&args),
                    &call_options,
                )
                .with_context(|| format!("Failed to call {}.{}", target.interface, method))?;
            println!("{}", to_pretty_json(&value)?);
        }
        Commands::Emit {
            target,
            signal,
            payload,
        } => {
            let args = payload.build()?;
            dbus(&target.service)
                .emit(
                    &target.object_path,
                    &target.interface,
                    signal,
                    optional(&args),
                    &call_options,
                )
                .with_context(|| format!("Failed to emit {}.{}", target.interface, signal))?;
        }
        Commands::GetProperty { target, name } => {
            let value = dbus(&target.service)
                .get_property(&target.object_path, &target.interface, name, &call_options)
                .with_context(|| format!("Failed to read property {}.{}", target.interface, name))?;
            println!("{}", to_pretty_json(&value)?);
        }
        Commands::SetProperty {
            target,
            name,
            payload,
        } => {
            let args = payload.build()?;
            if args.is_empty() {
                anyhow::bail!("set-property requires --signature and --args");
            }
            dbus(&target.service)
                .set_property(
                    &target.object_path,
                    &target.interface,
                    name,
                    optional(&args),
                    &call_options,
                )
                .with_context(|| format!("Failed to set property {}.{}", target.interface, name))?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays clean for piping.
fn init_logging(level: &str) {
    let default_level = level.parse().unwrap_or(LevelFilter::WARN);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// `timeout=5` → `("timeout", Some("5"))`, `verbose` → `("verbose", None)`.
fn parse_option(raw: &str) -> (String, Option<String>) {
    match raw.split_once('=') {
        Some((name, value)) => (name.to_string(), Some(value.to_string())),
        None => (raw.to_string(), None),
    }
}

/// No arguments means no marshalled attribute at all.
fn optional(args: &[DataObject]) -> busctl_core::Payload<'_> {
    if args.is_empty() {
        busctl_core::Payload::Nothing
    } else {
        busctl_core::Payload::Sequence(args)
    }
}

fn to_pretty_json(value: &Value) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize decoded value")
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
