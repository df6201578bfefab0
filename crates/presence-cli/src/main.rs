//! Command-line interface for the presence sensor capability bridge.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use presence_devices::config::{self, zigbee};
use presence_devices::{
    AttributeId, AttributeReport, CapabilityBridge, CapabilityState, CapabilityValue, ClusterId,
    DescriptorTable, DeviceSnapshot, MemoryTransport, WireValue,
};
use serde_json::json;

/// Presence sensor capability bridge - inspect and drive FP300 attributes.
#[derive(Parser, Debug)]
#[command(name = "presence")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Descriptor table JSON (defaults to $PRESENCE_DESCRIPTOR_TABLE, then the built-in FP300 table).
    #[arg(short, long, global = true)]
    table: Option<PathBuf>,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// List the capabilities of the descriptor table.
    Descriptors {
        /// Print the whole table as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Decode an attribute report into a capability patch.
    Decode {
        /// Cluster the attributes were reported on.
        #[arg(short, long, value_parser = parse_u16, default_value = "0xFCC0")]
        cluster: ClusterId,
        /// Reported attributes as ATTRIBUTE=VALUE, e.g. 0x010C=2 or 0x019A=hex:00030f0000.
        #[arg(required = true)]
        attributes: Vec<String>,
    },
    /// Encode a capability value without touching a device.
    Encode {
        /// Capability name.
        name: String,
        /// Value as JSON, or a bare label.
        value: String,
        /// Capability state JSON providing prior context.
        #[arg(short, long)]
        state: Option<PathBuf>,
    },
    /// Write a capability to a simulated device.
    Set {
        /// Capability name.
        name: String,
        /// Value as JSON, or a bare label.
        value: String,
        /// Device snapshot JSON, updated in place.
        #[arg(short, long)]
        device: PathBuf,
        /// Capability state JSON, updated in place.
        #[arg(short, long)]
        state: Option<PathBuf>,
    },
    /// Read a capability from a simulated device.
    Refresh {
        /// Capability name.
        name: String,
        /// Device snapshot JSON.
        #[arg(short, long)]
        device: PathBuf,
        /// Capability state JSON, updated in place.
        #[arg(short, long)]
        state: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let table = config::load_descriptor_table(args.table.as_deref())
        .context("Failed to load descriptor table")?;
    tracing::debug!(
        "Using descriptor table {} ({}) with {} capabilities",
        table.model,
        table.revision,
        table.len()
    );

    match args.command {
        Command::Descriptors { json } => list_descriptors(&table, json),
        Command::Decode {
            cluster,
            attributes,
        } => decode_report(table, cluster, &attributes),
        Command::Encode { name, value, state } => encode_value(&table, &name, &value, state),
        Command::Set {
            name,
            value,
            device,
            state,
        } => set_capability(table, &name, &value, &device, state).await,
        Command::Refresh {
            name,
            device,
            state,
        } => refresh_capability(table, &name, &device, state).await,
    }
}

/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("presence=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config::log_filter()))
    };

    if config::log_json() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

fn list_descriptors(table: &DescriptorTable, json: bool) -> Result<()> {
    if json {
        println!("{}", table.to_json_pretty()?);
        return Ok(());
    }

    println!("{} ({})", table.model, table.revision);
    for descriptor in &table.descriptors {
        println!(
            "  {:<44} {}  {:<9} {:<10} {}",
            descriptor.name,
            descriptor.address(),
            descriptor.wire_type,
            format!("{:?}", descriptor.access).to_lowercase(),
            descriptor.codec.name()
        );
    }
    Ok(())
}

fn decode_report(table: DescriptorTable, cluster: ClusterId, attributes: &[String]) -> Result<()> {
    let mut report = AttributeReport::new(cluster);
    for entry in attributes {
        let (attribute, value) = parse_attribute(entry)?;
        report = report.with_attribute(attribute, value);
    }

    let bridge = CapabilityBridge::new(Arc::new(table), MemoryTransport::new());
    let patch = bridge.handle_report(&report);
    println!("{}", serde_json::to_string_pretty(&patch)?);
    Ok(())
}

fn encode_value(
    table: &DescriptorTable,
    name: &str,
    value: &str,
    state: Option<PathBuf>,
) -> Result<()> {
    let descriptor = table
        .get(name)
        .with_context(|| format!("Unknown capability: {}", name))?;
    if !descriptor.access.writable() {
        anyhow::bail!("Capability is read-only: {}", name);
    }

    let state = load_state(state.as_deref())?;
    let encoded = table.encode_value(descriptor, &parse_value(value), &state)?;
    let output = json!({
        "address": descriptor.address().to_string(),
        "wire": encoded.wire,
        "patch": encoded.patch,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn set_capability(
    table: DescriptorTable,
    name: &str,
    value: &str,
    device: &Path,
    state_path: Option<PathBuf>,
) -> Result<()> {
    let mut state = load_state(state_path.as_deref())?;
    let bridge = CapabilityBridge::new(Arc::new(table), load_device(device)?);

    let patch = bridge
        .write_capability(name, &parse_value(value), &state)
        .await?;

    save_json(device, &bridge.transport().snapshot().await)?;
    println!("{}", serde_json::to_string_pretty(&patch)?);
    if let Some(path) = state_path {
        state.apply(patch);
        save_json(&path, &state)?;
    }
    Ok(())
}

async fn refresh_capability(
    table: DescriptorTable,
    name: &str,
    device: &Path,
    state_path: Option<PathBuf>,
) -> Result<()> {
    let bridge = CapabilityBridge::new(Arc::new(table), load_device(device)?);
    let patch = bridge.refresh_capability(name).await?;

    println!("{}", serde_json::to_string_pretty(&patch)?);
    if let Some(path) = state_path {
        let mut state = load_state(Some(&path))?;
        state.apply(patch);
        save_json(&path, &state)?;
    }
    Ok(())
}

/// JSON input first; anything that is not valid JSON is taken as a label.
fn parse_value(input: &str) -> CapabilityValue {
    serde_json::from_str(input).unwrap_or_else(|_| CapabilityValue::Text(input.to_string()))
}

fn parse_u16(input: &str) -> Result<u16> {
    let parsed = match input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.with_context(|| format!("Invalid 16-bit identifier: {}", input))
}

fn parse_wire_value(input: &str) -> Result<WireValue> {
    if let Some(hex) = input.strip_prefix("hex:") {
        let bytes = hex::decode(hex).with_context(|| format!("Invalid hex buffer: {}", hex))?;
        return Ok(WireValue::Bytes(bytes));
    }
    let raw = match input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => input.parse(),
    };
    raw.map(WireValue::Integer)
        .with_context(|| format!("Invalid wire value: {}", input))
}

fn parse_attribute(entry: &str) -> Result<(AttributeId, WireValue)> {
    let (attribute, value) = entry
        .split_once('=')
        .with_context(|| format!("Expected ATTRIBUTE=VALUE, got {}", entry))?;
    Ok((parse_u16(attribute)?, parse_wire_value(value)?))
}

fn load_state(path: Option<&Path>) -> Result<CapabilityState> {
    match path {
        Some(path) if path.exists() => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read state {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("Invalid state file {}", path.display()))
        }
        _ => Ok(CapabilityState::new()),
    }
}

fn load_device(path: &Path) -> Result<MemoryTransport> {
    if !path.exists() {
        tracing::info!(
            "Device snapshot {} not found, starting empty {} device",
            path.display(),
            zigbee::FP300_MODEL
        );
        return Ok(MemoryTransport::new());
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read device snapshot {}", path.display()))?;
    let snapshot: DeviceSnapshot = serde_json::from_str(&json)
        .with_context(|| format!("Invalid device snapshot {}", path.display()))?;
    Ok(MemoryTransport::from_snapshot(snapshot))
}

fn save_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
