use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vnetwire::source::{self, FrameSource, PnetSource};
use vnetwire::utils::Clock;
use vnetwire::{
    Config, EndpointId, FrameBuilder, LoopbackHost, Tap, Transport, VirtualWire, CAPTURE_ENTRY,
    STATS_ENTRY,
};

#[derive(Parser)]
#[command(name = "vnetwire")]
#[command(about = "Virtual interface pair with packet capture")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send synthetic frames across the wire and print both reports
    Simulate {
        /// Number of frames to send
        #[arg(short, long, default_value_t = 10)]
        frames: usize,
        /// Transport protocol of the frames
        #[arg(short, long, value_enum, default_value_t = ProtocolArg::Tcp)]
        protocol: ProtocolArg,
        /// Frame size in bytes, Ethernet header included
        #[arg(short, long, default_value_t = 64)]
        size: usize,
        /// Alternate frames between both endpoints
        #[arg(short, long)]
        both: bool,
    },
    /// Mirror a host interface's traffic onto the first endpoint
    Mirror {
        /// Host interface to read from (e.g., eth0)
        #[arg(short, long)]
        interface: Option<String>,
        /// Stop after this many frames
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// List host network interfaces
    Interfaces,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProtocolArg {
    Tcp,
    Udp,
    Icmp,
}

impl From<ProtocolArg> for Transport {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Tcp => Transport::Tcp,
            ProtocolArg::Udp => Transport::Udp,
            ProtocolArg::Icmp => Transport::Icmp,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Simulate {
            frames,
            protocol,
            size,
            both,
        } => simulate(&config, frames, protocol.into(), size, both),
        Commands::Mirror { interface, limit } => mirror(&config, interface, limit),
        Commands::Interfaces => {
            for line in PnetSource::list_interfaces() {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

/// Host, wire and tap wired together and opened.
struct Rig {
    host: Arc<LoopbackHost>,
    wire: Arc<VirtualWire>,
    tap: Tap,
}

impl Rig {
    fn start(config: &Config) -> Result<Self> {
        let clock = Clock::new();
        let host = Arc::new(LoopbackHost::new());
        let wire = VirtualWire::builder(config)
            .with_clock(clock)
            .setup(host.as_ref(), host.clone())
            .context("Failed to set up the interface pair")?;

        let tap = match Tap::install(config, clock, host.as_ref()) {
            Ok(tap) => tap,
            Err(e) => {
                wire.teardown(host.as_ref());
                return Err(e).context("Failed to install the capture tap");
            }
        };

        for id in EndpointId::ALL {
            wire.open(id);
        }

        Ok(Self { host, wire, tap })
    }

    fn print_reports(&self) {
        for entry in [CAPTURE_ENTRY, STATS_ENTRY] {
            if let Some(text) = self.host.read_status(entry) {
                print!("{}", text);
            }
            println!();
        }
    }

    fn stop(self) {
        let Rig { host, wire, tap } = self;
        tap.uninstall(host.as_ref());
        let drained = wire.teardown(host.as_ref());
        println!(
            "Released {} captured frames ({} bytes)",
            drained.records, drained.bytes
        );
    }
}

fn simulate(
    config: &Config,
    frames: usize,
    transport: Transport,
    size: usize,
    both: bool,
) -> Result<()> {
    let rig = Rig::start(config)?;
    let builder = FrameBuilder::new();

    let a = rig.wire.endpoint(EndpointId::A).name().to_string();
    let b = rig.wire.endpoint(EndpointId::B).name().to_string();

    for i in 0..frames {
        let dev = if both && i % 2 == 1 { &b } else { &a };
        if let Err(e) = rig.host.transmit(&rig.wire, dev, builder.build(transport, size)) {
            tracing::warn!("Frame {} on {} not sent: {}", i, dev, e);
        }
    }
    info!("Sent {} frames", frames);

    rig.print_reports();
    rig.stop();
    Ok(())
}

fn mirror(config: &Config, interface: Option<String>, limit: Option<usize>) -> Result<()> {
    let mut capture = match interface {
        Some(name) => PnetSource::new(&name),
        None => PnetSource::on_default_interface(),
    }
    .context("Failed to open capture interface")?;

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;
    capture.set_running(running);

    let rig = Rig::start(config)?;
    let dev = rig.wire.endpoint(EndpointId::A).name().to_string();
    info!(
        "Mirroring {} onto {}. Press Ctrl+C to stop.",
        capture.interface_name(),
        dev
    );

    let summary = match source::pump(&mut capture, &rig.host, &rig.wire, &dev, limit) {
        Ok(summary) => summary,
        Err(e) => {
            rig.stop();
            return Err(e).context("Failed to read frames");
        }
    };
    info!(
        "Read {} frames, forwarded {}, dropped {}",
        summary.read, summary.forwarded, summary.dropped
    );

    rig.print_reports();
    rig.stop();
    Ok(())
}
