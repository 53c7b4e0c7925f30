pub mod config;
pub mod dispatch;
pub mod ir;
pub mod message;
pub mod mqtt;
pub mod scheduler;
pub mod update;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::{eyre::WrapErr, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::BridgeConfig;
use crate::dispatch::{CommandDispatcher, ProtocolRegistry};
use crate::ir::gpio::{GpioIrReceiver, PwmIrTransmitter};
use crate::message::MessageCodec;
use crate::mqtt::{ConnectivityManager, MqttBrokerLink};
use crate::scheduler::{Bridge, BridgeSettings};
use crate::update::UpdateMonitor;

#[derive(Parser, Debug)]
#[command(name = "irbridge", about = "MQTT to infrared remote-control bridge")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    setup()?;

    let args = Args::parse();
    let config = BridgeConfig::load(args.config.as_deref())
        .wrap_err("failed to load configuration")?;

    info!(
        "starting {} against {}:{}",
        config.mqtt.client_id, config.mqtt.host, config.mqtt.port
    );

    let transmitter =
        PwmIrTransmitter::new(config.ir.tx_pwm_channel, config.ir.carrier_hz, config.ir.duty_cycle)
            .wrap_err("failed to open the IR transmit channel")?;
    let receiver = GpioIrReceiver::new(
        config.ir.rx_pin,
        Duration::from_millis(config.ir.frame_gap_ms),
    )
    .wrap_err("failed to open the IR receive pin")?;

    let connectivity = ConnectivityManager::new(Box::new(MqttBrokerLink::new(config.mqtt.clone())));
    let dispatcher = CommandDispatcher::new(ProtocolRegistry::standard(), Box::new(transmitter));
    let codec = MessageCodec::new(config.runtime.max_payload_len);
    let updater = UpdateMonitor::new(config.marker_path());

    let settings = BridgeSettings {
        loop_interval: Duration::from_millis(config.runtime.loop_interval_ms),
        reconnect_interval: Duration::from_secs(config.runtime.reconnect_interval_secs),
        event_topic: config.mqtt.event_topic.clone(),
        error_policy: config.runtime.error_policy,
    };

    let bridge = Bridge::create(
        connectivity,
        dispatcher,
        codec,
        Box::new(receiver),
        Box::new(updater),
        settings,
    )
    .activate();

    // run() returns only when an update takes over; hold() never returns.
    bridge.run().await.hold().await;
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();
    Ok(())
}
