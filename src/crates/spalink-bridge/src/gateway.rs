//! TCP connection to the RS-485 gateway.
//!
//! The engine is synchronous and single-threaded by design, so the bridge
//! keeps it inside one task and moves bytes around it:
//!
//! - inbound: the TCP read half feeds the engine byte by byte;
//! - outbound: the engine's [`Transport`] pushes reply frames onto an
//!   unbounded channel drained by a writer task, so a transmit never
//!   blocks a bus turn on socket backpressure;
//! - a ticker fires the engine's re-arm at the configured interval.
//!
//! A dropped connection is retried forever with a fixed backoff; the
//! engine instance (address, decoded state, intents) survives reconnects.

use std::time::Duration;

use spalink_core::engine::events::EventSink;
use spalink_core::engine::{SpaEngine, TransmitError, Transport};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Outbound half handed to the engine: replies go onto a channel that the
/// writer task owns.
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl Transport for ChannelTransport {
    fn transmit(&mut self, frame: &[u8]) -> Result<(), TransmitError> {
        self.tx
            .send(frame.to_vec())
            .map_err(|_| TransmitError("writer task gone".to_string()))
    }
}

/// Event sink that prints `<topic> <value>` lines to stdout.
pub struct StdoutSink;

impl EventSink for StdoutSink {
    fn emit(&mut self, topic: &str, value: &str) {
        println!("{topic} {value}");
    }
}

/// Runs the bridge loop until shutdown is requested.
pub async fn run(
    addr: String,
    reconnect: Duration,
    tick: Duration,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let (tx, mut outbound) = mpsc::unbounded_channel::<Vec<u8>>();
    let mut engine = SpaEngine::new(ChannelTransport { tx }, StdoutSink);
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        if *shutdown.borrow() {
            break;
        }
        let stream = tokio::select! {
            result = TcpStream::connect(addr.as_str()) => result,
            _ = shutdown.changed() => break,
        };
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!(%addr, error = %e, "gateway connect failed, retrying");
                tokio::select! {
                    _ = tokio::time::sleep(reconnect) => continue,
                    _ = shutdown.changed() => break,
                }
            }
        };
        info!(%addr, "connected to gateway");
        let (mut read_half, mut write_half) = stream.into_split();

        let mut buf = [0u8; 256];
        let disconnected = loop {
            tokio::select! {
                read = read_half.read(&mut buf) => match read {
                    Ok(0) => break true,
                    Ok(n) => {
                        for &byte in &buf[..n] {
                            if let Err(e) = engine.feed(byte) {
                                // The master re-polls; nothing to retry here.
                                warn!(error = %e, "reply not transmitted");
                            }
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "gateway read failed");
                        break true;
                    }
                },
                frame = outbound.recv() => match frame {
                    Some(frame) => {
                        if let Err(e) = write_half.write_all(&frame).await {
                            warn!(error = %e, "gateway write failed");
                            break true;
                        }
                        if let Err(e) = write_half.flush().await {
                            warn!(error = %e, "gateway flush failed");
                            break true;
                        }
                    }
                    None => break false,
                },
                _ = ticker.tick() => engine.on_tick(),
                _ = shutdown.changed() => break false,
            }
        };

        if !disconnected {
            break;
        }
        warn!("gateway connection lost, reconnecting");
        tokio::select! {
            _ = tokio::time::sleep(reconnect) => {}
            _ = shutdown.changed() => break,
        }
    }

    info!(
        frames_with_errors = engine.frames_with_errors(),
        "bridge stopped"
    );
    Ok(())
}
