//! Echo server: greets each client and relays what it says to everyone.
//!
//! ```text
//! GAMELINK_ADDR=0.0.0.0:7777 RUST_LOG=debug cargo run --bin echo-server
//! ```

use std::pin::pin;
use std::time::Duration;

use echo::{ClientMessage, ServerMessage, addr_from_env};
use gamelink::prelude::*;

const TICK: Duration = Duration::from_millis(16);

struct EchoServer;

impl EchoServer {
    fn reply(server: &mut GameServer, packet: Packet) {
        if let Err(e) = server.send(packet) {
            tracing::warn!(error = %e, "reply failed");
        }
    }
}

impl EventHandler<GameServer> for EchoServer {
    fn on_connect(&mut self, server: &mut GameServer, event: Event) {
        let Some(id) = event.client_id else { return };
        let Some(name) = server.get_client(id).map(|c| c.name().to_string()) else {
            return;
        };
        let welcome = ServerMessage::Welcome {
            client_id: id.0,
            name,
        };
        match Packet::encode(&JsonCodec, &welcome) {
            Ok(packet) => Self::reply(server, packet.for_client(id)),
            Err(e) => tracing::warn!(error = %e, "encode failed"),
        }
    }

    fn on_disconnect(&mut self, server: &mut GameServer, event: Event) {
        let Some(name) = event
            .client_id
            .and_then(|id| server.get_client(id))
            .map(|c| c.name().to_string())
        else {
            return;
        };
        if server.connected_count() == 0 {
            return;
        }
        if let Ok(packet) = Packet::encode(&JsonCodec, &ServerMessage::Left { name }) {
            Self::reply(server, packet);
        }
    }

    fn on_receive(&mut self, server: &mut GameServer, event: Event) {
        let Some(id) = event.client_id else { return };
        let from = server
            .get_client(id)
            .map(|c| c.name().to_string())
            .unwrap_or_default();

        let message: ClientMessage = match event.into_packet().decode(&JsonCodec) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(client_id = %id, error = %e, "ignoring malformed message");
                return;
            }
        };
        let ClientMessage::Say(text) = message;
        tracing::info!(client_id = %id, %from, %text, "say");

        if let Ok(packet) = Packet::encode(&JsonCodec, &ServerMessage::Echo { from, text }) {
            Self::reply(server, packet);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), GamelinkError> {
    init_logging("info");

    let addr = addr_from_env();
    let mut server = ServerBuilder::new().bind(&addr).max_clients(16).build().await?;
    tracing::info!(%addr, "echo server running, ctrl-c to stop");

    let mut ctrl_c = pin!(tokio::signal::ctrl_c());
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            ticked = server.tick(TICK) => {
                ticked?;
            }
        }
        dispatch_events(&mut server, &mut EchoServer);
    }

    server.shutdown().await?;
    Ok(())
}
