//! Echo client: says a few lines and prints what comes back.

use std::time::Duration;

use echo::{ClientMessage, ServerMessage, addr_from_env};
use gamelink::prelude::*;

const TICK: Duration = Duration::from_millis(16);
const LINES: usize = 5;

#[tokio::main]
async fn main() -> Result<(), GamelinkError> {
    init_logging("info");

    let addr = addr_from_env();
    let mut client = ClientBuilder::new().connect(&addr).await?;
    let mut said = 0;
    let mut echoed = 0;
    let mut last_said = tokio::time::Instant::now();

    while echoed < LINES {
        client.tick(TICK).await?;

        while let Some(event) = client.pop_event() {
            match event.kind {
                EventKind::Connect => tracing::info!(%addr, "connected"),
                EventKind::Disconnect => {
                    tracing::warn!("server closed the connection");
                    client.shutdown().await?;
                    return Ok(());
                }
                EventKind::Received => {
                    match event.into_packet().decode::<_, ServerMessage>(&JsonCodec)? {
                        ServerMessage::Welcome { client_id, name } => {
                            client.set_client_id(ClientId(client_id));
                            tracing::info!(client_id, %name, "welcomed");
                        }
                        ServerMessage::Echo { from, text } => {
                            tracing::info!(%from, %text, "echo");
                            echoed += 1;
                        }
                        ServerMessage::Left { name } => tracing::info!(%name, "left"),
                    }
                }
                EventKind::None => {}
            }
        }

        let ready = client.is_connected() && client.client_id().is_some();
        if ready && said < LINES && last_said.elapsed() >= Duration::from_secs(1) {
            said += 1;
            let line = ClientMessage::Say(format!("hello #{said}"));
            client.send(Packet::encode(&JsonCodec, &line)?)?;
            last_said = tokio::time::Instant::now();
        }
    }

    client.disconnect()?;
    client.tick(TICK).await?;
    client.shutdown().await?;
    Ok(())
}
