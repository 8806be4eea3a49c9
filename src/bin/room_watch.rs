use std::error::Error;

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use huddle::signaling::{ClientMessage, ServerMessage};

/// Join a room as a passive member and print every membership frame.
#[derive(Parser, Debug)]
#[command(name = "room_watch", version)]
struct Args {
    /// Relay WebSocket url
    #[arg(long, default_value = "ws://127.0.0.1:9001", env = "SIGNALING_URL")]
    url: String,

    /// Room to watch
    #[arg(default_value = "demo")]
    room: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let (ws_stream, _) = tokio_tungstenite::connect_async(args.url.as_str()).await?;
    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    println!("Connected to {}", args.url);

    let join = ClientMessage::Join {
        room_id: args.room.clone(),
    };
    ws_tx
        .send(Message::Text(serde_json::to_string(&join)?.into()))
        .await?;

    while let Some(frame) = ws_rx.next().await {
        let text = match frame? {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        match serde_json::from_str::<ServerMessage>(&text) {
            Ok(ServerMessage::Welcome { id }) => println!("> you are {}", id),
            Ok(ServerMessage::RoomInfo {
                room_id,
                peers,
                max_participants,
            }) => {
                println!(
                    "> joined {} ({}/{})",
                    room_id,
                    peers.len() + 1,
                    max_participants
                );
                for peer in peers {
                    println!("  - {}", peer);
                }
            }
            Ok(ServerMessage::RoomFull {
                max_participants,
                size,
            }) => {
                println!("> room is full ({}/{})", size, max_participants);
                break;
            }
            Ok(ServerMessage::PeerJoined { id }) => println!("> + {}", id),
            Ok(ServerMessage::PeerLeft { id }) => println!("> - {}", id),
            Ok(other) => println!("> ignoring {:?}", other),
            Err(e) => println!("> unreadable frame: {}", e),
        }
    }

    Ok(())
}
