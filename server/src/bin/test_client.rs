use shared::{ClientEvent, ServerEvent};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::time::timeout;

async fn send(
    writer: &mut (impl AsyncWriteExt + Unpin),
    event: &ClientEvent,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut line = serde_json::to_string(event)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    Ok(())
}

async fn recv(
    lines: &mut Lines<BufReader<OwnedReadHalf>>,
) -> Result<ServerEvent, Box<dyn std::error::Error>> {
    let line = timeout(Duration::from_secs(2), lines.next_line())
        .await??
        .ok_or("server closed the connection")?;
    Ok(serde_json::from_str(&line)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let server_addr = "127.0.0.1:3001";
    println!("Connecting to {}", server_addr);
    let stream = TcpStream::connect(server_addr).await?;
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    // Create a room and join it on the same connection, so this client is
    // both host and sole player
    send(&mut writer, &ClientEvent::CreateRoom).await?;
    let room_code = match recv(&mut lines).await? {
        ServerEvent::RoomCreated { room_code } => {
            println!("Room created: {}", room_code);
            room_code
        }
        other => {
            println!("Expected room_created but got: {:?}", other);
            return Ok(());
        }
    };

    send(
        &mut writer,
        &ClientEvent::JoinRoom {
            room_code: room_code.clone(),
            username: "smoke-test".to_string(),
        },
    )
    .await?;

    send(
        &mut writer,
        &ClientEvent::StartGame {
            room_code: room_code.clone(),
        },
    )
    .await?;

    // Answer option 0 on every question and let the host side advance;
    // whatever score comes out, the full event flow gets exercised
    loop {
        match recv(&mut lines).await? {
            ServerEvent::NextQuestion { question } => {
                println!(
                    "Question {}/{}: {} {:?}",
                    question.index + 1,
                    question.total,
                    question.prompt,
                    question.options
                );
                send(
                    &mut writer,
                    &ClientEvent::SubmitAnswer {
                        room_code: room_code.clone(),
                        answer_index: 0,
                        time_remaining: question.time_limit as f32 / 2.0,
                    },
                )
                .await?;
            }
            ServerEvent::AnswerProgress {
                answered_count,
                total_players,
            } => {
                println!("Progress: {}/{} answered", answered_count, total_players);
            }
            ServerEvent::AllAnswered => {
                println!("Everyone answered, advancing");
                send(
                    &mut writer,
                    &ClientEvent::AdvanceQuestion {
                        room_code: room_code.clone(),
                    },
                )
                .await?;
            }
            ServerEvent::GameOver { players } => {
                println!("Game over!");
                for (place, player) in players.iter().enumerate() {
                    println!("  {}. {} - {} points", place + 1, player.username, player.score);
                }
                break;
            }
            other => println!("Event: {:?}", other),
        }
    }

    println!("Test client finished");
    Ok(())
}
