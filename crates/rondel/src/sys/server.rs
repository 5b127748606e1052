use crate::events::AppEvent;
use async_channel::Sender;
use hostlink::ipc::{IpcCommand, SOCKET_PATH};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UnixListener;

impl From<IpcCommand> for AppEvent {
    fn from(cmd: IpcCommand) -> Self {
        match cmd {
            IpcCommand::Show => AppEvent::Show,
            IpcCommand::Hide => AppEvent::Hide,
            IpcCommand::Edit => AppEvent::Edit,
        }
    }
}

pub async fn run_server(tx: Sender<AppEvent>) {
    // stale socket from a previous run
    if std::fs::metadata(SOCKET_PATH).is_ok() {
        let _ = std::fs::remove_file(SOCKET_PATH);
    }

    let listener = match UnixListener::bind(SOCKET_PATH) {
        Ok(l) => l,
        Err(e) => {
            log::error!("Failed to bind unix socket: {}", e);
            return;
        }
    };

    loop {
        match listener.accept().await {
            Ok((mut stream, _)) => {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let reader = BufReader::new(&mut stream);
                    let mut lines = reader.lines();

                    while let Ok(Some(line)) = lines.next_line().await {
                        match line.trim().parse::<IpcCommand>() {
                            Ok(cmd) => {
                                let _ = tx.send(AppEvent::from(cmd)).await;
                            }
                            Err(_) => log::warn!("Unknown command on socket: {:?}", line),
                        }
                    }
                });
            }
            Err(e) => {
                log::error!("Failed to accept connection: {}", e);
            }
        }
    }
}
