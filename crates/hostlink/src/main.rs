use clap::{Parser, Subcommand};
use hostlink::ipc::{IpcCommand, SOCKET_PATH};
use hostlink::store::TomlStore;
use rondel_core::CommandStore;
use std::io::Write;
use std::os::unix::net::UnixStream;

#[derive(Parser, Debug)]
#[command(name = "rondelctl", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Show the menu at the cursor
    Show,
    /// Hide the menu
    Hide,
    /// Show the menu in edit mode
    Edit,
    /// Print the stored commands
    List,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Show => send_command(IpcCommand::Show),
        Commands::Hide => send_command(IpcCommand::Hide),
        Commands::Edit => send_command(IpcCommand::Edit),
        Commands::List => list_commands(),
    }
}

fn send_command(cmd: IpcCommand) -> anyhow::Result<()> {
    let mut stream = UnixStream::connect(SOCKET_PATH).map_err(|e| {
        anyhow::anyhow!(
            "Failed to connect to rondel at {}: {}. Is rondel running?",
            SOCKET_PATH,
            e
        )
    })?;

    writeln!(stream, "{}", cmd)?;
    Ok(())
}

fn list_commands() -> anyhow::Result<()> {
    let store = TomlStore::open_default()?;
    if store.is_empty() {
        println!("No commands in {}", store.root().display());
        return Ok(());
    }

    for path in store.keys()? {
        let Some(props) = store.load(&path)? else {
            continue;
        };
        let indent = "  ".repeat(path.depth().saturating_sub(1));
        let trigger = props.trigger.map(|c| format!(" [{c}]")).unwrap_or_default();
        if props.is_folder {
            println!("{indent}{path}/{trigger}");
        } else {
            println!("{indent}{path}{trigger} {}", props.left_macro.script);
        }
    }
    Ok(())
}
