mod app;
mod core;
mod event_emitter;
mod ipc;
mod platform;
mod x11;

use anyhow::Result;
use argh::FromArgs;
use ipc::IpcClient;
use tracing_subscriber::EnvFilter;

use shoji_ipc::{Command, EventFilter, Response};

use crate::core::{ChromeRule, Config};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shoji - EWMH virtual desktop manager
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Option<SubCommand>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Start(StartCmd),
    Version(VersionCmd),
    SwitchToDesktop(SwitchToDesktopCmd),
    SwitchToRecentDesktop(SwitchToRecentDesktopCmd),
    AddDesktop(AddDesktopCmd),
    RemoveDesktop(RemoveDesktopCmd),
    RemoveCurrentDesktop(RemoveCurrentDesktopCmd),
    RemoveLastDesktop(RemoveLastDesktopCmd),
    RemoveEmptyDesktops(RemoveEmptyDesktopsCmd),
    RenameDesktop(RenameDesktopCmd),
    RenameCurrentDesktop(RenameCurrentDesktopCmd),
    SwapDesktops(SwapDesktopsCmd),
    MoveDesktopLeft(MoveDesktopLeftCmd),
    MoveDesktopRight(MoveDesktopRightCmd),
    MoveCurrentDesktopLeft(MoveCurrentDesktopLeftCmd),
    MoveCurrentDesktopRight(MoveCurrentDesktopRightCmd),
    InvokeAction(InvokeActionCmd),
    ListActions(ListActionsCmd),
    SetKeepOneEmptyDesktop(SetKeepOneEmptyDesktopCmd),
    SetDropRedundantDesktops(SetDropRedundantDesktopsCmd),
    SetEmptyDesktopName(SetEmptyDesktopNameCmd),
    SetNewDesktopCommand(SetNewDesktopCommandCmd),
    ListDesktops(ListDesktopsCmd),
    GetState(GetStateCmd),
    Subscribe(SubscribeCmd),
    Quit(QuitCmd),
}

/// Start the shoji daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "start")]
struct StartCmd {
    /// always keep at least one empty desktop
    #[argh(switch)]
    keep_one_empty_desktop: bool,
    /// remove empty desktops beyond the first
    #[argh(switch)]
    drop_redundant_desktops: bool,
    /// name applied to every empty desktop
    #[argh(option)]
    empty_desktop_name: Option<String>,
    /// shell command to run after adding a desktop
    #[argh(option)]
    new_desktop_command: Option<String>,
    /// chrome window filter as CLASS or CLASS:NAME (repeatable,
    /// replaces the built-in filters)
    #[argh(option)]
    chrome_filter: Vec<String>,
}

/// Show version information
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCmd {}

/// Switch to a specific desktop
#[derive(FromArgs)]
#[argh(subcommand, name = "switch-to-desktop")]
struct SwitchToDesktopCmd {
    /// desktop number (1-based)
    #[argh(positional)]
    number: u32,
}

/// Switch to the previously active desktop
#[derive(FromArgs)]
#[argh(subcommand, name = "switch-to-recent-desktop")]
struct SwitchToRecentDesktopCmd {}

/// Add a new desktop at the end
#[derive(FromArgs)]
#[argh(subcommand, name = "add-desktop")]
struct AddDesktopCmd {
    /// name for the new desktop
    #[argh(positional)]
    name: Option<String>,
}

/// Remove a specific desktop
#[derive(FromArgs)]
#[argh(subcommand, name = "remove-desktop")]
struct RemoveDesktopCmd {
    /// desktop number (1-based)
    #[argh(positional)]
    number: u32,
}

/// Remove the current desktop
#[derive(FromArgs)]
#[argh(subcommand, name = "remove-current-desktop")]
struct RemoveCurrentDesktopCmd {}

/// Remove the last desktop
#[derive(FromArgs)]
#[argh(subcommand, name = "remove-last-desktop")]
struct RemoveLastDesktopCmd {}

/// Remove all empty desktops except one
#[derive(FromArgs)]
#[argh(subcommand, name = "remove-empty-desktops")]
struct RemoveEmptyDesktopsCmd {}

/// Rename a specific desktop
#[derive(FromArgs)]
#[argh(subcommand, name = "rename-desktop")]
struct RenameDesktopCmd {
    /// desktop number (1-based)
    #[argh(positional)]
    number: u32,
    /// new desktop name
    #[argh(positional)]
    name: String,
}

/// Rename the current desktop
#[derive(FromArgs)]
#[argh(subcommand, name = "rename-current-desktop")]
struct RenameCurrentDesktopCmd {
    /// new desktop name
    #[argh(positional)]
    name: String,
}

/// Swap two desktops
#[derive(FromArgs)]
#[argh(subcommand, name = "swap-desktops")]
struct SwapDesktopsCmd {
    /// first desktop number
    #[argh(positional)]
    first: u32,
    /// second desktop number
    #[argh(positional)]
    second: u32,
}

/// Move a desktop one position to the left
#[derive(FromArgs)]
#[argh(subcommand, name = "move-desktop-left")]
struct MoveDesktopLeftCmd {
    /// desktop number (1-based)
    #[argh(positional)]
    number: u32,
}

/// Move a desktop one position to the right
#[derive(FromArgs)]
#[argh(subcommand, name = "move-desktop-right")]
struct MoveDesktopRightCmd {
    /// desktop number (1-based)
    #[argh(positional)]
    number: u32,
}

/// Move the current desktop one position to the left
#[derive(FromArgs)]
#[argh(subcommand, name = "move-current-desktop-left")]
struct MoveCurrentDesktopLeftCmd {}

/// Move the current desktop one position to the right
#[derive(FromArgs)]
#[argh(subcommand, name = "move-current-desktop-right")]
struct MoveCurrentDesktopRightCmd {}

/// Invoke a named action
#[derive(FromArgs)]
#[argh(subcommand, name = "invoke-action")]
struct InvokeActionCmd {
    /// action name (see list-actions)
    #[argh(positional)]
    name: String,
}

/// List the named actions
#[derive(FromArgs)]
#[argh(subcommand, name = "list-actions")]
struct ListActionsCmd {}

/// Toggle the keep-one-empty-desktop policy
#[derive(FromArgs)]
#[argh(subcommand, name = "set-keep-one-empty-desktop")]
struct SetKeepOneEmptyDesktopCmd {
    /// true or false
    #[argh(positional)]
    value: bool,
}

/// Toggle the drop-redundant-desktops policy
#[derive(FromArgs)]
#[argh(subcommand, name = "set-drop-redundant-desktops")]
struct SetDropRedundantDesktopsCmd {
    /// true or false
    #[argh(positional)]
    value: bool,
}

/// Set the name applied to empty desktops
#[derive(FromArgs)]
#[argh(subcommand, name = "set-empty-desktop-name")]
struct SetEmptyDesktopNameCmd {
    /// name (empty string disables)
    #[argh(positional)]
    name: String,
}

/// Set the command run after adding a desktop
#[derive(FromArgs)]
#[argh(subcommand, name = "set-new-desktop-command")]
struct SetNewDesktopCommandCmd {
    /// shell command (empty string disables)
    #[argh(positional)]
    command: String,
}

/// List all desktops
#[derive(FromArgs)]
#[argh(subcommand, name = "list-desktops")]
struct ListDesktopsCmd {}

/// Get current desktop state
#[derive(FromArgs)]
#[argh(subcommand, name = "get-state")]
struct GetStateCmd {}

/// Subscribe to state events and print them as JSON lines
#[derive(FromArgs)]
#[argh(subcommand, name = "subscribe")]
struct SubscribeCmd {
    /// send a full state snapshot first
    #[argh(switch)]
    snapshot: bool,
    /// only desktop switch/amount events
    #[argh(switch)]
    desktops: bool,
    /// only desktop name events
    #[argh(switch)]
    names: bool,
    /// only empty desktop set events
    #[argh(switch)]
    empty: bool,
    /// only hook invocation events
    #[argh(switch)]
    hooks: bool,
}

/// Quit the shoji daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "quit")]
struct QuitCmd {}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    match cli.command {
        None => {
            // No subcommand - show help (simulate --help)
            let args: Vec<&str> = vec!["shoji", "--help"];
            match Cli::from_args(&args[..1], &args[1..]) {
                Ok(_) => {}
                Err(e) => {
                    println!("{}", e.output);
                }
            }
            Ok(())
        }
        Some(SubCommand::Start(cmd)) => {
            // Start daemon
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .init();

            tracing::info!("shoji starting");
            app::App::run(to_config(cmd))
        }
        Some(SubCommand::Version(_)) => {
            println!("shoji {}", VERSION);
            Ok(())
        }
        Some(SubCommand::Subscribe(cmd)) => {
            let filter = if cmd.desktops || cmd.names || cmd.empty || cmd.hooks {
                Some(EventFilter {
                    desktops: cmd.desktops,
                    names: cmd.names,
                    empty: cmd.empty,
                    hooks: cmd.hooks,
                })
            } else {
                None
            };
            ipc::subscribe_and_print(cmd.snapshot, filter)
        }
        Some(subcmd) => run_cli(subcmd),
    }
}

fn to_config(cmd: StartCmd) -> Config {
    let mut config = Config::new();
    config.keep_one_empty_desktop = cmd.keep_one_empty_desktop;
    config.drop_redundant_desktops = cmd.drop_redundant_desktops;
    if let Some(name) = cmd.empty_desktop_name {
        config.empty_desktop_name = name;
    }
    if let Some(command) = cmd.new_desktop_command {
        config.new_desktop_command = command;
    }
    if !cmd.chrome_filter.is_empty() {
        config.chrome_rules = cmd
            .chrome_filter
            .iter()
            .map(|spec| ChromeRule::parse(spec))
            .collect();
    }
    config
}

fn run_cli(subcmd: SubCommand) -> Result<()> {
    let cmd = to_command(subcmd);
    let mut client = IpcClient::connect()?;
    let response = client.send(&cmd)?;

    match response {
        Response::Ok => {}
        Response::Error { message } => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        Response::Desktops { desktops } => {
            for d in desktops {
                println!(
                    "{}: {}{}{}",
                    d.number,
                    if d.name.is_empty() { "(unnamed)" } else { &d.name },
                    if d.is_current { " *" } else { "" },
                    if d.is_empty { " [empty]" } else { "" }
                );
            }
        }
        Response::State { state } => {
            println!("Desktop count: {}", state.desktop_count);
            println!("Current desktop: {}", state.current_desktop);
            println!("Recent desktop: {:?}", state.recent_desktop);
            println!("Empty desktops: {:?}", state.empty_desktops);
        }
        Response::Actions { actions } => {
            for a in actions {
                println!("{} -> {}", a.name, a.command);
            }
        }
    }

    Ok(())
}

fn to_command(subcmd: SubCommand) -> Command {
    match subcmd {
        SubCommand::Start(_) | SubCommand::Version(_) | SubCommand::Subscribe(_) => {
            unreachable!("handled in main")
        }
        SubCommand::SwitchToDesktop(cmd) => Command::SwitchToDesktop { number: cmd.number },
        SubCommand::SwitchToRecentDesktop(_) => Command::SwitchToRecentDesktop,
        SubCommand::AddDesktop(cmd) => Command::AddDesktop { name: cmd.name },
        SubCommand::RemoveDesktop(cmd) => Command::RemoveDesktop { number: cmd.number },
        SubCommand::RemoveCurrentDesktop(_) => Command::RemoveCurrentDesktop,
        SubCommand::RemoveLastDesktop(_) => Command::RemoveLastDesktop,
        SubCommand::RemoveEmptyDesktops(_) => Command::RemoveEmptyDesktops,
        SubCommand::RenameDesktop(cmd) => Command::RenameDesktop {
            number: cmd.number,
            name: cmd.name,
        },
        SubCommand::RenameCurrentDesktop(cmd) => Command::RenameCurrentDesktop { name: cmd.name },
        SubCommand::SwapDesktops(cmd) => Command::SwapDesktops {
            first: cmd.first,
            second: cmd.second,
        },
        SubCommand::MoveDesktopLeft(cmd) => Command::MoveDesktop {
            number: cmd.number,
            step: -1,
        },
        SubCommand::MoveDesktopRight(cmd) => Command::MoveDesktop {
            number: cmd.number,
            step: 1,
        },
        SubCommand::MoveCurrentDesktopLeft(_) => Command::MoveCurrentDesktopLeft,
        SubCommand::MoveCurrentDesktopRight(_) => Command::MoveCurrentDesktopRight,
        SubCommand::InvokeAction(cmd) => Command::InvokeAction { name: cmd.name },
        SubCommand::ListActions(_) => Command::ListActions,
        SubCommand::SetKeepOneEmptyDesktop(cmd) => {
            Command::SetKeepOneEmptyDesktop { value: cmd.value }
        }
        SubCommand::SetDropRedundantDesktops(cmd) => {
            Command::SetDropRedundantDesktops { value: cmd.value }
        }
        SubCommand::SetEmptyDesktopName(cmd) => Command::SetEmptyDesktopName { name: cmd.name },
        SubCommand::SetNewDesktopCommand(cmd) => {
            Command::SetNewDesktopCommand { command: cmd.command }
        }
        SubCommand::ListDesktops(_) => Command::ListDesktops,
        SubCommand::GetState(_) => Command::GetState,
        SubCommand::Quit(_) => Command::Quit,
    }
}
