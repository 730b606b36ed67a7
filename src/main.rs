use clap::Parser;
use tasktrack::cli::commands::{Cli, Commands};
use tasktrack::cli::handlers;
use tasktrack::io::logging;

fn main() {
    let mut cli = Cli::parse();

    let result = match cli.command.take() {
        None => {
            // No subcommand → launch TUI
            tasktrack::tui::run(cli.dir.as_deref())
        }
        Some(Commands::Init(args)) => {
            // Init runs before store discovery
            logging::init_cli_logging();
            let root = cli.dir.as_deref().map(std::path::Path::new);
            handlers::cmd_init(args, root, cli.password.as_deref())
        }
        Some(cmd) => {
            logging::init_cli_logging();
            handlers::dispatch(cli, cmd)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
