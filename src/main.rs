use clap::Parser;
use verdant::cli::{
    carbon, classify, endpoints, handle_completions, handle_config_init, serve, Cli, Commands,
    ConfigCommands,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => serve::run_serve(args).await,
        Commands::Endpoints(args) => endpoints::handle_endpoints(&args).map(|output| {
            println!("{}", output);
        }),
        Commands::Carbon(args) => carbon::handle_carbon(&args).await.map(|output| {
            println!("{}", output);
        }),
        Commands::Classify(args) => classify::handle_classify(&args).map(|output| {
            println!("{}", output);
        }),
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
