//! fahctl CLI entry point.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use fahctl::client::commands::{assign, clones, creds, files, jobs, output, projects, runs};
use fahctl::client::FahClient;
use fahctl::config::FahConfig;

#[derive(Parser)]
#[command(
    name = "fahctl",
    version,
    about = "Manage Folding@Home assignment and work server resources"
)]
struct Cli {
    /// Output format (table or json)
    #[arg(short = 'f', long, global = true)]
    format: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Override the assignment server API URL
    #[arg(long, global = true)]
    as_url: Option<String>,

    /// Override the work server API URL
    #[arg(long, global = true)]
    ws_url: Option<String>,

    /// Override the work server IP identity
    #[arg(long, global = true)]
    ws_ip: Option<Ipv4Addr>,

    /// Override the client certificate path
    #[arg(long, global = true)]
    certificate_file: Option<PathBuf>,

    /// Override the private key path
    #[arg(long, global = true)]
    key_file: Option<PathBuf>,

    /// Skip server certificate verification
    #[arg(long, global = true)]
    insecure: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage work server projects
    #[command(subcommand)]
    Projects(projects::ProjectCommands),
    /// Create runs within a project
    #[command(subcommand)]
    Runs(runs::RunCommands),
    /// Create and inspect clones
    #[command(subcommand)]
    Clones(clones::CloneCommands),
    /// List, transfer, and delete files
    #[command(subcommand)]
    Files(files::FileCommands),
    /// Observe job state changes
    #[command(subcommand)]
    Jobs(jobs::JobCommands),
    /// Manage assignment server records
    #[command(subcommand)]
    Assign(assign::AssignCommands),
    /// Manage client credentials
    #[command(subcommand)]
    Creds(creds::CredCommands),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = FahConfig::load()?;
    if let Some(as_url) = &cli.as_url {
        config.client.as_api_url = as_url.clone();
    }
    if let Some(ws_url) = &cli.ws_url {
        config.client.ws_api_url = ws_url.clone();
    }
    if let Some(ws_ip) = cli.ws_ip {
        config.client.ws_ip_addr = ws_ip;
    }
    if let Some(certificate_file) = &cli.certificate_file {
        config.client.certificate_file = certificate_file.clone();
    }
    if let Some(key_file) = &cli.key_file {
        config.client.key_file = key_file.clone();
    }
    if cli.insecure {
        config.client.verify = false;
    }

    let log_level = cli
        .log_level
        .as_deref()
        .unwrap_or(&config.client.log_level);
    env_logger::Builder::new().parse_filters(log_level).init();

    let format = cli.format.clone().unwrap_or_else(|| config.client.format.clone());

    // Credential commands must work before any certificate exists.
    if let Commands::Creds(command) = &cli.command {
        creds::handle_cred_commands(command);
        return Ok(());
    }

    let client = match FahClient::from_config(&config.client) {
        Ok(client) => client,
        Err(e) => {
            output::print_error("constructing client", &e);
            std::process::exit(1);
        }
    };

    match &cli.command {
        Commands::Projects(command) => projects::handle_project_commands(&client, command, &format),
        Commands::Runs(command) => runs::handle_run_commands(&client, command, &format),
        Commands::Clones(command) => clones::handle_clone_commands(&client, command, &format),
        Commands::Files(command) => files::handle_file_commands(&client, command, &format),
        Commands::Jobs(command) => jobs::handle_job_commands(&client, command, &format),
        Commands::Assign(command) => assign::handle_assign_commands(&client, command, &format),
        Commands::Creds(_) => unreachable!("handled above"),
    }

    Ok(())
}
