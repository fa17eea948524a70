use crate::client::commands::output::{print_error, print_json};
use crate::client::FahClient;
use crate::models::ASWorkServerData;

#[derive(clap::Subcommand)]
#[command(after_long_help = "\
EXAMPLES:
    # Show this work server's record on the assignment server
    fahctl assign ws-get

    # Register capacity and constraints
    fahctl assign ws-set --max-assign-rate 10 --weight 1.0 \\
        --constraints 'cpus>=4'

    # Stop assignments for a project without deleting it
    fahctl assign project-reset 90001
")]
pub enum AssignCommands {
    /// Show this work server's assignment-server record
    WsGet,
    /// Update this work server's assignment-server record
    WsSet {
        /// Maximum assigns/sec allowed for this work server
        #[arg(long, required = true)]
        max_assign_rate: f64,
        /// Scheduling weight of this work server
        #[arg(long, required = true)]
        weight: f64,
        /// Constraints string as defined in the AS online help
        #[arg(long, default_value = "")]
        constraints: String,
    },
    /// Show a project's assignment-server record
    ProjectGet {
        /// Project ID
        #[arg()]
        project_id: u32,
    },
    /// Set a project's weight and constraints on the assignment server
    ProjectSet {
        /// Project ID
        #[arg()]
        project_id: u32,
        /// Scheduling weight of the project
        #[arg(long, required = true)]
        weight: f64,
        /// Constraints string as defined in the AS online help
        #[arg(long, default_value = "")]
        constraints: String,
    },
    /// Reset a project's record: weight 0, no constraints
    ProjectReset {
        /// Project ID
        #[arg()]
        project_id: u32,
    },
}

pub fn handle_assign_commands(client: &FahClient, command: &AssignCommands, format: &str) {
    match command {
        AssignCommands::WsGet => match client.as_get_work_server() {
            Ok(record) => {
                if format == "json" {
                    print_json(&record);
                } else {
                    println!("max_assign_rate: {}", record.max_assign_rate);
                    println!("weight:          {}", record.weight);
                    println!("constraints:     {}", record.constraints);
                }
            }
            Err(e) => {
                print_error("getting work server record", &e);
                std::process::exit(1);
            }
        },
        AssignCommands::WsSet {
            max_assign_rate,
            weight,
            constraints,
        } => {
            let record = ASWorkServerData {
                max_assign_rate: *max_assign_rate,
                weight: *weight,
                constraints: constraints.clone(),
            };
            match client.as_set_work_server(&record) {
                Ok(()) => println!("Updated work server record"),
                Err(e) => {
                    print_error("setting work server record", &e);
                    std::process::exit(1);
                }
            }
        }
        AssignCommands::ProjectGet { project_id } => match client.as_get_project(*project_id) {
            Ok(record) => {
                if format == "json" {
                    print_json(&record);
                } else {
                    let ws = record
                        .ws
                        .map(|ip| ip.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!("ws:          {}", ws);
                    println!("weight:      {}", record.weight);
                    println!("constraints: {}", record.constraints);
                }
            }
            Err(e) => {
                print_error("getting assignment-server project record", &e);
                std::process::exit(1);
            }
        },
        AssignCommands::ProjectSet {
            project_id,
            weight,
            constraints,
        } => match client.as_set_project(*project_id, *weight, constraints) {
            Ok(()) => println!("Updated project {} on the assignment server", project_id),
            Err(e) => {
                print_error("setting assignment-server project record", &e);
                std::process::exit(1);
            }
        },
        AssignCommands::ProjectReset { project_id } => {
            match client.as_reset_project(*project_id) {
                Ok(()) => println!("Reset project {} on the assignment server", project_id),
                Err(e) => {
                    print_error("resetting assignment-server project record", &e);
                    std::process::exit(1);
                }
            }
        }
    }
}
