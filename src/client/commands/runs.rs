use std::path::PathBuf;

use crate::client::commands::output::{print_error, print_json};
use crate::client::FahClient;

#[derive(clap::Subcommand)]
#[command(after_long_help = "\
EXAMPLES:
    # Create the next run for a project from its four artifact files
    fahctl runs create 90001 core.xml system.xml state.xml integrator.xml
")]
pub enum RunCommands {
    /// Create the next run for a project from its artifact files
    ///
    /// The run id is allocated from the project's current run count and
    /// printed on success. Concurrent run creation against the same project
    /// must be serialized externally; the allocation is not atomic.
    Create {
        /// Project ID
        #[arg()]
        project_id: u32,
        /// Core artifact file
        #[arg()]
        core_file: PathBuf,
        /// System artifact file
        #[arg()]
        system_file: PathBuf,
        /// State artifact file
        #[arg()]
        state_file: PathBuf,
        /// Integrator artifact file
        #[arg()]
        integrator_file: PathBuf,
    },
}

pub fn handle_run_commands(client: &FahClient, command: &RunCommands, format: &str) {
    match command {
        RunCommands::Create {
            project_id,
            core_file,
            system_file,
            state_file,
            integrator_file,
        } => {
            match client.create_run(*project_id, core_file, system_file, state_file, integrator_file)
            {
                Ok(run_id) => {
                    if format == "json" {
                        print_json(&serde_json::json!({
                            "project_id": project_id,
                            "run_id": run_id,
                        }));
                    } else {
                        println!("Created run {} for project {}", run_id, project_id);
                    }
                }
                Err(e) => {
                    print_error("creating run", &e);
                    std::process::exit(1);
                }
            }
        }
    }
}
