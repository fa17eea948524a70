use tabled::Tabled;

use crate::client::commands::output::{display_table_with_count, print_error, print_json};
use crate::client::FahClient;
use crate::models::JobData;

#[derive(Tabled)]
struct CloneTableRow {
    #[tabled(rename = "Project")]
    project: u32,
    #[tabled(rename = "Run")]
    run: u32,
    #[tabled(rename = "Clone")]
    clone: u32,
    #[tabled(rename = "Gen")]
    gen: u32,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Last Change")]
    last: String,
}

impl CloneTableRow {
    fn new(job: &JobData) -> Self {
        CloneTableRow {
            project: job.project,
            run: job.run,
            clone: job.clone,
            gen: job.gen,
            state: job.state.to_string(),
            last: job
                .last
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(clap::Subcommand)]
#[command(after_long_help = "\
EXAMPLES:
    # Create clone 0 of run 0
    fahctl clones create 90001 0 0

    # Watch its state
    fahctl clones get 90001 0 0
")]
pub enum CloneCommands {
    /// Request instantiation of a clone job slot
    ///
    /// The clone id must not collide with an existing non-terminal clone;
    /// the server is not assumed to check.
    Create {
        /// Project ID
        #[arg()]
        project_id: u32,
        /// Run ID
        #[arg()]
        run_id: u32,
        /// Clone ID
        #[arg()]
        clone_id: u32,
    },
    /// Get the current state snapshot for a clone
    Get {
        /// Project ID
        #[arg()]
        project_id: u32,
        /// Run ID
        #[arg()]
        run_id: u32,
        /// Clone ID
        #[arg()]
        clone_id: u32,
    },
}

pub fn handle_clone_commands(client: &FahClient, command: &CloneCommands, format: &str) {
    match command {
        CloneCommands::Create {
            project_id,
            run_id,
            clone_id,
        } => match client.create_clone(*project_id, *run_id, *clone_id) {
            Ok(()) => println!(
                "Created clone {} for project {} run {}",
                clone_id, project_id, run_id
            ),
            Err(e) => {
                print_error("creating clone", &e);
                std::process::exit(1);
            }
        },
        CloneCommands::Get {
            project_id,
            run_id,
            clone_id,
        } => match client.get_clone(*project_id, *run_id, *clone_id) {
            Ok(job) => {
                if format == "json" {
                    print_json(&job);
                } else {
                    display_table_with_count(vec![CloneTableRow::new(&job)], "clone");
                }
            }
            Err(e) => {
                print_error("getting clone", &e);
                std::process::exit(1);
            }
        },
    }
}
