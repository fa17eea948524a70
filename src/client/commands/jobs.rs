use chrono::{DateTime, Utc};
use tabled::Tabled;

use crate::client::commands::output::{display_table_with_count, print_error, print_json};
use crate::client::FahClient;
use crate::models::JobData;

#[derive(Tabled)]
struct JobTableRow {
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

impl JobTableRow {
    fn new(job: &JobData) -> Self {
        JobTableRow {
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
    # List all jobs for a project
    fahctl jobs list 90001

    # Only jobs whose state changed since a timestamp, for polling
    fahctl jobs list 90001 --since 2024-04-01T00:00:00Z

    # JSON output carries the `ts` to use for the next poll
    fahctl -f json jobs list 90001 --since 2024-04-01T00:00:00Z
")]
pub enum JobCommands {
    /// List jobs for a project, optionally only those changed since a time
    List {
        /// Project ID
        #[arg()]
        project_id: u32,
        /// Only jobs whose state changed at or after this ISO-8601 time
        #[arg(long)]
        since: Option<String>,
    },
}

pub fn handle_job_commands(client: &FahClient, command: &JobCommands, format: &str) {
    match command {
        JobCommands::List { project_id, since } => {
            let since = match since {
                Some(text) => match DateTime::parse_from_rfc3339(text) {
                    Ok(ts) => Some(ts.with_timezone(&Utc)),
                    Err(e) => {
                        print_error("parsing --since timestamp", &e);
                        std::process::exit(2);
                    }
                },
                None => None,
            };
            match client.get_project_jobs(*project_id, since.as_ref()) {
                Ok(results) => {
                    if format == "json" {
                        print_json(&results);
                    } else {
                        let rows = results.jobs.iter().map(JobTableRow::new).collect();
                        display_table_with_count(rows, "jobs");
                        println!("Next poll timestamp: {}", results.ts.to_rfc3339());
                    }
                }
                Err(e) => {
                    print_error("listing jobs", &e);
                    std::process::exit(1);
                }
            }
        }
    }
}
