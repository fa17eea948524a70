use tabled::Tabled;

use crate::client::commands::output::{display_table_with_count, print_error, print_json};
use crate::client::FahClient;
use crate::models::{CompressionType, ProjectData};

#[derive(Tabled)]
struct ProjectTableRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Core")]
    core_id: String,
    #[tabled(rename = "Contact")]
    contact: String,
    #[tabled(rename = "Runs")]
    runs: u32,
    #[tabled(rename = "Clones")]
    clones: u32,
    #[tabled(rename = "Gens")]
    gens: u32,
    #[tabled(rename = "Atoms")]
    atoms: u64,
    #[tabled(rename = "Credit")]
    credit: u64,
    #[tabled(rename = "Compression")]
    compression: String,
}

impl ProjectTableRow {
    fn new(id: &str, project: &ProjectData) -> Self {
        ProjectTableRow {
            id: id.to_string(),
            core_id: project.core_id.clone(),
            contact: project.contact.clone(),
            runs: project.runs,
            clones: project.clones,
            gens: project.gens,
            atoms: project.atoms,
            credit: project.credit,
            compression: project.compression.to_string(),
        }
    }
}

#[derive(clap::Subcommand)]
#[command(after_long_help = "\
EXAMPLES:
    # List projects on the work server
    fahctl projects list

    # Create a project
    fahctl projects create 90001 --core-id 0x23 --contact lol@no.int \\
        --atoms 10000 --credit 5000

    # Get a project as JSON for scripting
    fahctl -f json projects get 90001
")]
pub enum ProjectCommands {
    /// List all projects on the work server
    List,
    /// Create a new project
    Create {
        /// Project ID
        #[arg()]
        project_id: u32,
        /// Core identifier as a hex string, e.g. 0x23
        #[arg(long, required = true)]
        core_id: String,
        /// Email of the person responsible for the project
        #[arg(long, required = true)]
        contact: String,
        /// Approximate number of atoms in the simulations
        #[arg(long, required = true)]
        atoms: u64,
        /// Base credit awarded for a work unit
        #[arg(long, required = true)]
        credit: u64,
        /// Maximum number of generations per job
        #[arg(long, default_value = "1")]
        gens: u32,
        /// Seconds before a work unit can be reassigned
        #[arg(long, default_value = "86400")]
        timeout: f64,
        /// Seconds in which a work unit can be returned for credit
        #[arg(long, default_value = "172800")]
        deadline: f64,
        /// Work unit compression (NONE, BZIP2, ZLIB, GZIP, LZ4)
        #[arg(long, default_value = "ZLIB")]
        compression: CompressionType,
    },
    /// Get a specific project
    Get {
        /// Project ID
        #[arg()]
        project_id: u32,
    },
    /// Update an existing project (same write path as create)
    Update {
        /// Project ID
        #[arg()]
        project_id: u32,
        #[arg(long, required = true)]
        core_id: String,
        #[arg(long, required = true)]
        contact: String,
        #[arg(long, required = true)]
        atoms: u64,
        #[arg(long, required = true)]
        credit: u64,
        /// Number of runs (the run-id allocator; only set this if you know
        /// the server-side count is wrong)
        #[arg(long, default_value = "0")]
        runs: u32,
        #[arg(long, default_value = "0")]
        clones: u32,
        #[arg(long, default_value = "1")]
        gens: u32,
        #[arg(long, default_value = "86400")]
        timeout: f64,
        #[arg(long, default_value = "172800")]
        deadline: f64,
        #[arg(long, default_value = "ZLIB")]
        compression: CompressionType,
    },
    /// Delete a project
    Delete {
        /// Project ID
        #[arg()]
        project_id: u32,
    },
}

pub fn handle_project_commands(client: &FahClient, command: &ProjectCommands, format: &str) {
    match command {
        ProjectCommands::List => match client.list_projects() {
            Ok(projects) => {
                if format == "json" {
                    print_json(&projects);
                } else {
                    let rows = projects
                        .iter()
                        .map(|(id, project)| ProjectTableRow::new(id, project))
                        .collect();
                    display_table_with_count(rows, "projects");
                }
            }
            Err(e) => {
                print_error("listing projects", &e);
                std::process::exit(1);
            }
        },
        ProjectCommands::Create {
            project_id,
            core_id,
            contact,
            atoms,
            credit,
            gens,
            timeout,
            deadline,
            compression,
        } => {
            let data = ProjectData {
                gens: *gens,
                timeout: *timeout,
                deadline: *deadline,
                compression: *compression,
                ..ProjectData::new(core_id, contact, *atoms, *credit)
            };
            match client.create_project(*project_id, &data) {
                Ok(()) => {
                    if format == "json" {
                        print_json(&data);
                    } else {
                        println!("Created project {}", project_id);
                    }
                }
                Err(e) => {
                    print_error("creating project", &e);
                    std::process::exit(1);
                }
            }
        }
        ProjectCommands::Get { project_id } => match client.get_project(*project_id) {
            Ok(project) => {
                if format == "json" {
                    print_json(&project);
                } else {
                    let rows = vec![ProjectTableRow::new(&project_id.to_string(), &project)];
                    display_table_with_count(rows, "project");
                }
            }
            Err(e) => {
                print_error("getting project", &e);
                std::process::exit(1);
            }
        },
        ProjectCommands::Update {
            project_id,
            core_id,
            contact,
            atoms,
            credit,
            runs,
            clones,
            gens,
            timeout,
            deadline,
            compression,
        } => {
            let data = ProjectData {
                runs: *runs,
                clones: *clones,
                gens: *gens,
                timeout: *timeout,
                deadline: *deadline,
                compression: *compression,
                ..ProjectData::new(core_id, contact, *atoms, *credit)
            };
            match client.update_project(*project_id, &data) {
                Ok(()) => {
                    if format == "json" {
                        print_json(&data);
                    } else {
                        println!("Updated project {}", project_id);
                    }
                }
                Err(e) => {
                    print_error("updating project", &e);
                    std::process::exit(1);
                }
            }
        }
        ProjectCommands::Delete { project_id } => match client.delete_project(*project_id) {
            Ok(()) => println!("Deleted project {}", project_id),
            Err(e) => {
                print_error("deleting project", &e);
                std::process::exit(1);
            }
        },
    }
}
