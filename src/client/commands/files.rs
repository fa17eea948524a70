use std::path::PathBuf;

use tabled::Tabled;

use crate::client::commands::output::{display_table_with_count, print_error, print_json};
use crate::client::FahClient;
use crate::models::FileData;

#[derive(Tabled)]
struct FileTableRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Size")]
    size: u64,
    #[tabled(rename = "Modified")]
    modified: String,
}

impl FileTableRow {
    fn new(file: &FileData) -> Self {
        FileTableRow {
            path: file.path.clone(),
            size: file.size,
            modified: file.modified.to_rfc3339(),
        }
    }
}

#[derive(clap::Subcommand)]
#[command(after_long_help = "\
EXAMPLES:
    # List project files
    fahctl files list 90001

    # List output files of generation 2 of clone 0, run 0
    fahctl files list 90001 --run 0 --clone 0 --gen 2

    # Upload into a run directory
    fahctl files upload 90001 ./state.xml state.xml --run 0

    # Download a generation output file
    fahctl files download 90001 positions.xtc ./out/positions.xtc \\
        --run 0 --clone 0 --gen 2
")]
pub enum FileCommands {
    /// List files at project, clone, or generation scope
    List {
        /// Project ID
        #[arg()]
        project_id: u32,
        /// Run ID (scopes to a clone together with --clone)
        #[arg(long)]
        run: Option<u32>,
        /// Clone ID (requires --run)
        #[arg(long)]
        clone: Option<u32>,
        /// Generation ID (requires --run and --clone)
        #[arg(long)]
        gen: Option<u32>,
    },
    /// Upload a local file at project or run scope
    Upload {
        /// Project ID
        #[arg()]
        project_id: u32,
        /// Local file to upload
        #[arg()]
        src: PathBuf,
        /// Destination path relative to the project or run directory
        #[arg()]
        dest: String,
        /// Run ID (uploads into the RUN directory)
        #[arg(long)]
        run: Option<u32>,
    },
    /// Download a file at project, run, clone, or generation scope
    Download {
        /// Project ID
        #[arg()]
        project_id: u32,
        /// Remote path relative to the scoped directory
        #[arg()]
        src: String,
        /// Local destination path
        #[arg()]
        dest: PathBuf,
        /// Run ID
        #[arg(long)]
        run: Option<u32>,
        /// Clone ID (requires --run)
        #[arg(long)]
        clone: Option<u32>,
        /// Generation ID (requires --run and --clone)
        #[arg(long)]
        gen: Option<u32>,
    },
    /// Delete a file at project or run scope
    Delete {
        /// Project ID
        #[arg()]
        project_id: u32,
        /// Remote path relative to the project or run directory
        #[arg()]
        path: String,
        /// Run ID (deletes from the RUN directory)
        #[arg(long)]
        run: Option<u32>,
    },
}

fn invalid_scope(detail: &str) -> ! {
    print_error("resolving file scope", &detail);
    std::process::exit(2);
}

fn print_files(files: Vec<FileData>, format: &str) {
    if format == "json" {
        print_json(&files);
    } else {
        let rows = files.iter().map(FileTableRow::new).collect();
        display_table_with_count(rows, "files");
    }
}

pub fn handle_file_commands(client: &FahClient, command: &FileCommands, format: &str) {
    match command {
        FileCommands::List {
            project_id,
            run,
            clone,
            gen,
        } => {
            let result = match (run, clone, gen) {
                (None, None, None) => client.list_project_files(*project_id),
                (Some(run), Some(clone), None) => {
                    client.list_clone_files(*project_id, *run, *clone)
                }
                (Some(run), Some(clone), Some(gen)) => {
                    client.list_gen_files(*project_id, *run, *clone, *gen)
                }
                (Some(_), None, None) => invalid_scope(
                    "the work server has no run-scope file listing; \
                     run files appear under the project listing as RUN<id>/...",
                ),
                _ => invalid_scope("--clone requires --run, and --gen requires both"),
            };
            match result {
                Ok(files) => print_files(files, format),
                Err(e) => {
                    print_error("listing files", &e);
                    std::process::exit(1);
                }
            }
        }
        FileCommands::Upload {
            project_id,
            src,
            dest,
            run,
        } => {
            let result = match run {
                None => client.create_project_file(*project_id, src, dest),
                Some(run) => client.create_run_file(*project_id, *run, src, dest),
            };
            match result {
                Ok(()) => println!("Uploaded {} to {}", src.display(), dest),
                Err(e) => {
                    print_error("uploading file", &e);
                    std::process::exit(1);
                }
            }
        }
        FileCommands::Download {
            project_id,
            src,
            dest,
            run,
            clone,
            gen,
        } => {
            let result = match (run, clone, gen) {
                (None, None, None) => client.get_project_file(*project_id, src, dest),
                (Some(run), None, None) => client.get_run_file(*project_id, *run, src, dest),
                (Some(run), Some(clone), None) => {
                    client.get_clone_file(*project_id, *run, *clone, src, dest)
                }
                (Some(run), Some(clone), Some(gen)) => {
                    client.get_gen_file(*project_id, *run, *clone, *gen, src, dest)
                }
                _ => invalid_scope("--clone requires --run, and --gen requires both"),
            };
            match result {
                Ok(()) => println!("Downloaded {} to {}", src, dest.display()),
                Err(e) => {
                    print_error("downloading file", &e);
                    std::process::exit(1);
                }
            }
        }
        FileCommands::Delete {
            project_id,
            path,
            run,
        } => {
            let result = match run {
                None => client.delete_project_file(*project_id, path),
                Some(run) => client.delete_run_file(*project_id, *run, path),
            };
            match result {
                Ok(()) => println!("Deleted {}", path),
                Err(e) => {
                    print_error("deleting file", &e);
                    std::process::exit(1);
                }
            }
        }
    }
}
