//! The hierarchy client: typed operations over the assignment server and
//! work server REST interfaces.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info};
use validator::Validate;

use crate::client::credentials::Credential;
use crate::client::errors::FahError;
use crate::client::transport::{Transport, TransportOptions};
use crate::config::ClientConfig;
use crate::models::{
    ASProjectData, ASWorkServerData, FileData, JobAction, JobActionRequest, JobData, JobResults,
    ProjectData,
};

/// Client for one assignment server / work server pair.
///
/// Stateless beyond its immutable credential and configuration: every
/// operation is a single synchronous request, and a single instance may be
/// shared across threads. Concurrency control across callers (in particular
/// around [`FahClient::create_run`]) is the caller's responsibility.
pub struct FahClient {
    as_api_url: String,
    ws_api_url: String,
    ws_ip_addr: Ipv4Addr,
    transport: Transport,
}

impl FahClient {
    /// Build a client from explicit parts.
    pub fn new(
        as_api_url: &str,
        ws_api_url: &str,
        ws_ip_addr: Ipv4Addr,
        credential: &Credential,
        options: &TransportOptions,
    ) -> Result<Self, FahError> {
        let transport = Transport::new(credential, options)?;
        debug!(
            "client ready: as={} ws={} ip={}",
            as_api_url, ws_api_url, ws_ip_addr
        );
        Ok(FahClient {
            as_api_url: as_api_url.to_string(),
            ws_api_url: ws_api_url.to_string(),
            ws_ip_addr,
            transport,
        })
    }

    /// Build a client from configuration, loading the credential pair from
    /// the configured PEM files.
    pub fn from_config(config: &ClientConfig) -> Result<Self, FahError> {
        let credential = Credential::load(&config.certificate_file, &config.key_file)?;
        Self::new(
            &config.as_api_url,
            &config.ws_api_url,
            config.ws_ip_addr,
            &credential,
            &config.transport_options(),
        )
    }

    // ---- assignment server ----

    /// Get this work server's record from the assignment server.
    pub fn as_get_work_server(&self) -> Result<ASWorkServerData, FahError> {
        self.transport
            .get(&self.as_api_url, &format!("/ws/{}", self.ws_ip_addr), &[])
    }

    /// Set this work server's record on the assignment server.
    pub fn as_set_work_server(&self, data: &ASWorkServerData) -> Result<(), FahError> {
        self.transport
            .put(&self.as_api_url, &format!("/ws/{}", self.ws_ip_addr), data)
    }

    /// Get a project's record on the assignment server.
    pub fn as_get_project(&self, project_id: u32) -> Result<ASProjectData, FahError> {
        self.transport.get(
            &self.as_api_url,
            &format!("/ws/{}/projects/{}", self.ws_ip_addr, project_id),
            &[],
        )
    }

    /// Set a project's weight and constraints on the assignment server.
    pub fn as_set_project(
        &self,
        project_id: u32,
        weight: f64,
        constraints: &str,
    ) -> Result<(), FahError> {
        let data = ASProjectData {
            ws: None,
            weight,
            constraints: constraints.to_string(),
        };
        self.transport.put(
            &self.as_api_url,
            &format!("/ws/{}/projects/{}", self.ws_ip_addr, project_id),
            &data,
        )
    }

    /// Reset a project on the assignment server: weight 0, no constraints.
    pub fn as_reset_project(&self, project_id: u32) -> Result<(), FahError> {
        self.as_set_project(project_id, 0.0, "")
    }

    // ---- projects ----

    /// List all projects on the work server, keyed by project id.
    pub fn list_projects(&self) -> Result<BTreeMap<String, ProjectData>, FahError> {
        self.transport.get(&self.ws_api_url, "/projects", &[])
    }

    /// Create a project. The same write path as [`FahClient::update_project`];
    /// creating over an existing record is an idempotent upsert.
    pub fn create_project(&self, project_id: u32, data: &ProjectData) -> Result<(), FahError> {
        data.validate()?;
        self.transport
            .put(&self.ws_api_url, &format!("/projects/{}", project_id), data)
    }

    /// Update a project record.
    pub fn update_project(&self, project_id: u32, data: &ProjectData) -> Result<(), FahError> {
        self.create_project(project_id, data)
    }

    pub fn delete_project(&self, project_id: u32) -> Result<(), FahError> {
        self.transport
            .delete(&self.ws_api_url, &format!("/projects/{}", project_id))
    }

    pub fn get_project(&self, project_id: u32) -> Result<ProjectData, FahError> {
        self.transport
            .get(&self.ws_api_url, &format!("/projects/{}", project_id), &[])
    }

    // ---- project files ----

    /// List the files in the PROJECT directory tree.
    pub fn list_project_files(&self, project_id: u32) -> Result<Vec<FileData>, FahError> {
        self.transport
            .get(&self.ws_api_url, &format!("/projects/{}/files", project_id), &[])
    }

    /// Upload a local file to `dest`, relative to the PROJECT directory.
    pub fn create_project_file(
        &self,
        project_id: u32,
        src: &Path,
        dest: &str,
    ) -> Result<(), FahError> {
        self.transport.upload(
            &self.ws_api_url,
            &format!("/projects/{}/files/{}", project_id, dest),
            src,
        )
    }

    /// Upload in-memory content to `dest`, relative to the PROJECT directory.
    pub fn create_project_file_from_bytes(
        &self,
        project_id: u32,
        content: Vec<u8>,
        dest: &str,
    ) -> Result<(), FahError> {
        self.transport.put_bytes(
            &self.ws_api_url,
            &format!("/projects/{}/files/{}", project_id, dest),
            content,
        )
    }

    /// Download `src` from the PROJECT directory tree to a local path.
    pub fn get_project_file(
        &self,
        project_id: u32,
        src: &str,
        dest: &Path,
    ) -> Result<(), FahError> {
        self.transport.download(
            &self.ws_api_url,
            &format!("/projects/{}/files/{}", project_id, src),
            dest,
        )
    }

    /// Download `src` from the PROJECT directory tree into memory.
    pub fn get_project_file_to_bytes(
        &self,
        project_id: u32,
        src: &str,
    ) -> Result<Vec<u8>, FahError> {
        self.transport.get_bytes(
            &self.ws_api_url,
            &format!("/projects/{}/files/{}", project_id, src),
        )
    }

    /// Delete a file from the PROJECT directory tree.
    pub fn delete_project_file(&self, project_id: u32, path: &str) -> Result<(), FahError> {
        self.transport.delete(
            &self.ws_api_url,
            &format!("/projects/{}/files/{}", project_id, path),
        )
    }

    // ---- jobs ----

    /// List the project's jobs whose state changed at or after `since`,
    /// along with the server timestamp to use for the next poll. With no
    /// `since`, all jobs are returned.
    pub fn get_project_jobs(
        &self,
        project_id: u32,
        since: Option<&DateTime<Utc>>,
    ) -> Result<JobResults, FahError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(since) = since {
            query.push(("since", since.to_rfc3339()));
        }
        self.transport.get(
            &self.ws_api_url,
            &format!("/projects/{}/jobs", project_id),
            &query,
        )
    }

    // ---- runs ----

    /// Create the next run for a project and return its id.
    ///
    /// The run id is allocated sequentially from the project's `runs` count:
    /// ids are zero-based, never gap-filled, and deleted ids are never
    /// reused. The four artifact files are uploaded to
    /// `RUN{run_id}/` under their original file names, then the project
    /// record is persisted with `runs` incremented by exactly one.
    ///
    /// Not transactional: if any upload fails the counter is left untouched,
    /// so a retry reuses the same run id and overwrites any partial
    /// directory. The read-modify-write on the counter is also racy across
    /// concurrent callers targeting one project; serialize such callers
    /// externally.
    pub fn create_run(
        &self,
        project_id: u32,
        core_file: &Path,
        system_file: &Path,
        state_file: &Path,
        integrator_file: &Path,
    ) -> Result<u32, FahError> {
        let mut project = self.get_project(project_id)?;
        let run_id = project.runs;

        for src in [core_file, system_file, state_file, integrator_file] {
            let name = file_name(src)?;
            self.transport.upload(
                &self.ws_api_url,
                &format!("/projects/{}/files/RUN{}/{}", project_id, run_id, name),
                src,
            )?;
        }

        project.runs += 1;
        self.update_project(project_id, &project)?;

        info!("created run {} for project {}", run_id, project_id);
        Ok(run_id)
    }

    /// Upload a local file to `dest`, relative to the run directory.
    pub fn create_run_file(
        &self,
        project_id: u32,
        run_id: u32,
        src: &Path,
        dest: &str,
    ) -> Result<(), FahError> {
        self.transport.upload(
            &self.ws_api_url,
            &format!("/projects/{}/files/RUN{}/{}", project_id, run_id, dest),
            src,
        )
    }

    /// Delete a file from the run directory.
    pub fn delete_run_file(
        &self,
        project_id: u32,
        run_id: u32,
        path: &str,
    ) -> Result<(), FahError> {
        self.transport.delete(
            &self.ws_api_url,
            &format!("/projects/{}/files/RUN{}/{}", project_id, run_id, path),
        )
    }

    /// Download `src` from the run directory to a local path.
    pub fn get_run_file(
        &self,
        project_id: u32,
        run_id: u32,
        src: &str,
        dest: &Path,
    ) -> Result<(), FahError> {
        self.transport.download(
            &self.ws_api_url,
            &format!("/projects/{}/files/RUN{}/{}", project_id, run_id, src),
            dest,
        )
    }

    // ---- clones ----

    /// Request instantiation of a clone job slot.
    ///
    /// The server creates the job in NEW/READY; every later transition is
    /// server-driven and only observable through [`FahClient::get_clone`].
    /// The caller must pick a `clone_id` that does not collide with an
    /// existing non-terminal clone; the server is not assumed to check.
    pub fn create_clone(&self, project_id: u32, run_id: u32, clone_id: u32) -> Result<(), FahError> {
        let request = JobActionRequest {
            action: JobAction::Create,
        };
        self.transport.put(
            &self.ws_api_url,
            &format!(
                "/projects/{}/runs/{}/clones/{}",
                project_id, run_id, clone_id
            ),
            &request,
        )
    }

    /// Get the current state snapshot for a clone.
    pub fn get_clone(&self, project_id: u32, run_id: u32, clone_id: u32) -> Result<JobData, FahError> {
        self.transport.get(
            &self.ws_api_url,
            &format!(
                "/projects/{}/runs/{}/clones/{}",
                project_id, run_id, clone_id
            ),
            &[],
        )
    }

    /// List the files in a clone's directory.
    pub fn list_clone_files(
        &self,
        project_id: u32,
        run_id: u32,
        clone_id: u32,
    ) -> Result<Vec<FileData>, FahError> {
        self.transport.get(
            &self.ws_api_url,
            &format!(
                "/projects/{}/runs/{}/clones/{}/files",
                project_id, run_id, clone_id
            ),
            &[],
        )
    }

    /// Download `src` from a clone's directory to a local path.
    pub fn get_clone_file(
        &self,
        project_id: u32,
        run_id: u32,
        clone_id: u32,
        src: &str,
        dest: &Path,
    ) -> Result<(), FahError> {
        self.transport.download(
            &self.ws_api_url,
            &format!(
                "/projects/{}/runs/{}/clones/{}/files/{}",
                project_id, run_id, clone_id, src
            ),
            dest,
        )
    }

    // ---- generations ----

    /// List the output files of one generation.
    ///
    /// Generations are produced by remote execution; there is no create
    /// operation at this level.
    pub fn list_gen_files(
        &self,
        project_id: u32,
        run_id: u32,
        clone_id: u32,
        gen_id: u32,
    ) -> Result<Vec<FileData>, FahError> {
        self.transport.get(
            &self.ws_api_url,
            &format!(
                "/projects/{}/runs/{}/clones/{}/gens/{}/files",
                project_id, run_id, clone_id, gen_id
            ),
            &[],
        )
    }

    /// Download one generation output file to a local path.
    pub fn get_gen_file(
        &self,
        project_id: u32,
        run_id: u32,
        clone_id: u32,
        gen_id: u32,
        src: &str,
        dest: &Path,
    ) -> Result<(), FahError> {
        self.transport.download(
            &self.ws_api_url,
            &format!(
                "/projects/{}/runs/{}/clones/{}/gens/{}/files/{}",
                project_id, run_id, clone_id, gen_id, src
            ),
            dest,
        )
    }
}

fn file_name(path: &Path) -> Result<&str, FahError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| FahError::Validation {
            message: format!("artifact path `{}` has no usable file name", path.display()),
        })
}
