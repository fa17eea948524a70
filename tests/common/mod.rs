#![allow(dead_code)]

//! Shared test infrastructure: an in-process stub of the work server and
//! assignment server APIs, plus credential fixtures.
//!
//! The stub speaks just enough HTTP/1.1 for the blocking client: one
//! `Content-Length`-framed request/response pair at a time on a keep-alive
//! connection. State is shared behind a mutex so tests can seed records and
//! flip the clone-completion hook directly.

use std::collections::{BTreeMap, HashMap};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;

use chrono::{DateTime, TimeZone, Utc};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::x509::{X509, X509NameBuilder};
use tempfile::TempDir;

use fahctl::client::credentials;
use fahctl::client::transport::TransportOptions;
use fahctl::client::FahClient;
use fahctl::models::{
    ASProjectData, ASWorkServerData, FileData, JobData, JobResults, JobState, ProjectData,
};

/// Deterministic timestamp used for server-reported file metadata.
pub fn fixed_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()
}

#[derive(Default)]
pub struct ServerState {
    pub projects: HashMap<u32, ProjectData>,
    pub as_projects: HashMap<u32, ASProjectData>,
    pub ws_record: Option<ASWorkServerData>,
    /// Uploaded file content keyed by (project, path).
    pub files: BTreeMap<(u32, String), Vec<u8>>,
    pub clones: HashMap<(u32, u32, u32), JobData>,
    pub clone_files: HashMap<(u32, u32, u32), Vec<FileData>>,
    pub gen_files: HashMap<(u32, u32, u32, u32), Vec<FileData>>,
    /// When set, every file upload fails with a 500.
    pub fail_uploads: bool,
}

pub struct StubServer {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<ServerState>>,
}

impl StubServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let addr = listener.local_addr().expect("stub server address");
        let state = Arc::new(Mutex::new(ServerState::default()));

        let accept_state = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let connection_state = Arc::clone(&accept_state);
                thread::spawn(move || serve_connection(stream, connection_state));
            }
        });

        StubServer { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Mark a clone complete, the way the real work server would after
    /// remote execution returns the final generation.
    pub fn finish_clone(&self, project_id: u32, run_id: u32, clone_id: u32) {
        let mut state = self.state.lock().unwrap();
        if let Some(job) = state.clones.get_mut(&(project_id, run_id, clone_id)) {
            job.state = JobState::Finished;
            job.gen = 1;
            job.last = Some(fixed_timestamp());
        }
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.state.lock().unwrap().fail_uploads = fail;
    }
}

fn serve_connection(stream: TcpStream, state: Arc<Mutex<ServerState>>) {
    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(clone) => clone,
        Err(_) => return,
    });
    let mut stream = stream;

    loop {
        let mut request_line = String::new();
        match reader.read_line(&mut request_line) {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let request_line = request_line.trim_end();
        if request_line.is_empty() {
            continue;
        }
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or("").to_string();
        let target = parts.next().unwrap_or("").to_string();

        let mut content_length = 0usize;
        loop {
            let mut header = String::new();
            match reader.read_line(&mut header) {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
            let header = header.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
        }

        let mut body = vec![0u8; content_length];
        if content_length > 0 && reader.read_exact(&mut body).is_err() {
            return;
        }

        let path = target.split('?').next().unwrap_or("");
        let (status, response) = route(&state, &method, path, &body);
        let reason = match status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            500 => "Internal Server Error",
            _ => "Error",
        };
        let header = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n",
            status,
            reason,
            response.len()
        );
        if stream.write_all(header.as_bytes()).is_err()
            || stream.write_all(&response).is_err()
            || stream.flush().is_err()
        {
            return;
        }
    }
}

fn json(value: &impl serde::Serialize) -> Vec<u8> {
    serde_json::to_vec(value).expect("serialize stub response")
}

fn route(
    state: &Arc<Mutex<ServerState>>,
    method: &str,
    path: &str,
    body: &[u8],
) -> (u16, Vec<u8>) {
    let mut state = state.lock().unwrap();
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        // ---- assignment server ----
        ("GET", ["ws", _ip]) => match &state.ws_record {
            Some(record) => (200, json(record)),
            None => (404, b"no work server record".to_vec()),
        },
        ("PUT", ["ws", _ip]) => match serde_json::from_slice::<ASWorkServerData>(body) {
            Ok(record) => {
                state.ws_record = Some(record);
                (200, b"{}".to_vec())
            }
            Err(e) => (400, e.to_string().into_bytes()),
        },
        ("GET", ["ws", ip, "projects", id]) => {
            let Ok(project_id) = id.parse::<u32>() else {
                return (400, b"bad project id".to_vec());
            };
            match state.as_projects.get(&project_id) {
                Some(record) => {
                    let mut record = record.clone();
                    record.ws = ip.parse().ok();
                    (200, json(&record))
                }
                None => (404, b"no such project".to_vec()),
            }
        }
        ("PUT", ["ws", _ip, "projects", id]) => {
            let Ok(project_id) = id.parse::<u32>() else {
                return (400, b"bad project id".to_vec());
            };
            match serde_json::from_slice::<ASProjectData>(body) {
                Ok(record) => {
                    state.as_projects.insert(project_id, record);
                    (200, b"{}".to_vec())
                }
                Err(e) => (400, e.to_string().into_bytes()),
            }
        }

        // ---- work server: projects ----
        ("GET", ["projects"]) => {
            let listing: BTreeMap<String, &ProjectData> = state
                .projects
                .iter()
                .map(|(id, project)| (id.to_string(), project))
                .collect();
            (200, json(&listing))
        }
        ("GET", ["projects", id]) => {
            let Ok(project_id) = id.parse::<u32>() else {
                return (400, b"bad project id".to_vec());
            };
            match state.projects.get(&project_id) {
                Some(project) => (200, json(project)),
                None => (404, b"no such project".to_vec()),
            }
        }
        ("PUT", ["projects", id]) => {
            let Ok(project_id) = id.parse::<u32>() else {
                return (400, b"bad project id".to_vec());
            };
            match serde_json::from_slice::<ProjectData>(body) {
                Ok(project) => {
                    state.projects.insert(project_id, project);
                    (200, b"{}".to_vec())
                }
                Err(e) => (400, e.to_string().into_bytes()),
            }
        }
        ("DELETE", ["projects", id]) => {
            let Ok(project_id) = id.parse::<u32>() else {
                return (400, b"bad project id".to_vec());
            };
            match state.projects.remove(&project_id) {
                Some(_) => (200, b"{}".to_vec()),
                None => (404, b"no such project".to_vec()),
            }
        }

        // ---- work server: jobs ----
        ("GET", ["projects", id, "jobs"]) => {
            let Ok(project_id) = id.parse::<u32>() else {
                return (400, b"bad project id".to_vec());
            };
            let jobs: Vec<JobData> = state
                .clones
                .values()
                .filter(|job| job.project == project_id)
                .cloned()
                .collect();
            let results = JobResults {
                jobs,
                ts: fixed_timestamp(),
            };
            (200, json(&results))
        }

        // ---- work server: project files ----
        ("GET", ["projects", id, "files"]) => {
            let Ok(project_id) = id.parse::<u32>() else {
                return (400, b"bad project id".to_vec());
            };
            let listing: Vec<FileData> = state
                .files
                .iter()
                .filter(|((owner, _), _)| *owner == project_id)
                .map(|((_, path), content)| FileData {
                    path: path.clone(),
                    size: content.len() as u64,
                    modified: fixed_timestamp(),
                })
                .collect();
            (200, json(&listing))
        }
        ("PUT", ["projects", id, "files", rest @ ..]) if !rest.is_empty() => {
            let Ok(project_id) = id.parse::<u32>() else {
                return (400, b"bad project id".to_vec());
            };
            if state.fail_uploads {
                return (500, b"upload failed".to_vec());
            }
            state
                .files
                .insert((project_id, rest.join("/")), body.to_vec());
            (200, b"{}".to_vec())
        }
        ("GET", ["projects", id, "files", rest @ ..]) if !rest.is_empty() => {
            let Ok(project_id) = id.parse::<u32>() else {
                return (400, b"bad project id".to_vec());
            };
            match state.files.get(&(project_id, rest.join("/"))) {
                Some(content) => (200, content.clone()),
                None => (404, b"no such file".to_vec()),
            }
        }
        ("DELETE", ["projects", id, "files", rest @ ..]) if !rest.is_empty() => {
            let Ok(project_id) = id.parse::<u32>() else {
                return (400, b"bad project id".to_vec());
            };
            match state.files.remove(&(project_id, rest.join("/"))) {
                Some(_) => (200, b"{}".to_vec()),
                None => (404, b"no such file".to_vec()),
            }
        }

        // ---- work server: clones and generations ----
        ("PUT", ["projects", id, "runs", run, "clones", clone]) => {
            let (Ok(project_id), Ok(run_id), Ok(clone_id)) =
                (id.parse::<u32>(), run.parse::<u32>(), clone.parse::<u32>())
            else {
                return (400, b"bad identifier".to_vec());
            };
            let core = state
                .projects
                .get(&project_id)
                .and_then(|project| {
                    u32::from_str_radix(project.core_id.trim_start_matches("0x"), 16).ok()
                })
                .unwrap_or(0);
            let job = JobData {
                server: 1,
                core,
                project: project_id,
                run: run_id,
                clone: clone_id,
                gen: 0,
                state: JobState::Ready,
                last: None,
                retries: None,
                assigns: None,
                progress: None,
            };
            state.clones.insert((project_id, run_id, clone_id), job);
            (200, b"{}".to_vec())
        }
        ("GET", ["projects", id, "runs", run, "clones", clone]) => {
            let (Ok(project_id), Ok(run_id), Ok(clone_id)) =
                (id.parse::<u32>(), run.parse::<u32>(), clone.parse::<u32>())
            else {
                return (400, b"bad identifier".to_vec());
            };
            match state.clones.get(&(project_id, run_id, clone_id)) {
                Some(job) => (200, json(job)),
                None => (404, b"no such clone".to_vec()),
            }
        }
        ("GET", ["projects", id, "runs", run, "clones", clone, "files"]) => {
            let (Ok(project_id), Ok(run_id), Ok(clone_id)) =
                (id.parse::<u32>(), run.parse::<u32>(), clone.parse::<u32>())
            else {
                return (400, b"bad identifier".to_vec());
            };
            let listing = state
                .clone_files
                .get(&(project_id, run_id, clone_id))
                .cloned()
                .unwrap_or_default();
            (200, json(&listing))
        }
        ("GET", ["projects", id, "runs", run, "clones", clone, "gens", gen, "files"]) => {
            let (Ok(project_id), Ok(run_id), Ok(clone_id), Ok(gen_id)) = (
                id.parse::<u32>(),
                run.parse::<u32>(),
                clone.parse::<u32>(),
                gen.parse::<u32>(),
            ) else {
                return (400, b"bad identifier".to_vec());
            };
            let listing = state
                .gen_files
                .get(&(project_id, run_id, clone_id, gen_id))
                .cloned()
                .unwrap_or_default();
            (200, json(&listing))
        }

        _ => (404, format!("no route for {} {}", method, path).into_bytes()),
    }
}

// ---- credential fixtures ----

fn self_signed_certificate(key: &PKey<Private>) -> X509 {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "test@example.org").unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(key).unwrap();
    builder
        .set_not_before(Asn1Time::days_from_now(0).unwrap().as_ref())
        .unwrap();
    builder
        .set_not_after(Asn1Time::days_from_now(365).unwrap().as_ref())
        .unwrap();
    builder.sign(key, MessageDigest::sha256()).unwrap();
    builder.build()
}

/// PEM-encoded (certificate, key) pair, generated once per test binary.
fn credential_pems() -> &'static (Vec<u8>, Vec<u8>) {
    static PEMS: OnceLock<(Vec<u8>, Vec<u8>)> = OnceLock::new();
    PEMS.get_or_init(|| {
        let key = credentials::create_key().expect("generate test key");
        let certificate = self_signed_certificate(&key);
        (
            certificate.to_pem().expect("encode test certificate"),
            key.rsa()
                .and_then(|rsa| rsa.private_key_to_pem())
                .expect("encode test key"),
        )
    })
}

/// Write the shared test credential pair into `dir`.
pub fn write_credentials(dir: &Path) -> (PathBuf, PathBuf) {
    let (certificate_pem, key_pem) = credential_pems();
    let certificate_file = dir.join("api-certificate.pem");
    let key_file = dir.join("api-private.pem");
    std::fs::write(&certificate_file, certificate_pem).expect("write test certificate");
    std::fs::write(&key_file, key_pem).expect("write test key");
    (certificate_file, key_file)
}

/// A stub server plus a client pointed at it.
pub struct TestContext {
    pub server: StubServer,
    pub client: FahClient,
    pub tempdir: TempDir,
}

pub fn start_test_context() -> TestContext {
    let server = StubServer::start();
    let tempdir = TempDir::new().expect("create tempdir");
    let (certificate_file, key_file) = write_credentials(tempdir.path());
    let credential = fahctl::client::Credential::load(&certificate_file, &key_file)
        .expect("load test credential");
    let client = FahClient::new(
        &server.base_url(),
        &server.base_url(),
        "127.0.0.1".parse().unwrap(),
        &credential,
        &TransportOptions::default(),
    )
    .expect("build test client");
    TestContext {
        server,
        client,
        tempdir,
    }
}
