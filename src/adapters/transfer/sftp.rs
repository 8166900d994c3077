//! SFTP transfer session backed by libssh2
//!
//! Wraps the blocking `ssh2` client behind the async [`TransferSession`]
//! trait; every operation runs on the blocking thread pool. Authentication
//! prefers a passphrase-protected keyfile, then a plain keyfile, then
//! username/password, in that order. The configured timeout applies to the
//! TCP connect and, via the libssh2 session timeout, to every subsequent
//! operation.

use crate::adapters::transfer::traits::TransferSession;
use crate::config::schema::TransferConfig;
use crate::domain::errors::TransferError;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use ssh2::{CheckResult, ErrorCode, KnownHostFileKind, Session};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

// SFTP status codes of interest (draft-ietf-secsh-filexfer)
const SFTP_NO_SUCH_FILE: i32 = 2;
const SFTP_NO_SUCH_PATH: i32 = 10;
// libssh2 session-level timeout code
const SSH_ERROR_TIMEOUT: i32 = -9;

pub struct SftpSession {
    inner: Arc<Mutex<SftpInner>>,
}

struct SftpInner {
    session: Session,
    sftp: ssh2::Sftp,
    cwd: PathBuf,
}

struct ConnectParams {
    host: String,
    port: u16,
    username: String,
    password: Option<String>,
    keyfile: Option<PathBuf>,
    known_hosts: Option<PathBuf>,
    timeout: Duration,
}

impl SftpSession {
    pub async fn connect(config: &TransferConfig) -> Result<Self, TransferError> {
        let params = ConnectParams {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            password: config
                .password
                .as_ref()
                .map(|secret| secret.expose_secret().as_ref().to_string()),
            keyfile: config.keyfile.as_ref().map(PathBuf::from),
            known_hosts: config.known_hosts.as_ref().map(PathBuf::from),
            timeout: Duration::from_secs(config.timeout_secs),
        };

        let inner = tokio::task::spawn_blocking(move || SftpInner::connect(params))
            .await
            .map_err(join_error)??;

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
        })
    }

    async fn with_inner<T, F>(&self, op: F) -> Result<T, TransferError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SftpInner) -> Result<T, TransferError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut guard = inner
                .lock()
                .map_err(|_| TransferError::Protocol("session lock poisoned".to_string()))?;
            op(&mut guard)
        })
        .await
        .map_err(join_error)?
    }
}

impl SftpInner {
    fn connect(params: ConnectParams) -> Result<Self, TransferError> {
        let address = format!("{}:{}", params.host, params.port);
        let socket_addr = address
            .to_socket_addrs()
            .map_err(|err| TransferError::ConnectionFailed(format!("{address}: {err}")))?
            .next()
            .ok_or_else(|| {
                TransferError::ConnectionFailed(format!("{address}: no address resolved"))
            })?;
        let stream = TcpStream::connect_timeout(&socket_addr, params.timeout)
            .map_err(|err| TransferError::ConnectionFailed(format!("{address}: {err}")))?;

        let mut session = Session::new().map_err(map_ssh)?;
        session.set_timeout(params.timeout.as_millis() as u32);
        session.set_tcp_stream(stream);
        session
            .handshake()
            .map_err(|err| TransferError::ConnectionFailed(err.to_string()))?;

        if let Some(known_hosts) = &params.known_hosts {
            verify_host_key(&session, &params.host, params.port, known_hosts)?;
        }

        // auth order: passphrase-protected keyfile, plain keyfile, password
        match (&params.keyfile, &params.password) {
            (Some(keyfile), Some(passphrase)) => session.userauth_pubkey_file(
                &params.username,
                None,
                keyfile,
                Some(passphrase.as_str()),
            ),
            (Some(keyfile), None) => {
                session.userauth_pubkey_file(&params.username, None, keyfile, None)
            }
            (None, Some(password)) => session.userauth_password(&params.username, password),
            (None, None) => {
                return Err(TransferError::AuthenticationFailed(
                    "neither password nor keyfile configured".to_string(),
                ))
            }
        }
        .map_err(|err| TransferError::AuthenticationFailed(err.to_string()))?;

        if !session.authenticated() {
            return Err(TransferError::AuthenticationFailed(
                "authentication rejected by server".to_string(),
            ));
        }

        let sftp = session.sftp().map_err(map_ssh)?;
        debug!(host = %params.host, port = params.port, "sftp session established");

        Ok(Self {
            session,
            sftp,
            cwd: PathBuf::from("."),
        })
    }

    fn resolve(&self, name: &str) -> PathBuf {
        if name.starts_with('/') {
            PathBuf::from(name)
        } else {
            self.cwd.join(name)
        }
    }

    fn change_folder(&mut self, name: &str) -> Result<(), TransferError> {
        let target = self.resolve(name);
        // opendir doubles as the existence check; there is no cd in sftp
        self.sftp.opendir(&target).map_err(map_ssh)?;
        self.cwd = target;
        Ok(())
    }

    fn list(&mut self) -> Result<Vec<String>, TransferError> {
        let entries = self.sftp.readdir(&self.cwd).map_err(map_ssh)?;
        let mut names: Vec<String> = entries
            .iter()
            .filter_map(|(path, _stat)| path.file_name())
            .filter_map(|name| name.to_str())
            .map(str::to_string)
            .collect();
        names.sort();
        Ok(names)
    }

    fn download(&mut self, name: &str, dest_dir: &Path) -> Result<PathBuf, TransferError> {
        let mut remote = self.sftp.open(&self.resolve(name)).map_err(map_ssh)?;
        let dest = dest_dir.join(name);
        let mut local = std::fs::File::create(&dest)
            .map_err(|err| TransferError::Io(format!("{}: {err}", dest.display())))?;
        std::io::copy(&mut remote, &mut local)
            .map_err(|err| TransferError::Io(format!("download {name}: {err}")))?;
        Ok(dest)
    }

    fn upload(&mut self, local: &Path) -> Result<(), TransferError> {
        let name = local
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| TransferError::Io(format!("{} has no filename", local.display())))?;
        let mut source = std::fs::File::open(local)
            .map_err(|err| TransferError::Io(format!("{}: {err}", local.display())))?;
        let mut remote = self.sftp.create(&self.resolve(name)).map_err(map_ssh)?;
        std::io::copy(&mut source, &mut remote)
            .map_err(|err| TransferError::Io(format!("upload {name}: {err}")))?;
        Ok(())
    }

    fn make_folder(&mut self, name: &str) -> Result<(), TransferError> {
        self.sftp.mkdir(&self.resolve(name), 0o755).map_err(map_ssh)
    }

    fn delete(&mut self, name: &str) -> Result<(), TransferError> {
        self.sftp.unlink(&self.resolve(name)).map_err(map_ssh)
    }

    fn close(&mut self) -> Result<(), TransferError> {
        self.session
            .disconnect(None, "export finished", None)
            .map_err(map_ssh)
    }
}

#[async_trait]
impl TransferSession for SftpSession {
    async fn change_folder(&mut self, name: &str) -> Result<(), TransferError> {
        let name = name.to_string();
        self.with_inner(move |inner| inner.change_folder(&name)).await
    }

    async fn list(&mut self) -> Result<Vec<String>, TransferError> {
        self.with_inner(|inner| inner.list()).await
    }

    async fn download(&mut self, name: &str, dest_dir: &Path) -> Result<PathBuf, TransferError> {
        let name = name.to_string();
        let dest_dir = dest_dir.to_path_buf();
        self.with_inner(move |inner| inner.download(&name, &dest_dir))
            .await
    }

    async fn upload(&mut self, local: &Path) -> Result<(), TransferError> {
        let local = local.to_path_buf();
        self.with_inner(move |inner| inner.upload(&local)).await
    }

    async fn make_folder(&mut self, name: &str) -> Result<(), TransferError> {
        let name = name.to_string();
        self.with_inner(move |inner| inner.make_folder(&name)).await
    }

    async fn delete(&mut self, name: &str) -> Result<(), TransferError> {
        let name = name.to_string();
        self.with_inner(move |inner| inner.delete(&name)).await
    }

    async fn close(&mut self) -> Result<(), TransferError> {
        self.with_inner(|inner| inner.close()).await
    }
}

fn verify_host_key(
    session: &Session,
    host: &str,
    port: u16,
    file: &Path,
) -> Result<(), TransferError> {
    let mut known_hosts = session.known_hosts().map_err(map_ssh)?;
    known_hosts
        .read_file(file, KnownHostFileKind::OpenSSH)
        .map_err(|err| {
            TransferError::HostKeyMismatch(format!(
                "cannot read known hosts {}: {err}",
                file.display()
            ))
        })?;
    let (key, _key_type) = session.host_key().ok_or_else(|| {
        TransferError::HostKeyMismatch("server offered no host key".to_string())
    })?;
    match known_hosts.check_port(host, port, key) {
        CheckResult::Match => Ok(()),
        CheckResult::NotFound => Err(TransferError::HostKeyMismatch(format!(
            "{host} is not present in the known hosts file"
        ))),
        CheckResult::Mismatch => Err(TransferError::HostKeyMismatch(format!(
            "host key for {host} does not match the known hosts file"
        ))),
        CheckResult::Failure => Err(TransferError::HostKeyMismatch(
            "host key check failed".to_string(),
        )),
    }
}

fn map_ssh(err: ssh2::Error) -> TransferError {
    match err.code() {
        ErrorCode::SFTP(SFTP_NO_SUCH_FILE) | ErrorCode::SFTP(SFTP_NO_SUCH_PATH) => {
            TransferError::NotFound(err.to_string())
        }
        ErrorCode::Session(SSH_ERROR_TIMEOUT) => TransferError::Timeout(err.to_string()),
        _ => TransferError::Protocol(err.to_string()),
    }
}

fn join_error(err: tokio::task::JoinError) -> TransferError {
    TransferError::Protocol(format!("blocking task failed: {err}"))
}
