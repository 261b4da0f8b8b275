//! [`DownloadHost`] backed by libcurl, used by the native-messaging process.
//!
//! Each accepted download gets the next id, reserves its target name in the
//! download directory, and transfers on its own thread into a `.part` file
//! that is renamed into place on success.

use super::host::{ConflictAction, DownloadHost, DownloadId, DownloadOptions, HostError};
use anyhow::{Context, Result};
use std::collections::{HashMap, VecDeque};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::Duration;

/// Suffix of in-progress files.
const TEMP_SUFFIX: &str = ".part";

/// Upper bound on ` (n)` suffixes tried before giving up.
const MAX_UNIQUIFY: u32 = 9999;

/// Results of reaped transfers kept for a later `wait`.
const RECENT_RESULTS: usize = 32;

type Transfer = JoinHandle<Result<PathBuf>>;

pub struct CurlDownloadHost {
    download_dir: PathBuf,
    next_id: AtomicU64,
    transfers: Mutex<HashMap<DownloadId, Transfer>>,
    recent: Mutex<VecDeque<(DownloadId, Result<PathBuf>)>>,
}

impl CurlDownloadHost {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
            next_id: AtomicU64::new(1),
            transfers: Mutex::new(HashMap::new()),
            recent: Mutex::new(VecDeque::new()),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Blocks until download `id` finishes; returns the final path.
    ///
    /// Works for a download that was already reaped as long as it is among the
    /// last few finished ones.
    pub fn wait(&self, id: DownloadId) -> Result<PathBuf> {
        let handle = self
            .transfers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
        match handle {
            Some(handle) => join_transfer(id, handle),
            None => {
                let mut recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
                let pos = recent
                    .iter()
                    .position(|(done, _)| *done == id)
                    .with_context(|| format!("no running download with id {id}"))?;
                recent
                    .remove(pos)
                    .map(|(_, result)| result)
                    .with_context(|| format!("no running download with id {id}"))?
            }
        }
    }

    /// Downloads still in flight, after reaping finished ones.
    pub fn active_transfers(&self) -> usize {
        self.reap_finished();
        self.transfers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Joins and logs every transfer whose thread has exited.
    fn reap_finished(&self) {
        let done: Vec<(DownloadId, Transfer)> = {
            let mut transfers = self.transfers.lock().unwrap_or_else(|e| e.into_inner());
            let ids: Vec<DownloadId> = transfers
                .iter()
                .filter(|(_, handle)| handle.is_finished())
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| transfers.remove(&id).map(|handle| (id, handle)))
                .collect()
        };
        if done.is_empty() {
            return;
        }
        let mut recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
        for (id, handle) in done {
            let result = join_transfer(id, handle);
            log_outcome(id, &result);
            recent.push_back((id, result));
            while recent.len() > RECENT_RESULTS {
                recent.pop_front();
            }
        }
    }

    /// Blocks until every started download finishes, logging failures.
    pub fn wait_all(&self) {
        let handles: Vec<(DownloadId, Transfer)> = self
            .transfers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain()
            .collect();
        for (id, handle) in handles {
            log_outcome(id, &join_transfer(id, handle));
        }
    }
}

fn join_transfer(id: DownloadId, handle: Transfer) -> Result<PathBuf> {
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("download {id} thread panicked"))?
}

fn log_outcome(id: DownloadId, result: &Result<PathBuf>) {
    match result {
        Ok(path) => tracing::info!(download_id = %id, path = %path.display(), "download finished"),
        Err(e) => tracing::warn!(download_id = %id, "download failed: {:#}", e),
    }
}

impl DownloadHost for CurlDownloadHost {
    fn start_download(&self, options: DownloadOptions) -> Result<DownloadId, HostError> {
        self.reap_finished();
        if options.save_as {
            return Err(HostError::Rejected("save-as prompts are not supported".into()));
        }
        validate_url(&options.url)?;
        validate_filename(&options.filename)?;

        let (final_path, part_file) =
            resolve_target(&self.download_dir, &options.filename, options.conflict_action)?;
        let id = DownloadId(self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::info!(download_id = %id, path = %final_path.display(), "download accepted");

        let url = options.url;
        let handle = std::thread::spawn(move || {
            let result = fetch_into(&url, part_file, &final_path);
            if result.is_err() {
                let _ = std::fs::remove_file(temp_path(&final_path));
            }
            result.map(|()| final_path)
        });
        self.transfers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, handle);
        Ok(id)
    }
}

fn validate_url(raw: &str) -> Result<(), HostError> {
    let parsed = url::Url::parse(raw).map_err(|e| HostError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(HostError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

/// Filenames must be a single relative path component.
fn validate_filename(name: &str) -> Result<(), HostError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        return Err(HostError::InvalidFilename(name.to_string()));
    }
    Ok(())
}

fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// `name.mp4` → `name (n).mp4`; names without an extension get the suffix at the end.
fn numbered_name(filename: &str, n: u32) -> String {
    match filename.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({}){}", &filename[..dot], n, &filename[dot..]),
        _ => format!("{filename} ({n})"),
    }
}

/// Picks the final path for `filename` in `dir` and opens its `.part` file.
///
/// With [`ConflictAction::Uniquify`] the first free name among `filename`,
/// `filename (1)`, ... is reserved by creating its `.part` file exclusively, so
/// concurrent downloads never share a target. [`ConflictAction::Overwrite`]
/// always targets `filename`.
pub fn resolve_target(
    dir: &Path,
    filename: &str,
    action: ConflictAction,
) -> Result<(PathBuf, File), HostError> {
    std::fs::create_dir_all(dir)?;
    match action {
        ConflictAction::Overwrite => {
            let final_path = dir.join(filename);
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(temp_path(&final_path))?;
            Ok((final_path, file))
        }
        ConflictAction::Uniquify => {
            for n in 0..=MAX_UNIQUIFY {
                let candidate = if n == 0 {
                    filename.to_string()
                } else {
                    numbered_name(filename, n)
                };
                let final_path = dir.join(&candidate);
                if final_path.exists() {
                    continue;
                }
                match OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(temp_path(&final_path))
                {
                    Ok(file) => return Ok((final_path, file)),
                    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                    Err(e) => return Err(e.into()),
                }
            }
            Err(HostError::Rejected(format!(
                "no free name for {filename:?} after {MAX_UNIQUIFY} attempts"
            )))
        }
    }
}

fn fetch_into(url: &str, mut file: File, final_path: &Path) -> Result<()> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(Duration::from_secs(30))?;
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(Duration::from_secs(60))?;

    let mut write_err: Option<io::Error> = None;
    let performed = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| match file.write_all(data) {
            Ok(()) => Ok(data.len()),
            Err(e) => {
                tracing::warn!("download write failed: {}", e);
                write_err = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        transfer.perform()
    };
    if let Some(e) = write_err {
        return Err(e).context("write download file");
    }
    performed.context("GET request failed")?;

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("GET {} returned HTTP {}", url, code);
    }
    file.sync_all().context("sync download file")?;
    drop(file);
    std::fs::rename(temp_path(final_path), final_path)
        .with_context(|| format!("rename into {}", final_path.display()))?;
    Ok(())
}
