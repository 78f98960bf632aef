// Durable checkpoints of the directory
// One JSON file per map; each file is replaced atomically (write temp, fsync, rename)

use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};
use uuid::Uuid;

use idmesh_api::model::{DirectorySnapshot, User};
use idmesh_common::IdmeshError;

pub const BY_LOGIN_NAME_FILE: &str = "users_by_login_name.json";
pub const BY_IDENTIFIER_FILE: &str = "users_by_identifier.json";

/// Checkpoint files under one data directory
#[derive(Clone, Debug)]
pub struct CheckpointStore {
    dir: PathBuf,
    sync: bool,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sync: true,
        }
    }

    /// Skip fsync calls, for tests on throwaway directories
    pub fn without_sync(mut self) -> Self {
        self.sync = false;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write both maps of `snapshot`, replacing the previous checkpoint.
    ///
    /// The login-name file is renamed into place first; `load` rebuilds from it
    /// when a crash lands between the two renames.
    pub fn save(&self, snapshot: &DirectorySnapshot) -> Result<(), IdmeshError> {
        self.save_inner(snapshot)
            .map_err(|e| IdmeshError::Persistence(format!("{:#}", e)))
    }

    fn save_inner(&self, snapshot: &DirectorySnapshot) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create {}", self.dir.display()))?;

        self.write_atomic(BY_LOGIN_NAME_FILE, &snapshot.by_login_name)?;
        self.write_atomic(BY_IDENTIFIER_FILE, &snapshot.by_identifier)?;

        debug!(
            dir = %self.dir.display(),
            users = snapshot.len(),
            "Checkpoint written"
        );
        Ok(())
    }

    fn write_atomic<T: Serialize>(&self, name: &str, value: &T) -> anyhow::Result<()> {
        let path = self.dir.join(name);
        let tmp = path.with_extension("json.tmp");

        let raw = serde_json::to_vec(value).with_context(|| format!("encode {}", name))?;
        fs::write(&tmp, raw).with_context(|| format!("write {}", tmp.display()))?;
        if self.sync {
            let file = OpenOptions::new()
                .read(true)
                .open(&tmp)
                .with_context(|| format!("open {}", tmp.display()))?;
            file.sync_data()
                .with_context(|| format!("sync {}", tmp.display()))?;
        }
        fs::rename(&tmp, &path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
        if self.sync
            && let Ok(dir) = OpenOptions::new().read(true).open(&self.dir)
        {
            let _ = dir.sync_data();
        }
        Ok(())
    }

    /// Read the last checkpoint; `None` when nothing was ever written
    pub fn load(&self) -> Result<Option<DirectorySnapshot>, IdmeshError> {
        self.load_inner()
            .map_err(|e| IdmeshError::Persistence(format!("{:#}", e)))
    }

    fn load_inner(&self) -> anyhow::Result<Option<DirectorySnapshot>> {
        let by_login_name: Option<BTreeMap<String, User>> = self.read(BY_LOGIN_NAME_FILE)?;
        let by_identifier: Option<BTreeMap<Uuid, User>> = self.read(BY_IDENTIFIER_FILE)?;

        let snapshot = match (by_login_name, by_identifier) {
            (None, None) => return Ok(None),
            (Some(by_login_name), Some(by_identifier)) => DirectorySnapshot {
                by_login_name,
                by_identifier,
            },
            (Some(by_login_name), None) => rebuild_from_login_names(by_login_name),
            (None, Some(by_identifier)) => DirectorySnapshot {
                by_login_name: by_identifier
                    .values()
                    .map(|user| (user.login_name.clone(), user.clone()))
                    .collect(),
                by_identifier,
            },
        };

        if snapshot.is_consistent() {
            Ok(Some(snapshot))
        } else {
            warn!(
                dir = %self.dir.display(),
                "Checkpoint maps disagree, rebuilding from login names"
            );
            Ok(Some(rebuild_from_login_names(snapshot.by_login_name)))
        }
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> anyhow::Result<Option<T>> {
        let path = self.dir.join(name);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
        };

        let value =
            serde_json::from_slice(&raw).with_context(|| format!("decode {}", path.display()))?;
        Ok(Some(value))
    }
}

fn rebuild_from_login_names(by_login_name: BTreeMap<String, User>) -> DirectorySnapshot {
    let by_login_name: BTreeMap<String, User> = by_login_name
        .into_iter()
        .map(|(login_name, mut user)| {
            user.login_name = login_name.clone();
            (login_name, user)
        })
        .collect();
    let by_identifier = by_login_name
        .values()
        .map(|user| (user.identifier, user.clone()))
        .collect();

    DirectorySnapshot {
        by_login_name,
        by_identifier,
    }
}
