use crate::error::{Error, Result};
use crate::server::{LaunchArgs, ServerProcess};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Everything the manager knows about one running server.
pub struct ServerRecord {
    name: String,
    process: ServerProcess,
    port: u16,
    log_file: PathBuf,
    launch_args: LaunchArgs,
    script_path: PathBuf,
}

impl ServerRecord {
    pub fn new(
        name: impl Into<String>,
        process: ServerProcess,
        port: u16,
        log_file: PathBuf,
        launch_args: LaunchArgs,
        script_path: PathBuf,
    ) -> Self {
        Self {
            name: name.into(),
            process,
            port,
            log_file,
            launch_args,
            script_path,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn pid(&self) -> u32 {
        self.process.pid()
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    pub fn launch_args(&self) -> &LaunchArgs {
        &self.launch_args
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    pub fn process_mut(&mut self) -> &mut ServerProcess {
        &mut self.process
    }

    /// Closes the process handle and the log stream together.
    pub fn release(self) {
        self.process.release();
    }
}

/// In-memory map of logical server name to [`ServerRecord`].
///
/// The registry is the single source of truth for what is running. It is an
/// ordinary owned value: each [`ServerManager`](crate::ServerManager) holds
/// its own, and names iterate in sorted order.
#[derive(Default)]
pub struct Registry {
    records: BTreeMap<String, ServerRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record; fails without touching the existing one if the name is taken.
    pub fn insert(&mut self, record: ServerRecord) -> Result<()> {
        if self.records.contains_key(record.name()) {
            return Err(Error::AlreadyRunning(record.name().to_string()));
        }
        self.records.insert(record.name().to_string(), record);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ServerRecord> {
        self.records.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ServerRecord> {
        self.records.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ServerRecord> {
        self.records.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn port_of(&self, name: &str) -> Option<u16> {
        self.records.get(name).map(ServerRecord::port)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    /// `(name, port)` pairs, sorted by name.
    pub fn ports(&self) -> BTreeMap<String, u16> {
        self.records
            .iter()
            .map(|(name, record)| (name.clone(), record.port()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServerRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
