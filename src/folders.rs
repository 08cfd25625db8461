//! Folder discovery.

use std::sync::Mutex;

use crossbeam::channel::bounded;
use log::info;

use crate::config::ImapConfig;
use crate::conn::Connector;
use crate::error::{Error, Result};
use crate::ops::ImapOps;
use crate::session::{authenticate, lock, Session};

/// Capacity of the channel folder names are listed through.
pub const FOLDER_LIST_BUFFER: usize = 10;

impl<C: ImapOps + 'static> Session<C> {
    /// The names of all folders on the server, in the order the server lists them.
    ///
    /// The listing is produced on a separate thread and drained here as it arrives. An error of
    /// that producer is reported once every name it delivered has been consumed; the names are
    /// then discarded.
    pub fn list_folders(&self) -> Result<Vec<String>> {
        info!("retrieving folders");
        let (tx, rx) = bounded(FOLDER_LIST_BUFFER);
        let client: &Mutex<C> = &self.client;

        let (folders, outcome) = crossbeam::scope(|s| {
            let producer = s.spawn(move |_| lock(client).list("", "*", &tx));
            let folders: Vec<String> = rx.iter().map(|folder| folder.name).collect();
            (folders, producer.join())
        })
        .map_err(|_| Error::WorkerPanicked)?;
        outcome.map_err(|_| Error::WorkerPanicked)??;

        info!("retrieved {} folders", folders.len());
        Ok(folders)
    }
}

/// Log in, list every folder, and log out again.
pub fn get_all_folders<K: Connector>(config: &ImapConfig, connector: &K) -> Result<Vec<String>> {
    let session = authenticate(config, connector)?;
    let folders = session.list_folders();
    session.logout()?;
    folders
}
