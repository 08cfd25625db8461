//! Authenticated sessions.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{error, info};

use crate::config::ImapConfig;
use crate::conn::{connect, Connector};
use crate::error::{AuthError, Error, Result};
use crate::ops::ImapOps;
use crate::types::MailboxStatus;
use crate::utils::iter_join;

/// An authenticated IMAP session.
///
/// The only way to get one is [`Session::login`], so folders cannot be listed or fetched from
/// before authentication succeeded. Every operation holds the session's lock for as long as it
/// talks to the server: operations on one session are serialized, even when a retrieval is still
/// fetching in the background. Use one session per folder to work in parallel.
pub struct Session<C> {
    pub(crate) client: Arc<Mutex<C>>,
}

impl<C> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Session")
    }
}

/// Lock a shared client, taking it over even if a previous holder panicked.
pub(crate) fn lock<C>(client: &Mutex<C>) -> MutexGuard<'_, C> {
    client.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<C: ImapOps + 'static> Session<C> {
    /// Log in on a connected client.
    ///
    /// An empty password fails with [`AuthError::MissingPassword`] without contacting the server.
    /// Credentials the server refuses fail with [`AuthError::Rejected`].
    pub fn login(mut client: C, username: &str, password: &str) -> Result<Self> {
        if password.is_empty() {
            return Err(AuthError::MissingPassword.into());
        }
        match client.login(username, password) {
            Ok(()) => Ok(Session {
                client: Arc::new(Mutex::new(client)),
            }),
            Err(Error::No(reason)) | Err(Error::Bad(reason)) => {
                Err(AuthError::Rejected(reason).into())
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, C> {
        lock(&self.client)
    }

    /// Open `folder` read-only and return a snapshot of its status.
    pub fn select_folder(&self, folder: &str) -> Result<MailboxStatus> {
        info!("selecting folder: {}", folder);
        let status = self
            .lock()
            .select(folder, true)
            .map_err(|e| Error::Folder {
                name: folder.to_string(),
                source: Box::new(e),
            })?;
        info!(
            "flags for selected folder are [{}]",
            iter_join(&status.flags, " ")
        );
        info!("selected folder contains {} emails", status.exists);
        Ok(status)
    }

    /// Log out and close the session.
    ///
    /// Waits for a retrieval that is still fetching in the background to release the connection.
    pub fn logout(self) -> Result<()> {
        let result = self.lock().logout();
        result
    }

    /// Drop the connection without logging out.
    pub fn terminate(self) -> Result<()> {
        let result = self.lock().terminate();
        result
    }
}

/// Connect to the configured server and log in.
///
/// The password is checked before any connection is made.
pub fn authenticate<K: Connector>(
    config: &ImapConfig,
    connector: &K,
) -> Result<Session<K::Client>> {
    if config.password.is_empty() {
        error!("empty password detected");
        return Err(AuthError::MissingPassword.into());
    }

    info!("connecting to server {}", config.server);
    let client = connect(connector, &config.address(), config.insecure).map_err(|e| {
        error!("cannot connect");
        e
    })?;
    info!("connected");

    info!("logging in as {} with provided password", config.user);
    let session = Session::login(client, &config.user, &config.password).map_err(|e| {
        error!("cannot log in");
        e
    })?;
    info!("logged in");

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CallLog, FakeClient};
    use std::cell::Cell;

    fn calls(log: &CallLog) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn empty_password_is_not_sent() {
        let client = FakeClient::default();
        let log = client.call_log();
        match Session::login(client, "user", "") {
            Err(Error::Auth(AuthError::MissingPassword)) => {}
            other => panic!("unexpected result {:?}", other.map(|_| ())),
        }
        assert!(calls(&log).is_empty());
    }

    #[test]
    fn rejected_password() {
        let client = FakeClient::default().with_password("right");
        match Session::login(client, "user", "wrong") {
            Err(Error::Auth(AuthError::Rejected(reason))) => {
                assert!(reason.contains("AUTHENTICATIONFAILED"))
            }
            other => panic!("unexpected result {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn select_is_read_only() {
        let client = FakeClient::default().with_mailbox("INBOX", MailboxStatus::new(7));
        let log = client.call_log();
        let session = Session::login(client, "user", "secret").unwrap();
        let status = session.select_folder("INBOX").unwrap();
        assert_eq!(status.uid_validity, 7);
        assert_eq!(calls(&log), ["LOGIN user", "EXAMINE INBOX"]);
    }

    #[test]
    fn select_missing_folder() {
        let session = Session::login(FakeClient::default(), "user", "secret").unwrap();
        match session.select_folder("Nope") {
            Err(Error::Folder { name, source }) => {
                assert_eq!(name, "Nope");
                assert!(source.is_server_refusal());
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn logout_and_terminate() {
        let client = FakeClient::default();
        let log = client.call_log();
        Session::login(client, "user", "secret")
            .unwrap()
            .logout()
            .unwrap();
        assert_eq!(calls(&log), ["LOGIN user", "LOGOUT"]);

        let client = FakeClient::default();
        let log = client.call_log();
        Session::login(client, "user", "secret")
            .unwrap()
            .terminate()
            .unwrap();
        assert_eq!(calls(&log), ["LOGIN user", "TERMINATE"]);
    }

    struct CountingConnector {
        attempts: Cell<usize>,
    }

    impl Connector for CountingConnector {
        type Client = FakeClient;

        fn connect_tls(&self, _host: &str, _port: u16) -> Result<FakeClient> {
            self.attempts.set(self.attempts.get() + 1);
            Ok(FakeClient::default().with_password("secret"))
        }

        fn connect_plain(&self, host: &str, port: u16) -> Result<FakeClient> {
            self.connect_tls(host, port)
        }
    }

    #[test]
    fn authenticate_checks_password_before_connecting() {
        let connector = CountingConnector {
            attempts: Cell::new(0),
        };
        let config = ImapConfig::new("imap.example.com", "user");
        assert!(matches!(
            authenticate(&config, &connector),
            Err(Error::Auth(AuthError::MissingPassword))
        ));
        assert_eq!(connector.attempts.get(), 0);

        let config = config.with_password("secret");
        authenticate(&config, &connector).unwrap();
        assert_eq!(connector.attempts.get(), 1);
    }

    #[test]
    fn authenticate_honours_connection_policy() {
        let connector = CountingConnector {
            attempts: Cell::new(0),
        };
        let mut config = ImapConfig::new("imap.example.com", "user").with_password("secret");
        config.insecure = true;
        assert!(matches!(
            authenticate(&config, &connector),
            Err(Error::Policy(_))
        ));
        assert_eq!(connector.attempts.get(), 0);
    }
}
