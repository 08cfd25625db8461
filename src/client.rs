use bufstream::BufStream;
use crossbeam::channel::Sender;
use imap_proto::{Response, Status};
use lazy_static::lazy_static;
use log::trace;
use regex::bytes::Regex;
use std::io::{self, BufRead, Read, Write};
use std::str;

use super::conn::ImapConnection;
use super::error::{Error, ParseError, Result, ValidateError};
use super::ops::ImapOps;
use super::parse::{parse_fetch, parse_name, MailboxData};
use super::types::*;
use super::utils::{iter_join, quote};

static TAG_PREFIX: &str = "a";
const INITIAL_TAG: u32 = 0;
const CR: u8 = 0x0d;
const LF: u8 = 0x0a;

lazy_static! {
    static ref LITERAL_AT_EOL: Regex = Regex::new(r"\{([0-9]+)\}\r\n$").unwrap();
}

fn validate_str(value: &str) -> Result<String> {
    let quoted = quote(value);
    if quoted.contains('\n') {
        return Err(Error::Validate(ValidateError::InvalidChar('\n')));
    }
    if quoted.contains('\r') {
        return Err(Error::Validate(ValidateError::InvalidChar('\r')));
    }
    Ok(quoted)
}

/// An IMAP connection speaking the wire protocol over any [`ImapConnection`].
///
/// Every command is tagged (`a1`, `a2`, ...) and its response is read up to the matching tagged
/// completion. Untagged data belonging to the command is handed to the caller as it arrives, so
/// large `FETCH` responses are streamed rather than buffered.
pub struct Client<T: Read + Write> {
    stream: BufStream<T>,
    tag: u32,
    terminated: bool,
}

impl<T: Read + Write> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("tag", &self.tag)
            .field("terminated", &self.terminated)
            .finish()
    }
}

impl<T: Read + Write> Client<T> {
    /// Creates a new client with the underlying stream.
    pub fn new(stream: T) -> Client<T> {
        Client {
            stream: BufStream::new(stream),
            tag: INITIAL_TAG,
            terminated: false,
        }
    }

    /// Read the untagged greeting the server sends when a connection is opened.
    pub fn read_greeting(&mut self) -> Result<()> {
        let mut line = Vec::new();
        self.read_logical_line(&mut line)?;
        let status = match imap_proto::parser::parse_response(&line) {
            Ok((_, Response::Data { status, .. })) => status,
            _ => return Err(Error::Parse(ParseError::Greeting(line.clone()))),
        };
        match status {
            Status::Ok | Status::PreAuth => Ok(()),
            Status::Bye => Err(Error::ConnectionLost),
            _ => Err(Error::Parse(ParseError::Greeting(line))),
        }
    }

    /// Runs a command and reads its response, passing every untagged response to `on_data`.
    fn run_command_with<F>(&mut self, untagged_command: &str, on_data: F) -> Result<()>
    where
        F: FnMut(Response<'_>) -> Result<()>,
    {
        self.run_command(untagged_command)?;
        self.read_response_with(on_data)
    }

    /// Runs a command and checks if it returns OK.
    fn run_command_and_check_ok(&mut self, command: &str) -> Result<()> {
        self.run_command_with(command, |_| Ok(()))
    }

    fn run_command(&mut self, untagged_command: &str) -> Result<()> {
        if self.terminated {
            return Err(Error::ConnectionLost);
        }
        let command = self.create_command(untagged_command);
        self.write_line(command.as_bytes())
    }

    fn read_response_with<F>(&mut self, mut on_data: F) -> Result<()>
    where
        F: FnMut(Response<'_>) -> Result<()>,
    {
        let match_tag = format!("{}{}", TAG_PREFIX, self.tag);
        loop {
            let mut line = Vec::new();
            self.read_logical_line(&mut line)?;

            match imap_proto::parser::parse_response(&line) {
                Ok((
                    _,
                    Response::Done {
                        tag,
                        status,
                        information,
                        ..
                    },
                )) => {
                    if tag.0 != match_tag {
                        return Err(Error::Parse(ParseError::UnexpectedTag(tag.0)));
                    }
                    let expl = || {
                        information
                            .as_ref()
                            .map(|s| s.to_string())
                            .unwrap_or_else(|| "no explanation given".to_string())
                    };
                    return match status {
                        Status::Ok => Ok(()),
                        Status::No => Err(Error::No(expl())),
                        Status::Bad => Err(Error::Bad(expl())),
                        _ => Err(Error::Parse(ParseError::Invalid(line.clone()))),
                    };
                }
                Ok((_, resp)) => on_data(resp)?,
                // the line is complete, so a parser asking for more input is as bad as a failure
                Err(nom::Err::Incomplete(_)) | Err(_) => {
                    return Err(Error::Parse(ParseError::Invalid(line.clone())));
                }
            }
        }
    }

    /// Read one response line, following any `{n}` literals it announces.
    fn read_logical_line(&mut self, into: &mut Vec<u8>) -> Result<()> {
        loop {
            let read = self.readline(into)?;
            if !into.ends_with(&[CR, LF]) {
                return Err(Error::ConnectionLost);
            }

            let literal_len = LITERAL_AT_EOL
                .captures(&into[into.len() - read..])
                .and_then(|cap| cap.get(1))
                .and_then(|len| str::from_utf8(len.as_bytes()).ok())
                .and_then(|len| len.parse::<u64>().ok());

            match literal_len {
                Some(len) => self.read_literal(into, len)?,
                None => return Ok(()),
            }
        }
    }

    fn read_literal(&mut self, into: &mut Vec<u8>, len: u64) -> Result<()> {
        let read = (&mut self.stream).take(len).read_to_end(into)?;
        trace!("S: <literal of {} bytes>", read);
        if (read as u64) < len {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "hit EOF before end of literal",
            )));
        }
        Ok(())
    }

    fn readline(&mut self, into: &mut Vec<u8>) -> Result<usize> {
        let read = self.stream.read_until(LF, into)?;
        if read == 0 {
            return Err(Error::ConnectionLost);
        }

        let len = into.len();
        let line = &into[(len - read)..];
        trace!(
            "S: {}",
            String::from_utf8_lossy(line).trim_end_matches(&['\r', '\n'][..])
        );

        Ok(read)
    }

    fn create_command(&mut self, command: &str) -> String {
        self.tag += 1;
        format!("{}{} {}", TAG_PREFIX, self.tag, command)
    }

    fn write_line(&mut self, buf: &[u8]) -> Result<()> {
        self.stream.write_all(buf)?;
        self.stream.write_all(&[CR, LF])?;
        self.stream.flush()?;
        let line = String::from_utf8_lossy(buf);
        match line.split_once(' ') {
            Some((tag, command)) if command.starts_with("LOGIN ") => {
                trace!("C: {} LOGIN <credentials>", tag)
            }
            _ => trace!("C: {}", line),
        }
        Ok(())
    }

    fn fetch_with(
        &mut self,
        command: &str,
        set: &SequenceSet,
        items: &[FetchItem],
        sink: &Sender<RawMessage>,
    ) -> Result<()> {
        let command = format!("{} {} ({})", command, set, iter_join(items, " "));
        let mut forward = true;
        self.run_command_with(&command, |resp| {
            if let Response::Fetch(seq, attrs) = resp {
                // once the consumer is gone we keep draining so the connection stays in sync
                if forward && sink.send(parse_fetch(seq, attrs)).is_err() {
                    forward = false;
                }
            }
            Ok(())
        })
    }
}

impl<T: ImapConnection> ImapOps for Client<T> {
    fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let command = format!(
            "LOGIN {} {}",
            validate_str(username)?,
            validate_str(password)?
        );
        self.run_command_and_check_ok(&command)
    }

    fn list(
        &mut self,
        reference_name: &str,
        pattern: &str,
        sink: &Sender<FolderInfo>,
    ) -> Result<()> {
        let command = format!(
            "LIST {} {}",
            validate_str(reference_name)?,
            validate_str(pattern)?
        );
        let mut forward = true;
        self.run_command_with(&command, |resp| {
            if let Some(name) = parse_name(resp) {
                if forward && sink.send(name).is_err() {
                    forward = false;
                }
            }
            Ok(())
        })
    }

    fn select(&mut self, mailbox_name: &str, read_only: bool) -> Result<MailboxStatus> {
        let verb = if read_only { "EXAMINE" } else { "SELECT" };
        let command = format!("{} {}", verb, validate_str(mailbox_name)?);

        let mut data = MailboxData::default();
        self.run_command_with(&command, |resp| {
            data.absorb(resp);
            Ok(())
        })?;
        data.finish(mailbox_name)
    }

    fn fetch(
        &mut self,
        sequence_set: &SequenceSet,
        items: &[FetchItem],
        sink: &Sender<RawMessage>,
    ) -> Result<()> {
        self.fetch_with("FETCH", sequence_set, items, sink)
    }

    fn uid_fetch(
        &mut self,
        uid_set: &SequenceSet,
        items: &[FetchItem],
        sink: &Sender<RawMessage>,
    ) -> Result<()> {
        self.fetch_with("UID FETCH", uid_set, items, sink)
    }

    fn logout(&mut self) -> Result<()> {
        // the server says BYE before completing LOGOUT; the untagged BYE is ignored
        self.run_command_and_check_ok("LOGOUT")
    }

    fn terminate(&mut self) -> Result<()> {
        if self.terminated {
            return Ok(());
        }
        self.terminated = true;
        self.stream.flush()?;
        self.stream.get_mut().hangup()?;
        Ok(())
    }
}
