use imap_proto::{AttributeValue, MailboxDatum, Response, ResponseCode};

use super::error::{Error, ParseError, Result};
use super::types::*;

/// Turn a `LIST` response into a folder entry. Any other response yields `None`.
pub fn parse_name(resp: Response<'_>) -> Option<FolderInfo> {
    match resp {
        Response::MailboxData(MailboxDatum::List {
            name_attributes,
            delimiter,
            name,
        }) => Some(FolderInfo {
            attributes: name_attributes.into_iter().map(name_attribute).collect(),
            delimiter: delimiter.map(|d| d.into_owned()),
            name: name.into_owned(),
        }),
        _ => None,
    }
}

fn name_attribute(attr: imap_proto::NameAttribute<'_>) -> NameAttribute {
    use imap_proto::NameAttribute as Wire;
    match attr {
        Wire::NoInferiors => NameAttribute::NoInferiors,
        Wire::NoSelect => NameAttribute::NoSelect,
        Wire::Marked => NameAttribute::Marked,
        Wire::Unmarked => NameAttribute::Unmarked,
        Wire::Extension(s) => NameAttribute::from(s),
        // special-use attributes (RFC 6154)
        other => NameAttribute::Custom(format!("\\{:?}", other)),
    }
}

/// Collect the attributes of one `FETCH` response into an owned record.
pub fn parse_fetch(seq: Seq, attrs: Vec<AttributeValue<'_>>) -> RawMessage {
    let mut msg = RawMessage {
        seq,
        ..RawMessage::default()
    };
    for attr in attrs {
        match attr {
            AttributeValue::Uid(uid) => msg.uid = Some(uid),
            AttributeValue::InternalDate(date) => msg.internal_date = Some(date.into_owned()),
            AttributeValue::Flags(flags) => msg.flags.extend(Flag::from_strs(flags)),
            AttributeValue::Rfc822(Some(body)) => msg.body = Some(body.into_owned()),
            AttributeValue::BodySection {
                data: Some(body), ..
            } if msg.body.is_none() => msg.body = Some(body.into_owned()),
            _ => {}
        }
    }
    msg
}

/// The untagged data a `SELECT` or `EXAMINE` reports, gathered as it arrives.
#[derive(Debug, Default)]
pub struct MailboxData {
    flags: Vec<Flag<'static>>,
    exists: u32,
    recent: u32,
    uid_next: Option<Uid>,
    uid_validity: Option<UidValidity>,
}

impl MailboxData {
    /// Record one untagged response. Responses that say nothing about the mailbox are ignored.
    pub fn absorb(&mut self, resp: Response<'_>) {
        match resp {
            Response::Data {
                code: Some(code), ..
            } => match code {
                ResponseCode::UidValidity(v) => self.uid_validity = Some(v),
                ResponseCode::UidNext(n) => self.uid_next = Some(n),
                _ => {}
            },
            Response::MailboxData(MailboxDatum::Exists(e)) => self.exists = e,
            Response::MailboxData(MailboxDatum::Recent(r)) => self.recent = r,
            Response::MailboxData(MailboxDatum::Flags(flags)) => {
                self.flags.extend(Flag::from_strs(flags))
            }
            _ => {}
        }
    }

    /// The status of `mailbox_name`; a mailbox without `UIDVALIDITY` cannot be mirrored.
    pub fn finish(self, mailbox_name: &str) -> Result<MailboxStatus> {
        let missing = || Error::Parse(ParseError::MissingUidValidity(mailbox_name.to_string()));
        let uid_validity = self.uid_validity.ok_or_else(missing)?;
        Ok(MailboxStatus {
            flags: self.flags,
            exists: self.exists,
            recent: self.recent,
            uid_next: self.uid_next,
            uid_validity,
        })
    }
}
