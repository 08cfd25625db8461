use std::borrow::Cow;

/// A folder name returned by a `LIST` command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FolderInfo {
    pub(crate) attributes: Vec<NameAttribute>,
    pub(crate) delimiter: Option<String>,
    pub(crate) name: String,
}

/// An attribute set for an IMAP name.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum NameAttribute {
    /// It is not possible for any child levels of hierarchy to exist
    /// under this name; no child levels exist now and none can be
    /// created in the future.
    NoInferiors,

    /// It is not possible to use this name as a selectable mailbox.
    NoSelect,

    /// The mailbox has been marked "interesting" by the server.
    Marked,

    /// The mailbox does not contain any additional messages since the
    /// last time the mailbox was selected.
    Unmarked,

    /// A non-standard user- or server-defined name attribute.
    Custom(String),
}

impl NameAttribute {
    fn system(s: &str) -> Option<Self> {
        match s {
            "\\Noinferiors" => Some(NameAttribute::NoInferiors),
            "\\Noselect" => Some(NameAttribute::NoSelect),
            "\\Marked" => Some(NameAttribute::Marked),
            "\\Unmarked" => Some(NameAttribute::Unmarked),
            _ => None,
        }
    }
}

impl<'a> From<Cow<'a, str>> for NameAttribute {
    fn from(s: Cow<'a, str>) -> Self {
        NameAttribute::system(&s).unwrap_or_else(|| NameAttribute::Custom(s.into_owned()))
    }
}

impl<'a> From<&'a str> for NameAttribute {
    fn from(s: &'a str) -> Self {
        NameAttribute::system(s).unwrap_or_else(|| NameAttribute::Custom(s.to_string()))
    }
}

impl FolderInfo {
    /// Make a folder entry, e.g. for a scripted server.
    pub fn new(name: impl Into<String>, delimiter: Option<&str>, attributes: &[&str]) -> Self {
        FolderInfo {
            attributes: attributes.iter().map(|a| NameAttribute::from(*a)).collect(),
            delimiter: delimiter.map(String::from),
            name: name.into(),
        }
    }

    /// Attributes of this name.
    pub fn attributes(&self) -> &[NameAttribute] {
        &self.attributes[..]
    }

    /// The hierarchy delimiter is a character used to delimit levels of hierarchy in a mailbox
    /// name.  `None` means that no hierarchy exists; the name is a "flat" name.
    pub fn delimiter(&self) -> Option<&str> {
        self.delimiter.as_deref()
    }

    /// The full name of the folder, valid as an argument to `SELECT`/`EXAMINE` unless
    /// [`NameAttribute::NoSelect`] is indicated.
    pub fn name(&self) -> &str {
        &self.name
    }
}
