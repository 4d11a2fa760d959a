//! File-system subjects, as seen by classification.

/// Access permission of a file-system entry.
///
/// `Empty` is the "unknown / not reported" sentinel and is distinct from a
/// known mode that grants nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Permission {
    /// No permission information.
    #[default]
    Empty,
    /// Known access bits.
    Mode {
        readable: bool,
        writable: bool,
        executable: bool,
    },
}

impl Permission {
    /// Read, write and execute.
    pub const FULL: Permission = Permission::mode(true, true, true);

    /// Known access bits.
    pub const fn mode(readable: bool, writable: bool, executable: bool) -> Self {
        Permission::Mode {
            readable,
            writable,
            executable,
        }
    }

    /// Parse an `rwx`-style triple such as `"r-x"`. Returns `None` for anything else.
    pub fn from_symbolic(symbolic: &str) -> Option<Self> {
        let bytes = symbolic.as_bytes();
        if bytes.len() != 3 {
            return None;
        }
        let bit = |c: u8, set: u8| match c {
            b'-' => Some(false),
            c if c == set => Some(true),
            _ => None,
        };
        Some(Permission::mode(
            bit(bytes[0], b'r')?,
            bit(bytes[1], b'w')?,
            bit(bytes[2], b'x')?,
        ))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Permission::Empty)
    }

    pub fn is_readable(&self) -> bool {
        matches!(self, Permission::Mode { readable: true, .. })
    }

    pub fn is_writable(&self) -> bool {
        matches!(self, Permission::Mode { writable: true, .. })
    }

    pub fn is_executable(&self) -> bool {
        matches!(self, Permission::Mode { executable: true, .. })
    }
}

/// The queries classification needs from a file-system entry.
pub trait FileSubject {
    fn is_directory(&self) -> bool;

    fn is_file(&self) -> bool;

    fn is_symbolic_link(&self) -> bool;

    /// Extension without the leading dot; empty when there is none.
    fn extension(&self) -> &str;

    fn permission(&self) -> Permission;

    /// Whether the entry is encrypted but presented decrypted.
    fn is_decrypted(&self) -> bool;
}

/// Kind of a [`PathSubject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Plain-data [`FileSubject`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSubject {
    kind: EntryKind,
    extension: String,
    symbolic_link: bool,
    decrypted: bool,
    permission: Permission,
}

impl PathSubject {
    /// A regular file named `name`; the extension is taken from the name.
    pub fn file(name: &str) -> Self {
        let extension = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_string(),
            _ => String::new(),
        };
        Self {
            kind: EntryKind::File,
            extension,
            symbolic_link: false,
            decrypted: false,
            permission: Permission::Empty,
        }
    }

    /// A directory.
    pub fn directory() -> Self {
        Self {
            kind: EntryKind::Directory,
            extension: String::new(),
            symbolic_link: false,
            decrypted: false,
            permission: Permission::Empty,
        }
    }

    #[must_use]
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }

    #[must_use]
    pub fn with_symbolic_link(mut self, symbolic_link: bool) -> Self {
        self.symbolic_link = symbolic_link;
        self
    }

    #[must_use]
    pub fn with_decrypted(mut self, decrypted: bool) -> Self {
        self.decrypted = decrypted;
        self
    }
}

impl FileSubject for PathSubject {
    fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    fn is_symbolic_link(&self) -> bool {
        self.symbolic_link
    }

    fn extension(&self) -> &str {
        &self.extension
    }

    fn permission(&self) -> Permission {
        self.permission
    }

    fn is_decrypted(&self) -> bool {
        self.decrypted
    }
}
