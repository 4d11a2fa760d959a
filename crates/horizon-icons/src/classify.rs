//! Classification of file-system subjects into icon families.

use horizon_icons_render::{Classifier, IconIdentity};

use crate::subject::FileSubject;

/// Badge resource for entries shown decrypted.
pub const UNLOCKED_BADGE: &str = "unlockedbadge";
/// Badge resource for symbolic links.
pub const ALIAS_BADGE: &str = "aliasbadge";
/// Badge resource for folders that cannot be entered.
pub const PRIVATE_FOLDER_BADGE: &str = "privatefolderbadge";
/// Badge resource for write-only folders.
pub const DROP_FOLDER_BADGE: &str = "dropfolderbadge";
/// Badge resource for read-only folders.
pub const READONLY_FOLDER_BADGE: &str = "readonlyfolderbadge";

/// Which base artwork a subject uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseIcon {
    Folder,
    /// File icon for this extension (possibly empty).
    File(String),
    /// No base: the executable resource is returned directly.
    Executable,
}

/// Outcome of classifying a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// `path:folder` or `path:<extension>`.
    pub identity: IconIdentity,
    pub classifier: Classifier,
    pub base: BaseIcon,
    /// Badge drawn over the base, if any.
    pub badge: Option<&'static str>,
}

impl Classification {
    fn new(subject: &dyn FileSubject, classifier: Classifier, badge: Option<&'static str>) -> Self {
        let (identity, base) = if subject.is_directory() {
            (IconIdentity::folder(), BaseIcon::Folder)
        } else {
            let extension = subject.extension().to_string();
            (IconIdentity::extension(&extension), BaseIcon::File(extension))
        };
        Self {
            identity,
            classifier,
            base,
            badge,
        }
    }
}

/// Classify `subject`; the first matching rule wins.
///
/// 1. decrypted: `unlocked` with the unlocked badge
/// 2. symbolic link: `alias` with the alias badge
/// 3. extensionless executable file: `executable`, no base
/// 4. other files: default role, no badge
/// 5. directories with a known, restricted permission: private, drop or
///    read-only folder; anything else is a plain folder
pub fn classify(subject: &dyn FileSubject) -> Classification {
    if subject.is_decrypted() {
        return Classification::new(subject, Classifier::UNLOCKED, Some(UNLOCKED_BADGE));
    }
    if subject.is_symbolic_link() {
        return Classification::new(subject, Classifier::ALIAS, Some(ALIAS_BADGE));
    }

    let permission = subject.permission();
    if subject.is_file() {
        if subject.extension().trim().is_empty() && permission.is_executable() {
            return Classification {
                identity: IconIdentity::extension(""),
                classifier: Classifier::EXECUTABLE,
                base: BaseIcon::Executable,
                badge: None,
            };
        }
        return Classification::new(subject, Classifier::DEFAULT, None);
    }

    if subject.is_directory() && !permission.is_empty() {
        if !permission.is_executable() {
            return Classification::new(
                subject,
                Classifier::PRIVATE_FOLDER,
                Some(PRIVATE_FOLDER_BADGE),
            );
        }
        if !permission.is_readable() && permission.is_writable() {
            return Classification::new(subject, Classifier::DROP_FOLDER, Some(DROP_FOLDER_BADGE));
        }
        if permission.is_readable() && !permission.is_writable() {
            return Classification::new(
                subject,
                Classifier::READONLY_FOLDER,
                Some(READONLY_FOLDER_BADGE),
            );
        }
    }

    Classification::new(subject, Classifier::DEFAULT, None)
}
