//! The file-name filter applied to inbound `Index`/`IndexUpdate` listings.
//!
//! Names the model layer must never see: empty, `.`, `..`, or `/`. Anything
//! else is the model's responsibility to validate.

use std::borrow::Cow;

use crate::message::FileInfo;

fn is_rejected(name: &str) -> bool {
    matches!(name, "" | "." | ".." | "/")
}

/// Drops entries whose name is rejected, per [`is_rejected`].
///
/// Returns a borrowed `Cow` when nothing was dropped, so the common case of
/// an already-clean listing costs no allocation.
#[must_use]
pub fn filter_files(files: &[FileInfo]) -> Cow<'_, [FileInfo]> {
    if files.iter().any(|f| is_rejected(&f.name)) {
        Cow::Owned(
            files
                .iter()
                .filter(|f| !is_rejected(&f.name))
                .cloned()
                .collect(),
        )
    } else {
        Cow::Borrowed(files)
    }
}
