//! Repository browser links.

use url::Url;

use crate::changelog::ChangeEntry;

/// Builds links to a web view of the delegate's repository.
///
/// Links are pure string composition: `<base>/<image>/<head>/<revision>`,
/// each component percent-encoded as one path segment. Without a base URL no
/// links are produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryBrowser {
    base: Option<Url>,
    image: String,
    head: String,
}

impl RepositoryBrowser {
    /// Create a browser for one image and head.
    #[must_use]
    pub fn new(base: Option<Url>, image: impl Into<String>, head: impl Into<String>) -> Self {
        Self {
            base,
            image: image.into(),
            head: head.into(),
        }
    }

    /// The configured base URL.
    #[must_use]
    pub fn base(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    /// Link to a revision, or `None` if there is no usable base URL.
    #[must_use]
    pub fn revision_url(&self, revision: &str) -> Option<Url> {
        let mut url = self.base.clone()?;
        {
            let mut segments = url.path_segments_mut().ok()?;
            segments
                .pop_if_empty()
                .push(&self.image)
                .push(&self.head)
                .push(revision);
        }
        Some(url)
    }

    /// Link to the revision of a changelog entry.
    #[must_use]
    pub fn change_url(&self, entry: &ChangeEntry) -> Option<Url> {
        entry
            .revision
            .as_deref()
            .and_then(|revision| self.revision_url(revision))
    }
}
