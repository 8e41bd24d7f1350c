//! SCM identity keys.

use std::borrow::Cow;

use crate::SCHEME;

/// Escape a key component so `:` can only appear as a separator.
fn escape(component: &str) -> Cow<'_, str> {
    if component.contains(['%', ':']) {
        Cow::Owned(component.replace('%', "%25").replace(':', "%3A"))
    } else {
        Cow::Borrowed(component)
    }
}

/// Identity of an SCM configuration, used by hosts to spot equivalent jobs.
///
/// The format is `userspace:<image>:<config>:<head>`. Components are escaped
/// (`%` as `%25`, `:` as `%3A`), so two different tuples never produce the
/// same key. The function is pure.
#[must_use]
pub fn scm_identity_key(container: &str, discriminator: &str, head: &str) -> String {
    format!(
        "{SCHEME}:{}:{}:{}",
        escape(container),
        escape(discriminator),
        escape(head)
    )
}
