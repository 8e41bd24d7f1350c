//! Test fixtures.

use userspace_delegate::ContainerSpec;
use userspace_protocol::ChangeKind;

/// A container spec with a recognisable image and config.
#[must_use]
pub fn test_container_spec() -> ContainerSpec {
    ContainerSpec::new("registry.example/git-delegate:1")
        .with_config("url=https://example.invalid/repo.git")
}

/// Build a well-formed `compare` reply.
#[must_use]
pub fn compare_reply(kind: ChangeKind, token: &str) -> String {
    format!("{}\n{token}", kind.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_reply_decodes() {
        let reply = compare_reply(ChangeKind::Incomparable, "r9");
        let (kind, state) = userspace_protocol::decode_compare(reply.as_bytes()).unwrap();
        assert_eq!(kind, ChangeKind::Incomparable);
        assert_eq!(state.data(), "r9");
    }
}
