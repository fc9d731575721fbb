use thiserror::Error;

/// Why fetching a batch from the remote stats service failed.
///
/// Both variants fail the whole batch; the sync cycle folds them into the
/// failure count and keeps going.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection failure, timeout, or non-success HTTP status.
    #[error("network error: {0}")]
    Network(String),

    /// Response body was not valid JSON or lacked the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Why the replica cache could not produce a readable database file.
#[derive(Debug, Error)]
pub enum ReplicaError {
    /// Download failed and no local copy exists to fall back on.
    #[error("replica unavailable: {0}")]
    Unavailable(String),

    /// The local replica file exists but could not be opened.
    #[error("failed to open replica: {0}")]
    Open(String),
}

/// Truncate a raw response body for logging.
pub fn truncate_body(body: &str) -> &str {
    let cut = body
        .char_indices()
        .nth(500)
        .map(|(idx, _)| idx)
        .unwrap_or(body.len());
    &body[..cut]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_body_keeps_short_bodies_intact() {
        assert_eq!(truncate_body("{}"), "{}");
    }

    #[test]
    fn truncate_body_cuts_long_bodies() {
        let long = "x".repeat(2000);
        assert_eq!(truncate_body(&long).len(), 500);
    }
}
