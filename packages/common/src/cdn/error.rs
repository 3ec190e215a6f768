use thiserror::Error;

#[derive(Debug, Error)]
pub enum CdnError {
    #[error("{actual} paths exceed the per-call limit of {limit}")]
    TooManyPaths { actual: usize, limit: usize },
    #[error("invalidation request failed: {0}")]
    Request(String),
    #[error("invalidation rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("CDN configuration error: {0}")]
    Config(String),
}
