use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("no numeric or letter tile rows found")]
    NoTileRows,

    #[error("row {row} has {found} tiles, expected {expected}")]
    NotRectangular {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("quadrant {width}x{height} is too small to mirror (need width >= 1, height >= 2)")]
    QuadrantTooSmall { width: usize, height: usize },

    #[error("unknown tile token {token:?} at row {row}, column {col}")]
    UnknownToken {
        row: usize,
        col: usize,
        token: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("level map: {0}")]
    Map(#[from] MapError),

    #[error("invalid config: {0}")]
    Invalid(String),
}
