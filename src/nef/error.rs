//! Reader errors

/// Failure while walking a converted NEF block into a model
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    #[error("NEF data block '{0}' has no nef_nmr_meta_data save frame")]
    MissingMetaData(String),
    #[error("NEF data block has more than one {category} save frame: {framecode}")]
    DuplicateFrame { category: String, framecode: String },
    #[error("{frame}: {tag} refers to unknown save frame '{target}'")]
    UnresolvedReference {
        frame: String,
        tag: String,
        target: String,
    },
    #[error("Illegal value of nef_sequence.linking: {0}")]
    IllegalLinking(String),
    #[error("Sequence contains 'cyclic' residue(s) that do not form a closed, cyclic molecule")]
    InterruptedCycle,
    #[error("Sequence contains 'cyclic' residue that is not terminated by matching 'cyclic' residue")]
    UnterminatedCycle,
    #[error("{frame}: {message}")]
    Model { frame: String, message: String },
}

impl ReadError {
    /// Rejection raised by a model while loading `frame`
    pub fn model(frame: impl Into<String>, message: impl Into<String>) -> Self {
        ReadError::Model {
            frame: frame.into(),
            message: message.into(),
        }
    }
}
