use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("Name exceeds 255 bytes")]
    NameTooLong,

    #[error("Label exceeds 63 bytes")]
    LabelTooLong,

    #[error("Empty label in name")]
    EmptyLabel,

    #[error("Message truncated")]
    Truncated,

    #[error("Invalid label type {0:#04x}")]
    BadLabelType(u8),

    #[error("Compression pointer out of range")]
    BadPointer,

    #[error("Compression pointer loop")]
    PointerLoop,

    #[error("Record data overruns message")]
    RdataOverrun,
}
