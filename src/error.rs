use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The capture device could not be opened
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A frame or mask does not match what the consumer expects
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to decode frame: {0}")]
    Decode(#[from] image::ImageError),

    #[error("display error: {0}")]
    Display(String),

    /// The computer vision backend rejected an operation
    #[error("vision backend error: {0}")]
    Vision(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(feature = "opencv")]
impl From<opencv::Error> for Error {
    fn from(err: opencv::Error) -> Self {
        Error::Vision(err.to_string())
    }
}

/// Reject `actual` unless it equals `expected`
pub(crate) fn check_dimensions(
    what: &str,
    expected: (u32, u32),
    actual: (u32, u32),
) -> Result<()> {
    if expected != actual {
        return Err(Error::InvalidInput(format!(
            "{} is {}x{}, expected {}x{}",
            what, actual.0, actual.1, expected.0, expected.1
        )));
    }
    Ok(())
}
