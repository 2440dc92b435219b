use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Not a data URI")]
    NotDataUri,

    #[error("Data URI has no payload separator")]
    MissingPayload,

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Surface of {width}x{height} is too large")]
    SurfaceTooLarge { width: u32, height: u32 },

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, MediaError>;
