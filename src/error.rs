use image::ImageFormat;

pub type Result<T> = std::result::Result<T, RedactError>;

#[derive(Debug, thiserror::Error)]
pub enum RedactError {
    #[error("image data is empty")]
    EmptyImage,

    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("text recognition failed")]
    Ocr(#[source] anyhow::Error),

    #[error("face detection failed")]
    FaceDetection(#[source] anyhow::Error),

    #[error("entity recognition failed")]
    EntityRecognition(#[source] anyhow::Error),

    #[error("could not encode image as {format:?}")]
    Encode {
        format: ImageFormat,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RedactError {
    /// Errors caused by the uploaded bytes rather than by the pipeline.
    pub fn is_client_error(&self) -> bool {
        matches!(self, RedactError::EmptyImage | RedactError::Decode(_))
    }
}
