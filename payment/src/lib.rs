#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("vendor api error {status}: {title} {detail}")]
    Api {
        status: u16,
        title: String,
        detail: String,
    },
    #[error("payment not found")]
    PaymentNotFound,
    #[error("{0}")]
    Message(String),
}

impl Error {
    pub fn from<E>(cause: E) -> Self
    where
        E: std::error::Error,
    {
        Self::Message(cause.to_string())
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

pub mod mollie;
pub use mollie::Mollie;

pub mod vendor;
pub use vendor::PaymentVendor;
