use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Signal payload must not start with reserved tag '{0}'")]
    ReservedTag(char),
}
