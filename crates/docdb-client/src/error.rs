use docdb_db::DbError;

#[derive(Debug)]
pub enum ClientError {
    Transport(String),
    Serialization(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Transport(msg) => write!(f, "transport error: {msg}"),
            ClientError::Serialization(msg) => write!(f, "serialization error: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<rmp_serde::encode::Error> for ClientError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        ClientError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for ClientError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        ClientError::Serialization(e.to_string())
    }
}

/// Client-side failures surface through the contract as backend errors.
impl From<ClientError> for DbError {
    fn from(e: ClientError) -> Self {
        DbError::backend(e.to_string())
    }
}
