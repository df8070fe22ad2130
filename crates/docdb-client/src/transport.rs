use async_trait::async_trait;
use docdb_db::DocumentDatabase;
use docdb_server::{Request, Response, Session};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ClientError;

/// Carries one encoded request to a server and returns the encoded response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn round_trip(&self, request: Vec<u8>) -> Result<Vec<u8>, ClientError>;
}

/// Envelopes travel as MessagePack maps keyed by field name.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ClientError> {
    Ok(rmp_serde::to_vec_named(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ClientError> {
    Ok(rmp_serde::from_slice(bytes)?)
}

/// In-process transport: decodes each request and hands it to a `Session`.
/// Every call still goes through the full encode/decode cycle.
pub struct LoopbackTransport<D> {
    session: Session<D>,
}

impl<D: DocumentDatabase> LoopbackTransport<D> {
    pub fn new(db: D) -> Self {
        Self {
            session: Session::new(db),
        }
    }

    pub fn session(&self) -> &Session<D> {
        &self.session
    }
}

#[async_trait]
impl<D: DocumentDatabase> Transport for LoopbackTransport<D> {
    async fn round_trip(&self, request: Vec<u8>) -> Result<Vec<u8>, ClientError> {
        let request: Request = decode(&request)?;
        let response: Response = self.session.handle(request).await;
        encode(&response)
    }
}
