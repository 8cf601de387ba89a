//! Acesso HTTP ao backend.
//!
//! [`Transport`] é a costura entre o cliente e a rede: a implementação real
//! usa `reqwest` bloqueante nas threads de I/O, os testes usam respostas
//! roteirizadas.

use crate::protocol::ProtocolError;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Falhas de um poll.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("Backend inacessível: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("Corpo inválido: {0}")]
    Decode(String),
}

impl From<ProtocolError> for FetchError {
    fn from(e: ProtocolError) -> Self {
        FetchError::Decode(e.to_string())
    }
}

/// Endpoint consultado por GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub path: &'static str,
    pub accept: &'static str,
}

impl Endpoint {
    pub const fn json(path: &'static str) -> Self {
        Self {
            path,
            accept: "application/json",
        }
    }

    pub const fn image(path: &'static str) -> Self {
        Self {
            path,
            accept: "image/*",
        }
    }
}

/// Acesso ao backend. Chamado a partir das threads de I/O.
pub trait Transport: Send + Sync {
    /// GET que só retorna o corpo em respostas 2xx.
    fn get(&self, endpoint: &Endpoint) -> Result<Vec<u8>, FetchError>;

    /// POST com corpo JSON; a resposta é ignorada se 2xx.
    fn post_json(&self, path: &str, body: Vec<u8>) -> Result<(), FetchError>;
}

/// [`Transport`] sobre HTTP.
pub struct HttpTransport {
    client: Client,
    base: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let mut base = Url::parse(base_url).map_err(|e| {
            FetchError::NetworkUnreachable(format!("URL inválida {base_url}: {e}"))
        })?;
        // Sem a barra final, `join` trocaria o último segmento do prefixo
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::NetworkUnreachable(e.to_string()))?;
        Ok(Self { client, base })
    }

    /// Rotas são relativas ao prefixo de `backend_url` (`/api` + `/frame`).
    fn url(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| {
                FetchError::NetworkUnreachable(format!("caminho inválido {path}: {e}"))
            })
    }
}

impl Transport for HttpTransport {
    fn get(&self, endpoint: &Endpoint) -> Result<Vec<u8>, FetchError> {
        let url = self.url(endpoint.path)?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, endpoint.accept)
            .send()
            .map_err(|e| FetchError::NetworkUnreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }
        let body = response
            .bytes()
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        debug!("GET {} → {} bytes", endpoint.path, body.len());
        Ok(body.to_vec())
    }

    fn post_json(&self, path: &str, body: Vec<u8>) -> Result<(), FetchError> {
        let url = self.url(path)?;
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|e| FetchError::NetworkUnreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }
}
