//! Resource client for the accounts collection.
//!
//! # Design
//! Each verb is split into a `build_*` method that produces an `HttpRequest`
//! and an async method that hands it to the `Transport`. The response comes
//! back unmodified: status interpretation is left to the caller, since 409 on
//! a repeated create or 404 on a stale id are ordinary answers here.
//!
//! The base URL is read from the client's own `ClientConfig` at call time.
//! A transport passed to `with_transport` is always the one used.

use tracing::debug;

use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, TransportOptions};
use crate::types::Account;

#[derive(Debug, Clone)]
pub struct AccountsClient {
    config: ClientConfig,
    transport: Transport,
}

impl AccountsClient {
    /// Client with its own transport built from default options.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let transport = Transport::new(TransportOptions::default())?;
        Ok(Self::with_transport(config, transport))
    }

    /// Client reading its base URL from `FORM3_ACCOUNTS_API_URL`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(ClientConfig::from_env())
    }

    pub fn with_transport(config: ClientConfig, transport: Transport) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn set_base_url(&mut self, base_url: &str) {
        self.config.set_base_url(base_url);
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut Transport {
        &mut self.transport
    }

    pub fn build_create(&self, account: &Account) -> Result<HttpRequest, ApiError> {
        let body = encode_body(account)?;
        Ok(HttpRequest::new(HttpMethod::Post, self.config.base_url()).body(body))
    }

    pub fn build_fetch(&self, id: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.resource_url(id))
    }

    pub fn build_delete(&self, id: &str, version: i64) -> HttpRequest {
        HttpRequest::new(HttpMethod::Delete, self.resource_url(id))
            .query("version", version.to_string())
    }

    pub async fn create(&self, account: &Account) -> Result<HttpResponse, ApiError> {
        self.create_with(&Context::background(), account).await
    }

    pub async fn create_with(
        &self,
        ctx: &Context,
        account: &Account,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.build_create(account)?;
        debug!(id = %account.id(), "creating account");
        self.transport.execute(request, ctx).await
    }

    pub async fn fetch(&self, id: &str) -> Result<HttpResponse, ApiError> {
        self.fetch_with(&Context::background(), id).await
    }

    pub async fn fetch_with(&self, ctx: &Context, id: &str) -> Result<HttpResponse, ApiError> {
        self.transport.execute(self.build_fetch(id), ctx).await
    }

    pub async fn delete(&self, id: &str, version: i64) -> Result<HttpResponse, ApiError> {
        self.delete_with(&Context::background(), id, version).await
    }

    pub async fn delete_with(
        &self,
        ctx: &Context,
        id: &str,
        version: i64,
    ) -> Result<HttpResponse, ApiError> {
        self.transport.execute(self.build_delete(id, version), ctx).await
    }

    fn resource_url(&self, id: &str) -> String {
        format!("{}/{id}", self.config.base_url())
    }
}

fn encode_body<T: serde::Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(value).map_err(|e| ApiError::Serialization(e.to_string()))
}
