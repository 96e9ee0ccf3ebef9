// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{anyhow, bail, Context, Result};
use url::Url;

/// A validated node endpoint.
///
/// The board is only ever called with request/response, so websocket endpoints are accepted
/// and used over their http(s) equivalent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcEndpoint {
    url: Url,
}

impl RpcEndpoint {
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim()).context("Invalid URL format")?;
        if !matches!(url.scheme(), "http" | "https" | "ws" | "wss") {
            bail!("Invalid protocol. Expected: http://, https://, ws://, wss://");
        }
        if url.host_str().is_none() {
            bail!("URL must contain a host");
        }
        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_websocket(&self) -> bool {
        matches!(self.url.scheme(), "ws" | "wss")
    }

    pub fn http_url(&self) -> Result<String> {
        let scheme = match self.url.scheme() {
            "ws" => "http",
            "wss" => "https",
            _ => return Ok(self.url.to_string()),
        };
        let mut url = self.url.clone();
        url.set_scheme(scheme)
            .map_err(|_| anyhow!("cannot rewrite {} to {scheme}", self.url))?;
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() -> Result<()> {
        let rpc = RpcEndpoint::parse("wss://sepolia.example.org/v3/key")?;
        assert!(rpc.is_websocket());
        assert_eq!(rpc.http_url()?, "https://sepolia.example.org/v3/key");

        let rpc = RpcEndpoint::parse(" ws://127.0.0.1:8545 ")?;
        assert_eq!(rpc.http_url()?, "http://127.0.0.1:8545/");

        let rpc = RpcEndpoint::parse("https://ethereum-sepolia-rpc.publicnode.com")?;
        assert!(!rpc.is_websocket());
        assert_eq!(rpc.url().host_str(), Some("ethereum-sepolia-rpc.publicnode.com"));

        assert!(RpcEndpoint::parse("ftp://example.org").is_err());
        assert!(RpcEndpoint::parse("not a url").is_err());
        Ok(())
    }
}
