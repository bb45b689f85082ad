//! SSRF-guarded link-preview fetching
//!
//! One preview fetch walks Validating → Resolving → Fetching →
//! Extracting. Redirects are never followed blindly: automatic
//! following is disabled and every hop goes back through scheme, host,
//! and address screening, with the connection pinned to the vetted
//! address. The body is streamed and truncated at a hard cap, never
//! buffered past it.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use reqwest::header::LOCATION;
use reqwest::{redirect, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::net::lookup_host;
use tracing::{debug, warn};
use url::{Host, Url};

use warden_core::error::PreviewError;

use crate::addr::is_private_addr;
use crate::extract::extract_metadata;

/// Fetch policy for link previews.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Identifying user-agent sent with every request
    pub user_agent: String,
    /// Overall deadline for the whole fetch, redirects included
    pub timeout: Duration,
    /// Redirect hops allowed beyond the original URL
    pub max_redirects: usize,
    /// Body bytes kept; the rest of the response is discarded
    pub max_body_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "WardenPreview/1.0".to_string(),
            timeout: Duration::from_secs(10),
            max_redirects: 3,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Extracted, HTML-escaped preview metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewResult {
    pub title: String,
    pub description: String,
    pub source_url: String,
}

/// Fetch a preview for a user-supplied URL.
///
/// The entire operation runs under one deadline; hitting it cancels the
/// underlying connection rather than waiting it out.
pub async fn fetch_preview(
    raw_url: &str,
    config: &FetchConfig,
) -> Result<PreviewResult, PreviewError> {
    match tokio::time::timeout(config.timeout, fetch_inner(raw_url, config)).await {
        Ok(result) => result,
        Err(_) => Err(PreviewError::FetchTimeout(config.timeout.as_secs())),
    }
}

async fn fetch_inner(raw_url: &str, config: &FetchConfig) -> Result<PreviewResult, PreviewError> {
    let mut current = Url::parse(raw_url).map_err(|_| PreviewError::InvalidHost)?;

    for hop in 0..=config.max_redirects {
        ensure_allowed(&current)?;
        let (pin, first_ip) = resolve_and_screen(&current).await?;

        let client = build_client(config, &pin)?;
        debug!(url = %current, hop, ip = %first_ip, "fetching preview");

        let response = client
            .get(current.as_str())
            .send()
            .await
            .map_err(|e| map_reqwest(e, config))?;
        let status = response.status();

        if status.is_redirection() {
            if hop == config.max_redirects {
                return Err(PreviewError::NonSuccessStatus(status.as_u16()));
            }
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| PreviewError::Fetch("redirect without location".to_string()))?;
            current = current
                .join(location)
                .map_err(|_| PreviewError::Fetch("unparseable redirect target".to_string()))?;
            continue;
        }

        if status != StatusCode::OK {
            return Err(PreviewError::NonSuccessStatus(status.as_u16()));
        }

        let (body, truncated) = read_capped(response, config.max_body_bytes, config).await?;
        if truncated {
            debug!(url = %current, cap = config.max_body_bytes, "body truncated at cap");
        }

        let text = String::from_utf8_lossy(&body);
        let (title, description) = extract_metadata(&text);
        return Ok(PreviewResult {
            title,
            description,
            source_url: raw_url.to_string(),
        });
    }

    // Unreachable: the loop either returns or errors on the last hop.
    Err(PreviewError::Fetch("redirect budget exhausted".to_string()))
}

/// Validating stage: scheme must be exactly http or https, and the URL
/// must carry a hostname.
fn ensure_allowed(url: &Url) -> Result<(), PreviewError> {
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(PreviewError::InvalidScheme(other.to_string())),
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(PreviewError::InvalidHost),
    }
}

/// Resolving stage: every address the host resolves to must be public.
///
/// For domain hosts, returns the vetted address to pin the connection
/// to, so the fetch cannot be re-resolved to something else between
/// screening and connecting.
async fn resolve_and_screen(url: &Url) -> Result<(Option<(String, SocketAddr)>, IpAddr), PreviewError> {
    let port = url.port_or_known_default().unwrap_or(80);

    match url.host() {
        Some(Host::Ipv4(ip)) => {
            screen(IpAddr::V4(ip))?;
            Ok((None, IpAddr::V4(ip)))
        }
        Some(Host::Ipv6(ip)) => {
            screen(IpAddr::V6(ip))?;
            Ok((None, IpAddr::V6(ip)))
        }
        Some(Host::Domain(domain)) => {
            let addrs: Vec<SocketAddr> = lookup_host((domain, port))
                .await
                .map_err(|_| PreviewError::UnresolvableHost(domain.to_string()))?
                .collect();
            let first = addrs
                .first()
                .copied()
                .ok_or_else(|| PreviewError::UnresolvableHost(domain.to_string()))?;
            for addr in &addrs {
                screen(addr.ip())?;
            }
            Ok((Some((domain.to_string(), first)), first.ip()))
        }
        None => Err(PreviewError::InvalidHost),
    }
}

fn screen(ip: IpAddr) -> Result<(), PreviewError> {
    if is_private_addr(ip) {
        warn!(%ip, "preview target resolved to private address");
        return Err(PreviewError::PrivateAddressRejected(ip));
    }
    Ok(())
}

/// One client per hop: redirects disabled, vetted address pinned.
fn build_client(
    config: &FetchConfig,
    pin: &Option<(String, SocketAddr)>,
) -> Result<Client, PreviewError> {
    let mut builder = Client::builder()
        .redirect(redirect::Policy::none())
        .timeout(config.timeout)
        .user_agent(&config.user_agent);

    if let Some((domain, addr)) = pin {
        builder = builder.resolve(domain, *addr);
    }

    builder
        .build()
        .map_err(|e| PreviewError::Fetch(e.to_string()))
}

/// Fetching stage, body half: stream chunks into a capped buffer.
/// Dropping the response mid-stream aborts the connection, so an
/// oversized body costs at most one chunk past the cap.
async fn read_capped(
    mut response: Response,
    cap: usize,
    config: &FetchConfig,
) -> Result<(Vec<u8>, bool), PreviewError> {
    let mut buf = Vec::new();
    let mut truncated = false;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| map_reqwest(e, config))?
    {
        if push_capped(&mut buf, &chunk, cap) {
            truncated = true;
            break;
        }
    }
    Ok((buf, truncated))
}

/// Append `chunk` to `buf` without growing past `cap`. Returns true
/// once the cap has been reached.
fn push_capped(buf: &mut Vec<u8>, chunk: &[u8], cap: usize) -> bool {
    let room = cap.saturating_sub(buf.len());
    let take = chunk.len().min(room);
    buf.extend_from_slice(&chunk[..take]);
    take < chunk.len() || buf.len() == cap
}

fn map_reqwest(err: reqwest::Error, config: &FetchConfig) -> PreviewError {
    if err.is_timeout() {
        PreviewError::FetchTimeout(config.timeout.as_secs())
    } else {
        PreviewError::Fetch(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_redirects, 3);
        assert_eq!(config.max_body_bytes, 1024 * 1024);
        assert!(config.user_agent.contains("WardenPreview"));
    }

    #[test]
    fn test_ensure_allowed_schemes() {
        assert!(ensure_allowed(&Url::parse("http://example.com/").unwrap()).is_ok());
        assert!(ensure_allowed(&Url::parse("https://example.com/").unwrap()).is_ok());
        assert_eq!(
            ensure_allowed(&Url::parse("ftp://example.com/").unwrap()),
            Err(PreviewError::InvalidScheme("ftp".to_string()))
        );
        assert_eq!(
            ensure_allowed(&Url::parse("file:///etc/passwd").unwrap()),
            Err(PreviewError::InvalidScheme("file".to_string()))
        );
    }

    #[test]
    fn test_push_capped_truncates() {
        let mut buf = Vec::new();
        assert!(!push_capped(&mut buf, b"hello", 10));
        assert!(push_capped(&mut buf, b"world!!", 10));
        assert_eq!(buf.len(), 10);
        assert_eq!(&buf, b"helloworld");

        // Later chunks add nothing once capped.
        assert!(push_capped(&mut buf, b"more", 10));
        assert_eq!(buf.len(), 10);
    }

    #[test]
    fn test_oversized_body_prefix_still_extracts() {
        let cap = 1024 * 1024;
        let mut page = String::from("<title>Big Page</title>");
        page.push_str(&"z".repeat(2 * cap));

        let mut buf = Vec::new();
        let mut truncated = false;
        for chunk in page.as_bytes().chunks(8192) {
            if push_capped(&mut buf, chunk, cap) {
                truncated = true;
                break;
            }
        }
        assert!(truncated);
        assert_eq!(buf.len(), cap);

        let text = String::from_utf8_lossy(&buf);
        let (title, description) = extract_metadata(&text);
        assert_eq!(title, "Big Page");
        assert_eq!(description, "");
    }

    #[tokio::test]
    async fn test_rejects_bad_scheme_before_any_network() {
        let err = fetch_preview("gopher://example.com/", &FetchConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err, PreviewError::InvalidScheme("gopher".to_string()));
    }

    #[tokio::test]
    async fn test_rejects_unparseable_url() {
        let err = fetch_preview("not a url", &FetchConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err, PreviewError::InvalidHost);
    }

    #[tokio::test]
    async fn test_rejects_literal_private_addresses() {
        for target in [
            "http://127.0.0.1/",
            "http://10.0.0.5/",
            "http://192.168.1.1/metadata",
            "http://169.254.1.1/",
            "http://[fc00::1]/",
            "http://[::1]:8080/",
        ] {
            let err = fetch_preview(target, &FetchConfig::default())
                .await
                .unwrap_err();
            assert!(
                matches!(err, PreviewError::PrivateAddressRejected(_)),
                "{target} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_preview_result_wire_shape() {
        let result = PreviewResult {
            title: "T".to_string(),
            description: "D".to_string(),
            source_url: "https://example.com".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["title"], "T");
        assert_eq!(json["source_url"], "https://example.com");
    }
}
