use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use http::header::{HeaderValue, ACCEPT, CONTENT_TYPE, COOKIE, HOST, USER_AGENT};
use http::HeaderMap;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Incoming};
use hyper::client::conn::http1;
use hyper::{Request, Response, Uri};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::Instrument;

use crate::cli::app_config::Cli;
use crate::http::error::RequestError;
use crate::http::timing::RequestTimings;
use crate::progress::event::{Phase, PhaseEventKind};
use crate::progress::monitor::ProgressMonitor;
use crate::request::parse;
use crate::response::res::{format_headers, HttpResponse};
use crate::tls::build_client_config;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// GET unless a body implies POST or `-X` says otherwise.
pub fn resolve_method(cli: &Cli) -> String {
    if let Some(method) = cli.method_option.as_ref() {
        method.to_uppercase()
    } else if cli.body_option.is_some() {
        String::from("POST")
    } else {
        String::from("GET")
    }
}

/// Performs one instrumented round trip. The monitor is created and started
/// before any parsing so its Complete signal fires exactly once on every
/// path out of this function, pre-flight validation failures included.
pub async fn http_request(cli: &Cli) -> Result<HttpResponse, anyhow::Error> {
    let mut monitor = ProgressMonitor::new(!cli.no_progress);
    monitor.start();

    let mut timings = RequestTimings::new();
    timings.start_total();

    let result = perform(cli, &monitor, &mut timings).await;
    monitor.complete().await;
    result
}

async fn perform(
    cli: &Cli,
    monitor: &ProgressMonitor,
    timings: &mut RequestTimings,
) -> Result<HttpResponse, anyhow::Error> {
    let url_str = cli.url.as_ref().ok_or_else(|| anyhow!("URL is required"))?;
    let query = parse::parse_query(cli.query_option.as_deref())?;
    let url = parse::append_query(url_str, &query)?;
    let headers = parse::parse_headers(cli.headers_option.as_deref())?;
    let (body, content_type) = parse::parse_body(cli.body_option.as_deref(), &cli.body_type)?;

    let uri: Uri = url
        .as_str()
        .parse()
        .context("Failed to parse request URL")?;
    let scheme = uri.scheme_str().unwrap_or("http");
    ensure!(
        scheme == "http" || scheme == "https",
        "unsupported scheme: {}",
        scheme
    );
    let host = uri
        .host()
        .ok_or_else(|| anyhow!("no host in URL"))?
        .to_string();
    let port = uri
        .port_u16()
        .unwrap_or(if scheme == "https" { 443 } else { 80 });

    // TLS setup happens before any phase starts so certificate file reads
    // never count into the handshake measurement.
    let tls_config = if scheme == "https" {
        Some(Arc::new(build_client_config(
            cli.certificate_path_option.as_deref(),
            cli.skip_certificate_validate,
        )?))
    } else {
        None
    };

    let request = build_request(cli, &uri, headers, body, content_type)?;

    let network = async {
        monitor.update(Phase::Dns, PhaseEventKind::Start, Duration::ZERO);
        timings.start_dns();
        debug!("Resolving DNS for: {}", host);
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host.as_str(), port))
            .await
            .map_err(|e| RequestError::Dns {
                host: host.clone(),
                source: e,
            })?
            .collect();
        timings.end_dns();
        monitor.update(
            Phase::Dns,
            PhaseEventKind::Complete,
            timings.dns_duration().unwrap_or_default(),
        );
        let addr = *addrs
            .first()
            .ok_or_else(|| RequestError::NoAddress(host.clone()))?;
        debug!("Resolved DNS for {}: {:?}", host, addrs);

        monitor.update(Phase::Connect, PhaseEventKind::Start, Duration::ZERO);
        timings.start_tcp_connect();
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| RequestError::Connect {
                addr: addr.to_string(),
                source: e,
            })?;
        timings.end_tcp_connect();
        monitor.update(
            Phase::Connect,
            PhaseEventKind::Complete,
            timings.tcp_connect_duration().unwrap_or_default(),
        );

        let mut sender = match tls_config {
            Some(tls_config) => {
                monitor.update(Phase::Tls, PhaseEventKind::Start, Duration::ZERO);
                timings.start_tls();
                let connector = TlsConnector::from(tls_config);
                let domain = pki_types::ServerName::try_from(host.clone())
                    .map_err(|e| anyhow!("invalid server name: {}", e))?;
                let tls_stream =
                    connector
                        .connect(domain, stream)
                        .await
                        .map_err(|e| RequestError::Tls {
                            host: host.clone(),
                            source: e,
                        })?;
                timings.end_tls();
                monitor.update(
                    Phase::Tls,
                    PhaseEventKind::Complete,
                    timings.tls_duration().unwrap_or_default(),
                );
                open_connection(tls_stream, addr).await?
            }
            None => open_connection(stream, addr).await?,
        };

        // No wrote-request hook exists at this layer; with a fully buffered
        // body the server phase is measured from issuance to response head.
        timings.mark_request_sent();
        monitor.update(Phase::Server, PhaseEventKind::Start, Duration::ZERO);
        let response = sender
            .send_request(request)
            .await
            .map_err(RequestError::Send)?;
        timings.mark_first_byte();
        timings.start_transfer();
        monitor.update(
            Phase::Server,
            PhaseEventKind::Complete,
            timings.server_duration().unwrap_or_default(),
        );
        monitor.update(Phase::Transfer, PhaseEventKind::Start, Duration::ZERO);

        Ok::<Response<Incoming>, anyhow::Error>(response)
    };

    let response = timeout(REQUEST_TIMEOUT, network)
        .await
        .map_err(|_| RequestError::Timeout(REQUEST_TIMEOUT))??;

    if cli.verbosity >= 1 {
        debug!("< {:?} {}", response.version(), response.status());
        for (key, value) in response.headers().iter() {
            debug!("< {}: {}", key, value.to_str().unwrap_or("<binary>"));
        }
        debug!("<");
    }

    let (parts, incoming) = response.into_parts();
    let body_bytes = incoming
        .collect()
        .await
        .map_err(RequestError::Transfer)
        .with_context(|| format!("response status was {}", parts.status))?
        .to_bytes();
    timings.end_transfer();
    monitor.update(
        Phase::Transfer,
        PhaseEventKind::Complete,
        timings.transfer_duration().unwrap_or_default(),
    );
    timings.end_total();

    Ok(HttpResponse {
        status_code: parts.status.as_u16(),
        headers: format_headers(&parts.headers),
        body: String::from_utf8_lossy(&body_bytes).to_string(),
        content_length: body_bytes.len() as u64,
        time: timings.total_duration().unwrap_or_default(),
        timings: timings.snapshot(),
    })
}

/// HTTP/1.1 handshake over a fresh stream; the connection driver runs on
/// its own task so the send path never waits on it.
async fn open_connection<T>(
    stream: T,
    remote: SocketAddr,
) -> Result<http1::SendRequest<Full<Bytes>>, anyhow::Error>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = TokioIo::new(stream);
    let (sender, conn) = http1::handshake(io)
        .await
        .context("HTTP/1.1 handshake failed")?;
    tokio::spawn(
        async move {
            if let Err(err) = conn.await {
                debug!("connection closed with error: {:?}", err);
            }
        }
        .instrument(info_span!("connection", remote = %remote)),
    );
    Ok(sender)
}

fn build_request(
    cli: &Cli,
    uri: &Uri,
    user_headers: HeaderMap,
    body: Bytes,
    content_type: Option<&'static str>,
) -> Result<Request<Full<Bytes>>, anyhow::Error> {
    let method = resolve_method(cli);
    // Origin-form target; the connection is already pinned to the host.
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let mut request_builder = Request::builder().method(method.as_str()).uri(target);

    let mut header_map = HeaderMap::new();
    let host_value = match uri.port_u16() {
        Some(port) => format!("{}:{}", uri.host().unwrap_or_default(), port),
        None => uri.host().unwrap_or_default().to_string(),
    };
    header_map.insert(HOST, HeaderValue::from_str(&host_value)?);
    if let Some(content_type) = content_type {
        header_map.insert(CONTENT_TYPE, HeaderValue::from_str(content_type)?);
    }
    header_map.insert(ACCEPT, HeaderValue::from_str("*/*")?);
    let user_agent = cli
        .user_agent_option
        .as_deref()
        .unwrap_or(concat!("rpost/", env!("CARGO_PKG_VERSION")));
    header_map.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);
    if let Some(cookie) = cli.cookie_option.as_ref() {
        header_map.insert(COOKIE, HeaderValue::from_str(cookie)?);
    }
    // User-supplied headers win over the defaults.
    for (key, value) in user_headers.iter() {
        header_map.insert(key.clone(), value.clone());
    }

    for (key, value) in header_map {
        request_builder = request_builder.header(key.ok_or(anyhow!("Key is null"))?, value);
    }

    let request = request_builder.body(Full::new(body))?;

    if cli.verbosity >= 1 {
        debug!(
            "> {} {} {:?}",
            request.method(),
            request.uri(),
            request.version()
        );
        for (key, value) in request.headers().iter() {
            debug!("> {}: {}", key, value.to_str().unwrap_or("<binary>"));
        }
        debug!(
            "> Content-Length: {}",
            request.body().size_hint().exact().unwrap_or(0)
        );
        debug!(">");
    }

    Ok(request)
}
