// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, ClientConnection, DigitallySignedStruct, ProtocolVersion, SignatureScheme};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

use crate::domain::models::diagnostic::TlsInfo;

/// 接受任意证书的校验器
///
/// 探测关心的是会话参数而非证书信任链
#[derive(Debug)]
struct AcceptAnyCertificate(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

fn protocol_name(version: ProtocolVersion) -> String {
    match version {
        ProtocolVersion::TLSv1_3 => "TLSv1.3".to_string(),
        ProtocolVersion::TLSv1_2 => "TLSv1.2".to_string(),
        other => format!("{:?}", other),
    }
}

/// 接受任意证书的客户端配置
fn client_config() -> Result<ClientConfig, rustls::Error> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    Ok(ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate(provider)))
        .with_no_client_auth())
}

/// 把待发送的TLS记录全部写到套接字
async fn flush_tls(conn: &mut ClientConnection, sock: &mut TcpStream) -> Result<(), String> {
    while conn.wants_write() {
        let mut out = Vec::new();
        conn.write_tls(&mut out).map_err(|e| e.to_string())?;
        sock.write_all(&out).await.map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// 在事件循环上驱动一次TLS握手
async fn handshake(host: String, port: u16) -> Result<TlsInfo, String> {
    let config = client_config().map_err(|e| e.to_string())?;
    let server_name = ServerName::try_from(host.clone()).map_err(|e| e.to_string())?;
    let mut conn = ClientConnection::new(Arc::new(config), server_name).map_err(|e| e.to_string())?;

    let mut sock = TcpStream::connect((host.as_str(), port))
        .await
        .map_err(|e| e.to_string())?;
    let mut buf = vec![0u8; 16 * 1024];

    while conn.is_handshaking() {
        flush_tls(&mut conn, &mut sock).await?;
        if !conn.is_handshaking() {
            break;
        }
        if !conn.wants_read() {
            return Err("TLS handshake stalled".to_string());
        }

        let n = sock.read(&mut buf).await.map_err(|e| e.to_string())?;
        if n == 0 {
            return Err("Connection closed during TLS handshake".to_string());
        }
        let mut incoming = &buf[..n];
        while !incoming.is_empty() {
            conn.read_tls(&mut incoming).map_err(|e| e.to_string())?;
            conn.process_new_packets().map_err(|e| e.to_string())?;
        }
    }
    // Deliver the client Finished before the socket closes.
    flush_tls(&mut conn, &mut sock).await?;

    Ok(TlsInfo {
        cipher: conn
            .negotiated_cipher_suite()
            .map(|suite| format!("{:?}", suite.suite())),
        protocol: conn.protocol_version().map(protocol_name),
        error: None,
    })
}

/// 获取HTTPS目标协商出的加密套件与协议版本
///
/// 独立完成一次TLS握手；任何失败都记录在 `TlsInfo::error` 中，不影响探测结果
pub async fn inspect(url: &Url, timeout: Duration) -> TlsInfo {
    let Some(host) = url.host_str().map(|h| h.trim_matches(|c| c == '[' || c == ']').to_string())
    else {
        return TlsInfo {
            error: Some("URL has no host".to_string()),
            ..TlsInfo::default()
        };
    };
    let port = url.port_or_known_default().unwrap_or(443);

    match tokio::time::timeout(timeout, handshake(host, port)).await {
        Ok(Ok(info)) => info,
        Ok(Err(error)) => {
            debug!("TLS inspection failed for {}: {}", url, error);
            TlsInfo {
                error: Some(error),
                ..TlsInfo::default()
            }
        }
        Err(_) => TlsInfo {
            error: Some(format!("TLS handshake timed out after {:?}", timeout)),
            ..TlsInfo::default()
        },
    }
}
