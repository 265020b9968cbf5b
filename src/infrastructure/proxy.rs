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

use crate::config::settings::ProxySettings;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

/// 代理错误类型
#[derive(Error, Debug)]
pub enum ProxyError {
    /// 代理启用但上游不可用，抓取必须失败而不是裸连
    #[error("Proxy enabled but upstream is not configured")]
    Unavailable,
    /// 上游代理URL非法
    #[error("Invalid upstream proxy URL: {0}")]
    InvalidUpstream(String),
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 代理会话管理器
///
/// Chromium 的 --proxy-server 不支持带认证的代理，所以在本地
/// 起一个匿名隧道：浏览器连本地端口，隧道向上游代理转发并
/// 注入 Proxy-Authorization。代理启用但上游缺失时拒绝工作，
/// 绝不降级为直连。
pub struct ProxySessionManager {
    enabled: bool,
    upstream: Option<Upstream>,
}

/// 解析后的上游代理
#[derive(Clone)]
struct Upstream {
    host: String,
    port: u16,
    auth_header: Option<String>,
}

impl ProxySessionManager {
    /// 从配置创建管理器，上游URL在此处解析校验
    pub fn new(settings: &ProxySettings) -> Result<Self, ProxyError> {
        let upstream = match (settings.enabled, &settings.upstream_url) {
            (false, _) => None,
            (true, None) => return Err(ProxyError::Unavailable),
            (true, Some(raw)) => {
                let url = Url::parse(raw)
                    .map_err(|e| ProxyError::InvalidUpstream(e.to_string()))?;
                let host = url
                    .host_str()
                    .ok_or_else(|| ProxyError::InvalidUpstream("missing host".to_string()))?
                    .to_string();
                let port = url
                    .port_or_known_default()
                    .ok_or_else(|| ProxyError::InvalidUpstream("missing port".to_string()))?;
                let auth_header = if url.username().is_empty() {
                    None
                } else {
                    let credentials = format!(
                        "{}:{}",
                        url.username(),
                        url.password().unwrap_or_default()
                    );
                    Some(format!("Basic {}", BASE64.encode(credentials)))
                };
                Some(Upstream {
                    host,
                    port,
                    auth_header,
                })
            }
        };

        Ok(Self {
            enabled: settings.enabled,
            upstream,
        })
    }

    /// 打开一个代理会话
    ///
    /// # 返回值
    ///
    /// * `Ok(None)` - 代理未启用，调用方直连
    /// * `Ok(Some(handle))` - 本地隧道已就绪
    /// * `Err(ProxyError)` - 代理启用但不可用
    pub async fn open_session(&self) -> Result<Option<ProxyHandle>, ProxyError> {
        if !self.enabled {
            return Ok(None);
        }
        let upstream = self.upstream.clone().ok_or(ProxyError::Unavailable)?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let local_addr = listener.local_addr()?;

        let accept_task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((client, peer)) => {
                        debug!(%peer, "Proxy tunnel connection accepted");
                        let upstream = upstream.clone();
                        tokio::spawn(async move {
                            if let Err(e) = tunnel_client(client, upstream).await {
                                debug!(error = %e, "Proxy tunnel connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "Proxy tunnel accept failed");
                        break;
                    }
                }
            }
        });

        debug!(%local_addr, "Proxy session opened");
        Ok(Some(ProxyHandle {
            local_addr,
            accept_task: Some(accept_task),
        }))
    }
}

/// 代理会话句柄
///
/// 释放是幂等的；句柄被丢弃时隧道随之关闭
pub struct ProxyHandle {
    local_addr: SocketAddr,
    accept_task: Option<JoinHandle<()>>,
}

impl ProxyHandle {
    /// 浏览器使用的本地隧道地址
    pub fn local_addr(&self) -> String {
        self.local_addr.to_string()
    }

    /// 关闭隧道
    pub fn release(&mut self) {
        if let Some(task) = self.accept_task.take() {
            task.abort();
            debug!(addr = %self.local_addr, "Proxy session released");
        }
    }
}

impl Drop for ProxyHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// 处理一条浏览器连接：CONNECT 打隧道，普通请求带认证转发
async fn tunnel_client(mut client: TcpStream, upstream: Upstream) -> std::io::Result<()> {
    let head = read_request_head(&mut client).await?;
    let head_text = String::from_utf8_lossy(&head).to_string();

    let mut server = TcpStream::connect((upstream.host.as_str(), upstream.port)).await?;

    if head_text.starts_with("CONNECT ") {
        server
            .write_all(inject_auth(&head_text, upstream.auth_header.as_deref()).as_bytes())
            .await?;

        let response = read_request_head(&mut server).await?;
        let response_text = String::from_utf8_lossy(&response);
        let established = response_text
            .lines()
            .next()
            .map(|line| line.contains(" 200"))
            .unwrap_or(false);

        if !established {
            client
                .write_all(b"HTTP/1.1 502 Bad Gateway\r\n\r\n")
                .await?;
            return Ok(());
        }
        client
            .write_all(b"HTTP/1.1 200 Connection Established\r\n\r\n")
            .await?;
    } else {
        // Plain HTTP goes through the upstream proxy with auth attached
        server
            .write_all(inject_auth(&head_text, upstream.auth_header.as_deref()).as_bytes())
            .await?;
    }

    tokio::io::copy_bidirectional(&mut client, &mut server)
        .await
        .map(|_| ())
}

/// 在请求头部末尾注入 Proxy-Authorization
fn inject_auth(head: &str, auth_header: Option<&str>) -> String {
    match auth_header {
        Some(auth) => {
            let trimmed = head.trim_end_matches("\r\n\r\n");
            format!("{}\r\nProxy-Authorization: {}\r\n\r\n", trimmed, auth)
        }
        None => head.to_string(),
    }
}

/// 读取到空行为止的请求/响应头部
async fn read_request_head(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(512);
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        let n = stream.read(&mut byte).await?;
        if n == 0 {
            break;
        }
        head.push(byte[0]);
        if head.len() > 16 * 1024 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "request head too large",
            ));
        }
    }
    Ok(head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::ProxySettings;

    fn settings(enabled: bool, url: Option<&str>) -> ProxySettings {
        ProxySettings {
            enabled,
            upstream_url: url.map(|s| s.to_string()),
        }
    }

    /// 假上游代理：校验 CONNECT 与认证头后回 200 并回显数据
    async fn spawn_fake_upstream(expect_auth: bool) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut conn, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let head = read_request_head(&mut conn).await.unwrap();
                    let text = String::from_utf8_lossy(&head).to_string();
                    assert!(text.starts_with("CONNECT "));
                    if expect_auth {
                        assert!(text.contains("Proxy-Authorization: Basic "));
                    }
                    conn.write_all(b"HTTP/1.1 200 Connection Established\r\n\r\n")
                        .await
                        .unwrap();
                    let mut buf = [0u8; 64];
                    while let Ok(n) = conn.read(&mut buf).await {
                        if n == 0 {
                            break;
                        }
                        conn.write_all(&buf[..n]).await.unwrap();
                    }
                });
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_disabled_proxy_yields_no_session() {
        let manager = ProxySessionManager::new(&settings(false, None)).unwrap();
        assert!(manager.open_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_enabled_without_upstream_fails_closed() {
        assert!(matches!(
            ProxySessionManager::new(&settings(true, None)),
            Err(ProxyError::Unavailable)
        ));
    }

    #[tokio::test]
    async fn test_invalid_upstream_rejected() {
        assert!(matches!(
            ProxySessionManager::new(&settings(true, Some("not a url"))),
            Err(ProxyError::InvalidUpstream(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_tunnel_injects_auth() {
        let upstream_addr = spawn_fake_upstream(true).await;
        let url = format!("http://user:secret@{}", upstream_addr);
        let manager = ProxySessionManager::new(&settings(true, Some(&url))).unwrap();

        let mut handle = manager.open_session().await.unwrap().unwrap();
        let mut client = TcpStream::connect(handle.local_addr()).await.unwrap();
        client
            .write_all(b"CONNECT example.com:443 HTTP/1.1\r\nHost: example.com:443\r\n\r\n")
            .await
            .unwrap();

        let response = read_request_head(&mut client).await.unwrap();
        let text = String::from_utf8_lossy(&response);
        assert!(text.starts_with("HTTP/1.1 200"));

        // Tunnel is transparent after CONNECT
        client.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        handle.release();
        handle.release(); // idempotent
    }
}
