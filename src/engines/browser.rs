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

use crate::config::settings::BrowserSettings;
use crate::engines::driver::ScrapeError;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// 浏览器会话
///
/// 持有一个 Chromium 实例及其 CDP 事件处理循环。启动参数
/// 做了反检测处理；长时间运行的抓取每处理 N 页后应回收
/// 会话重建，避免内存膨胀与指纹老化。
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    pages_served: u32,
}

impl BrowserSession {
    /// 启动新的浏览器会话
    ///
    /// # 参数
    ///
    /// * `settings` - 浏览器配置
    /// * `proxy_server` - 本地代理隧道地址（如 "127.0.0.1:38041"），无代理时为 None
    pub async fn launch(
        settings: &BrowserSettings,
        proxy_server: Option<&str>,
    ) -> Result<Self, ScrapeError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--ignore-certificate-errors")
            .arg("--disable-web-security")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");

        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(addr) = proxy_server {
            builder = builder.arg(format!("--proxy-server={}", addr));
        }
        if let Some(path) = &settings.executable_path {
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .build()
            .map_err(ScrapeError::Launch)?;

        let (browser, mut handler) = Browser::launch(config).await?;

        // Drive the CDP message loop until the browser goes away
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        debug!(proxy = ?proxy_server, "Browser session launched");
        Ok(Self {
            browser,
            handler_task,
            pages_served: 0,
        })
    }

    /// 打开一个新页面
    pub async fn new_page(&mut self) -> Result<Page, ScrapeError> {
        let page = self.browser.new_page("about:blank").await?;
        self.pages_served += 1;
        Ok(page)
    }

    /// 会话已服务的页面数
    pub fn pages_served(&self) -> u32 {
        self.pages_served
    }

    /// 是否达到回收阈值
    pub fn needs_recycle(&self, pages_per_browser: u32) -> bool {
        self.pages_served >= pages_per_browser
    }

    /// 关闭会话，终止浏览器进程与事件循环
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Browser close failed");
        }
        self.handler_task.abort();
    }
}
