//! Terminal stand-in for the browser host.
//!
//! Notifications are printed to stdout. There is no tab to open and no
//! native download to cancel from a terminal, so those calls fail.

use async_trait::async_trait;
use download_broker::broker::{BrowserHost, DownloadId, HostError, Notification};

#[derive(Debug, Default)]
pub struct ConsoleHost;

#[async_trait]
impl BrowserHost for ConsoleHost {
    async fn open_in_new_context(&self, _url: &str) -> Result<(), HostError> {
        Err(HostError::api("tabs.create", "no browser attached to the terminal"))
    }

    async fn cancel_download(&self, _id: DownloadId) -> Result<(), HostError> {
        Err(HostError::api("downloads.cancel", "no browser attached to the terminal"))
    }

    async fn notify(&self, notification: &Notification) -> Result<(), HostError> {
        println!("{}: {}", notification.title, notification.message);
        Ok(())
    }
}
