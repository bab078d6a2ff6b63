use anyhow::{Context, Result};
use async_imap::Session;
use async_native_tls::{TlsConnector, TlsStream};
use futures::stream::StreamExt;
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncReadCompatExt;

use crate::config::Account;
use crate::message::RawMessage;

pub struct MailClient {
    session: Session<TlsStream<tokio_util::compat::Compat<TcpStream>>>,
}

impl MailClient {
    pub async fn connect(account: &Account) -> Result<Self> {
        info!(
            "Connecting to IMAP server {}:{} for {}",
            account.imap_server, account.imap_port, account.email
        );

        let tcp_stream = TcpStream::connect((account.imap_server.as_str(), account.imap_port))
            .await
            .context("Unable to connect to IMAP server")?;

        let tcp_stream_compat = tcp_stream.compat();

        let tls = TlsConnector::new();
        let tls_stream = tls
            .connect(&account.imap_server, tcp_stream_compat)
            .await
            .context("Unable to establish TLS connection")?;

        let client = async_imap::Client::new(tls_stream);

        let session = client
            .login(&account.email, &account.password)
            .await
            .map_err(|e| anyhow::anyhow!("IMAP authentication failed: {:?}", e.0))?;

        info!("IMAP connection established");

        Ok(MailClient { session })
    }

    /// Fetch messages with UIDs strictly greater than `last_uid` from INBOX,
    /// oldest first, capped at `limit` when given. Messages that fail to
    /// fetch or parse are skipped; they never abort the batch.
    pub async fn fetch_since(
        &mut self,
        last_uid: Option<u32>,
        limit: Option<usize>,
    ) -> Result<Vec<RawMessage>> {
        self.session
            .select("INBOX")
            .await
            .context("Unable to select INBOX")?;

        let criteria = match last_uid {
            Some(uid) => format!("UID {}:*", uid + 1),
            None => "ALL".to_string(),
        };
        debug!("IMAP search criteria: {}", criteria);

        let uids = self
            .session
            .uid_search(&criteria)
            .await
            .context("IMAP UID search failed")?;

        let mut uids: Vec<u32> = uids.into_iter().collect();
        uids.sort_unstable();

        // "UID n:*" always returns at least the last message in the
        // mailbox, even when its UID is below n; drop anything already seen.
        if let Some(last) = last_uid {
            uids.retain(|uid| *uid > last);
        }

        if let Some(limit) = limit {
            uids.truncate(limit);
        }

        info!("Found {} new message(s) to fetch", uids.len());

        let mut messages = Vec::with_capacity(uids.len());
        for uid in uids {
            match self.fetch_message(uid).await {
                Ok(Some(msg)) => messages.push(msg),
                Ok(None) => warn!("Message UID {} was empty or unparseable, skipped", uid),
                Err(e) => warn!("Error fetching message UID {}: {}", uid, e),
            }
        }

        Ok(messages)
    }

    async fn fetch_message(&mut self, uid: u32) -> Result<Option<RawMessage>> {
        debug!("Fetching message UID {}", uid);

        let messages_stream = self
            .session
            .uid_fetch(uid.to_string(), "RFC822")
            .await
            .context("Unable to fetch message")?;

        let fetched: Vec<_> = messages_stream
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .filter_map(|r| r.ok())
            .collect();

        for fetch in &fetched {
            if let Some(body) = fetch.body() {
                debug!("Message UID {} fetched, {} bytes", uid, body.len());
                return Ok(RawMessage::parse(fetch.uid.unwrap_or(uid), body));
            }
        }

        Ok(None)
    }

    pub async fn logout(mut self) -> Result<()> {
        info!("Closing IMAP connection");
        self.session
            .logout()
            .await
            .context("Error during IMAP logout")?;
        Ok(())
    }
}
