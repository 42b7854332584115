use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use twitch_irc::login::StaticLoginCredentials;
use twitch_irc::message::{PrivmsgMessage, ServerMessage};
use twitch_irc::{ClientConfig, SecureTCPTransport, TwitchIRCClient};

use crate::config::TwitchConfig;
use crate::platform::{ChatEvent, ChatSink};
use crate::relay::Relay;

type IrcClient = TwitchIRCClient<SecureTCPTransport, StaticLoginCredentials>;

/// Sends chat replies through the IRC connection.
pub struct TwitchSink {
    client: IrcClient,
    authenticated: bool,
}

#[async_trait]
impl ChatSink for TwitchSink {
    async fn say(&self, channel: &str, text: &str) -> Result<()> {
        if !self.authenticated {
            anyhow::bail!("anonymous connection cannot send chat messages");
        }
        self.client
            .say(channel.to_string(), text.to_string())
            .await
            .map_err(|e| anyhow!("Failed to send chat message: {}", e))
    }
}

/// Twitch expects the bare token; `.env` files often carry `oauth:abc`.
fn bare_token(token: &str) -> String {
    token.strip_prefix("oauth:").unwrap_or(token).to_string()
}

/// Channel logins are lowercase and carry no `#`.
fn channel_login(channel: &str) -> String {
    channel.trim().trim_start_matches('#').to_lowercase()
}

/// Open the connection and join the configured channel.
pub fn connect(config: &TwitchConfig) -> Result<(UnboundedReceiver<ServerMessage>, TwitchSink)> {
    let (client_config, authenticated) = match config.credentials() {
        Some((username, token)) => {
            info!("Connecting to Twitch as {}", username);
            let credentials =
                StaticLoginCredentials::new(username.to_lowercase(), Some(bare_token(token)));
            (ClientConfig::new_simple(credentials), true)
        }
        None => {
            info!("No bot credentials, connecting anonymously (read-only)");
            (ClientConfig::default(), false)
        }
    };

    let (incoming, client) = IrcClient::new(client_config);

    let channel = channel_login(&config.channel);
    client
        .join(channel.clone())
        .map_err(|e| anyhow!("Invalid channel name {}: {}", channel, e))?;

    Ok((
        incoming,
        TwitchSink {
            client,
            authenticated,
        },
    ))
}

fn to_chat_event(msg: PrivmsgMessage) -> ChatEvent {
    ChatEvent {
        channel: msg.channel_login,
        sender: msg.sender.name,
        text: msg.message_text,
    }
}

/// Feed chat messages to the relay until the connection closes.
/// Every message is handled on its own task; in-flight tasks are awaited
/// before returning.
pub async fn run(
    mut incoming: UnboundedReceiver<ServerMessage>,
    relay: Arc<Relay>,
    channel: &str,
) -> Result<()> {
    let channel = channel_login(channel);
    let mut tasks = JoinSet::new();

    info!("Listening on #{}", channel);

    while let Some(message) = incoming.recv().await {
        while tasks.try_join_next().is_some() {}

        match message {
            ServerMessage::Privmsg(msg) => {
                if msg.channel_login != channel {
                    debug!("Ignoring message from #{}", msg.channel_login);
                    continue;
                }
                let event = to_chat_event(msg);
                let relay = relay.clone();
                tasks.spawn(async move {
                    if let Err(e) = relay.handle(&event).await {
                        error!(
                            "Aborted command from {} in #{}: {:#}",
                            event.sender, event.channel, e
                        );
                    }
                });
            }
            ServerMessage::Join(join) => {
                info!("connected: joined #{}", join.channel_login);
            }
            ServerMessage::Reconnect(_) => {
                info!("reconnected");
            }
            ServerMessage::Notice(notice) => {
                warn!("Twitch notice: {}", notice.message_text);
            }
            _ => {}
        }
    }

    warn!("Twitch message stream closed");
    while tasks.join_next().await.is_some() {}
    Ok(())
}
