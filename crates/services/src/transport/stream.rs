use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use quiz_core::model::{LandmarkSnapshot, PredictionCandidate};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use url::Url;

use super::ClassificationTransport;
use super::socketio::{self, Packet};
use super::wire::{LANDMARKS_EVENT, PREDICT_EVENT, PredictionRecord, into_candidates};
use crate::error::TransportError;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Reply = oneshot::Sender<Result<Vec<PredictionCandidate>, TransportError>>;

enum Outbound {
    Push(String),
    Evaluate(Reply),
    Close,
}

struct Link {
    tx: mpsc::UnboundedSender<Outbound>,
    task: JoinHandle<()>,
}

/// Pushes each snapshot over a persistent Socket.IO channel as it is
/// retained; the service accumulates them per connection and answers the
/// predict event through an acknowledgement.
pub struct StreamingTransport {
    url: Url,
    link: Mutex<Option<Link>>,
}

impl StreamingTransport {
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            url,
            link: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn send(&self, outbound: Outbound) -> Result<(), TransportError> {
        let link = self.link.lock().await;
        let link = link.as_ref().ok_or(TransportError::NotConnected)?;
        link.tx.send(outbound).map_err(|_| TransportError::ChannelClosed)
    }
}

#[async_trait]
impl ClassificationTransport for StreamingTransport {
    fn name(&self) -> &'static str {
        "stream"
    }

    async fn connect(&self) -> Result<(), TransportError> {
        let mut link = self.link.lock().await;
        if link.as_ref().is_some_and(|l| !l.task.is_finished()) {
            return Ok(());
        }
        let (mut socket, _) = connect_async(self.url.as_str()).await?;
        let sid = tokio::time::timeout(HANDSHAKE_TIMEOUT, handshake(&mut socket))
            .await
            .map_err(|_| TransportError::HandshakeTimeout)??;
        info!(url = %self.url, %sid, "streaming channel open");
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_channel(socket, rx));
        *link = Some(Link { tx, task });
        Ok(())
    }

    async fn push(&self, snapshot: &LandmarkSnapshot) -> Result<(), TransportError> {
        let text = socketio::event(LANDMARKS_EVENT, snapshot)?;
        self.send(Outbound::Push(text)).await
    }

    async fn submit(
        &self,
        _evidence: Vec<LandmarkSnapshot>,
    ) -> Result<Vec<PredictionCandidate>, TransportError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Outbound::Evaluate(reply_tx)).await?;
        reply_rx.await.map_err(|_| TransportError::ChannelClosed)?
    }

    async fn close(&self) {
        let Some(link) = self.link.lock().await.take() else {
            return;
        };
        let _ = link.tx.send(Outbound::Close);
        let mut task = link.task;
        if tokio::time::timeout(CLOSE_TIMEOUT, &mut task).await.is_err() {
            warn!(url = %self.url, "streaming channel did not close in time; aborting");
            task.abort();
        }
        info!(url = %self.url, "streaming channel closed");
    }
}

/// Waits for the Engine.IO open packet, joins the default namespace and
/// returns the Engine.IO session id.
async fn handshake(socket: &mut Socket) -> Result<String, TransportError> {
    let mut sid = None;
    while let Some(message) = socket.next().await {
        let Message::Text(text) = message? else {
            continue;
        };
        match socketio::decode(&text)? {
            Packet::Open(open) => {
                debug!(sid = %open.sid, ping_interval = open.ping_interval, "engine session open");
                sid = Some(open.sid);
                socket.send(Message::Text(socketio::CONNECT.into())).await?;
            }
            Packet::Connect => {
                return sid.ok_or_else(|| TransportError::Protocol("namespace joined before open".into()));
            }
            Packet::ConnectError(reason) => {
                return Err(TransportError::Protocol(format!("connection refused: {reason}")));
            }
            Packet::Ping => socket.send(Message::Text(socketio::PONG.into())).await?,
            packet => debug!(?packet, "ignoring packet during handshake"),
        }
    }
    Err(TransportError::ChannelClosed)
}

async fn run_channel(socket: Socket, mut rx: mpsc::UnboundedReceiver<Outbound>) {
    let (mut sink, mut source) = socket.split();
    let mut waiting: HashMap<u64, Reply> = HashMap::new();
    let mut next_ack = 0u64;

    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(Outbound::Push(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        warn!("streaming push failed: {e}");
                        break;
                    }
                }
                Some(Outbound::Evaluate(reply)) => {
                    let id = next_ack;
                    next_ack += 1;
                    match sink.send(Message::Text(socketio::ack_request(PREDICT_EVENT, id))).await {
                        Ok(()) => {
                            waiting.insert(id, reply);
                        }
                        Err(e) => {
                            let _ = reply.send(Err(e.into()));
                            break;
                        }
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = sink.send(Message::Text(socketio::DISCONNECT.into())).await;
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            inbound = source.next() => match inbound {
                Some(Ok(Message::Text(text))) => match socketio::decode(&text) {
                    Ok(Packet::Ping) => {
                        if let Err(e) = sink.send(Message::Text(socketio::PONG.into())).await {
                            warn!("streaming heartbeat failed: {e}");
                            break;
                        }
                    }
                    Ok(Packet::Ack { id, args }) => match waiting.remove(&id) {
                        Some(reply) => {
                            let _ = reply.send(ack_candidates(args));
                        }
                        None => debug!(id, "ignoring unmatched acknowledgement"),
                    },
                    Ok(Packet::Close | Packet::Disconnect) => {
                        debug!("server closed streaming channel");
                        break;
                    }
                    Ok(packet) => debug!(?packet, "ignoring packet"),
                    Err(e) => warn!("{e}"),
                },
                Some(Ok(Message::Close(_))) | None => {
                    debug!("server closed streaming channel");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("streaming channel error: {e}");
                    break;
                }
            },
        }
    }
    // Dropping `waiting` resolves every outstanding evaluate with `ChannelClosed`.
}

/// The predict handler acknowledges with its return value as the only
/// argument: a candidate array, or nothing when it had no evidence.
fn ack_candidates(args: Vec<Value>) -> Result<Vec<PredictionCandidate>, TransportError> {
    match args.into_iter().next() {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => {
            let records: Vec<PredictionRecord> = serde_json::from_value(value)?;
            Ok(into_candidates(records))
        }
    }
}
