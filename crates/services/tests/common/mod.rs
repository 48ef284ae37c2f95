#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{Label, Landmark, LandmarkFrame, LandmarkSnapshot, PredictionCandidate, Quiz};
use services::capture::{
    CameraSource, Category, Frame, FrameRenderer, GestureClassifier, LandmarkExtractor,
};
use services::error::{CaptureError, TransportError};
use services::sessions::{SessionEvent, SessionView};
use services::transport::ClassificationTransport;
use services::EngineConfig;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Notify, mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// Shared log of teardown steps, in call order.
pub type Journal = Arc<Mutex<Vec<&'static str>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<&'static str> {
    journal.lock().unwrap().clone()
}

pub fn quiz(labels: &[&str]) -> Quiz {
    Quiz::new(labels.iter().map(|s| Label::new(*s).unwrap())).unwrap()
}

/// Every render callback is sampled.
pub fn config() -> EngineConfig {
    EngineConfig {
        render_rate: 30,
        target_sample_rate: 30,
        ..EngineConfig::default()
    }
}

pub fn frame(timestamp_ms: i64) -> Frame {
    Frame::new(2, 2, timestamp_ms, vec![0; 16]).unwrap()
}

// ─── CAMERA ────────────────────────────────────────────────────────────────────

pub struct FakeCamera {
    frames: mpsc::UnboundedReceiver<Frame>,
    available: bool,
    journal: Journal,
}

impl FakeCamera {
    pub fn new(journal: &Journal) -> (Self, mpsc::UnboundedSender<Frame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let camera = Self {
            frames: rx,
            available: true,
            journal: Arc::clone(journal),
        };
        (camera, tx)
    }

    pub fn unavailable(journal: &Journal) -> Self {
        let (camera, _tx) = Self::new(journal);
        Self {
            available: false,
            ..camera
        }
    }
}

#[async_trait]
impl CameraSource for FakeCamera {
    async fn acquire(&mut self) -> Result<(), CaptureError> {
        if self.available {
            Ok(())
        } else {
            Err(CaptureError::CameraUnavailable("permission denied".into()))
        }
    }

    async fn next_frame(&mut self) -> Option<Frame> {
        self.frames.recv().await
    }

    fn release(&mut self) {
        self.journal.lock().unwrap().push("camera.release");
    }
}

/// A camera whose backlog never drains: every poll yields a frame at once.
pub struct BusyCamera {
    next: i64,
    journal: Journal,
}

impl BusyCamera {
    pub fn new(journal: &Journal) -> Self {
        Self {
            next: 0,
            journal: Arc::clone(journal),
        }
    }
}

#[async_trait]
impl CameraSource for BusyCamera {
    async fn acquire(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    async fn next_frame(&mut self) -> Option<Frame> {
        self.next += 1;
        Some(frame(self.next))
    }

    fn release(&mut self) {
        self.journal.lock().unwrap().push("camera.release");
    }
}

/// Keeps the pixels of every rendered frame.
#[derive(Clone, Default)]
pub struct CapturingRenderer {
    pub rendered: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl FrameRenderer for CapturingRenderer {
    fn render(&mut self, frame: &Frame) {
        self.rendered.lock().unwrap().push(frame.pixels().to_vec());
    }
}

// ─── MODELS ────────────────────────────────────────────────────────────────────

pub struct FakeClassifier {
    pub calls: Arc<AtomicUsize>,
    categories: Vec<Category>,
    journal: Journal,
}

impl FakeClassifier {
    pub fn answering(name: &str, score: f64, journal: &Journal) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            categories: vec![Category::new(name, score)],
            journal: Arc::clone(journal),
        }
    }
}

#[async_trait]
impl GestureClassifier for FakeClassifier {
    async fn classify(
        &mut self,
        _frame: &Frame,
        _timestamp_ms: i64,
    ) -> Result<Vec<Category>, CaptureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.categories.clone())
    }

    async fn close(&mut self) {
        self.journal.lock().unwrap().push("model.close");
    }
}

pub struct FakeExtractor {
    journal: Journal,
}

impl FakeExtractor {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Arc::clone(journal),
        }
    }
}

#[async_trait]
impl LandmarkExtractor for FakeExtractor {
    async fn extract(&mut self, _frame: &Frame) -> Result<LandmarkFrame, CaptureError> {
        Ok(LandmarkFrame {
            right_hand_landmarks: Some(vec![Landmark::new(0.5, 0.5, 0.0)]),
            ..LandmarkFrame::default()
        })
    }

    async fn close(&mut self) {
        self.journal.lock().unwrap().push("model.close");
    }
}

// ─── TRANSPORT ─────────────────────────────────────────────────────────────────

/// Replies with fixed candidates; optionally holds every reply until released.
pub struct FakeTransport {
    reply: Vec<PredictionCandidate>,
    gate: Option<Arc<Notify>>,
    pub pushes: AtomicUsize,
    pub submitted: Mutex<Vec<usize>>,
    journal: Journal,
}

impl FakeTransport {
    pub fn replying(reply: &[(&str, f64)], journal: &Journal) -> Self {
        Self {
            reply: reply
                .iter()
                .map(|(label, confidence)| PredictionCandidate::new(*label, *confidence).unwrap())
                .collect(),
            gate: None,
            pushes: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
            journal: Arc::clone(journal),
        }
    }

    #[must_use]
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl ClassificationTransport for FakeTransport {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn push(&self, _snapshot: &LandmarkSnapshot) -> Result<(), TransportError> {
        self.pushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn submit(
        &self,
        evidence: Vec<LandmarkSnapshot>,
    ) -> Result<Vec<PredictionCandidate>, TransportError> {
        self.submitted.lock().unwrap().push(evidence.len());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(self.reply.clone())
    }

    async fn close(&self) {
        self.journal.lock().unwrap().push("transport.close");
    }
}

// ─── SERVERS ───────────────────────────────────────────────────────────────────

/// Serves one HTTP request with a fixed response. Yields the request body.
pub async fn serve_http_once(status: &'static str, body: &'static str) -> (Url, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = Url::parse(&format!("http://{}/api/vocab-predict", listener.local_addr().unwrap())).unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request_body(&mut stream).await;
        let _ = tx.send(request);
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        let _ = stream.shutdown().await;
    });
    (url, rx)
}

async fn read_request_body(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            return String::new();
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).into_owned();
        let Some(end) = text.find("\r\n\r\n") else {
            continue;
        };
        let length = text[..end]
            .lines()
            .find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        if text.len() >= end + 4 + length {
            return text[end + 4..end + 4 + length].to_string();
        }
    }
}

/// Server side of one Socket.IO connection, after the namespace handshake.
pub struct SocketIoPeer {
    from_client: mpsc::UnboundedReceiver<String>,
    to_client: mpsc::UnboundedSender<String>,
}

impl SocketIoPeer {
    pub fn send(&self, text: &str) {
        self.to_client.send(text.to_string()).unwrap();
    }

    pub async fn recv(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(5), self.from_client.recv())
            .await
            .expect("timed out waiting for a client packet")
            .expect("client connection ended")
    }
}

/// Accepts one WebSocket connection and performs the Engine.IO open and
/// namespace join the way a Flask-SocketIO service does.
pub async fn socketio_server() -> (Url, SocketIoPeer) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = Url::parse(&format!(
        "ws://{}/socket.io/?EIO=4&transport=websocket",
        listener.local_addr().unwrap()
    ))
    .unwrap();
    let (from_client_tx, from_client) = mpsc::unbounded_channel();
    let (to_client, mut to_client_rx) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
        let open = r#"0{"sid":"eio-1","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
        socket.send(Message::Text(open.into())).await.unwrap();
        match socket.next().await {
            Some(Ok(Message::Text(text))) if text == "40" => {}
            other => panic!("expected a namespace connect, got {other:?}"),
        }
        socket.send(Message::Text(r#"40{"sid":"ns-1"}"#.into())).await.unwrap();

        loop {
            tokio::select! {
                text = to_client_rx.recv() => match text {
                    Some(text) => socket.send(Message::Text(text)).await.unwrap(),
                    None => break,
                },
                message = socket.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        let _ = from_client_tx.send(text);
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                },
            }
        }
    });

    (url, SocketIoPeer { from_client, to_client })
}

// ─── EVENTS ────────────────────────────────────────────────────────────────────

/// Reads events until one satisfies `pred`.
pub async fn wait_for_event(
    events: &mut mpsc::UnboundedReceiver<SessionEvent>,
    pred: impl Fn(&SessionEvent) -> bool,
) -> SessionEvent {
    let search = async {
        while let Some(event) = events.recv().await {
            if pred(&event) {
                return event;
            }
        }
        panic!("event channel closed before the expected event");
    };
    tokio::time::timeout(Duration::from_secs(5), search)
        .await
        .expect("timed out waiting for session event")
}

/// Reads events until a view satisfies `pred`.
pub async fn wait_for_view(
    events: &mut mpsc::UnboundedReceiver<SessionEvent>,
    pred: impl Fn(&SessionView) -> bool,
) -> SessionView {
    match wait_for_event(events, |event| matches!(event, SessionEvent::Updated(view) if pred(view))).await {
        SessionEvent::Updated(view) => view,
        _ => unreachable!(),
    }
}
