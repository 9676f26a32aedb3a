//! Background chat thread.
//!
//! Cloud requests block for seconds, so the router lives on its own thread
//! and the event loop polls for finished replies once per frame.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;

use super::{ChatContext, Reply, Responder, Router};
use crate::config::Settings;

enum Request {
    Chat { text: String, ctx: ChatContext },
    Reconfigure(Settings),
    Shutdown,
}

pub struct ChatWorker {
    requests: Sender<Request>,
    replies: Receiver<Reply>,
    handle: Option<JoinHandle<()>>,
    in_flight: usize,
}

impl ChatWorker {
    pub fn spawn(settings: &Settings) -> std::io::Result<Self> {
        let router = Router::new(settings, fastrand::Rng::new());
        Self::spawn_with(router)
    }

    fn spawn_with<R: Responder + Send + 'static>(mut responder: R) -> std::io::Result<Self>
    where
        R: Reconfigure,
    {
        let (req_tx, req_rx) = mpsc::channel::<Request>();
        let (reply_tx, reply_rx) = mpsc::channel::<Reply>();

        let handle = std::thread::Builder::new()
            .name("chat".into())
            .spawn(move || {
                while let Ok(request) = req_rx.recv() {
                    match request {
                        Request::Chat { text, ctx } => {
                            let reply = responder.respond(&text, &ctx);
                            if reply_tx.send(reply).is_err() {
                                break;
                            }
                        }
                        Request::Reconfigure(settings) => responder.reconfigure(&settings),
                        Request::Shutdown => break,
                    }
                }
                log::debug!("chat worker exiting");
            })?;

        Ok(Self {
            requests: req_tx,
            replies: reply_rx,
            handle: Some(handle),
            in_flight: 0,
        })
    }

    pub fn send(&mut self, text: &str, ctx: ChatContext) {
        let request = Request::Chat {
            text: text.to_string(),
            ctx,
        };
        if self.requests.send(request).is_ok() {
            self.in_flight += 1;
        } else {
            log::error!("chat worker is gone, message dropped");
        }
    }

    pub fn reconfigure(&self, settings: &Settings) {
        if self.requests.send(Request::Reconfigure(settings.clone())).is_err() {
            log::error!("chat worker is gone, settings not applied");
        }
    }

    /// Next finished reply, if any.
    pub fn try_recv(&mut self) -> Option<Reply> {
        match self.replies.try_recv() {
            Ok(reply) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(reply)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.in_flight = 0;
                None
            }
        }
    }

    /// A message was sent and its reply has not arrived yet.
    pub fn is_pending(&self) -> bool {
        self.in_flight > 0
    }
}

impl Drop for ChatWorker {
    fn drop(&mut self) {
        let _ = self.requests.send(Request::Shutdown);
        // A cloud request in progress may take a while; don't block exit on it.
        if let Some(handle) = self.handle.take() {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }
}

/// Responders that can pick up new settings on the worker thread.
pub trait Reconfigure {
    fn reconfigure(&mut self, settings: &Settings);
}

impl Reconfigure for Router {
    fn reconfigure(&mut self, settings: &Settings) {
        Router::reconfigure(self, settings);
    }
}
