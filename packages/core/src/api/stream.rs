// Живой поток входящих сообщений поверх observer транспорта

use crate::crypto::keys::PrivateKeyBundle;
use crate::protocol::message::Message;
use crate::protocol::transport::{ObserverHandle, Transport};
use crate::protocol::wire;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::{debug, warn};

struct HandleInner {
    transport: Arc<dyn Transport>,
    observer: ObserverHandle,
    topic: String,
    cancelled: AtomicBool,
}

/// Handle отмены подписки.
///
/// `cancel()` можно вызывать сколько угодно раз: отписка от транспорта
/// происходит ровно один раз, после неё поток больше ничего не отдаёт.
#[derive(Clone)]
pub struct StreamHandle {
    inner: Arc<HandleInner>,
}

impl StreamHandle {
    pub(crate) fn new(transport: Arc<dyn Transport>, observer: ObserverHandle, topic: String) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                transport,
                observer,
                topic,
                cancelled: AtomicBool::new(false),
            }),
        }
    }

    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.transport.unsubscribe(self.inner.observer);
        debug!(topic = %self.inner.topic, "Stream cancelled");
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub fn topic(&self) -> &str {
        &self.inner.topic
    }
}

/// Бесконечный поток расшифрованных сообщений для одного получателя.
///
/// Сам не завершается: только через [`StreamHandle::cancel`] или drop.
/// Payload, который не декодируется, не расшифровывается или не содержит
/// ciphertext, молча пропускается, чтобы одно битое сообщение не ломало поток.
pub struct MessageStream {
    receiver: mpsc::UnboundedReceiver<Vec<u8>>,
    recipient: PrivateKeyBundle,
    handle: StreamHandle,
}

impl MessageStream {
    pub(crate) fn new(
        receiver: mpsc::UnboundedReceiver<Vec<u8>>,
        recipient: PrivateKeyBundle,
        handle: StreamHandle,
    ) -> Self {
        Self {
            receiver,
            recipient,
            handle,
        }
    }

    pub fn handle(&self) -> StreamHandle {
        self.handle.clone()
    }

    fn open(&self, payload: &[u8]) -> Option<Message> {
        let mut message = match wire::decode(payload) {
            Ok(message) => message,
            Err(e) => {
                debug!(topic = %self.handle.topic(), error = %e, "Dropping undecodable payload");
                return None;
            }
        };

        if !message.is_decryptable() {
            debug!(topic = %self.handle.topic(), "Dropping envelope without ciphertext or sender");
            return None;
        }

        if let Err(e) = message.decrypt_with(&self.recipient) {
            warn!(topic = %self.handle.topic(), error = %e, "Dropping envelope that failed to decrypt");
            return None;
        }
        Some(message)
    }
}

impl Stream for MessageStream {
    type Item = Message;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if self.handle.is_cancelled() {
                return Poll::Ready(None);
            }

            match self.receiver.poll_recv(cx) {
                Poll::Ready(Some(payload)) => {
                    if let Some(message) = self.open(&payload) {
                        return Poll::Ready(Some(message));
                    }
                    // битый payload: ждём следующий
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for MessageStream {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}
