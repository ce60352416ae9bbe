// In-memory store-and-forward транспорт для тестов и локальных сценариев

use crate::protocol::transport::{
    Cursor, HistoryPage, HistoryQuery, Observer, ObserverHandle, SortDirection, StoredEnvelope,
    Transport,
};
use crate::utils::error::{OverlayError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

struct Registration {
    topics: Vec<String>,
    observer: Observer,
}

#[derive(Default)]
struct MemoryState {
    envelopes: Vec<StoredEnvelope>,
    observers: HashMap<u64, Registration>,
    queries: Vec<HistoryQuery>,
    publish_count: usize,
}

/// In-memory транспорт: хранит всё опубликованное и раздаёт его observers
#[derive(Default)]
pub struct MemoryTransport {
    state: Mutex<MemoryState>,
    next_observer_id: AtomicU64,
    offline: AtomicBool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// В offline-режиме publish и query_history возвращают ошибку транспорта
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Положить запись в историю без доставки observers
    pub fn store(&self, envelope: StoredEnvelope) -> Result<()> {
        self.lock()?.envelopes.push(envelope);
        Ok(())
    }

    pub fn publish_count(&self) -> usize {
        self.lock().map(|s| s.publish_count).unwrap_or(0)
    }

    pub fn observer_count(&self) -> usize {
        self.lock().map(|s| s.observers.len()).unwrap_or(0)
    }

    /// Все запросы истории в порядке поступления
    pub fn queries(&self) -> Vec<HistoryQuery> {
        self.lock().map(|s| s.queries.clone()).unwrap_or_default()
    }

    /// Payload'ы, опубликованные в topic
    pub fn envelopes_for(&self, topic: &str) -> Vec<StoredEnvelope> {
        self.lock()
            .map(|s| {
                s.envelopes
                    .iter()
                    .filter(|e| e.content_topic == topic)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| OverlayError::Transport("memory transport state poisoned".to_string()))
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(OverlayError::Transport("transport is offline".to_string()));
        }
        Ok(())
    }
}

fn decode_cursor(cursor: &Cursor) -> Result<usize> {
    let bytes: [u8; 8] = cursor
        .0
        .as_slice()
        .try_into()
        .map_err(|_| OverlayError::Transport("invalid history cursor".to_string()))?;
    Ok(u64::from_be_bytes(bytes) as usize)
}

fn encode_cursor(offset: usize) -> Cursor {
    Cursor((offset as u64).to_be_bytes().to_vec())
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn publish(&self, topic: &str, payload: Vec<u8>, timestamp: DateTime<Utc>) -> Result<()> {
        self.ensure_online()?;

        let observers: Vec<Observer> = {
            let mut state = self.lock()?;
            state.publish_count += 1;
            state.envelopes.push(StoredEnvelope {
                content_topic: topic.to_string(),
                payload: Some(payload.clone()),
                timestamp,
            });
            state
                .observers
                .values()
                .filter(|r| r.topics.iter().any(|t| t == topic))
                .map(|r| r.observer.clone())
                .collect()
        };

        debug!(topic = %topic, observers = observers.len(), "Published envelope");

        // Observers вызываются без удержания lock: они могут снова обратиться к транспорту
        for observer in observers {
            observer(payload.clone());
        }
        Ok(())
    }

    fn subscribe(&self, topics: &[String], on_message: Observer) -> Result<ObserverHandle> {
        let id = self.next_observer_id.fetch_add(1, Ordering::SeqCst);
        self.lock()?.observers.insert(
            id,
            Registration {
                topics: topics.to_vec(),
                observer: on_message,
            },
        );
        Ok(ObserverHandle(id))
    }

    fn unsubscribe(&self, handle: ObserverHandle) {
        let Ok(mut state) = self.lock() else {
            return;
        };
        if state.observers.remove(&handle.0).is_some() {
            debug!(observer = handle.0, "Observer removed");
        }
    }

    async fn query_history(&self, query: &HistoryQuery, cursor: Option<Cursor>) -> Result<HistoryPage> {
        self.ensure_online()?;
        let offset = cursor.as_ref().map(decode_cursor).transpose()?.unwrap_or(0);

        let mut state = self.lock()?;
        state.queries.push(query.clone());

        let mut matching: Vec<StoredEnvelope> = state
            .envelopes
            .iter()
            .filter(|e| query.content_topics.contains(&e.content_topic))
            .filter(|e| e.timestamp >= query.start_time && e.timestamp <= query.end_time)
            .cloned()
            .collect();

        // sort_by_key стабилен: одинаковые timestamp остаются в порядке публикации
        matching.sort_by_key(|e| e.timestamp);
        if query.direction == SortDirection::Backward {
            matching.reverse();
        }

        let page_size = query.page_size.max(1) as usize;
        let end = (offset + page_size).min(matching.len());
        let envelopes = matching
            .get(offset..end)
            .map(|page| page.to_vec())
            .unwrap_or_default();
        let cursor = (end < matching.len()).then(|| encode_cursor(end));

        Ok(HistoryPage { envelopes, cursor })
    }
}
