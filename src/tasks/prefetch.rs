//! Three-slot image buffer around the carousel's current index.
//!
//! Slots hold the previous, current and next photo. Every fetch is tagged with
//! a [`RequestToken`]; a completion is written only into the slot that is still
//! waiting for that exact photo and token, so results from superseded requests
//! are dropped no matter what order they arrive in.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::select;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::detail::carousel::Direction;
use crate::events::{FetchCompleted, RequestToken};
use crate::gallery::{AssetStore, DecodedImage, PhotoId, PhotoRef, TargetSize};

const COMPLETION_CHANNEL_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Previous,
    Current,
    Next,
}

impl Slot {
    pub const ALL: [Self; 3] = [Self::Previous, Self::Current, Self::Next];

    const fn position(self) -> usize {
        match self {
            Self::Previous => 0,
            Self::Current => 1,
            Self::Next => 2,
        }
    }

    fn from_position(position: usize) -> Self {
        match position {
            0 => Self::Previous,
            1 => Self::Current,
            _ => Self::Next,
        }
    }

    /// Index this slot represents when `center` is the current index.
    fn target_index(self, center: usize, len: usize) -> Option<usize> {
        let index = match self {
            Self::Previous => center.checked_sub(1)?,
            Self::Current => center,
            Self::Next => center + 1,
        };
        (index < len).then_some(index)
    }
}

#[derive(Debug, Clone, Default)]
pub enum SlotImage {
    /// Nothing belongs here (sequence boundary, or not mounted).
    #[default]
    Empty,
    Loading {
        photo: PhotoId,
        token: RequestToken,
    },
    Ready {
        photo: PhotoId,
        image: Arc<DecodedImage>,
    },
    /// The store could not produce an image for this photo.
    Unavailable { photo: PhotoId },
}

impl SlotImage {
    #[must_use]
    pub fn photo(&self) -> Option<&PhotoId> {
        match self {
            Self::Empty => None,
            Self::Loading { photo, .. }
            | Self::Ready { photo, .. }
            | Self::Unavailable { photo } => Some(photo),
        }
    }

    #[must_use]
    pub fn image(&self) -> Option<&Arc<DecodedImage>> {
        match self {
            Self::Ready { image, .. } => Some(image),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

/// Owner of the three slots. Lives on the UI-affine context; decodes run on
/// spawned tasks and come back through [`PrefetchBuffer::poll_completions`] or
/// [`PrefetchBuffer::next_completion`].
///
/// Methods that issue fetches must be called from within a tokio runtime.
pub struct PrefetchBuffer {
    store: Arc<dyn AssetStore>,
    photos: Arc<[PhotoRef]>,
    target: TargetSize,
    slots: [SlotImage; 3],
    center: Option<usize>,
    next_token: u64,
    in_flight: HashMap<RequestToken, CancellationToken>,
    cancel: CancellationToken,
    completed_tx: Sender<FetchCompleted>,
    completed_rx: Receiver<FetchCompleted>,
}

impl PrefetchBuffer {
    pub fn new(store: Arc<dyn AssetStore>, photos: Arc<[PhotoRef]>, target: TargetSize) -> Self {
        let (completed_tx, completed_rx) = mpsc::channel(COMPLETION_CHANNEL_CAPACITY);
        Self {
            store,
            photos,
            target,
            slots: Default::default(),
            center: None,
            next_token: 0,
            in_flight: HashMap::new(),
            cancel: CancellationToken::new(),
            completed_tx,
            completed_rx,
        }
    }

    #[must_use]
    pub fn slot(&self, slot: Slot) -> &SlotImage {
        &self.slots[slot.position()]
    }

    #[must_use]
    pub fn center(&self) -> Option<usize> {
        self.center
    }

    /// Number of fetches still awaiting completion.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Whether any slot is still waiting for its image.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.slots.iter().any(SlotImage::is_loading)
    }

    /// Populate all three slots for `index`, current first.
    ///
    /// Out-of-range neighbours are set to [`SlotImage::Empty`] explicitly.
    pub fn load_around(&mut self, index: usize) {
        if index >= self.photos.len() {
            warn!(index, len = self.photos.len(), "load_around outside gallery");
            return;
        }
        for slot in Slot::ALL {
            self.clear(slot);
        }
        self.center = Some(index);
        for slot in [Slot::Current, Slot::Previous, Slot::Next] {
            if let Some(target) = slot.target_index(index, self.photos.len()) {
                self.issue(slot, target);
            }
        }
    }

    /// Rotate the slots one step after a committed navigation.
    ///
    /// The neighbour in the travel direction becomes current without a new
    /// fetch; only the newly exposed neighbour is requested.
    pub fn shift(&mut self, direction: Direction) {
        let Some(center) = self.center else {
            warn!(?direction, "shift before load_around; ignoring");
            return;
        };
        let len = self.photos.len();
        let (new_center, exposed) = match direction {
            Direction::Forward if center + 1 < len => {
                self.clear(Slot::Previous);
                self.slots.rotate_left(1);
                (center + 1, Slot::Next)
            }
            Direction::Backward if center > 0 => {
                self.clear(Slot::Next);
                self.slots.rotate_right(1);
                (center - 1, Slot::Previous)
            }
            _ => {
                warn!(?direction, center, len, "shift past gallery boundary; ignoring");
                return;
            }
        };
        self.center = Some(new_center);
        debug!(?direction, center = new_center, "prefetch slots rotated");
        if let Some(target) = exposed.target_index(new_center, len) {
            self.issue(exposed, target);
        }
    }

    /// Cancel every in-flight fetch and drop the slots still waiting on one.
    pub fn cancel_all(&mut self) {
        for (token, cancel) in self.in_flight.drain() {
            debug!(token = token.0, "cancelling fetch");
            cancel.cancel();
        }
        for slot in &mut self.slots {
            if slot.is_loading() {
                *slot = SlotImage::Empty;
            }
        }
    }

    /// Apply every completion that has already arrived. Returns the slots that changed.
    pub fn poll_completions(&mut self) -> Vec<Slot> {
        let mut changed = Vec::new();
        while let Ok(done) = self.completed_rx.try_recv() {
            if let Some(slot) = self.apply(done) {
                changed.push(slot);
            }
        }
        changed
    }

    /// Wait for the next completion that lands in a slot.
    ///
    /// Returns `None` once nothing is left in flight.
    pub async fn next_completion(&mut self) -> Option<Slot> {
        while !self.in_flight.is_empty() {
            let done = self.completed_rx.recv().await?;
            if let Some(slot) = self.apply(done) {
                return Some(slot);
            }
        }
        None
    }

    /// Wait until no slot is loading.
    pub async fn settle(&mut self) {
        while self.has_pending() {
            if self.next_completion().await.is_none() {
                break;
            }
        }
    }

    fn apply(&mut self, done: FetchCompleted) -> Option<Slot> {
        self.in_flight.remove(&done.token);
        let position = self.slots.iter().position(|slot| {
            matches!(slot, SlotImage::Loading { photo, token }
                if *token == done.token && *photo == done.photo)
        });
        let Some(position) = position else {
            debug!(
                token = done.token.0,
                photo = %done.photo,
                "discarding stale fetch result"
            );
            return None;
        };
        let slot = Slot::from_position(position);
        self.slots[position] = match done.image {
            Some(image) => {
                debug!(?slot, photo = %done.photo, "slot ready");
                SlotImage::Ready {
                    photo: done.photo,
                    image,
                }
            }
            None => {
                warn!(?slot, photo = %done.photo, "image unavailable");
                SlotImage::Unavailable { photo: done.photo }
            }
        };
        Some(slot)
    }

    fn clear(&mut self, slot: Slot) {
        let previous = std::mem::take(&mut self.slots[slot.position()]);
        if let SlotImage::Loading { token, .. } = previous {
            if let Some(cancel) = self.in_flight.remove(&token) {
                cancel.cancel();
            }
        }
    }

    fn issue(&mut self, slot: Slot, index: usize) {
        let photo = self.photos[index].clone();
        let token = RequestToken(self.next_token);
        self.next_token += 1;

        let cancel = self.cancel.child_token();
        self.in_flight.insert(token, cancel.clone());
        self.slots[slot.position()] = SlotImage::Loading {
            photo: photo.id().clone(),
            token,
        };
        debug!(
            ?slot,
            index,
            photo = %photo.id(),
            token = token.0,
            priority = slot == Slot::Current,
            "fetch issued"
        );

        let store = Arc::clone(&self.store);
        let target = self.target;
        let tx = self.completed_tx.clone();
        tokio::spawn(async move {
            let image = select! {
                _ = cancel.cancelled() => return,
                image = store.decode(&photo, target) => image,
            };
            let done = FetchCompleted {
                token,
                photo: photo.id().clone(),
                image: image.map(Arc::new),
            };
            // Receiver gone means the buffer was dropped; nothing to do.
            let _ = tx.send(done).await;
        });
    }
}

impl Drop for PrefetchBuffer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
