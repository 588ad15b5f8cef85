use photo_carousel::detail::carousel::{Direction, StepOutcome};
use photo_carousel::detail::{DetailOptions, DetailView};
use photo_carousel::gallery::{PhotoRef, TargetSize};
use photo_carousel::tasks::prefetch::{PrefetchBuffer, Slot, SlotImage};
use photo_carousel::testkit::StubAssetStore;
use std::sync::Arc;
use std::time::Duration;

fn photo_in(view: &DetailView, slot: Slot) -> Option<String> {
    view.slot(slot).photo().map(|p| p.as_str().to_owned())
}

fn step_and_finish(view: &mut DetailView, direction: Direction) {
    assert!(matches!(view.step(direction), StepOutcome::Started { .. }));
    view.transition_finished().expect("step in flight");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn out_of_order_completions_land_in_their_own_slots() {
    let store = Arc::new(StubAssetStore::with_photos(6));
    let photos: Arc<[PhotoRef]> = store.photos().into();
    let mut view =
        DetailView::new(photos, 0, store.clone(), DetailOptions::default()).expect("valid view");
    store.gate("photo-2");
    store.gate("photo-3");
    view.mount();
    tokio::time::timeout(Duration::from_secs(2), view.settle_images())
        .await
        .expect("first photos settle");

    step_and_finish(&mut view, Direction::Forward);
    step_and_finish(&mut view, Direction::Forward);
    assert_eq!(view.index(), 2);
    assert!(view.slot(Slot::Current).is_loading());
    assert!(view.slot(Slot::Next).is_loading());

    // The later photo finishes first.
    store.release("photo-3");
    let first = tokio::time::timeout(Duration::from_secs(2), view.next_image())
        .await
        .expect("completion arrives");
    assert_eq!(first, Some(Slot::Next));
    assert!(view.slot(Slot::Current).is_loading());

    store.release("photo-2");
    tokio::time::timeout(Duration::from_secs(2), view.settle_images())
        .await
        .expect("slots settle");
    assert_eq!(photo_in(&view, Slot::Previous).as_deref(), Some("photo-1"));
    assert_eq!(photo_in(&view, Slot::Current).as_deref(), Some("photo-2"));
    assert_eq!(photo_in(&view, Slot::Next).as_deref(), Some("photo-3"));
    for slot in Slot::ALL {
        assert!(matches!(view.slot(slot), SlotImage::Ready { .. }));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn leaving_a_neighbour_cancels_its_fetch() {
    let store = Arc::new(StubAssetStore::with_photos(4));
    let photos: Arc<[PhotoRef]> = store.photos().into();
    let mut view =
        DetailView::new(photos, 1, store.clone(), DetailOptions::default()).expect("valid view");
    view.mount();
    tokio::time::timeout(Duration::from_secs(2), view.settle_images())
        .await
        .expect("first photos settle");

    store.gate("photo-3");
    step_and_finish(&mut view, Direction::Forward);
    assert!(view.slot(Slot::Next).is_loading());
    assert_eq!(view.prefetch().in_flight(), 1);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(store.decode_count("photo-3"), 1);

    step_and_finish(&mut view, Direction::Backward);
    assert_eq!(view.prefetch().in_flight(), 1, "only the re-exposed previous photo");
    assert_eq!(photo_in(&view, Slot::Next).as_deref(), Some("photo-2"));
    tokio::time::timeout(Duration::from_secs(2), view.settle_images())
        .await
        .expect("slots settle without the gated photo");
    tokio::time::sleep(Duration::from_millis(20)).await;

    step_and_finish(&mut view, Direction::Forward);
    store.release("photo-3");
    tokio::time::timeout(Duration::from_secs(2), view.settle_images())
        .await
        .expect("refetched neighbour settles");
    assert_eq!(photo_in(&view, Slot::Next).as_deref(), Some("photo-3"));
    assert!(matches!(view.slot(Slot::Next), SlotImage::Ready { .. }));
    assert_eq!(store.decode_count("photo-3"), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reload_discards_results_from_the_earlier_round() {
    let store = Arc::new(StubAssetStore::with_photos(3));
    let photos: Arc<[PhotoRef]> = store.photos().into();
    let mut buffer = PrefetchBuffer::new(store.clone(), photos, TargetSize::Full);

    buffer.load_around(1);
    // Let the first round finish into the channel without applying it.
    tokio::time::sleep(Duration::from_millis(50)).await;
    buffer.load_around(1);
    assert_eq!(buffer.in_flight(), 3);

    tokio::time::timeout(Duration::from_secs(2), buffer.settle())
        .await
        .expect("second round settles");
    assert_eq!(buffer.in_flight(), 0);
    assert_eq!(store.total_decodes(), 6);
    for slot in Slot::ALL {
        assert!(matches!(buffer.slot(slot), SlotImage::Ready { .. }));
    }
}
