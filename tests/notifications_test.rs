//! End-to-end notification routing through a live session.

mod common;

use async_trait::async_trait;
use bytes::Bytes;
use common::tagged_frame;
use pipevis_rs::client::{PipelineService, Throttled};
use pipevis_rs::notify::{DISPLAY_ADD_INPUT, DISPLAY_RENDER};
use pipevis_rs::session::Session;
use pipevis_rs::types::{NodeId, Pipeline, PipelineId, SessionId};
use pipevis_rs::{FrameDecoder, Result};
use rmpv::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

struct EchoService;

#[async_trait]
impl PipelineService for EchoService {
    async fn submit_pipeline(&self, _session: &SessionId, pipeline: &Pipeline) -> Result<Pipeline> {
        Ok(pipeline.clone())
    }
}

fn start_session() -> (Session, mpsc::Sender<Bytes>) {
    common::init_tracing();
    let (tx, rx) = mpsc::channel(64);
    let session = Session::start(
        SessionId::from("s1"),
        FrameDecoder::tagged(),
        rx,
        Arc::new(Throttled::new(EchoService)),
    );
    (session, tx)
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached within 2s");
}

#[tokio::test]
async fn test_frames_route_to_the_addressed_display_only() {
    let (session, tx) = start_session();
    let d1 = session.open_display(NodeId::from("d1"));
    let d2 = session.open_display(NodeId::from("d2"));

    let d1_hits = Arc::new(AtomicUsize::new(0));
    let d2_hits = Arc::new(AtomicUsize::new(0));
    {
        let hits = d1_hits.clone();
        d1.subscribe(DISPLAY_RENDER, move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });
    }
    {
        let hits = d2_hits.clone();
        d2.subscribe(DISPLAY_RENDER, move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });
    }

    let frame = tagged_frame(
        DISPLAY_RENDER,
        vec![
            ("displayId", "d1".into()),
            ("imageSrc", Value::Binary(vec![0x89, b'P', b'N', b'G'])),
        ],
    );
    tx.send(Bytes::from(frame)).await.unwrap();

    let hits = d1_hits.clone();
    wait_until(move || hits.load(Ordering::SeqCst) == 1).await;
    assert_eq!(d2_hits.load(Ordering::SeqCst), 0);

    session.shutdown().await;
}

#[tokio::test]
async fn test_frames_dispatch_in_arrival_order() {
    let (session, tx) = start_session();
    let display = session.open_display(NodeId::from("d1"));

    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_in = seen.clone();
    display.subscribe(DISPLAY_ADD_INPUT, move |envelope| {
        if let Some(source) = envelope.source_id() {
            seen_in.lock().unwrap().push(source);
        }
    });

    for i in 0..10 {
        let frame = common::tagged_frame_json(
            DISPLAY_ADD_INPUT,
            serde_json::json!({
                "displayId": "d1",
                "sourceId": format!("op{i}"),
                "label": "spectrum",
            }),
        );
        tx.send(Bytes::from(frame)).await.unwrap();
    }

    let seen_wait = seen.clone();
    wait_until(move || seen_wait.lock().unwrap().len() == 10).await;
    let order = seen.lock().unwrap().clone();
    let expected: Vec<String> = (0..10).map(|i| format!("op{i}")).collect();
    assert_eq!(order, expected);

    session.shutdown().await;
}

#[tokio::test]
async fn test_bad_frames_do_not_break_the_stream() {
    let (session, tx) = start_session();
    let display = session.open_display(NodeId::from("d1"));

    let hits = Arc::new(AtomicUsize::new(0));
    let hits_in = hits.clone();
    display.subscribe(DISPLAY_RENDER, move |_| {
        hits_in.fetch_add(1, Ordering::SeqCst);
    });

    // Undecodable garbage, then a foreign frame, then a real one.
    tx.send(Bytes::from_static(&[0xc1, 0xff, 0x00]))
        .await
        .unwrap();
    let foreign = common::encode_frame(&Value::Map(vec![
        ("type".into(), "@@OTHER".into()),
        ("action".into(), DISPLAY_RENDER.into()),
    ]));
    tx.send(Bytes::from(foreign)).await.unwrap();
    let good = tagged_frame(DISPLAY_RENDER, vec![("displayId", "d1".into())]);
    tx.send(Bytes::from(good)).await.unwrap();

    let hits_wait = hits.clone();
    wait_until(move || hits_wait.load(Ordering::SeqCst) == 1).await;
    assert!(session.notifications().dropped_frames() >= 1);
    assert!(session.notifications().foreign_frames() >= 1);

    session.shutdown().await;
}

#[tokio::test]
async fn test_double_subscribe_delivers_once() {
    let (session, tx) = start_session();
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_in = hits.clone();
    let listener = pipevis_rs::notify::listener(move |_| {
        hits_in.fetch_add(1, Ordering::SeqCst);
    });
    session.notifications().subscribe(DISPLAY_RENDER, &listener);
    session.notifications().subscribe(DISPLAY_RENDER, &listener);

    let frame = tagged_frame(DISPLAY_RENDER, vec![("displayId", "d1".into())]);
    tx.send(Bytes::from(frame)).await.unwrap();

    let hits_wait = hits.clone();
    wait_until(move || hits_wait.load(Ordering::SeqCst) >= 1).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    session.shutdown().await;
}

#[tokio::test]
async fn test_unsubscribed_listener_sees_no_future_frames() {
    let (session, tx) = start_session();
    let display = session.open_display(NodeId::from("d1"));

    let hits = Arc::new(AtomicUsize::new(0));
    let hits_in = hits.clone();
    let handle = display.subscribe(DISPLAY_RENDER, move |_| {
        hits_in.fetch_add(1, Ordering::SeqCst);
    });

    let frame = tagged_frame(DISPLAY_RENDER, vec![("displayId", "d1".into())]);
    tx.send(Bytes::from(frame.clone())).await.unwrap();
    let hits_wait = hits.clone();
    wait_until(move || hits_wait.load(Ordering::SeqCst) == 1).await;

    display.unsubscribe(DISPLAY_RENDER, &handle);
    tx.send(Bytes::from(frame)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    session.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_releases_listeners() {
    let (session, _tx) = start_session();
    let display = session.open_display(NodeId::from("d1"));
    display.subscribe(DISPLAY_RENDER, |_| {});
    let notifications = session.notifications().clone();
    assert_eq!(notifications.listener_count(DISPLAY_RENDER), 1);

    drop(display); // channel teardown removes its own registrations
    assert_eq!(notifications.listener_count(DISPLAY_RENDER), 0);

    let d2 = session.open_display(NodeId::from("d2"));
    let handle = d2.subscribe(DISPLAY_RENDER, |_| {});
    assert_eq!(notifications.listener_count(DISPLAY_RENDER), 1);

    session.shutdown().await;
    assert_eq!(notifications.listener_count(DISPLAY_RENDER), 0);
    drop(handle);
}

#[tokio::test]
async fn test_submit_goes_through_the_throttled_service() {
    let (session, _tx) = start_session();
    let pipeline = Pipeline::empty(PipelineId::from("p1"));
    let returned = session.submit(&pipeline).await.unwrap();
    assert_eq!(returned, pipeline);
    session.shutdown().await;
}
