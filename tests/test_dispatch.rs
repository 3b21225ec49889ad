//! Message dispatch: connectivity guards, normalization, send events

mod common;

use common::{connect, manager, wait_for, Sent};
use wamux::{AuthMethod, Event, ImageContent, WamuxError};

#[tokio::test]
async fn send_on_missing_session_fails_fast() {
    let (manager, transport, _store) = manager();

    match manager.send_text("ghost", "628999", "hi").await {
        Err(WamuxError::NotConnected(id)) => assert_eq!(id, "ghost"),
        other => panic!("expected not-connected, got {other:?}"),
    }
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn send_on_unstarted_session_fails_fast() {
    let (manager, transport, _store) = manager();
    manager.create_session("s1").await.unwrap();

    match manager.send_text("s1", "628999", "hi").await {
        Err(WamuxError::NotConnected(_)) => {}
        other => panic!("expected not-connected, got {other:?}"),
    }
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn send_before_auth_completes_fails_fast() {
    let (manager, transport, _store) = manager();
    manager
        .start_session("s1", AuthMethod::Qr, None)
        .await
        .unwrap();
    let mut events = manager.subscribe();
    transport.emit("s1", wamux::TransportEvent::Qr("XYZ".to_string()));
    wait_for(&mut events, |e| matches!(e, Event::Qr { .. })).await;

    // qr_pending has a live handle but is not connected.
    match manager.send_text("s1", "628999", "hi").await {
        Err(WamuxError::NotConnected(_)) => {}
        other => panic!("expected not-connected, got {other:?}"),
    }
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn send_text_normalizes_the_recipient() {
    let (manager, transport, _store) = manager();
    connect(&manager, &transport, "s1").await;

    manager
        .send_text("s1", "+62 (800) 011-1222", "order shipped")
        .await
        .unwrap();

    match transport.sent().as_slice() {
        [Sent::Text { to, text, .. }] => {
            assert_eq!(to, "628000111222@s.whatsapp.net");
            assert_eq!(text, "order shipped");
        }
        other => panic!("unexpected sends: {other:?}"),
    }
}

#[tokio::test]
async fn canonical_recipients_pass_through_untouched() {
    let (manager, transport, _store) = manager();
    connect(&manager, &transport, "s1").await;

    manager
        .send_text("s1", "628000111222@s.whatsapp.net", "hi")
        .await
        .unwrap();

    match transport.sent().as_slice() {
        [Sent::Text { to, .. }] => assert_eq!(to, "628000111222@s.whatsapp.net"),
        other => panic!("unexpected sends: {other:?}"),
    }
}

#[tokio::test]
async fn digitless_recipient_is_rejected_before_dispatch() {
    let (manager, transport, _store) = manager();
    connect(&manager, &transport, "s1").await;

    match manager.send_text("s1", "not-a-number", "hi").await {
        Err(WamuxError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn send_image_forwards_metadata_and_publishes_both_events() {
    let (manager, transport, _store) = manager();
    connect(&manager, &transport, "s1").await;
    let mut events = manager.subscribe();

    let image = ImageContent {
        bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
        caption: Some("receipt".to_string()),
        mime_type: Some("image/jpeg".to_string()),
        filename: Some("receipt.jpg".to_string()),
    };
    manager.send_image("s1", "628999", image).await.unwrap();

    match transport.sent().as_slice() {
        [Sent::Image {
            to,
            caption,
            mime_type,
            filename,
            len,
            ..
        }] => {
            assert_eq!(to, "628999@s.whatsapp.net");
            assert_eq!(caption.as_deref(), Some("receipt"));
            assert_eq!(mime_type.as_deref(), Some("image/jpeg"));
            assert_eq!(filename.as_deref(), Some("receipt.jpg"));
            assert_eq!(*len, 4);
        }
        other => panic!("unexpected sends: {other:?}"),
    }

    let event = wait_for(&mut events, |e| matches!(e, Event::ImageSent { .. })).await;
    let Event::ImageSent { to, .. } = event else {
        unreachable!()
    };
    assert_eq!(to.as_str(), "628999@s.whatsapp.net");
    wait_for(&mut events, |e| matches!(e, Event::MessageSent { .. })).await;
}

#[tokio::test]
async fn transport_send_failure_surfaces_with_recipient_context() {
    let (manager, transport, _store) = manager();
    connect(&manager, &transport, "s1").await;
    let mut events = manager.subscribe();

    transport.set_fail_sends(true);
    match manager.send_text("s1", "628999", "hi").await {
        Err(WamuxError::SendFailure {
            session_id,
            recipient,
            ..
        }) => {
            assert_eq!(session_id, "s1");
            assert_eq!(recipient, "628999@s.whatsapp.net");
        }
        other => panic!("expected send failure, got {other:?}"),
    }

    let event = wait_for(&mut events, |e| {
        matches!(e, Event::Error { session_id: Some(_), .. })
    })
    .await;
    let Event::Error { message, .. } = event else {
        unreachable!()
    };
    assert!(message.contains("628999@s.whatsapp.net"));
}

#[tokio::test]
async fn send_after_logout_fails_fast() {
    let (manager, transport, _store) = manager();
    connect(&manager, &transport, "s1").await;

    manager.logout_session("s1").await.unwrap();
    let sends_before = transport.sent().len();

    match manager.send_text("s1", "628999", "hi").await {
        Err(WamuxError::NotConnected(_)) => {}
        other => panic!("expected not-connected, got {other:?}"),
    }
    assert_eq!(transport.sent().len(), sends_before);
}
