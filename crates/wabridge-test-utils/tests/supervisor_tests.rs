// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end supervisor behavior against mock collaborators, on a paused clock.

use std::time::Duration;

use wabridge_core::types::{
    Chat, ChatId, ClientEvent, ClientState, ConnectionState, ContactRecord, IncomingMessage,
};
use wabridge_test_utils::{ClientCall, TestHarness};

const USER: &str = "212600112233@c.us";
const GROUP: &str = "120363000000@g.us";

fn chat(id: &str, unread_count: u32) -> Chat {
    Chat {
        id: ChatId(id.into()),
        name: None,
        is_group: id.ends_with("@g.us"),
        unread_count,
    }
}

fn incoming(id: &str, body: &str) -> IncomingMessage {
    IncomingMessage {
        id: id.into(),
        from: ChatId(USER.into()),
        from_me: false,
        has_media: false,
        kind: "chat".into(),
        body: body.into(),
        timestamp: None,
    }
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

// --- Ready and contact sync ---

#[tokio::test(start_paused = true)]
async fn ready_sets_every_flag_and_syncs_contacts() {
    let harness = TestHarness::builder()
        .with_chats(vec![chat(USER, 0), chat(GROUP, 0)])
        .build()
        .await
        .unwrap();

    harness.client.inject_event(ClientEvent::Authenticated).await;
    harness.client.inject_event(ClientEvent::Ready).await;
    harness.settle().await;

    let state = harness.state();
    assert!(state.connected && state.authenticated && state.ready);
    assert!(state.last_qr_code.is_none());
    assert_eq!(
        harness.forwarder.contact_batches().await,
        vec![vec![ContactRecord::sync("212600112233")]]
    );

    harness.advance(secs(121)).await;
    assert_eq!(harness.forwarder.contact_batches().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn qr_is_published_until_authenticated() {
    let harness = TestHarness::builder().build().await.unwrap();

    harness
        .client
        .inject_event(ClientEvent::Qr("2@abc,def,ghi".into()))
        .await;
    harness.settle().await;
    let code = harness.state().last_qr_code.expect("QR published");
    assert_eq!(code.token, "2@abc,def,ghi");
    assert!(code.data_uri.starts_with("data:image/svg+xml;base64,"));

    harness.client.inject_event(ClientEvent::Authenticated).await;
    harness.settle().await;
    let state = harness.state();
    assert!(state.authenticated);
    assert!(state.last_qr_code.is_none());
}

#[tokio::test(start_paused = true)]
async fn group_only_chats_post_nothing() {
    let harness = TestHarness::builder()
        .with_chats(vec![chat(GROUP, 0), chat("120363999999@g.us", 0)])
        .build()
        .await
        .unwrap();

    harness.client.inject_event(ClientEvent::Ready).await;
    harness.settle().await;

    assert!(harness.forwarder.contact_batches().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn unread_messages_are_relayed_then_marked_seen() {
    let harness = TestHarness::builder()
        .with_chats(vec![chat(USER, 2)])
        .build()
        .await
        .unwrap();
    harness
        .client
        .set_history(
            ChatId(USER.into()),
            vec![incoming("a", "old"), incoming("b", "first"), incoming("c", "second")],
        )
        .await;

    harness.client.inject_event(ClientEvent::Ready).await;
    harness.settle().await;

    let bodies: Vec<_> = harness
        .forwarder
        .forwarded()
        .await
        .into_iter()
        .map(|f| f.message_body)
        .collect();
    assert_eq!(bodies, ["first", "second"]);
    assert_eq!(harness.client.seen_chats().await, vec![ChatId(USER.into())]);

    // Only the first sync after Ready replays unread messages.
    harness.advance(secs(121)).await;
    assert_eq!(harness.forwarder.forwarded().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn unread_catch_up_can_be_disabled() {
    let harness = TestHarness::builder()
        .with_chats(vec![chat(USER, 2)])
        .without_unread_catch_up()
        .build()
        .await
        .unwrap();
    harness
        .client
        .set_history(ChatId(USER.into()), vec![incoming("a", "hello")])
        .await;

    harness.client.inject_event(ClientEvent::Ready).await;
    harness.settle().await;

    assert!(harness.forwarder.forwarded().await.is_empty());
    assert!(harness.client.seen_chats().await.is_empty());
    assert_eq!(harness.forwarder.contact_batches().await.len(), 1);
}

// --- Message relay ---

#[tokio::test(start_paused = true)]
async fn own_messages_are_never_forwarded() {
    let harness = TestHarness::builder().build().await.unwrap();

    let own = IncomingMessage {
        from_me: true,
        ..incoming("m1", "sent from the phone")
    };
    harness.client.inject_event(ClientEvent::Message(own)).await;
    harness
        .client
        .inject_event(ClientEvent::Message(incoming("m2", "  bonjour ")))
        .await;
    harness.settle().await;

    let forwarded = harness.forwarder.forwarded().await;
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].sender_number, USER);
    assert_eq!(forwarded[0].message_body, "bonjour");
}

#[tokio::test(start_paused = true)]
async fn forwarding_failure_does_not_stop_the_supervisor() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.forwarder.fail_forwarding(true).await;

    harness
        .client
        .inject_event(ClientEvent::Message(incoming("m1", "one")))
        .await;
    harness.settle().await;
    harness.forwarder.fail_forwarding(false).await;
    harness
        .client
        .inject_event(ClientEvent::Message(incoming("m2", "two")))
        .await;
    harness.settle().await;

    assert_eq!(harness.forwarder.forwarded().await.len(), 2);
    harness.shutdown().await.unwrap();
}

// --- Recovery ---

#[tokio::test(start_paused = true)]
async fn soft_recovery_never_destroys() {
    let harness = TestHarness::builder()
        .with_client_state(Some(ClientState::Connected))
        .build()
        .await
        .unwrap();

    harness.client.inject_event(ClientEvent::Authenticated).await;
    harness.settle().await;
    assert!(!harness.state().ready);

    harness.advance(secs(61)).await;
    let state = harness.state();
    assert!(state.connected && state.authenticated && state.ready);
    assert_eq!(harness.client.destroy_count().await, 0);
    assert_eq!(harness.client.initialize_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn ready_in_time_cancels_recovery() {
    let harness = TestHarness::builder()
        .with_client_state(Some(ClientState::Opening))
        .build()
        .await
        .unwrap();

    harness.client.inject_event(ClientEvent::Authenticated).await;
    harness.advance(secs(30)).await;
    harness.client.inject_event(ClientEvent::Ready).await;
    harness.advance(secs(90)).await;

    assert!(harness.state().ready);
    assert_eq!(harness.client.destroy_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn hard_recovery_destroys_waits_then_initializes() {
    let harness = TestHarness::builder()
        .with_client_state(Some(ClientState::Opening))
        .build()
        .await
        .unwrap();

    harness.client.inject_event(ClientEvent::Authenticated).await;
    harness.advance(secs(61)).await;
    assert_eq!(harness.state(), ConnectionState::default());
    assert_eq!(harness.client.destroy_count().await, 1);
    assert_eq!(harness.client.initialize_count().await, 1);

    harness.advance(secs(2)).await;
    let calls = harness.client.calls().await;
    let [ClientCall::Initialize(_), ClientCall::Destroy(destroyed), ClientCall::Initialize(restarted)] =
        calls[..]
    else {
        panic!("unexpected call sequence: {calls:?}");
    };
    assert!(restarted.duration_since(destroyed) >= secs(2));
}

#[tokio::test(start_paused = true)]
async fn recovery_runs_at_most_once_per_authentication() {
    let harness = TestHarness::builder()
        .with_client_state(Some(ClientState::Opening))
        .build()
        .await
        .unwrap();

    harness.client.inject_event(ClientEvent::Authenticated).await;
    harness.advance(secs(400)).await;

    assert_eq!(harness.client.destroy_count().await, 1);
    assert_eq!(harness.client.initialize_count().await, 2);
}

#[tokio::test(start_paused = true)]
async fn unanswered_probe_triggers_hard_recovery() {
    let harness = TestHarness::builder()
        .with_client_state(Some(ClientState::Connected))
        .build()
        .await
        .unwrap();
    harness.client.set_state_delay(secs(30)).await;

    harness.client.inject_event(ClientEvent::Authenticated).await;
    // Recovery timer at 60s, probe gives up at 70s.
    harness.advance(secs(71)).await;

    assert!(!harness.state().ready);
    assert_eq!(harness.client.destroy_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn failed_destroy_is_retried_exactly_once() {
    let harness = TestHarness::builder()
        .with_client_state(Some(ClientState::Unpaired))
        .build()
        .await
        .unwrap();
    harness.client.fail_destroys(5).await;

    harness.client.inject_event(ClientEvent::Authenticated).await;
    harness.advance(secs(80)).await;

    assert_eq!(harness.client.destroy_count().await, 2);
    // The cycle still reinitializes after giving up on destroy.
    assert_eq!(harness.client.initialize_count().await, 2);
}

#[tokio::test(start_paused = true)]
async fn destroy_succeeding_on_retry_reinitializes() {
    let harness = TestHarness::builder()
        .with_client_state(Some(ClientState::Unpaired))
        .build()
        .await
        .unwrap();
    harness.client.fail_destroys(1).await;

    harness.client.inject_event(ClientEvent::Authenticated).await;
    harness.advance(secs(80)).await;

    assert_eq!(harness.client.destroy_count().await, 2);
    assert_eq!(harness.client.initialize_count().await, 2);
}

// --- Disconnects and auth failures ---

#[tokio::test(start_paused = true)]
async fn disconnect_schedules_reinitialization() {
    let harness = TestHarness::builder()
        .with_chats(vec![chat(USER, 0)])
        .build()
        .await
        .unwrap();
    harness.client.inject_event(ClientEvent::Ready).await;
    harness.settle().await;

    harness
        .client
        .inject_event(ClientEvent::Disconnected("NAVIGATION".into()))
        .await;
    harness.settle().await;
    assert_eq!(harness.state(), ConnectionState::default());

    harness.advance(secs(4)).await;
    assert_eq!(harness.client.initialize_count().await, 1);
    harness.advance(secs(2)).await;
    assert_eq!(harness.client.initialize_count().await, 2);
    assert_eq!(harness.client.destroy_count().await, 0);

    // The sync loop stopped with the disconnect.
    harness.advance(secs(300)).await;
    assert_eq!(harness.forwarder.contact_batches().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn auth_failure_resets_without_reinitializing() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.client.inject_event(ClientEvent::Authenticated).await;
    harness
        .client
        .inject_event(ClientEvent::AuthFailure("session expired".into()))
        .await;
    harness.advance(secs(120)).await;

    assert_eq!(harness.state(), ConnectionState::default());
    assert_eq!(harness.client.initialize_count().await, 1);
    assert_eq!(harness.client.destroy_count().await, 0);
}

// --- Operator commands ---

#[tokio::test(start_paused = true)]
async fn disconnect_command_destroys_and_resets() {
    let harness = TestHarness::builder()
        .with_chats(vec![chat(USER, 0)])
        .build()
        .await
        .unwrap();
    harness.client.inject_event(ClientEvent::Ready).await;
    harness.settle().await;

    harness.handle.disconnect().await.unwrap();

    assert_eq!(harness.state(), ConnectionState::default());
    assert_eq!(harness.client.destroy_count().await, 1);
    harness.advance(secs(300)).await;
    assert_eq!(harness.forwarder.contact_batches().await.len(), 1);
    assert_eq!(harness.client.initialize_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn disconnect_command_cancels_pending_reinit() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .client
        .inject_event(ClientEvent::Disconnected("LOGOUT".into()))
        .await;
    harness.settle().await;

    harness.handle.disconnect().await.unwrap();
    harness.advance(secs(10)).await;

    assert_eq!(harness.client.initialize_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn clear_session_removes_data_and_reinitializes() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.client.inject_event(ClientEvent::Ready).await;
    harness.settle().await;
    assert!(harness.session_dir.exists());

    harness.handle.clear_session().await.unwrap();

    assert!(!harness.session_dir.exists());
    assert_eq!(harness.state(), ConnectionState::default());
    assert_eq!(harness.client.destroy_count().await, 1);

    harness.advance(secs(3)).await;
    assert_eq!(harness.client.initialize_count().await, 2);
}

#[tokio::test(start_paused = true)]
async fn commands_fail_after_shutdown() {
    let harness = TestHarness::builder().build().await.unwrap();
    let handle = harness.handle.clone();
    harness.shutdown().await.unwrap();

    assert!(handle.disconnect().await.is_err());
}
