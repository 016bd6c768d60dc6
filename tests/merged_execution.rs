//! Merged boot-time execution over the live protocol: the host invokes
//! lifecycle hooks per action and unrecognized member invocations forward
//! back to the host.

mod common;

use common::HostHarness;
use serde_json::json;
use sill::{Envelope, PluginHooks};

#[tokio::test]
async fn merged_hook_sees_session_state_merged_with_extra_state() {
    let hooks = PluginHooks::new().merged_hook("onBeforeItemUpsert", |args, ctx| async move {
        // Session state and per-call extra state are both visible; the
        // per-call side wins on collision.
        assert_eq!(ctx.get("pluginId"), Some(&json!("p-1")));
        assert_eq!(ctx.get("locale"), Some(&json!("de")));
        assert_eq!(args["payload"]["title"], "hello");
        Ok(json!(true))
    });

    let mut host = HostHarness::spawn(hooks);
    host.complete_handshake(json!({
        "mode": "init",
        "pluginId": "p-1",
        "locale": "en",
    }))
    .await;

    let id = host
        .call(
            "invokeHook",
            json!({
                "name": "onBeforeItemUpsert",
                "args": { "payload": { "title": "hello" } },
                "extraState": { "locale": "de" },
                "callId": "corr-7",
            }),
        )
        .await;
    let (ok, data) = host.await_response(&id).await;
    assert!(ok);
    assert_eq!(data.unwrap(), json!(true));
}

#[tokio::test]
async fn unknown_member_invocation_forwards_to_host() {
    let hooks = PluginHooks::new().merged_hook("onBeforeItemDestroy", |_args, ctx| async move {
        ctx.invoke("futureMethod", vec![json!(1), json!(2)]).await
    });

    let mut host = HostHarness::spawn(hooks);
    host.complete_handshake(json!({ "mode": "init" })).await;

    let invoke_id = host
        .call(
            "invokeHook",
            json!({
                "name": "onBeforeItemDestroy",
                "args": {},
                "extraState": {},
                "callId": "corr-42",
            }),
        )
        .await;

    // The handler turns around and calls the generic forwarder.
    let envelope = host.read_envelope().await;
    let Envelope::Call {
        id: Some(forward_id),
        method,
        params,
    } = envelope
    else {
        panic!("expected forwardCall, got {envelope:?}");
    };
    assert_eq!(method, "forwardCall");
    assert_eq!(params["callId"], "corr-42");
    assert_eq!(params["member"], "futureMethod");
    assert_eq!(params["args"], json!([1, 2]));
    host.send(&Envelope::response_ok(forward_id, Some(json!("fromHost"))))
        .await;

    let (ok, data) = host.await_response(&invoke_id).await;
    assert!(ok);
    assert_eq!(data.unwrap(), json!("fromHost"));
}

#[tokio::test]
async fn local_member_invocation_uses_capability_binding() {
    let hooks = PluginHooks::new().merged_hook("onBeforeItemPublish", |_args, ctx| async move {
        ctx.invoke("notice", vec![json!("publishing")]).await?;
        Ok(json!(true))
    });

    let mut host = HostHarness::spawn(hooks);
    host.complete_handshake(json!({ "mode": "init" })).await;

    let invoke_id = host
        .call(
            "invokeHook",
            json!({
                "name": "onBeforeItemPublish",
                "args": {},
                "extraState": {},
                "callId": "corr-9",
            }),
        )
        .await;

    // The known member runs through its local binding, not the forwarder.
    let envelope = host.read_envelope().await;
    let Envelope::Call {
        id: Some(notice_id),
        method,
        params,
    } = envelope
    else {
        panic!("expected notice call, got {envelope:?}");
    };
    assert_eq!(method, "notice");
    assert_eq!(params["message"], "publishing");
    host.send(&Envelope::response_ok(notice_id, None)).await;

    let (ok, data) = host.await_response(&invoke_id).await;
    assert!(ok);
    assert_eq!(data.unwrap(), json!(true));
}

#[tokio::test]
async fn unknown_merged_hook_is_an_error() {
    let mut host = HostHarness::spawn(PluginHooks::new());
    host.complete_handshake(json!({ "mode": "init" })).await;

    let id = host
        .call(
            "invokeHook",
            json!({ "name": "onBeforeNothing", "args": {}, "extraState": {}, "callId": "c" }),
        )
        .await;
    let (ok, _) = host.await_response(&id).await;
    assert!(!ok);
}

#[tokio::test]
async fn hook_error_propagates_as_error_response() {
    let hooks = PluginHooks::new().merged_hook("onBeforeItemDestroy", |_args, _ctx| async move {
        Err(sill::Error::hook("onBeforeItemDestroy", "refused"))
    });

    let mut host = HostHarness::spawn(hooks);
    host.complete_handshake(json!({ "mode": "init" })).await;

    let id = host
        .call(
            "invokeHook",
            json!({ "name": "onBeforeItemDestroy", "args": {}, "extraState": {}, "callId": "c" }),
        )
        .await;
    let (ok, _) = host.await_response(&id).await;
    assert!(!ok);
}
