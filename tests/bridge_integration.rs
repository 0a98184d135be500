use std::time::Duration;

use anyhow::{Context, Result};
use script_bridge::{Bridge, BridgeValue, QuickJsEngine, ReleaseMode, SweepTimer};
use serde_json::json;

fn quickjs_bridge(mode: ReleaseMode) -> Result<Bridge<QuickJsEngine>> {
    let engine = QuickJsEngine::new()?;
    engine.eval("function make_list(...xs) { return xs; }")?;
    engine.eval("function list_len(xs) { return xs.length; }")?;
    engine.eval("function push_item(xs, x) { xs.push(x); return xs.length; }")?;
    Ok(Bridge::with_mode(engine, mode))
}

#[test]
fn test_end_to_end_handle_lifecycle() -> Result<()> {
    let bridge = quickjs_bridge(ReleaseMode::SweepOnly)?;

    // Hyphenated host-facing name reaches the underscore-named function.
    let list = bridge
        .invoke(
            "make-list",
            &[json!(1).into(), json!(2).into(), json!(3).into()],
        )?
        .into_handle()
        .context("expected a handle result")?;

    assert_eq!(list.to_native()?, json!([1, 2, 3]));
    assert_eq!(bridge.tracked_handles(), 1);
    assert_eq!(bridge.engine().live_objects()?, 1);

    drop(list);
    bridge.sweep();
    assert_eq!(bridge.tracked_handles(), 0);
    assert_eq!(bridge.engine().live_objects()?, 0);
    Ok(())
}

#[test]
fn test_handles_pass_back_by_identity() -> Result<()> {
    let bridge = quickjs_bridge(ReleaseMode::Deterministic)?;

    let list = bridge
        .invoke("make-list", &[json!(1).into(), json!(2).into()])?
        .into_handle()
        .context("expected a handle result")?;

    // The engine sees the same object, not a re-encoded copy: mutating it
    // through one call is visible through the proxy afterwards.
    let len = bridge
        .invoke(
            "push-item",
            &[BridgeValue::Handle(list.clone()), json!(9).into()],
        )?
        .into_native()
        .context("expected a native result")?;
    assert_eq!(len, json!(3));
    assert_eq!(list.to_native()?, json!([1, 2, 9]));
    Ok(())
}

#[test]
fn test_proxy_method_forwarding() -> Result<()> {
    let bridge = quickjs_bridge(ReleaseMode::Deterministic)?;

    let list = bridge
        .invoke("make-list", &[json!("a").into(), json!("b").into()])?
        .into_handle()
        .context("expected a handle result")?;

    let len = bridge
        .invoke("list-len", &[BridgeValue::Handle(list.clone())])?
        .into_native()
        .context("expected a native result")?;
    assert_eq!(len, json!(2));

    // Same thing through the proxy's own forwarding.
    let len = list
        .call("list-len", &[])?
        .into_native()
        .context("expected a native result")?;
    assert_eq!(len, json!(2));
    Ok(())
}

#[test]
fn test_deterministic_release_frees_engine_objects() -> Result<()> {
    let bridge = quickjs_bridge(ReleaseMode::Deterministic)?;

    let list = bridge
        .invoke("make-list", &[json!(1).into()])?
        .into_handle()
        .context("expected a handle result")?;
    assert_eq!(bridge.engine().live_objects()?, 1);

    // No sweep needed: the engine-side object goes away with the proxy.
    drop(list);
    assert_eq!(bridge.engine().live_objects()?, 0);

    // The registry entry lingers until the next sweep prunes it.
    assert_eq!(bridge.tracked_handles(), 1);
    bridge.sweep();
    assert_eq!(bridge.tracked_handles(), 0);
    Ok(())
}

#[test]
fn test_cooperative_sweep_timer() -> Result<()> {
    let bridge = quickjs_bridge(ReleaseMode::SweepOnly)?;
    let timer = SweepTimer::new(Duration::from_millis(100));

    let list = bridge
        .invoke("make-list", &[json!(1).into()])?
        .into_handle()
        .context("expected a handle result")?;
    drop(list);

    assert!(!timer.due());
    assert_eq!(bridge.engine().live_objects()?, 1);

    std::thread::sleep(Duration::from_millis(150));
    assert!(timer.due());
    bridge.sweep();
    assert_eq!(bridge.engine().live_objects()?, 0);
    Ok(())
}

#[test]
fn test_engine_fault_propagates() -> Result<()> {
    let bridge = quickjs_bridge(ReleaseMode::Deterministic)?;
    assert!(bridge.invoke("no-such-function", &[]).is_err());
    Ok(())
}
