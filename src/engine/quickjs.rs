//! QuickJS adapter for the [`ForeignEngine`](super::ForeignEngine) contract.
//!
//! The engine keeps its own handle table on the JS side (`__reg`): object and
//! array results stay in the table and come back to the host as handles,
//! primitives come back as interchange JSON. The host defines foreign
//! functions with [`QuickJsEngine::eval`].

use rquickjs::{Array, Context, Function, Runtime, Value};

use crate::error::{BridgeError, BridgeResult};

use super::{Arg, ForeignEngine, ForeignHandle, RawResult};

const PRELUDE: &str = r#"
globalThis.__reg = { next: 1, objs: {} };
globalThis.__call = function (name, args) {
    const fn = globalThis[name];
    if (typeof fn !== "function") {
        throw new Error("no such foreign function: " + name);
    }
    const out = fn.apply(null, args);
    if (out === null || out === undefined || typeof out !== "object") {
        return JSON.stringify(out === undefined ? null : out);
    }
    const id = __reg.next++;
    __reg.objs[id] = out;
    return id;
};
globalThis.__serialize = function (id) {
    return JSON.stringify(__reg.objs[id]);
};
globalThis.__release = function (id) {
    delete __reg.objs[id];
};
globalThis.__decode = function (text) {
    return JSON.parse(text);
};
"#;

pub struct QuickJsEngine {
    // The runtime must outlive the context.
    _runtime: Runtime,
    context: Context,
}

impl QuickJsEngine {
    pub fn new() -> BridgeResult<Self> {
        let runtime = Runtime::new().map_err(engine_fault)?;
        let context = Context::full(&runtime).map_err(engine_fault)?;
        let engine = Self {
            _runtime: runtime,
            context,
        };
        engine.eval(PRELUDE)?;
        Ok(engine)
    }

    /// Evaluate JS source in the engine's global scope. This is how a host
    /// defines the foreign functions it later dispatches to.
    pub fn eval(&self, code: &str) -> BridgeResult<()> {
        self.context.with(|ctx| {
            ctx.eval::<(), _>(code)
                .map_err(|e| BridgeError::Invocation(format!("{:?}", e)))
        })
    }

    /// Number of live entries in the JS-side handle table.
    pub fn live_objects(&self) -> BridgeResult<usize> {
        self.context.with(|ctx| {
            ctx.eval::<f64, _>("Object.keys(__reg.objs).length")
                .map(|n| n as usize)
                .map_err(engine_fault)
        })
    }
}

impl ForeignEngine for QuickJsEngine {
    fn invoke(&self, name: &str, args: &[Arg]) -> BridgeResult<RawResult> {
        self.context.with(|ctx| {
            let call: Function = ctx.globals().get("__call").map_err(engine_fault)?;
            let decode: Function = ctx.globals().get("__decode").map_err(engine_fault)?;

            let list = Array::new(ctx.clone()).map_err(engine_fault)?;
            for (i, arg) in args.iter().enumerate() {
                let value: Value = match arg {
                    Arg::Handle(handle) => ctx
                        .eval(format!("__reg.objs[{}]", handle.raw()))
                        .map_err(engine_fault)?,
                    Arg::Encoded(text) => decode
                        .call((text.as_str(),))
                        .map_err(|e| BridgeError::Encode(format!("{:?}", e)))?,
                };
                list.set(i, value).map_err(engine_fault)?;
            }

            let ret: Value = call
                .call((name, list))
                .map_err(|e| BridgeError::Invocation(format!("{:?}", e)))?;

            if let Some(text) = ret.as_string() {
                Ok(RawResult::Encoded(text.to_string().map_err(engine_fault)?))
            } else if let Some(id) = ret.as_number() {
                Ok(RawResult::Handle(ForeignHandle::from_raw(id as u64)))
            } else {
                Err(BridgeError::Engine(
                    "unexpected return type from dispatch trampoline".to_string(),
                ))
            }
        })
    }

    fn serialize(&self, handle: ForeignHandle) -> BridgeResult<String> {
        self.context.with(|ctx| {
            let serialize: Function = ctx.globals().get("__serialize").map_err(engine_fault)?;
            serialize
                .call((handle.raw() as f64,))
                .map_err(|e| BridgeError::Engine(format!("{:?}", e)))
        })
    }

    fn finalize(&self, handles: &[ForeignHandle]) {
        self.context.with(|ctx| {
            for handle in handles {
                let _ = ctx.eval::<(), _>(format!("__release({})", handle.raw()));
            }
        });
        tracing::trace!(target: "script", count = handles.len(), "released foreign handles");
    }
}

fn engine_fault(e: rquickjs::Error) -> BridgeError {
    BridgeError::Engine(format!("{:?}", e))
}
