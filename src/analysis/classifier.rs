//! Invocation classifier
//!
//! Decides what a call expression is before any resolution happens. Provider
//! and timer methods are recognized by the receiver's static type, handle
//! invocations by the callee's static type; names alone never qualify a
//! call (an unrelated `fake.Count(...)` is ignored).

use crate::profile::{DirectMethod, Profile, RegisteringMethod};
use crate::tree::{Expr, ExprKind, TypeOracle};

/// Access path shape through which a handle reached its invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationKind {
    /// `cb(...)`
    Identifier,
    /// `x.field(...)`
    Field,
    /// `arr[i](...)`, `m["k"](...)`, `f(x)[i](...)`
    Indexed,
    /// `f(x)(...)`
    CallResult,
    /// `em.MetricFnCallsite(path)`; located at the decorator call
    Decorated,
}

/// A call that consumes a handle
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub kind: InvocationKind,
    /// The call being classified
    pub call: &'a Expr,
    /// Access path to trace back to a registration
    pub target: &'a Expr,
}

#[derive(Debug, Clone, Copy)]
pub enum CallClass<'a> {
    /// Direct emit on a provider (`em.Count(ctx, "event", props, 1)`)
    Emit(&'a DirectMethod),
    /// Timer method on a timer handle (`t.Time(ctx, "event", props, fn)`)
    Timer(&'a DirectMethod),
    /// Handle-producing call (`em.Metric("event", COUNT)`)
    Registering(&'a RegisteringMethod),
    Invocation(Invocation<'a>),
    Other,
}

pub struct Classifier<'a> {
    oracle: &'a dyn TypeOracle,
    profile: &'a Profile,
}

impl<'a> Classifier<'a> {
    pub fn new(oracle: &'a dyn TypeOracle, profile: &'a Profile) -> Self {
        Self { oracle, profile }
    }

    pub fn classify(&self, call: &'a Expr) -> CallClass<'a> {
        let ExprKind::Call { fun, args } = &call.node else {
            return CallClass::Other;
        };
        let fun = fun.unparen();

        if let ExprKind::Selector { x, sel } = &fun.node {
            if let Some(receiver) = self.oracle.type_of(x) {
                let name = sel.name.as_str();
                if self.profile.is_provider(receiver) {
                    if let Some(method) = self.profile.direct_method(name) {
                        return CallClass::Emit(method);
                    }
                    if let Some(method) = self.profile.registering_method(name) {
                        return CallClass::Registering(method);
                    }
                    if self.profile.is_decorator(name) {
                        return match args.as_slice() {
                            [target] => CallClass::Invocation(Invocation {
                                kind: InvocationKind::Decorated,
                                call,
                                target,
                            }),
                            _ => CallClass::Other,
                        };
                    }
                    return CallClass::Other;
                }
                if self.profile.is_timer(receiver) {
                    return match self.profile.timer_method(name) {
                        Some(method) => CallClass::Timer(method),
                        None => CallClass::Other,
                    };
                }
            }
        }

        match self.oracle.type_of(fun) {
            Some(ty) if self.profile.is_handle(ty) => {}
            _ => return CallClass::Other,
        }

        let kind = match &fun.node {
            ExprKind::Ident(_) => InvocationKind::Identifier,
            ExprKind::Selector { .. } => InvocationKind::Field,
            ExprKind::Index { .. } => InvocationKind::Indexed,
            ExprKind::Call { .. } => InvocationKind::CallResult,
            _ => return CallClass::Other,
        };
        CallClass::Invocation(Invocation {
            kind,
            call,
            target: fun,
        })
    }
}
