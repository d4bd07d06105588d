//! Registration scanner
//!
//! Reads the metadata carried by recognized instrumentation calls: the event
//! name (which must be a string literal), the property keys declared at the
//! call and the metric kind.

use super::classifier::{CallClass, Classifier};
use super::{AnalysisError, CallSite, Location, Registration};
use crate::profile::{DirectMethod, Profile};
use crate::tree::walk::Site;
use crate::tree::{Expr, ExprKind, Package, TypeOracle};

pub struct Scanner<'a> {
    package: &'a Package,
    classifier: Classifier<'a>,
}

impl<'a> Scanner<'a> {
    pub fn new(package: &'a Package, oracle: &'a dyn TypeOracle, profile: &'a Profile) -> Self {
        Self {
            package,
            classifier: Classifier::new(oracle, profile),
        }
    }

    fn location(&self, site: &Site<'_>, expr: &Expr) -> Location {
        Location {
            file: self.package.files[site.file].name.clone(),
            line: expr.pos.line,
        }
    }

    fn routine(&self, site: &Site<'_>) -> String {
        site.func
            .map(|f| self.package.qualify(f))
            .unwrap_or_default()
    }

    /// Literal event name at argument `index`; `Ok(None)` when the call has
    /// no such argument
    fn event_name(
        &self,
        call: &Expr,
        args: &[Expr],
        index: usize,
        site: &Site<'_>,
    ) -> Result<Option<String>, AnalysisError> {
        let Some(arg) = args.get(index) else {
            return Ok(None);
        };
        match arg.as_str_lit() {
            Some(name) => Ok(Some(name.to_string())),
            None => Err(AnalysisError::NonLiteralEventName {
                location: self.location(site, arg),
                call: self.location(site, call),
                found: arg.describe().to_string(),
            }),
        }
    }

    /// Reject instrumentation calls whose event name is not a literal
    pub fn validate(&self, call: &'a Expr, site: &Site<'_>) -> Result<(), AnalysisError> {
        let ExprKind::Call { args, .. } = &call.node else {
            return Ok(());
        };
        let event_arg = match self.classifier.classify(call) {
            CallClass::Emit(method) | CallClass::Timer(method) => method.event_arg,
            CallClass::Registering(method) => method.event_arg,
            CallClass::Invocation(_) | CallClass::Other => return Ok(()),
        };
        self.event_name(call, args, event_arg, site).map(|_| ())
    }

    /// Registration produced by `call`, if it is a registering call
    pub fn registration(
        &self,
        call: &'a Expr,
        site: &Site<'_>,
    ) -> Result<Option<Registration>, AnalysisError> {
        let CallClass::Registering(method) = self.classifier.classify(call) else {
            return Ok(None);
        };
        let ExprKind::Call { args, .. } = &call.node else {
            return Ok(None);
        };
        let Some(event_name) = self.event_name(call, args, method.event_arg, site)? else {
            return Ok(None);
        };

        let metric_kind = method
            .kind_arg
            .and_then(|i| args.get(i))
            .and_then(kind_name)
            .unwrap_or_else(|| method.metric_kind.clone());
        let property_keys = method
            .keys_arg
            .and_then(|i| args.get(i))
            .map(list_keys)
            .unwrap_or_default();

        Ok(Some(Registration {
            event_name,
            location: self.location(site, call),
            enclosing_routine: self.routine(site),
            property_keys,
            metric_kind,
        }))
    }

    /// Call site of a direct emit or timer call, recorded where it stands
    pub fn direct_callsite(
        &self,
        call: &Expr,
        method: &DirectMethod,
        site: &Site<'_>,
    ) -> Option<CallSite> {
        let ExprKind::Call { args, .. } = &call.node else {
            return None;
        };
        let event_name = args.get(method.event_arg)?.as_str_lit()?;
        // A props argument that is not a map literal carries no static keys
        let property_keys = method
            .props_arg
            .and_then(|i| args.get(i))
            .map(map_keys)
            .unwrap_or_default();

        Some(CallSite {
            event_name: event_name.to_string(),
            filename: self.package.files[site.file].name.clone(),
            line_no: call.pos.line,
            func_name: self.routine(site),
            package: self.package.path.clone(),
            property_keys,
            metric_type: method.metric_kind.clone(),
        })
    }
}

/// `types.GAUGE`, `GAUGE` or `"GAUGE"`
fn kind_name(arg: &Expr) -> Option<String> {
    match &arg.unparen().node {
        ExprKind::Selector { sel, .. } => Some(sel.name.clone()),
        ExprKind::Ident(ident) => Some(ident.name.clone()),
        ExprKind::Str(value) => Some(value.clone()),
        _ => None,
    }
}

/// String elements of a list literal
fn list_keys(arg: &Expr) -> Vec<String> {
    let ExprKind::Composite { elts } = &arg.unparen().node else {
        return Vec::new();
    };
    sorted_keys(elts.iter().filter_map(|e| e.as_str_lit().map(str::to_string)))
}

/// Keys of a map literal (`map[string]any{"k": v}` or `Props{k: v}`)
fn map_keys(arg: &Expr) -> Vec<String> {
    let ExprKind::Composite { elts } = &arg.unparen().node else {
        return Vec::new();
    };
    sorted_keys(elts.iter().filter_map(|e| match &e.node {
        ExprKind::KeyValue { key, .. } => match &key.node {
            ExprKind::Str(value) => Some(value.clone()),
            ExprKind::Ident(ident) => Some(ident.name.clone()),
            _ => None,
        },
        _ => None,
    }))
}

fn sorted_keys(keys: impl Iterator<Item = String>) -> Vec<String> {
    let mut keys: Vec<String> = keys.collect();
    keys.sort();
    keys.dedup();
    keys
}
