//! Alias resolver
//!
//! Walks an access path backward to the registering call that produced the
//! handle: identifiers through their bindings, selectors through the values
//! stored into that exact field declaration, literal indexes through the
//! collection literal, and call results through the callee's return
//! statements. Every hop is a lookup in the prebuilt `TreeIndex`.
//!
//! One resolution explores each value expression at most once per goal, so
//! stores that copy a handle back and forth terminate after one round.

use super::classifier::{CallClass, Classifier, Invocation, InvocationKind};
use super::index::{FieldBinding, TreeIndex};
use super::scanner::Scanner;
use super::Registration;
use crate::tree::walk::{self, Site};
use crate::tree::{DeclId, Expr, ExprKind, Ident, TypeOracle};
use fnv::FnvHashSet;

/// Hops followed before an access path is given up
pub const MAX_RESOLUTION_DEPTH: usize = 32;

/// What a visited expression was searched for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Goal {
    Registration,
    Collection,
}

type Visited = FnvHashSet<(*const Expr, Goal)>;

/// Literal collection key
#[derive(Debug, Clone, Copy, PartialEq)]
enum Key<'a> {
    Int(i64),
    Str(&'a str),
}

impl<'a> Key<'a> {
    fn of(index: &'a Expr) -> Option<Self> {
        match &index.unparen().node {
            ExprKind::Int(i) => Some(Key::Int(*i)),
            ExprKind::Str(s) => Some(Key::Str(s)),
            _ => None,
        }
    }

    fn matches(&self, expr: &Expr) -> bool {
        match (self, &expr.unparen().node) {
            (Key::Int(k), ExprKind::Int(i)) => k == i,
            (Key::Str(k), ExprKind::Str(s)) => k == s,
            _ => false,
        }
    }
}

pub struct Resolver<'r, 'a> {
    index: &'r TreeIndex<'a>,
    oracle: &'a dyn TypeOracle,
    scanner: &'r Scanner<'a>,
    classifier: &'r Classifier<'a>,
}

impl<'r, 'a> Resolver<'r, 'a> {
    pub(crate) fn new(
        index: &'r TreeIndex<'a>,
        oracle: &'a dyn TypeOracle,
        scanner: &'r Scanner<'a>,
        classifier: &'r Classifier<'a>,
    ) -> Self {
        Self {
            index,
            oracle,
            scanner,
            classifier,
        }
    }

    /// Registration reaching `target` as seen from `site`
    pub fn resolve(&self, target: &'a Expr, site: &Site<'a>) -> Option<Registration> {
        let mut visited = Visited::default();
        self.resolve_at(target, site, 0, &mut visited)
    }

    fn resolve_at(
        &self,
        expr: &'a Expr,
        site: &Site<'a>,
        depth: usize,
        visited: &mut Visited,
    ) -> Option<Registration> {
        if depth > MAX_RESOLUTION_DEPTH {
            tracing::warn!(
                line = expr.pos.line,
                limit = MAX_RESOLUTION_DEPTH,
                "alias chain too deep, leaving invocation unresolved"
            );
            return None;
        }
        let expr = expr.unparen();
        if !visited.insert((expr as *const Expr, Goal::Registration)) {
            tracing::trace!(line = expr.pos.line, "already explored");
            return None;
        }
        tracing::trace!(depth, line = expr.pos.line, node = expr.describe(), "resolving");

        match self.classifier.classify(expr) {
            // A malformed registration has already failed validation
            CallClass::Registering(_) => return self.scanner.registration(expr, site).ok().flatten(),
            // Attributed at the decorator itself
            CallClass::Invocation(Invocation {
                kind: InvocationKind::Decorated,
                ..
            }) => return None,
            _ => {}
        }

        self.sources(expr, site, depth, visited)
            .into_iter()
            .find_map(|(value, at)| self.resolve_at(value, &at, depth + 1, visited))
    }

    /// Expressions whose value flows into `expr`, most relevant first
    fn sources(
        &self,
        expr: &'a Expr,
        site: &Site<'a>,
        depth: usize,
        visited: &mut Visited,
    ) -> Vec<(&'a Expr, Site<'a>)> {
        match &expr.node {
            ExprKind::Ident(ident) => self.variable(ident, site),
            ExprKind::Selector { x, sel } => match self.oracle.resolve(sel) {
                Some(id) if !self.oracle.is_field(id) => self.variable(sel, site),
                _ => self.field(x, sel, site),
            },
            ExprKind::Call { .. } => self.returned(expr, None),
            ExprKind::Index { x, index } => {
                let Some(key) = Key::of(index) else {
                    tracing::trace!(line = expr.pos.line, "non-literal index");
                    return Vec::new();
                };
                self.collections(x, site, depth, visited)
                    .into_iter()
                    .filter_map(|(lit, at)| element(lit, key).map(|e| (e, at)))
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    fn variable(&self, ident: &Ident, site: &Site<'a>) -> Vec<(&'a Expr, Site<'a>)> {
        let Some(decl) = self.oracle.resolve(ident) else {
            return Vec::new();
        };
        let Some(binding) = self.index.binding_for(decl, site) else {
            return Vec::new();
        };
        match binding.tuple {
            None => vec![(binding.value, binding.site)],
            Some(i) => self.returned(binding.value.unparen(), Some(i)),
        }
    }

    fn field(&self, x: &'a Expr, sel: &Ident, site: &Site<'a>) -> Vec<(&'a Expr, Site<'a>)> {
        let field = self
            .oracle
            .resolve(sel)
            .filter(|id| self.oracle.is_field(*id))
            .or_else(|| {
                let owner = self.oracle.type_of(x)?;
                self.oracle.field(owner, &sel.name)
            });
        let Some(field) = field else {
            return Vec::new();
        };

        // Stores preceding the use in the same routine, nearest first, then
        // every other store in traversal order
        let (mut local, other): (Vec<&FieldBinding<'a>>, Vec<&FieldBinding<'a>>) = self
            .index
            .field_values(&sel.name, field)
            .partition(|b| b.site.same_routine(site) && b.site.precedes(site));
        local.reverse();
        local
            .into_iter()
            .chain(other)
            .map(|b| (b.value, b.site))
            .collect()
    }

    /// Values returned by a local function called by `call`; `tuple` selects
    /// one result of a multi-value return. A `return g()` forwarding a
    /// multi-value result is followed into `g` with the same position.
    fn returned(&self, call: &'a Expr, tuple: Option<usize>) -> Vec<(&'a Expr, Site<'a>)> {
        let mut values = Vec::new();
        let mut seen = FnvHashSet::default();
        let mut pending = vec![call];

        while let Some(call) = pending.pop() {
            let ExprKind::Call { fun, .. } = &call.node else {
                continue;
            };
            let Some(id) = self.callee(fun) else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            let Some((file, func)) = self.index.func(id) else {
                continue;
            };

            for (results, pos) in walk::returns(&func.body) {
                let value = match (tuple, results) {
                    (Some(_), [single]) if matches!(single.unparen().node, ExprKind::Call { .. }) => {
                        pending.push(single.unparen());
                        continue;
                    }
                    (Some(i), _) => results.get(i),
                    (None, [single]) => Some(single),
                    (None, _) => None,
                };
                if let Some(value) = value {
                    values.push((
                        value,
                        Site {
                            file,
                            pos,
                            func: Some(func),
                        },
                    ));
                }
            }
        }
        values
    }

    fn callee(&self, fun: &Expr) -> Option<DeclId> {
        match &fun.unparen().node {
            ExprKind::Ident(ident) => self.oracle.resolve(ident),
            ExprKind::Selector { sel, .. } => self.oracle.resolve(sel),
            _ => None,
        }
    }

    /// Collection literals that `x` may evaluate to
    fn collections(
        &self,
        x: &'a Expr,
        site: &Site<'a>,
        depth: usize,
        visited: &mut Visited,
    ) -> Vec<(&'a Expr, Site<'a>)> {
        let x = x.unparen();
        if matches!(x.node, ExprKind::Composite { .. }) {
            return vec![(x, *site)];
        }
        if !visited.insert((x as *const Expr, Goal::Collection)) {
            return Vec::new();
        }
        if depth >= MAX_RESOLUTION_DEPTH {
            tracing::warn!(
                line = x.pos.line,
                limit = MAX_RESOLUTION_DEPTH,
                "collection chain too deep, leaving invocation unresolved"
            );
            return Vec::new();
        }
        self.sources(x, site, depth + 1, visited)
            .into_iter()
            .flat_map(|(value, at)| self.collections(value, &at, depth + 1, visited))
            .collect()
    }
}

/// Element `key` of a collection literal
fn element<'a>(lit: &'a Expr, key: Key<'_>) -> Option<&'a Expr> {
    let ExprKind::Composite { elts } = &lit.node else {
        return None;
    };
    let keyed = elts
        .iter()
        .any(|e| matches!(e.node, ExprKind::KeyValue { .. }));

    match key {
        Key::Int(i) if !keyed => usize::try_from(i).ok().and_then(|i| elts.get(i)),
        _ => elts.iter().find_map(|e| match &e.node {
            ExprKind::KeyValue { key: k, value } if key.matches(k) => Some(value.as_ref()),
            _ => None,
        }),
    }
}
