// Shared fixtures for integration tests
//
// Packages are assembled with the tree builder, the same way the external
// type checker would dump them.
#![allow(dead_code)]

use emitgen::tree::builder::{at, At, PackageBuilder, Sym};
use emitgen::tree::{Expr, Package, Stmt, TypeName};
use std::fs;
use std::path::{Path, PathBuf};

pub const EMITTER: &str = "emitter/types.CombinedEmitter";
pub const METRIC_FN: &str = "emitter/types.MetricEmitterFn";
pub const LOG_FN: &str = "emitter/types.LogEmitterFn";
pub const TIMER: &str = "emitter/types.MetricsTimer";

pub fn ty(name: &str) -> TypeName {
    TypeName::new(name)
}

/// `em.Metric(event, types.<kind>)`
pub fn metric(l: At, em: &Sym, event: &str, kind: &str) -> Expr {
    l.method(
        l.ident(em),
        "Metric",
        vec![l.str(event), l.select_name(l.name("types"), kind)],
    )
    .typed(ty(METRIC_FN))
}

/// `em.MetricWithProps(event, types.<kind>, []string{keys...})`
pub fn metric_with_props(l: At, em: &Sym, event: &str, kind: &str, keys: &[&str]) -> Expr {
    let keys = l.composite(ty("[]string"), keys.iter().map(|k| l.str(k)).collect());
    l.method(
        l.ident(em),
        "MetricWithProps",
        vec![l.str(event), l.select_name(l.name("types"), kind), keys],
    )
    .typed(ty(METRIC_FN))
}

/// `fun(ctx, 1)`
pub fn invoke(l: At, fun: Expr) -> Stmt {
    l.stmt(l.call(fun, vec![l.name("ctx"), l.int(1)]))
}

/// Two files exercising every access path the analysis follows.
///
/// Expected call sites (all in `main.go`):
///
/// | event                   | line | kind  | keys   |
/// |-------------------------|------|-------|--------|
/// | `service_b_get_success` | 11   | COUNT | status |
/// | `slice_one`             | 12   | GAUGE | shard  |
/// | `requests`              | 14   | COUNT |        |
/// | `user_login`            | 15   | COUNT |        |
/// | `direct_count`          | 16   | COUNT | route  |
/// | `db_query`              | 17   | TIMER | table  |
pub fn fixture_package() -> Package {
    let mut b = PackageBuilder::new("app", "example.com/app");
    let services = b.file("services.go");
    let main_go = b.file("main.go");

    let em = b.var("em", ty(EMITTER));
    let timer = b.var("timer", ty(TIMER));

    // services.go
    let service_a = b.structure("example.com/app.ServiceA", &[("getSuccess", ty(METRIC_FN))]);
    let service_b = b.structure("example.com/app.ServiceB", &[("getSuccess", ty(METRIC_FN))]);
    let a = b.var("serviceA", ty("*example.com/app.ServiceA"));
    let svc_b = b.var("serviceB", ty("*example.com/app.ServiceB"));

    let l = at(10);
    b.global(
        services,
        10,
        &a,
        l.addr(l.composite(
            service_a.ty.clone(),
            vec![l.field_value(
                service_a.field("getSuccess"),
                metric(l, &em, "service_a_get_success", "COUNT"),
            )],
        )),
    );
    let l = at(14);
    b.global(
        services,
        14,
        &svc_b,
        l.addr(l.composite(
            service_b.ty.clone(),
            vec![l.field_value(
                service_b.field("getSuccess"),
                metric_with_props(l, &em, "service_b_get_success", "COUNT", &["status"]),
            )],
        )),
    );

    let slice_ty = ty("[]emitter/types.MetricEmitterFn");
    let get_slice = b.func_sym("getCallbackSlice", Some(slice_ty.clone()));
    let l = at(21);
    b.func(
        services,
        20,
        &get_slice,
        vec![l.ret(vec![l.composite(
            slice_ty,
            vec![
                metric(at(21), &em, "slice_zero", "COUNT"),
                metric_with_props(at(22), &em, "slice_one", "GAUGE", &["shard"]),
            ],
        )])],
    );

    // main.go
    let requests = b.var("requests", ty(METRIC_FN));
    b.global(main_go, 5, &requests, metric(at(5), &em, "requests", "COUNT"));
    let on_login = b.var("onLogin", ty(LOG_FN));
    let l = at(6);
    b.global(
        main_go,
        6,
        &on_login,
        l.method(l.ident(&em), "Log", vec![l.str("user_login")])
            .typed(ty(LOG_FN)),
    );

    let main = b.func_sym("main", None);
    let props = |l: At, key: &str| l.string_map(ty("map[string]any"), vec![(key, l.opaque())]);
    let body = vec![
        invoke(at(11), at(11).select(at(11).ident(&svc_b), service_b.field("getSuccess"))),
        invoke(
            at(12),
            at(12).index(at(12).call_fn(&get_slice, vec![]), at(12).int(1)),
        ),
        invoke(at(13), at(13).ident(&requests)),
        invoke(
            at(14),
            at(14)
                .method(at(14).ident(&em), "MetricFnCallsite", vec![at(14).ident(&requests)])
                .typed(ty(METRIC_FN)),
        ),
        at(15).stmt(at(15).call(at(15).ident(&on_login), vec![at(15).name("ctx"), at(15).name("nil")])),
        at(16).stmt(at(16).method(
            at(16).ident(&em),
            "Count",
            vec![at(16).name("ctx"), at(16).str("direct_count"), props(at(16), "route"), at(16).int(1)],
        )),
        at(17).stmt(at(17).method(
            at(17).ident(&timer),
            "Time",
            vec![
                at(17).name("ctx"),
                at(17).str("db_query"),
                props(at(17), "table"),
                at(17).func_lit(vec![]),
            ],
        )),
    ];
    b.func(main_go, 10, &main, body);

    b.finish()
}

/// Two handles registered under the same event name, both invoked
pub fn duplicate_package() -> Package {
    let mut b = PackageBuilder::new("app", "example.com/app");
    let file = b.file("main.go");
    let em = b.var("em", ty(EMITTER));
    let first = b.var("first", ty(METRIC_FN));
    let second = b.var("second", ty(METRIC_FN));
    b.global(file, 5, &first, metric(at(5), &em, "requests", "COUNT"));
    b.global(file, 6, &second, metric(at(6), &em, "requests", "COUNT"));
    let main = b.func_sym("main", None);
    b.func(
        file,
        10,
        &main,
        vec![
            invoke(at(11), at(11).ident(&first)),
            invoke(at(12), at(12).ident(&second)),
        ],
    );
    b.finish()
}

/// Registration whose event name is a variable
pub fn non_literal_package() -> Package {
    let mut b = PackageBuilder::new("app", "example.com/app");
    let file = b.file("main.go");
    let em = b.var("em", ty(EMITTER));
    let name = b.var("eventName", ty("string"));
    let handle = b.var("handle", ty(METRIC_FN));
    let l = at(8);
    b.global(
        file,
        8,
        &handle,
        l.method(
            l.ident(&em),
            "Metric",
            vec![l.col(22).ident(&name), l.select_name(l.name("types"), "COUNT")],
        )
        .typed(ty(METRIC_FN)),
    );
    b.finish()
}

/// Write `package` as the single dump of `dir`
pub fn write_dump(dir: &Path, package: &Package) -> PathBuf {
    let path = dir.join(format!("{}.tree.json", package.name));
    let json = serde_json::to_string_pretty(package).expect("serialize package");
    fs::write(&path, json).expect("write dump");
    path
}
