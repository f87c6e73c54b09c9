//! Service registry and request dispatch.
//!
//! A [`ServiceDef`] collects a service's methods before installation. Typed
//! methods are plain closures whose argument types declare their own wire
//! tags; [`ServiceDef::method_raw`] covers dynamic cases where tags are only
//! known as strings. Installation resolves every declared tag: a method that
//! declares a tag outside the supported set is dropped with a warning rather
//! than failing the whole service.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::RwLock;

use seqrpc_wire::{code, FromValue, ParamKind, Request, Response, Value};
use tracing::{debug, warn};

type Invoker = Box<dyn Fn(&[Value]) -> seqrpc_wire::Result<Response> + Send + Sync>;

/// One RPC method a closure can be called through.
///
/// Implemented for `Fn` closures of zero to four arguments whose argument
/// types implement [`FromValue`] and which return a [`Response`].
pub trait ServiceMethod<Args>: Send + Sync + 'static {
    fn param_kinds() -> Vec<ParamKind>;
    fn invoke(&self, params: &[Value]) -> seqrpc_wire::Result<Response>;
}

macro_rules! impl_service_method {
    ($($arg:ident : $idx:tt),*) => {
        impl<F, $($arg,)*> ServiceMethod<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> Response + Send + Sync + 'static,
            $($arg: FromValue,)*
        {
            fn param_kinds() -> Vec<ParamKind> {
                vec![$($arg::KIND),*]
            }

            #[allow(unused_variables)]
            fn invoke(&self, params: &[Value]) -> seqrpc_wire::Result<Response> {
                Ok(self($($arg::from_value(&params[$idx])?),*))
            }
        }
    };
}

impl_service_method!();
impl_service_method!(A0: 0);
impl_service_method!(A0: 0, A1: 1);
impl_service_method!(A0: 0, A1: 1, A2: 2);
impl_service_method!(A0: 0, A1: 1, A2: 2, A3: 3);

enum ParamSpec {
    /// Tags were checked at compile time through `FromValue::KIND`.
    Resolved(Vec<ParamKind>),
    /// Tags arrive as strings and are resolved at installation.
    Declared(Vec<String>),
}

struct PendingMethod {
    name: String,
    params: ParamSpec,
    invoker: Invoker,
}

/// Builder describing one service and its methods.
pub struct ServiceDef {
    name: String,
    methods: Vec<PendingMethod>,
}

impl ServiceDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    /// Add a typed method. Argument wire tags are derived from the closure's
    /// parameter types.
    pub fn method<Args, F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: ServiceMethod<Args>,
    {
        self.methods.push(PendingMethod {
            name: name.into(),
            params: ParamSpec::Resolved(F::param_kinds()),
            invoker: Box::new(move |params: &[Value]| f.invoke(params)),
        });
        self
    }

    /// Add a method whose parameter tags are given as strings.
    ///
    /// The invoker receives already-unmarshaled values in declaration order.
    /// Methods declaring a tag outside the supported set are dropped at
    /// installation instead of failing registration.
    pub fn method_raw<F>(mut self, name: impl Into<String>, tags: &[&str], invoker: F) -> Self
    where
        F: Fn(&[Value]) -> seqrpc_wire::Result<Response> + Send + Sync + 'static,
    {
        self.methods.push(PendingMethod {
            name: name.into(),
            params: ParamSpec::Declared(tags.iter().map(|t| t.to_string()).collect()),
            invoker: Box::new(invoker),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve declared tags, dropping methods with unsupported ones.
    ///
    /// Resolution is separate from installation so callers can validate the
    /// outcome (a service may resolve to zero methods) before announcing or
    /// installing anything.
    pub(crate) fn resolve(self) -> ResolvedService {
        let mut methods = HashMap::with_capacity(self.methods.len());
        for pending in self.methods {
            let kinds = match pending.params {
                ParamSpec::Resolved(kinds) => kinds,
                ParamSpec::Declared(tags) => {
                    let resolved: Option<Vec<ParamKind>> =
                        tags.iter().map(|t| ParamKind::from_tag(t)).collect();
                    match resolved {
                        Some(kinds) => kinds,
                        None => {
                            warn!(
                                service = %self.name,
                                method = %pending.name,
                                ?tags,
                                "skipping method with unsupported parameter tag"
                            );
                            continue;
                        }
                    }
                }
            };
            methods.insert(
                pending.name,
                MethodDef {
                    param_kinds: kinds,
                    invoker: pending.invoker,
                },
            );
        }
        ResolvedService {
            name: self.name,
            methods,
        }
    }
}

struct MethodDef {
    param_kinds: Vec<ParamKind>,
    invoker: Invoker,
}

/// A service definition with every declared tag resolved.
pub(crate) struct ResolvedService {
    name: String,
    methods: HashMap<String, MethodDef>,
}

impl ResolvedService {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn method_count(&self) -> usize {
        self.methods.len()
    }
}

/// Name-keyed registry of installed services.
///
/// Shared between the accept loop and every connection handler; reads vastly
/// outnumber writes, which normally all happen before `serve`.
pub struct Registry {
    services: RwLock<HashMap<String, HashMap<String, MethodDef>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            services: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve and install a service definition, replacing any previous
    /// service of the same name. Returns the number of methods actually
    /// installed; a definition resolving to zero usable methods is not
    /// installed.
    pub fn install(&self, def: ServiceDef) -> usize {
        self.insert(def.resolve())
    }

    pub(crate) fn insert(&self, svc: ResolvedService) -> usize {
        let count = svc.methods.len();
        if count == 0 {
            warn!(service = %svc.name, "service has no usable methods, not installing");
            return 0;
        }
        debug!(service = %svc.name, methods = count, "installing service");
        self.write_services().insert(svc.name, svc.methods);
        count
    }

    pub fn contains(&self, service_name: &str) -> bool {
        self.read_services().contains_key(service_name)
    }

    /// Installed service names, sorted.
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read_services().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Route one request to its handler and produce the response.
    ///
    /// Never fails and never panics: lookup misses, bad arguments, and
    /// handler panics all become error-coded responses stamped with the
    /// request's sequence number.
    pub fn dispatch(&self, req: &Request) -> Response {
        let mut resp = self.dispatch_inner(req);
        resp.seq = req.seq;
        resp
    }

    fn dispatch_inner(&self, req: &Request) -> Response {
        let services = self.read_services();
        let Some(methods) = services.get(&req.service_name) else {
            return Response::error(
                code::SERVICE_NOT_FOUND,
                format!("unknown service '{}'", req.service_name),
            );
        };
        let Some(method) = methods.get(&req.method_name) else {
            return Response::error(
                code::METHOD_NOT_FOUND,
                format!(
                    "service '{}' has no method '{}'",
                    req.service_name, req.method_name
                ),
            );
        };

        if req.params.len() != method.param_kinds.len() {
            return Response::error(
                code::BAD_PARAMS,
                format!(
                    "method '{}' takes {} parameter(s), got {}",
                    req.method_name,
                    method.param_kinds.len(),
                    req.params.len()
                ),
            );
        }

        let mut values = Vec::with_capacity(req.params.len());
        for param in &req.params {
            match Value::from_wire(param) {
                Ok(value) => values.push(value),
                Err(err) => return Response::error(code::BAD_PARAMS, err.to_string()),
            }
        }

        // The panic boundary for user handlers. A poisoned registry lock is
        // impossible from here: this read guard is the only lock held.
        match panic::catch_unwind(AssertUnwindSafe(|| (method.invoker)(&values))) {
            Ok(Ok(resp)) => resp,
            Ok(Err(err)) => Response::error(code::BAD_PARAMS, err.to_string()),
            Err(_) => {
                warn!(
                    service = %req.service_name,
                    method = %req.method_name,
                    "handler panicked"
                );
                Response::error(code::INVOKE_FAILED, "handler panicked")
            }
        }
    }

    fn read_services(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<String, HashMap<String, MethodDef>>> {
        match self.services.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_services(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<String, HashMap<String, MethodDef>>> {
        match self.services.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc_service() -> ServiceDef {
        ServiceDef::new("Calc")
            .method("Add", |a: i64, b: i64| Response::ok(a + b))
            .method("Upper", |s: String| Response::ok(s.to_uppercase()))
            .method("Pi", || Response::ok(std::f64::consts::PI))
    }

    fn request(service: &str, method: &str, params: Vec<Value>) -> Request {
        Request {
            seq: 42,
            service_name: service.to_string(),
            method_name: method.to_string(),
            params: params.iter().map(Value::to_wire).collect(),
        }
    }

    #[test]
    fn dispatch_routes_to_typed_method() {
        let registry = Registry::new();
        assert_eq!(registry.install(calc_service()), 3);

        let resp = registry.dispatch(&request(
            "Calc",
            "Add",
            vec![Value::Int(2), Value::Int(40)],
        ));
        assert_eq!(resp.code, code::OK);
        assert_eq!(resp.data, serde_json::json!(42));
        assert_eq!(resp.seq, 42);
    }

    #[test]
    fn zero_arity_method_works() {
        let registry = Registry::new();
        registry.install(calc_service());

        let resp = registry.dispatch(&request("Calc", "Pi", vec![]));
        assert_eq!(resp.code, code::OK);
    }

    #[test]
    fn unknown_service_is_coded() {
        let registry = Registry::new();
        registry.install(calc_service());

        let resp = registry.dispatch(&request("Nope", "Add", vec![]));
        assert_eq!(resp.code, code::SERVICE_NOT_FOUND);
        assert!(resp.message.contains("Nope"));
        assert_eq!(resp.seq, 42);
    }

    #[test]
    fn unknown_method_is_coded() {
        let registry = Registry::new();
        registry.install(calc_service());

        let resp = registry.dispatch(&request("Calc", "Nope", vec![]));
        assert_eq!(resp.code, code::METHOD_NOT_FOUND);
    }

    #[test]
    fn arity_mismatch_is_bad_params() {
        let registry = Registry::new();
        registry.install(calc_service());

        let resp = registry.dispatch(&request("Calc", "Add", vec![Value::Int(1)]));
        assert_eq!(resp.code, code::BAD_PARAMS);
        assert!(resp.message.contains("2 parameter(s)"));
    }

    #[test]
    fn type_mismatch_is_bad_params() {
        let registry = Registry::new();
        registry.install(calc_service());

        let resp = registry.dispatch(&request(
            "Calc",
            "Add",
            vec![Value::Int(1), Value::from("two")],
        ));
        assert_eq!(resp.code, code::BAD_PARAMS);
    }

    #[test]
    fn undecodable_wire_param_is_bad_params() {
        let registry = Registry::new();
        registry.install(calc_service());

        let mut req = request("Calc", "Add", vec![Value::Int(1), Value::Int(2)]);
        req.params[1].value = "not-a-number".to_string();
        let resp = registry.dispatch(&req);
        assert_eq!(resp.code, code::BAD_PARAMS);
    }

    #[test]
    fn handler_panic_becomes_invoke_failed() {
        let registry = Registry::new();
        registry.install(
            ServiceDef::new("Bomb").method("Boom", || -> Response { panic!("kaboom") }),
        );

        let resp = registry.dispatch(&request("Bomb", "Boom", vec![]));
        assert_eq!(resp.code, code::INVOKE_FAILED);

        // The registry stays usable afterwards.
        registry.install(calc_service());
        let resp = registry.dispatch(&request("Calc", "Pi", vec![]));
        assert_eq!(resp.code, code::OK);
    }

    #[test]
    fn raw_method_with_supported_tags_installs() {
        let registry = Registry::new();
        let installed = registry.install(ServiceDef::new("Dyn").method_raw(
            "Echo",
            &["string"],
            |params| Ok(Response::ok(format!("{:?}", params[0]))),
        ));
        assert_eq!(installed, 1);

        let resp = registry.dispatch(&request("Dyn", "Echo", vec![Value::from("hi")]));
        assert_eq!(resp.code, code::OK);
    }

    #[test]
    fn raw_method_with_unsupported_tag_is_skipped() {
        let registry = Registry::new();
        let installed = registry.install(
            ServiceDef::new("Dyn")
                .method_raw("Good", &["int"], |_| Ok(Response::ok(1)))
                .method_raw("Bad", &["uint128"], |_| Ok(Response::ok(2))),
        );
        assert_eq!(installed, 1);

        let resp = registry.dispatch(&request("Dyn", "Bad", vec![]));
        assert_eq!(resp.code, code::METHOD_NOT_FOUND);
        let resp = registry.dispatch(&request("Dyn", "Good", vec![Value::Int(0)]));
        assert_eq!(resp.code, code::OK);
    }

    #[test]
    fn reinstall_replaces_previous_service() {
        let registry = Registry::new();
        registry.install(calc_service());
        registry.install(ServiceDef::new("Calc").method("Neg", |a: i64| Response::ok(-a)));

        let resp = registry.dispatch(&request("Calc", "Add", vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(resp.code, code::METHOD_NOT_FOUND);
        let resp = registry.dispatch(&request("Calc", "Neg", vec![Value::Int(5)]));
        assert_eq!(resp.data, serde_json::json!(-5));
    }

    #[test]
    fn service_names_are_sorted() {
        let registry = Registry::new();
        registry.install(ServiceDef::new("Zeta").method("M", || Response::ok(0)));
        registry.install(ServiceDef::new("Alpha").method("M", || Response::ok(0)));
        assert_eq!(registry.service_names(), vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn narrowing_out_of_range_is_bad_params() {
        let registry = Registry::new();
        registry.install(ServiceDef::new("N").method("Take32", |v: i32| Response::ok(v)));

        let resp = registry.dispatch(&request("N", "Take32", vec![Value::Int(i64::MAX)]));
        assert_eq!(resp.code, code::BAD_PARAMS);

        let resp = registry.dispatch(&request("N", "Take32", vec![Value::Int(7)]));
        assert_eq!(resp.data, serde_json::json!(7));
    }

    #[test]
    fn handler_error_codes_pass_through() {
        let registry = Registry::new();
        registry.install(ServiceDef::new("App").method("Fail", || {
            Response::error(1001, "domain-specific failure")
        }));

        let resp = registry.dispatch(&request("App", "Fail", vec![]));
        assert_eq!(resp.code, 1001);
        assert_eq!(resp.message, "domain-specific failure");
        assert_eq!(resp.seq, 42);
    }
}
