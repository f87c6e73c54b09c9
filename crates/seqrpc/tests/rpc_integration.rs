//! End-to-end tests driving a real server over TCP with the real client.

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use seqrpc::client::{Client, ClientConfig, ClientError};
use seqrpc::server::{Server, ServerConfig, ServiceDef};
use seqrpc::wire::{code, Response, Value};
use seqrpc::StaticRoutes;

fn calc_service() -> ServiceDef {
    ServiceDef::new("Calc")
        .method("Add", |a: i64, b: i64| Response::ok(a + b))
        .method("Div", |a: f64, b: f64| {
            if b == 0.0 {
                Response::error(1001, "division by zero")
            } else {
                Response::ok(a / b)
            }
        })
        .method("Slow", |millis: i64| {
            thread::sleep(Duration::from_millis(millis as u64));
            Response::ok("done")
        })
}

fn start_calc_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = Server::new(ServerConfig::default());
    server.register(calc_service()).unwrap();
    thread::spawn(move || server.serve_on(listener).unwrap());
    addr
}

fn connect(addr: SocketAddr) -> Client {
    Client::connect(
        ClientConfig::default()
            .with_address(addr.to_string())
            .with_read_timeout(Duration::from_secs(5)),
    )
    .unwrap()
}

#[test]
fn basic_call_round_trip() {
    let addr = start_calc_server();
    let client = connect(addr);

    let resp = client
        .call("Calc", "Add", vec![Value::Int(19), Value::Int(23)])
        .unwrap();
    assert_eq!(resp.code, code::OK);
    assert_eq!(resp.data, serde_json::json!(42));
}

#[test]
fn application_error_codes_reach_the_caller() {
    let addr = start_calc_server();
    let client = connect(addr);

    let resp = client
        .call("Calc", "Div", vec![Value::Float64(1.0), Value::Float64(0.0)])
        .unwrap();
    assert_eq!(resp.code, 1001);
    assert_eq!(resp.message, "division by zero");
}

#[test]
fn unknown_service_leaves_connection_usable() {
    let addr = start_calc_server();
    let client = connect(addr);

    let resp = client.call("Nope", "M", vec![]).unwrap();
    assert_eq!(resp.code, code::SERVICE_NOT_FOUND);

    let resp = client
        .call("Calc", "Add", vec![Value::Int(1), Value::Int(2)])
        .unwrap();
    assert_eq!(resp.data, serde_json::json!(3));
}

#[test]
fn concurrent_calls_multiplex_over_one_connection() {
    let addr = start_calc_server();
    let client = connect(addr);

    let workers: Vec<_> = (0..16)
        .map(|i| {
            let client = client.clone();
            thread::spawn(move || {
                let resp = client
                    .call("Calc", "Add", vec![Value::Int(i), Value::Int(1000)])
                    .unwrap();
                assert_eq!(resp.data, serde_json::json!(i + 1000));
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(client.pending_calls(), 0);
}

#[test]
fn slow_call_times_out_and_connection_recovers() {
    let addr = start_calc_server();
    let client = Client::connect(
        ClientConfig::default()
            .with_address(addr.to_string())
            .with_read_timeout(Duration::from_millis(100)),
    )
    .unwrap();

    let err = client
        .call("Calc", "Slow", vec![Value::Int(500)])
        .unwrap_err();
    assert!(matches!(err, ClientError::Timeout(_)));
    assert_eq!(client.pending_calls(), 0);

    // The late response is discarded; a fresh call still works because the
    // server handles the connection sequentially and has caught up by now.
    thread::sleep(Duration::from_millis(600));
    let resp = client
        .call("Calc", "Add", vec![Value::Int(1), Value::Int(1)])
        .unwrap();
    assert_eq!(resp.data, serde_json::json!(2));
}

#[test]
fn mixed_param_kinds_marshal_across_the_wire() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = Server::new(ServerConfig::default());
    server
        .register(ServiceDef::new("Fmt").method(
            "Describe",
            |name: String, count: i32, ratio: f64, enabled: bool| {
                Response::ok(format!("{name}/{count}/{ratio}/{enabled}"))
            },
        ))
        .unwrap();
    thread::spawn(move || server.serve_on(listener).unwrap());

    let client = connect(addr);
    let resp = client
        .call(
            "Fmt",
            "Describe",
            vec![
                Value::from("job"),
                Value::Int32(3),
                Value::Float64(0.5),
                Value::Bool(true),
            ],
        )
        .unwrap();
    assert_eq!(resp.data, serde_json::json!("job/3/0.5/true"));
}

#[test]
fn static_routes_resolve_register_and_call() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let routes = Arc::new(StaticRoutes::new());
    routes.add_route("Calc", addr);

    // Routed services register; unrouted ones are refused.
    let server = Server::new(ServerConfig::default()).with_registrar(routes.clone());
    server.register(calc_service()).unwrap();
    assert!(server
        .register(ServiceDef::new("Ghost").method("M", || Response::ok(0)))
        .is_err());

    thread::spawn(move || server.serve_on(listener).unwrap());

    let resp = routes
        .call("Calc", "Add", vec![Value::Int(2), Value::Int(3)])
        .unwrap();
    assert_eq!(resp.data, serde_json::json!(5));

    // Second call reuses the cached connection.
    let resp = routes
        .call("Calc", "Add", vec![Value::Int(20), Value::Int(30)])
        .unwrap();
    assert_eq!(resp.data, serde_json::json!(50));

    let err = routes.call("Ghost", "M", vec![]).unwrap_err();
    assert!(matches!(err, ClientError::Resolve { .. }));
}

#[test]
fn two_clients_share_one_server() {
    let addr = start_calc_server();
    let a = connect(addr);
    let b = connect(addr);

    let resp = a
        .call("Calc", "Add", vec![Value::Int(1), Value::Int(2)])
        .unwrap();
    assert_eq!(resp.data, serde_json::json!(3));
    let resp = b
        .call("Calc", "Add", vec![Value::Int(3), Value::Int(4)])
        .unwrap();
    assert_eq!(resp.data, serde_json::json!(7));
}
