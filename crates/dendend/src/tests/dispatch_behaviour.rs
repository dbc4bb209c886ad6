//! Behavioural tests for dispatch over the server socket.

use std::cell::RefCell;
use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use denden_types::{
    AskUserPayload, AskUserResult, DelegatePayload, DenDenRequest, DenDenResponse, ErrorCode,
    ResponseResult, ResponseStatus, RpcCall, RpcReply, Task,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::dispatch::HandlerError;
use crate::server::{DenDenServer, RunningServer};

use super::support::TestConfigLoader;

struct DispatchWorld {
    server: DenDenServer,
    running: Option<RunningServer>,
    address: Option<SocketAddr>,
    reply: Option<RpcReply>,
}

impl DispatchWorld {
    fn new() -> Self {
        Self {
            server: DenDenServer::new(TestConfigLoader::new().config()),
            running: None,
            address: None,
            reply: None,
        }
    }

    fn start(&mut self) {
        let running = self.server.start().expect("start server");
        self.address = running.local_addr();
        self.running = Some(running);
    }

    fn send_line(&mut self, line: &str) {
        let addr = self.address.expect("address set");
        let mut stream = TcpStream::connect(addr).expect("connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("set read timeout");
        stream.write_all(line.as_bytes()).expect("write call");
        stream.write_all(b"\n").expect("write newline");
        stream.shutdown(Shutdown::Write).expect("close write half");

        let mut reply = String::new();
        BufReader::new(stream)
            .read_line(&mut reply)
            .expect("read reply");
        self.reply = Some(serde_json::from_str(&reply).expect("decode reply"));
    }

    fn call(&mut self, call: &RpcCall) {
        let line = serde_json::to_string(call).expect("encode call");
        self.send_line(&line);
    }

    fn send(&mut self, request: DenDenRequest) {
        self.call(&RpcCall::Send { request });
    }

    fn response(&self) -> &DenDenResponse {
        match &self.reply {
            Some(RpcReply::Response { response }) => response,
            other => panic!("expected response frame, got {other:?}"),
        }
    }
}

impl Drop for DispatchWorld {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.drain(Duration::from_secs(1));
        }
    }
}

fn delegate(request_id: &str) -> DenDenRequest {
    DenDenRequest::new(
        request_id,
        DelegatePayload::new("implementer", Task::new("write the parser")),
    )
}

#[fixture]
fn world() -> RefCell<DispatchWorld> {
    RefCell::new(DispatchWorld::new())
}

#[given("a running server with an echoing ask_user handler")]
fn given_running_server(world: &RefCell<DispatchWorld>) {
    let mut world = world.borrow_mut();
    world
        .server
        .on_ask_user(|request: &DenDenRequest| -> Result<DenDenResponse, HandlerError> {
            let question = request
                .ask_user()
                .map(|payload| payload.question.clone())
                .unwrap_or_default();
            Ok(DenDenResponse::ok(
                request.request_id.clone(),
                AskUserResult::new(question),
            ))
        });
    world.start();
}

#[given("a delegate handler that fails with {message}")]
fn given_failing_delegate(world: &RefCell<DispatchWorld>, message: String) {
    world.borrow().server.on_delegate(
        move |_: &DenDenRequest| -> Result<DenDenResponse, HandlerError> {
            Err(anyhow::anyhow!("{message}"))
        },
    );
}

#[given("a delegate handler that denies with {code}")]
fn given_denying_delegate(world: &RefCell<DispatchWorld>, code: String) {
    let code: ErrorCode = code.parse().expect("known error code");
    world.borrow().server.on_delegate(
        move |request: &DenDenRequest| -> Result<DenDenResponse, HandlerError> {
            Ok(DenDenResponse::denied(
                request.request_id.clone(),
                code,
                "policy says no",
            ))
        },
    );
}

#[when("the client sends an ask_user request {request_id} asking {question}")]
fn when_ask_user(world: &RefCell<DispatchWorld>, request_id: String, question: String) {
    world
        .borrow_mut()
        .send(DenDenRequest::new(request_id, AskUserPayload::new(question)));
}

#[when("the client sends a delegate request without a request_id")]
fn when_delegate_without_id(world: &RefCell<DispatchWorld>) {
    world.borrow_mut().send(delegate(""));
}

#[when("the client sends a delegate request with id {request_id}")]
fn when_delegate(world: &RefCell<DispatchWorld>, request_id: String) {
    world.borrow_mut().send(delegate(&request_id));
}

#[when("the client asks for status")]
fn when_status(world: &RefCell<DispatchWorld>) {
    world.borrow_mut().call(&RpcCall::Status);
}

#[when("the client sends the raw line {line}")]
fn when_raw_line(world: &RefCell<DispatchWorld>, line: String) {
    world.borrow_mut().send_line(&line);
}

#[then("the response status is {status}")]
fn then_status(world: &RefCell<DispatchWorld>, status: String) {
    let expected = match status.as_str() {
        "OK" => ResponseStatus::Ok,
        "DENIED" => ResponseStatus::Denied,
        _ => ResponseStatus::Error,
    };
    assert_eq!(world.borrow().response().status, expected);
}

#[then("the response has an empty request_id")]
fn then_request_id_empty(world: &RefCell<DispatchWorld>) {
    assert_eq!(world.borrow().response().request_id, "");
}

#[then("the response request_id is {request_id}")]
fn then_request_id(world: &RefCell<DispatchWorld>, request_id: String) {
    assert_eq!(world.borrow().response().request_id, request_id);
}

#[then("the ask_user result text is {text}")]
fn then_ask_user_text(world: &RefCell<DispatchWorld>, text: String) {
    let world = world.borrow();
    assert_eq!(
        world.response().result,
        Some(ResponseResult::AskUser(AskUserResult::new(text)))
    );
}

#[then("the response error code is {code}")]
fn then_error_code(world: &RefCell<DispatchWorld>, code: String) {
    let expected: ErrorCode = code.parse().expect("known error code");
    assert_eq!(world.borrow().response().error_code(), Some(expected));
}

#[then("the response error message contains {text}")]
fn then_error_message(world: &RefCell<DispatchWorld>, text: String) {
    let world = world.borrow();
    let message = world
        .response()
        .error
        .as_ref()
        .map(|error| error.message.clone())
        .unwrap_or_default();
    assert!(message.contains(&text), "message was: {message}");
}

#[then("the response error is not retryable")]
fn then_not_retryable(world: &RefCell<DispatchWorld>) {
    let world = world.borrow();
    let error = world.response().error.as_ref().expect("error detail");
    assert!(!error.retryable);
}

#[then("the status reply reports uptime")]
fn then_status_reply(world: &RefCell<DispatchWorld>) {
    let world = world.borrow();
    assert!(
        matches!(world.reply, Some(RpcReply::Status { .. })),
        "expected status frame, got {:?}",
        world.reply
    );
}

#[then("the reply is a fault")]
fn then_fault(world: &RefCell<DispatchWorld>) {
    let world = world.borrow();
    assert!(
        matches!(world.reply, Some(RpcReply::Fault { .. })),
        "expected fault frame, got {:?}",
        world.reply
    );
}

#[scenario(path = "tests/features/denden_dispatch.feature")]
fn denden_dispatch(#[from(world)] world: RefCell<DispatchWorld>) {
    drop(world);
}
