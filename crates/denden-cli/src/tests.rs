//! Runtime tests driving the client against in-process fake servers.

use std::ffi::OsString;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::process::ExitCode;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use denden_config::{Config, SocketEndpoint};
use denden_types::{
    AskUserResult, DenDenResponse, ErrorCode, RpcCall, RpcReply, StatusResponse,
};
use rstest::rstest;

use crate::config::ConfigLoader;
use crate::{AppError, run_with_loader};

struct FixedConfig(Config);

impl ConfigLoader for FixedConfig {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.0.clone())
    }
}

fn config_for(endpoint: SocketEndpoint) -> FixedConfig {
    FixedConfig(Config {
        daemon_socket: endpoint,
        request_timeout_secs: 5,
        ..Config::default()
    })
}

/// Accepts one connection, decodes the call and writes whatever `reply`
/// returns. `None` closes the connection without replying.
fn serve_once<F>(reply: F) -> (SocketEndpoint, JoinHandle<RpcCall>)
where
    F: FnOnce(&RpcCall) -> Option<RpcReply> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake server");
    let port = listener.local_addr().expect("local addr").port();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader.read_line(&mut line).expect("read call");
        let call: RpcCall = serde_json::from_str(&line).expect("decode call");
        if let Some(frame) = reply(&call) {
            let mut stream = reader.into_inner();
            let encoded = serde_json::to_string(&frame).expect("encode reply");
            writeln!(stream, "{encoded}").expect("write reply");
        }
        call
    });
    (SocketEndpoint::tcp("127.0.0.1", port), handle)
}

fn run_cli(args: &[&str], loader: &FixedConfig) -> (ExitCode, String, String) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut argv = vec![OsString::from("denden")];
    argv.extend(args.iter().map(OsString::from));
    let code = run_with_loader(argv, &mut stdout, &mut stderr, loader);
    (
        code,
        String::from_utf8(stdout).expect("stdout utf8"),
        String::from_utf8(stderr).expect("stderr utf8"),
    )
}

fn request_id_of(call: &RpcCall) -> String {
    match call {
        RpcCall::Send { request } => request.request_id.clone(),
        RpcCall::Status => String::new(),
    }
}

#[rstest]
fn status_prints_uptime() {
    let (endpoint, server) = serve_once(|_| {
        Some(RpcReply::Status {
            status: StatusResponse::new(42),
        })
    });

    let (code, stdout, stderr) = run_cli(&["status"], &config_for(endpoint));

    assert_eq!(code, ExitCode::SUCCESS, "stderr: {stderr}");
    let printed: serde_json::Value = serde_json::from_str(&stdout).expect("json output");
    assert_eq!(printed, serde_json::json!({"uptime_seconds": 42}));
    assert_eq!(server.join().expect("server thread"), RpcCall::Status);
}

#[rstest]
fn successful_send_prints_response() {
    let (endpoint, server) = serve_once(|call| {
        Some(RpcReply::Response {
            response: DenDenResponse::ok(request_id_of(call), AskUserResult::new("blue")),
        })
    });

    let (code, stdout, _) = run_cli(
        &["send", r#"{"ask_user":{"question":"color?"}}"#],
        &config_for(endpoint),
    );

    assert_eq!(code, ExitCode::SUCCESS);
    let call = server.join().expect("server thread");
    let request_id = request_id_of(&call);
    assert!(request_id.starts_with("req_"));
    let printed: serde_json::Value = serde_json::from_str(&stdout).expect("json output");
    assert_eq!(printed["status"], "OK");
    assert_eq!(printed["request_id"], request_id.as_str());
    assert_eq!(printed["ask_user_result"]["text"], "blue");
}

#[rstest]
#[case(DenDenResponse::denied("r1", ErrorCode::DenyDepthLimit, "too deep"), "DENIED")]
#[case(DenDenResponse::error("r1", ErrorCode::ErrSubagentFailure, "boom"), "ERROR")]
fn non_ok_responses_exit_with_failure(#[case] response: DenDenResponse, #[case] status: &str) {
    let (endpoint, server) = serve_once(move |_| Some(RpcReply::Response { response }));

    let (code, stdout, _) = run_cli(
        &["send", r#"{"request_id":"r1","delegate":{"delegate_to":"x","task":{"text":"t"}}}"#],
        &config_for(endpoint),
    );

    assert_eq!(code, ExitCode::FAILURE);
    assert!(stdout.contains(status), "stdout: {stdout}");
    assert_eq!(request_id_of(&server.join().expect("server thread")), "r1");
}

#[rstest]
fn fault_frames_are_reported() {
    let (endpoint, server) = serve_once(|_| Some(RpcReply::fault("malformed frame")));

    let (code, stdout, stderr) = run_cli(&["status"], &config_for(endpoint));

    assert_eq!(code, ExitCode::FAILURE);
    assert!(stdout.is_empty());
    assert!(stderr.starts_with("error: "), "stderr: {stderr}");
    assert!(stderr.contains("malformed frame"));
    let _ = server.join();
}

#[rstest]
fn closed_connection_is_reported() {
    let (endpoint, server) = serve_once(|_| None);

    let (code, _, stderr) = run_cli(&["status"], &config_for(endpoint));

    assert_eq!(code, ExitCode::FAILURE);
    assert!(stderr.contains("closed the connection"), "stderr: {stderr}");
    let _ = server.join();
}

#[rstest]
fn silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake server");
    let port = listener.local_addr().expect("local addr").port();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        thread::sleep(Duration::from_secs(3));
        drop(stream);
    });
    let loader = FixedConfig(Config {
        daemon_socket: SocketEndpoint::tcp("127.0.0.1", port),
        request_timeout_secs: 1,
        ..Config::default()
    });

    let (code, _, stderr) = run_cli(&["status"], &loader);

    assert_eq!(code, ExitCode::FAILURE);
    assert!(stderr.contains("timed out"), "stderr: {stderr}");
    let _ = server.join();
}

#[rstest]
fn invalid_json_never_contacts_server() {
    let loader = config_for(SocketEndpoint::tcp("127.0.0.1", 9));

    let (code, _, stderr) = run_cli(&["send", "{oops"], &loader);

    assert_eq!(code, ExitCode::FAILURE);
    assert!(stderr.starts_with("error: invalid JSON: "), "stderr: {stderr}");
}

#[rstest]
fn missing_payload_never_contacts_server() {
    let loader = config_for(SocketEndpoint::tcp("127.0.0.1", 9));

    let (code, _, stderr) = run_cli(&["send", r#"{"request_id":"r"}"#], &loader);

    assert_eq!(code, ExitCode::FAILURE);
    assert!(stderr.contains("either 'ask_user' or 'delegate' payload is required"));
}

#[rstest]
fn help_is_printed_to_stdout() {
    let loader = config_for(SocketEndpoint::tcp("127.0.0.1", 9));

    let (code, stdout, stderr) = run_cli(&["--help"], &loader);

    assert_eq!(code, ExitCode::SUCCESS);
    assert!(stdout.contains("send"));
    assert!(stderr.is_empty());
}

#[rstest]
fn missing_subcommand_is_a_usage_error() {
    let loader = config_for(SocketEndpoint::tcp("127.0.0.1", 9));

    let (code, stdout, stderr) = run_cli(&[], &loader);

    assert_eq!(code, ExitCode::FAILURE);
    assert!(stdout.is_empty());
    assert!(!stderr.is_empty());
}

#[cfg(unix)]
#[rstest]
fn status_over_unix_socket() {
    use std::os::unix::net::UnixListener;

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("denden.sock");
    let listener = UnixListener::bind(&path).expect("bind unix socket");
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader.read_line(&mut line).expect("read call");
        let reply = serde_json::to_string(&RpcReply::Status {
            status: StatusResponse::new(7),
        })
        .expect("encode reply");
        writeln!(reader.into_inner(), "{reply}").expect("write reply");
    });
    let endpoint = SocketEndpoint::unix(path.to_str().expect("utf8 path"));

    let (code, stdout, stderr) = run_cli(&["status"], &config_for(endpoint));

    assert_eq!(code, ExitCode::SUCCESS, "stderr: {stderr}");
    assert!(stdout.contains("\"uptime_seconds\": 7"));
    server.join().expect("server thread");
}
