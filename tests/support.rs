use std::ffi::OsStr;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::process::{Child, Command, Output, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Environment variables that would otherwise leak into the binary's
/// argument resolution.
const SCRUBBED_ENV: [&str; 15] = [
    "LOGRELAY_LOG",
    "LOGRELAY_LISTEN",
    "LOGRELAY_HOST",
    "LOGRELAY_USER",
    "LOGRELAY_PASSWORD",
    "LOGRELAY_DB_PATH",
    "POSTGRES_CONN_STRING",
    "LOKI_HOST",
    "INFLUX_ENDPOINT",
    "INFLUX_ORG",
    "INFLUX_BUCKET",
    "INFLUX_TOKEN",
    "CREATE_METRICS_TABLE",
    "VERSION",
    "SOURCE",
];

const READY_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ServerHandle {
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// Spawn a lightweight stand-in for the target API.
///
/// `POST /api/session` sets the session cookie, `fail_path` answers 500 and
/// every other request answers 200.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_target_server(
    fail_path: Option<&'static str>,
) -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    thread::spawn(move || handle_client(stream, fail_path));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(_) => break,
            }
        }
    });

    Ok((
        format!("http://{}", addr),
        ServerHandle {
            shutdown: shutdown_tx,
            thread: Some(handle),
        },
    ))
}

fn handle_client(mut stream: TcpStream, fail_path: Option<&'static str>) {
    if stream.set_nonblocking(false).is_err() {
        return;
    }
    let request = read_request(&mut stream);
    let mut parts = request.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let path = parts.next().unwrap_or_default();

    let response: &[u8] = if method == "POST" && path == "/api/session" {
        b"HTTP/1.1 200 OK\r\nSet-Cookie: metabase.SESSION=e2e-session; Path=/; HttpOnly\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}"
    } else if Some(path) == fail_path {
        b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    } else {
        b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}"
    };
    if stream.write_all(response).is_err() {
        return;
    }
    if stream.flush().is_err() {
        return;
    }
    drop(stream.shutdown(Shutdown::Both));
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 2048];
    loop {
        let Ok(read) = stream.read(&mut chunk) else {
            break;
        };
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(chunk.get(..read).unwrap_or_default());
        let text = String::from_utf8_lossy(&buffer);
        if let Some((head, body)) = text.split_once("\r\n\r\n") {
            let length = head
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if body.len() >= length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

fn logrelay_command() -> Result<Command, String> {
    let bin = logrelay_bin()?;
    let mut command = Command::new(bin);
    for name in SCRUBBED_ENV {
        command.env_remove(name);
    }
    command.env("RUST_LOG", "info").env("NO_COLOR", "true");
    Ok(command)
}

/// Run the `logrelay` binary to completion and capture output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_logrelay<I, S>(args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    logrelay_command()?
        .args(args)
        .output()
        .map_err(|err| format!("run logrelay failed: {}", err))
}

pub struct ChildGuard {
    child: Child,
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        drop(self.child.kill());
        drop(self.child.wait());
    }
}

/// Start `logrelay serve` on a free local port and wait until it accepts
/// connections.
///
/// # Errors
///
/// Returns an error if no port is free or the server never comes up.
pub fn start_serve(extra: &[&str]) -> Result<(String, ChildGuard), String> {
    start_serve_with_env(extra, &[])
}

/// Like [`start_serve`], with extra environment variables for the child.
///
/// # Errors
///
/// Returns an error if no port is free or the server never comes up.
pub fn start_serve_with_env(
    extra: &[&str],
    env: &[(&str, &str)],
) -> Result<(String, ChildGuard), String> {
    let port = TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map_err(|err| format!("free port lookup failed: {}", err))?
        .port();
    let addr = format!("127.0.0.1:{}", port);

    let child = logrelay_command()?
        .arg("serve")
        .arg("--listen")
        .arg(&addr)
        .args(extra)
        .envs(env.iter().copied())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| format!("spawn logrelay failed: {}", err))?;
    let guard = ChildGuard { child };

    let started = Instant::now();
    while TcpStream::connect(&addr).is_err() {
        if started.elapsed() > READY_TIMEOUT {
            return Err("logrelay serve did not start listening".to_owned());
        }
        thread::sleep(Duration::from_millis(20));
    }
    Ok((addr, guard))
}

/// Send a raw HTTP request and return the full response text.
///
/// # Errors
///
/// Returns an error if the connection fails.
pub fn send_raw(addr: &str, request: &str) -> Result<String, String> {
    let mut stream =
        TcpStream::connect(addr).map_err(|err| format!("connect failed: {}", err))?;
    stream
        .set_read_timeout(Some(READY_TIMEOUT))
        .map_err(|err| format!("set timeout failed: {}", err))?;
    stream
        .write_all(request.as_bytes())
        .map_err(|err| format!("write failed: {}", err))?;
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .map_err(|err| format!("read failed: {}", err))?;
    Ok(response)
}

fn logrelay_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_logrelay").map_or_else(
        || Err("CARGO_BIN_EXE_logrelay missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}
