mod support;

use support::{run_logrelay, spawn_target_server};

fn describe(output: &std::process::Output) -> String {
    format!(
        "status: {:?}\nstdout: {}\nstderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn e2e_load_replays_sequence() -> Result<(), String> {
    let (url, _server) = spawn_target_server(None)?;

    let output = run_logrelay([
        "load",
        "--host",
        url.as_str(),
        "--user",
        "admin@example.com",
        "--password",
        "pw",
        "--iterations",
        "1",
        "--think-time",
        "1ms",
    ])?;
    if !output.status.success() {
        return Err(describe(&output));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let expected = format!("GET {}/api/user/current 200 took", url);
    if !stdout.contains(&expected) {
        return Err(format!("Missing request log line\n{}", describe(&output)));
    }
    if !stdout.contains("8 checked ok, 0 failed") {
        return Err(format!("Missing summary line\n{}", describe(&output)));
    }
    Ok(())
}

#[test]
fn e2e_load_aborts_on_unexpected_status() -> Result<(), String> {
    let (url, _server) = spawn_target_server(Some("/api/bookmark"))?;

    let output = run_logrelay([
        "load",
        "--host",
        url.as_str(),
        "--user",
        "admin@example.com",
        "--password",
        "pw",
        "--iterations",
        "5",
        "--think-time",
        "1ms",
    ])?;
    if output.status.success() {
        return Err(format!("Expected a failing exit\n{}", describe(&output)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let expected = format!("GET {}/api/bookmark 500", url);
    if !stdout.contains(&expected) {
        return Err(format!("Missing error line\n{}", describe(&output)));
    }
    Ok(())
}

#[test]
fn e2e_load_requires_credentials() -> Result<(), String> {
    let output = run_logrelay(["load", "--host", "http://127.0.0.1:9"])?;
    if output.status.success() {
        return Err(format!("Expected missing credentials to fail\n{}", describe(&output)));
    }
    Ok(())
}
