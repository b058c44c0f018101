// Minimal integration test that drives the compiled binary through a PTY.
// This exercises the real event loop and crossterm input handling.
//
// Notes:
// - Requires a TTY; uses expectrl which allocates a pseudo terminal.
// - Marked Unix-only and ignored by default to avoid CI/platform issues.
// - Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn minimal_walk_starts_and_quits() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let route = dir.path().join("route.csv");
    std::fs::write(&route, "lat,lng\n51.5007,-0.1246\n51.5010,-0.1260\n")?;

    let bin = assert_cmd::cargo::cargo_bin("stroll");
    let cmd = format!("{} --tick-ms 50 -r {}", bin.display(), route.display());

    let mut p = spawn(cmd)?;

    // Give the app a moment to set up the alternate screen
    std::thread::sleep(Duration::from_millis(200));

    // Start walking, let a few ticks pass, then pause
    p.send("\r")?;
    std::thread::sleep(Duration::from_millis(200));
    p.send(" ")?;
    std::thread::sleep(Duration::from_millis(100));

    p.send("q")?;
    p.expect(Eof)?;
    Ok(())
}
