//! Interactive shell example

use anyhow::{Context, Result};
use std::time::Duration;
use termexpect::{ExpectOpts, Session};

const PROMPT: &str = "demo$ ";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("termexpect - Interactive Shell Example");
    println!("{}", "=".repeat(50));

    let mut session = Session::builder()
        .timeout(Duration::from_secs(10))
        .env("PS1", PROMPT)
        .env("TERM", "dumb")
        .spawn_args("bash", ["--norc", "--noprofile"])
        .context("spawning bash")?;

    session.expect(PROMPT).await.context("waiting for prompt")?;
    println!("✓ Got shell prompt");

    session.send_line("FOO=bar").await?;
    session.expect_input().await.context("consuming echo")?;
    session.expect(PROMPT).await?;

    // The assignment printed nothing, so only its echo ever contained FOO=bar
    let quick = ExpectOpts::new()
        .timeout(Duration::from_millis(200))
        .silence();
    match session.with(quick).expect("FOO=bar").await {
        Err(e) if e.is_timeout() => println!("✓ Echo was consumed, no stale match"),
        other => println!("✗ Unexpected: {:?}", other),
    }

    session.send_line("echo $FOO").await?;
    session.expect_input().await?;
    let result = session.expect("bar").await?;
    println!("✓ Shell printed: {}", result.matched);

    session.send_line("exit").await?;
    session.expect_input().await?;
    session
        .expect_exit_code(0)
        .await
        .context("waiting for shell to exit")?;

    println!("\n✓ Interactive shell example complete!");
    Ok(())
}
