//! Basic command execution example

use std::time::Duration;
use termexpect::Session;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("termexpect - Basic Command Example");
    println!("{}", "=".repeat(50));

    let mut session = Session::builder()
        .timeout(Duration::from_secs(5))
        .spawn(if cfg!(windows) {
            "cmd /C echo Hello from termexpect!"
        } else {
            "echo Hello from termexpect!"
        })?;

    let result = session.expect("Hello").await?;
    println!("Matched: {}", result.matched);
    println!("Consumed through offset {}", result.end);

    let status = session.expect_exit_code(0).await?;
    println!("Exited with {}", status.exit_code());

    println!("\nFull output:\n{}", session.snapshot());
    Ok(())
}
