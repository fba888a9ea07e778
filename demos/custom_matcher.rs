//! Custom matcher example: wait until a counter reaches a threshold

use std::time::Duration;
use termexpect::{ExpectError, ExpectOpts, MatchOutcome, MatcherError, Session};

/// Consume through the first line holding a number of at least `min`.
///
/// Gives up with an error as soon as a line reads `FAIL`.
fn counter_at_least(min: u32) -> impl FnMut(&[u8]) -> MatchOutcome + Send {
    move |window: &[u8]| {
        let mut offset = 0;
        for line in window.split_inclusive(|&b| b == b'\n') {
            offset += line.len();
            if !line.ends_with(b"\n") {
                break;
            }
            let line = String::from_utf8_lossy(line);
            let line = line.trim();
            if line == "FAIL" {
                return Err(MatcherError::from("counter reported failure"));
            }
            if line.parse::<u32>().is_ok_and(|n| n >= min) {
                return Ok(Some(offset));
            }
        }
        Ok(None)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("termexpect - Custom Matcher Example");
    println!("{}", "=".repeat(50));

    let mut session = Session::builder()
        .timeout(Duration::from_secs(10))
        .spawn_args(
            "bash",
            ["-c", "for i in 1 2 3 4 5; do echo $i; sleep 0.2; done"],
        )?;

    let result = session.expect_custom(counter_at_least(3)).await?;
    println!("Consumed: {:?}", result.matched);

    match session
        .with(ExpectOpts::new().silence())
        .expect_custom(counter_at_least(10))
        .await
    {
        Err(ExpectError::Timeout { exited: true, .. }) => {
            println!("Counter finished before reaching 10");
        }
        other => println!("Unexpected: {:?}", other),
    }

    Ok(())
}
