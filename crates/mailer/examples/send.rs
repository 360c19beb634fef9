//! Send a one-off message through the configured mailer
//!
//! To run this example:
//! ```sh
//! cd crates/mailer
//! cargo run --example send -- you@example.com
//! ```
//!
//! Set `MAILER` to use something other than msmtp (e.g. `MAILER=sendmail`).

use mailer::{Mailer, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let recipient = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "root@localhost".to_string());
    let program = std::env::var("MAILER").unwrap_or_else(|_| mailer::DEFAULT_PROGRAM.to_string());

    let mailer = Mailer::new(program);
    let message = format!("Subject: mailer example\nTo: {}\n\nIt works.\n", recipient);

    match mailer.send(&recipient, &message).await {
        Ok(output) => {
            println!("✓ Delivered to {}", recipient);
            if !output.combined().is_empty() {
                println!("{}", output.combined());
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(output) = e.output() {
                eprintln!("{}", output.combined());
            }
            Err(e)
        }
    }
}
