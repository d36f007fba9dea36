//! Line-oriented console channel.
//!
//! Stands in for an external chat framework: every stdin line is either a
//! `kaggle ...` command answered with one reply on stdout, or free chat text
//! scanned for keep-alive keywords. EOF or Ctrl-C ends the session.

use anyhow::Result;
use kernelbot_core::CommandRouter;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

pub async fn run(router: &CommandRouter) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupt received, shutting down");
                break;
            }
            line = lines.next_line() => {
                let Some(text) = line? else { break };
                if let Some(reply) = router.handle_line(&text).await {
                    println!("{reply}");
                }
            }
        }
    }

    Ok(())
}
