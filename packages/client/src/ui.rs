//! UI utilities for the client.

use std::io::Write;

/// Redisplay the prompt after receiving a message
pub fn redisplay_prompt(party_id: &str) {
    print!("{}> ", party_id);
    std::io::stdout().flush().ok();
}
