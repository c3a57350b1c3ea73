// Message types exchanged between the transport and the app loop.

use draftline_core::trade::advisor::AdvisorError;

/// One chat message from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    /// Transport-assigned id, echoed on every reply to this message.
    pub id: u64,
    pub text: String,
}

/// Text sent back to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub in_reply_to: u64,
    pub text: String,
}

/// Result of a spawned advisor call, routed back into the app loop.
#[derive(Debug)]
pub struct AdviceOutcome {
    /// Monotonic id of the trade request.
    pub request_id: u64,
    pub in_reply_to: u64,
    pub my_team: u32,
    pub result: Result<String, AdvisorError>,
}

// ---------------------------------------------------------------------------
// Line transport framing
// ---------------------------------------------------------------------------

/// Groups terminal lines into chat messages.
///
/// A single line is a message on its own, except `!import`, which collects
/// the pasted board until a blank line.
#[derive(Debug, Default)]
pub struct MessageAssembler {
    buffer: Option<String>,
}

impl MessageAssembler {
    /// Feed one line; returns a complete message when one is ready.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        if let Some(buffer) = self.buffer.as_mut() {
            if line.trim().is_empty() {
                return self.buffer.take();
            }
            buffer.push('\n');
            buffer.push_str(line);
            return None;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        if is_import(trimmed) {
            self.buffer = Some(trimmed.to_string());
            return None;
        }
        Some(trimmed.to_string())
    }

    /// Flush a partially collected message at end of input.
    pub fn finish(&mut self) -> Option<String> {
        self.buffer.take()
    }
}

fn is_import(line: &str) -> bool {
    line.get(..7)
        .is_some_and(|head| head.eq_ignore_ascii_case("!import"))
}
