use std::io::Write;

use crate::models::DrillItem;

pub type NotifyResult = Result<(), Box<dyn std::error::Error>>;

/// Feedback cues emitted by the session controller. Every hook is
/// best-effort: a failure is logged by the caller and never aborts a
/// transition.
pub trait Notifier {
    fn on_advance(&mut self) -> NotifyResult {
        Ok(())
    }

    fn on_answer_revealed(&mut self, _answer: &str) -> NotifyResult {
        Ok(())
    }

    fn on_show_item(&mut self, _item: &DrillItem) -> NotifyResult {
        Ok(())
    }

    fn on_request_speak(&mut self, _text: &str) -> NotifyResult {
        Ok(())
    }
}

/// Headless notifier used by the one-shot CLI commands.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn on_advance(&mut self) -> NotifyResult {
        log::debug!("advance");
        Ok(())
    }

    fn on_answer_revealed(&mut self, answer: &str) -> NotifyResult {
        log::debug!("answer revealed: {}", answer);
        Ok(())
    }

    fn on_show_item(&mut self, item: &DrillItem) -> NotifyResult {
        log::debug!("showing session {} step {}", item.group_id, item.step_no);
        Ok(())
    }

    fn on_request_speak(&mut self, text: &str) -> NotifyResult {
        log::info!("speak: {}", text);
        Ok(())
    }
}

const BELL: &[u8] = b"\x07";

/// Rings the terminal bell as the audio cue for revealing and advancing.
pub struct BellNotifier<W: Write> {
    out: W,
}

impl<W: Write> BellNotifier<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn ring(&mut self) -> NotifyResult {
        self.out.write_all(BELL)?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Notifier for BellNotifier<W> {
    fn on_advance(&mut self) -> NotifyResult {
        self.ring()
    }

    fn on_answer_revealed(&mut self, _answer: &str) -> NotifyResult {
        self.ring()
    }

    // No speech backend in a terminal
    fn on_request_speak(&mut self, text: &str) -> NotifyResult {
        log::info!("speak: {}", text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bell_rings_on_advance_and_reveal() {
        let mut notifier = BellNotifier::new(Vec::new());
        notifier.on_advance().unwrap();
        notifier.on_answer_revealed("answer").unwrap();
        assert_eq!(notifier.out, b"\x07\x07".to_vec());
    }

    #[test]
    fn bell_silent_on_speak() {
        let mut notifier = BellNotifier::new(Vec::new());
        notifier.on_request_speak("hello").unwrap();
        assert!(notifier.out.is_empty());
    }

    #[test]
    fn log_notifier_never_fails() {
        let mut notifier = LogNotifier;
        assert!(notifier.on_advance().is_ok());
        assert!(notifier.on_answer_revealed("x").is_ok());
        assert!(notifier.on_request_speak("x").is_ok());
    }
}
