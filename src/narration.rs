/// Whether a narrator is still speaking after `speak` returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NarrationStatus {
    Playing,
    Finished,
}

/// Speaks cue sentences and word announcements.
pub trait Narrator: Send {
    fn speak(&mut self, text: &str) -> NarrationStatus;
    fn stop(&mut self);
}

/// Writes narration to the log. Speech is instantaneous, so the word
/// announcement follows shortly after each sentence.
#[derive(Debug, Default)]
pub struct LogNarrator;

impl Narrator for LogNarrator {
    fn speak(&mut self, text: &str) -> NarrationStatus {
        log::info!(target: "narration", "{text}");
        NarrationStatus::Finished
    }

    fn stop(&mut self) {}
}

/// Records everything spoken, for tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingNarrator {
    pub lines: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

impl RecordingNarrator {
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|l| l.clone())
            .unwrap_or_default()
    }
}

impl Narrator for RecordingNarrator {
    fn speak(&mut self, text: &str) -> NarrationStatus {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(text.to_string());
        }
        NarrationStatus::Finished
    }

    fn stop(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_narrator_finishes_immediately() {
        let mut narrator = LogNarrator;
        assert_eq!(narrator.speak("The word is cat."), NarrationStatus::Finished);
        narrator.stop();
    }

    #[test]
    fn test_recording_narrator_shares_lines_across_clones() {
        let recorder = RecordingNarrator::default();
        let mut handle = recorder.clone();
        handle.speak("one");
        handle.speak("two");
        assert_eq!(recorder.lines(), vec!["one", "two"]);
    }
}
