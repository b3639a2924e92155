use crate::config::CountingMode;
use crate::debug_if_enabled;
use crate::events::{KeyEvent, KeyState, SymbolicKey};
use crate::services::diagnostic_sink::DiagnosticSink;
use crate::services::event_recorder::EventRecorder;
use std::sync::Arc;
use std::time::Instant;

/// Вид счётного события
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountableKind {
    Character(char),
    Space,
    Enter,
}

/// Результат классификации счётного нажатия
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountableEvent {
    pub kind: CountableKind,
    /// Отметка, записанная в журнал (в режиме слов может отсутствовать)
    pub recorded: Option<Instant>,
}

/// Классификатор сырых событий клавиатуры.
///
/// Вызывается только из контекста слушателя. Никогда не возвращает ошибку:
/// всё непонятное считается несчётным.
pub struct InputClassifier {
    recorder: Arc<EventRecorder>,
    mode: CountingMode,
    count_autorepeat: bool,
    diagnostics: Option<DiagnosticSink>,
}

impl InputClassifier {
    pub fn new(recorder: Arc<EventRecorder>, mode: CountingMode) -> Self {
        Self {
            recorder,
            mode,
            count_autorepeat: true,
            diagnostics: None,
        }
    }

    pub fn with_autorepeat(mut self, count_autorepeat: bool) -> Self {
        self.count_autorepeat = count_autorepeat;
        self
    }

    pub fn with_diagnostics(mut self, sink: Option<DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn mode(&self) -> CountingMode {
        self.mode
    }

    /// Классификация с отметкой времени самого события
    pub fn classify(&mut self, event: &KeyEvent) -> Option<CountableEvent> {
        self.classify_at(event, event.timestamp)
    }

    pub fn classify_at(&mut self, event: &KeyEvent, now: Instant) -> Option<CountableEvent> {
        let result = self.decide(event, now);

        // Запись в журнал после освобождения замка регистратора
        if let Some(sink) = self.diagnostics.as_mut() {
            sink.write_event(now, event.character, &event.key);
        }

        debug_if_enabled!("Классификация {}: {:?}", event, result);
        result
    }

    fn decide(&self, event: &KeyEvent, now: Instant) -> Option<CountableEvent> {
        match event.state {
            KeyState::Pressed => {}
            KeyState::Repeat if self.count_autorepeat => {}
            _ => return None,
        }

        if let Some(ch) = event.character.filter(|ch| !ch.is_control()) {
            let recorded = match self.mode {
                CountingMode::Keystrokes => {
                    self.recorder.record(now);
                    Some(now)
                }
                CountingMode::Words => {
                    self.recorder.push_char(ch);
                    None
                }
            };
            return Some(CountableEvent {
                kind: CountableKind::Character(ch),
                recorded,
            });
        }

        // Непечатный символ, сообщённый как символ, не даёт права на клавишу
        if event.character.is_some() {
            return None;
        }

        let kind = match event.key {
            SymbolicKey::Space => CountableKind::Space,
            SymbolicKey::Enter => CountableKind::Enter,
            SymbolicKey::Other(_) => return None,
        };

        let recorded = match self.mode {
            CountingMode::Keystrokes => {
                self.recorder.record(now);
                Some(now)
            }
            CountingMode::Words => self.recorder.complete_word(now).then_some(now),
        };

        Some(CountableEvent { kind, recorded })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::KeyCode;

    fn hello_world() -> Vec<KeyEvent> {
        let mut events = Vec::new();
        events.extend("hello".chars().map(KeyEvent::char_press));
        events.push(KeyEvent::key_press(SymbolicKey::Space));
        events.extend("world".chars().map(KeyEvent::char_press));
        events.push(KeyEvent::key_press(SymbolicKey::Enter));
        events
    }

    fn classifier(mode: CountingMode) -> (Arc<EventRecorder>, InputClassifier) {
        let recorder = Arc::new(EventRecorder::new(60.0));
        (Arc::clone(&recorder), InputClassifier::new(recorder, mode))
    }

    #[test]
    fn test_word_mode_records_completed_words() {
        let (recorder, mut classifier) = classifier(CountingMode::Words);
        let events = hello_world();

        for event in &events[..5] {
            let result = classifier.classify(event).unwrap();
            assert_eq!(result.recorded, None);
        }
        assert_eq!(recorder.current_word(), "hello");

        assert!(classifier.classify(&events[5]).unwrap().recorded.is_some());
        assert_eq!(recorder.current_word(), "");

        for event in &events[6..] {
            classifier.classify(event);
        }
        assert_eq!(recorder.current_word(), "");
        assert_eq!(recorder.len(), 2);
    }

    #[test]
    fn test_keystroke_mode_records_every_countable_press() {
        let (recorder, mut classifier) = classifier(CountingMode::Keystrokes);
        for event in &hello_world() {
            let result = classifier.classify(event).unwrap();
            assert!(result.recorded.is_some());
        }
        assert_eq!(recorder.len(), 12);
        assert_eq!(recorder.current_word(), "");
    }

    #[test]
    fn test_separator_without_word_is_countable_but_not_recorded() {
        let (recorder, mut classifier) = classifier(CountingMode::Words);
        let result = classifier
            .classify(&KeyEvent::key_press(SymbolicKey::Space))
            .unwrap();

        assert_eq!(result.kind, CountableKind::Space);
        assert_eq!(result.recorded, None);
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_non_printable_keys_are_ignored() {
        let (recorder, mut classifier) = classifier(CountingMode::Keystrokes);
        let shift = KeyEvent::key_press(SymbolicKey::Other(KeyCode::new(42)));
        let control_char = KeyEvent::char_press('\u{7}');

        assert_eq!(classifier.classify(&shift), None);
        assert_eq!(classifier.classify(&control_char), None);
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_releases_and_autorepeat() {
        let (recorder, classifier) = classifier(CountingMode::Keystrokes);
        let mut classifier = classifier.with_autorepeat(false);

        let mut release = KeyEvent::char_press('a');
        release.state = KeyState::Released;
        let mut repeat = KeyEvent::char_press('a');
        repeat.state = KeyState::Repeat;

        assert_eq!(classifier.classify(&release), None);
        assert_eq!(classifier.classify(&repeat), None);
        assert!(recorder.is_empty());

        let mut classifier = classifier.with_autorepeat(true);
        assert!(classifier.classify(&repeat).is_some());
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn test_unwritable_diagnostics_do_not_affect_counting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.log");
        std::fs::write(&path, "").unwrap();
        let read_only = std::fs::File::open(&path).unwrap();

        let (recorder, classifier) = classifier(CountingMode::Keystrokes);
        let mut classifier =
            classifier.with_diagnostics(Some(DiagnosticSink::from_writer(Box::new(read_only))));

        for event in "hello".chars().map(KeyEvent::char_press) {
            assert!(classifier.classify(&event).unwrap().recorded.is_some());
        }
        drop(classifier);

        assert_eq!(recorder.len(), 5);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_diagnostics_receive_every_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.log");
        let sink = DiagnosticSink::create(&path).unwrap();

        let (recorder, classifier) = classifier(CountingMode::Keystrokes);
        let mut classifier = classifier.with_diagnostics(Some(sink));

        classifier.classify(&KeyEvent::char_press('x'));
        classifier.classify(&KeyEvent::key_press(SymbolicKey::Other(KeyCode::new(29))));
        drop(classifier);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert_eq!(recorder.len(), 1);
    }
}
