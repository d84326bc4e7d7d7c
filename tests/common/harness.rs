// Test harness: a fake editor host driving a Shelter context

use shelter::config::ShelterConfig;
use shelter::model::{render_overlays, BufferId, ExtmarkSpec};
use shelter::plugin_api::{BufferSource, ShelterCommand, TimerId};
use shelter::services::TestTimeSource;
use shelter::state::{Feature, StateCommand};
use shelter::Shelter;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

struct FakeBuffer {
    path: PathBuf,
    lines: Vec<String>,
    cursor_line: usize,
}

/// Buffers held by the fake editor
#[derive(Default)]
pub struct FakeEditor {
    buffers: HashMap<BufferId, FakeBuffer>,
    next_id: usize,
}

impl BufferSource for FakeEditor {
    fn get_lines(&self, buffer_id: BufferId) -> Option<Vec<String>> {
        self.buffers.get(&buffer_id).map(|b| b.lines.clone())
    }

    fn is_valid(&self, buffer_id: BufferId) -> bool {
        self.buffers.contains_key(&buffer_id)
    }

    fn file_path(&self, buffer_id: BufferId) -> Option<PathBuf> {
        self.buffers.get(&buffer_id).map(|b| b.path.clone())
    }

    fn cursor_line(&self, buffer_id: BufferId) -> Option<usize> {
        self.buffers.get(&buffer_id).map(|b| b.cursor_line)
    }
}

fn split_lines(content: &str) -> Vec<String> {
    content.lines().map(str::to_string).collect()
}

/// Fake host that applies shelter commands the way an editor would
pub struct ShelterTestHarness {
    editor: FakeEditor,
    shelter: Shelter,
    rx: Receiver<ShelterCommand>,
    time: Arc<TestTimeSource>,
    overlays: HashMap<BufferId, Vec<ExtmarkSpec>>,
    completion: HashMap<BufferId, bool>,
    deferred: VecDeque<(BufferId, u64)>,
    timers: BTreeMap<TimerId, Duration>,
    statuses: Vec<String>,
}

impl ShelterTestHarness {
    pub fn new() -> Self {
        Self::with_config(ShelterConfig::default())
    }

    pub fn with_config(config: ShelterConfig) -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        let time = Arc::new(TestTimeSource::new());
        let shelter = Shelter::with_time_source(config, tx, time.clone());
        let mut harness = Self {
            editor: FakeEditor::default(),
            shelter,
            rx,
            time,
            overlays: HashMap::new(),
            completion: HashMap::new(),
            deferred: VecDeque::new(),
            timers: BTreeMap::new(),
            statuses: Vec::new(),
        };
        harness.process_commands();
        harness
    }

    pub fn with_json_config(json: &str) -> Self {
        Self::with_config(ShelterConfig::from_json_str(json).unwrap())
    }

    /// Open a buffer and let sheltering run to completion
    pub fn open(&mut self, path: impl AsRef<Path>, content: &str) -> BufferId {
        let buffer_id = self.open_pending(path, content);
        self.run_deferred();
        buffer_id
    }

    /// Open a buffer, applying only the first overlay batch
    pub fn open_pending(&mut self, path: impl AsRef<Path>, content: &str) -> BufferId {
        let buffer_id = BufferId(self.editor.next_id);
        self.editor.next_id += 1;
        self.editor.buffers.insert(
            buffer_id,
            FakeBuffer {
                path: path.as_ref().to_path_buf(),
                lines: split_lines(content),
                cursor_line: 1,
            },
        );
        self.shelter.shelter_buffer(&self.editor, buffer_id);
        self.process_commands();
        buffer_id
    }

    /// Replace a buffer's text and fire the change event
    pub fn edit(&mut self, buffer_id: BufferId, content: &str) {
        self.edit_pending(buffer_id, content);
        self.run_deferred();
    }

    pub fn edit_pending(&mut self, buffer_id: BufferId, content: &str) {
        self.replace_text_silently(buffer_id, content);
        self.shelter.on_buffer_changed(&self.editor, buffer_id);
        self.process_commands();
    }

    /// Replace a buffer's text without telling the shelter
    pub fn replace_text_silently(&mut self, buffer_id: BufferId, content: &str) {
        if let Some(buffer) = self.editor.buffers.get_mut(&buffer_id) {
            buffer.lines = split_lines(content);
        }
    }

    pub fn close(&mut self, buffer_id: BufferId) {
        self.editor.buffers.remove(&buffer_id);
        self.overlays.remove(&buffer_id);
        self.shelter.on_buffer_closed(buffer_id);
        self.process_commands();
    }

    pub fn set_cursor(&mut self, buffer_id: BufferId, line: usize) {
        if let Some(buffer) = self.editor.buffers.get_mut(&buffer_id) {
            buffer.cursor_line = line;
        }
    }

    pub fn move_cursor(&mut self, buffer_id: BufferId, line: usize) {
        self.set_cursor(buffer_id, line);
        self.shelter.on_cursor_moved(&self.editor, buffer_id);
        self.settle();
    }

    pub fn leave(&mut self, buffer_id: BufferId) {
        self.shelter.on_buffer_leave(&self.editor, buffer_id);
        self.settle();
    }

    pub fn reveal_current_line(&mut self, buffer_id: BufferId) -> bool {
        let revealed = self.shelter.reveal_current_line(&self.editor, buffer_id);
        self.settle();
        revealed
    }

    pub fn toggle_feature(&mut self, feature: Feature) {
        self.shelter.toggle_feature(&self.editor, feature);
        self.settle();
    }

    pub fn set_state(&mut self, command: StateCommand, feature: Option<Feature>) {
        self.shelter.set_state(&self.editor, command, feature);
        self.settle();
    }

    pub fn toggle_all(&mut self) {
        self.shelter.toggle_all(&self.editor);
        self.settle();
    }

    pub fn unshelter(&mut self, buffer_id: BufferId) {
        self.shelter.unshelter_buffer(buffer_id);
        self.process_commands();
    }

    pub fn reshelter(&mut self, buffer_id: BufferId) {
        self.shelter.shelter_buffer(&self.editor, buffer_id);
        self.settle();
    }

    /// Read every pending command and apply it to the fake editor
    pub fn process_commands(&mut self) {
        while let Ok(command) = self.rx.try_recv() {
            match command {
                ShelterCommand::ClearOverlays { buffer_id } => {
                    self.overlays.remove(&buffer_id);
                }
                ShelterCommand::AddOverlays {
                    buffer_id,
                    overlays,
                } => self.overlays.entry(buffer_id).or_default().extend(overlays),
                ShelterCommand::SetBufferCompletion { buffer_id, enabled } => {
                    self.completion.insert(buffer_id, enabled);
                }
                ShelterCommand::Defer {
                    buffer_id,
                    generation,
                } => self.deferred.push_back((buffer_id, generation)),
                ShelterCommand::StartTimer { timer_id, interval } => {
                    self.timers.insert(timer_id, interval);
                }
                ShelterCommand::StopTimer { timer_id } => {
                    self.timers.remove(&timer_id);
                }
                ShelterCommand::SetStatus { message } => self.statuses.push(message),
            }
        }
    }

    /// Run one deferred batch. Returns false when nothing was queued.
    pub fn run_one_deferred(&mut self) -> bool {
        let Some((buffer_id, generation)) = self.deferred.pop_front() else {
            return false;
        };
        self.shelter.resume(&self.editor, buffer_id, generation);
        self.process_commands();
        true
    }

    pub fn run_deferred(&mut self) {
        while self.run_one_deferred() {}
    }

    pub fn settle(&mut self) {
        self.process_commands();
        self.run_deferred();
    }

    pub fn pending_deferred(&self) -> usize {
        self.deferred.len()
    }

    pub fn advance_time(&mut self, by: Duration) {
        self.time.advance(by);
    }

    pub fn active_timers(&self) -> Vec<TimerId> {
        self.timers.keys().copied().collect()
    }

    pub fn fire_timers(&mut self) {
        for timer_id in self.active_timers() {
            self.shelter.on_timer(timer_id);
        }
        self.process_commands();
    }

    pub fn reconfigure(&mut self, config: ShelterConfig) {
        self.shelter.reconfigure(config, &self.editor);
        self.settle();
    }

    pub fn shutdown(&mut self) {
        self.shelter.shutdown();
        self.process_commands();
    }

    pub fn shelter(&self) -> &Shelter {
        &self.shelter
    }

    pub fn shelter_mut(&mut self) -> &mut Shelter {
        &mut self.shelter
    }

    pub fn overlays(&self, buffer_id: BufferId) -> &[ExtmarkSpec] {
        self.overlays.get(&buffer_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn completion_enabled(&self, buffer_id: BufferId) -> Option<bool> {
        self.completion.get(&buffer_id).copied()
    }

    pub fn last_status(&self) -> Option<&str> {
        self.statuses.last().map(String::as_str)
    }

    /// Actual buffer text, as it would be saved
    pub fn buffer_text(&self, buffer_id: BufferId) -> String {
        self.editor
            .buffers
            .get(&buffer_id)
            .map(|b| b.lines.join("\n"))
            .unwrap_or_default()
    }

    /// What the user sees: buffer text with overlays drawn over it
    pub fn screen(&self, buffer_id: BufferId) -> String {
        let lines = self.editor.get_lines(buffer_id).unwrap_or_default();
        render_overlays(&lines, self.overlays(buffer_id)).join("\n")
    }

    pub fn screen_line(&self, buffer_id: BufferId, line: usize) -> String {
        self.screen(buffer_id)
            .lines()
            .nth(line - 1)
            .unwrap_or_default()
            .to_string()
    }

    pub fn assert_screen_contains(&self, buffer_id: BufferId, text: &str) {
        let screen = self.screen(buffer_id);
        assert!(screen.contains(text), "Expected screen to contain {:?}\nScreen:\n{}", text, screen);
    }

    pub fn assert_screen_not_contains(&self, buffer_id: BufferId, text: &str) {
        let screen = self.screen(buffer_id);
        assert!(!screen.contains(text), "Expected screen not to contain {:?}\nScreen:\n{}", text, screen);
    }
}
