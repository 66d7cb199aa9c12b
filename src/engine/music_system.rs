use super::*;

impl GameEngine {
    pub fn mood(&self) -> MusicMood {
        self.mood.unwrap_or_else(|| self.current_mood())
    }

    fn current_mood(&self) -> MusicMood {
        if self.frightened_timer > 0.0 {
            MusicMood::Frightened
        } else if self
            .ghosts
            .iter()
            .any(|ghost| ghost.state() == GhostState::Eaten)
        {
            MusicMood::DeadPresent
        } else {
            MusicMood::Normal
        }
    }

    pub(super) fn update_music(&mut self) {
        let mood = self.current_mood();
        if self.mood != Some(mood) {
            self.mood = Some(mood);
            self.events.push(RuntimeEvent::MusicChanged { mood });
        }
    }
}
