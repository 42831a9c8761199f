/// Simulated audio focus environment
use cadence_playback::FocusEnvironment;
use tracing::info;

/// Grants or denies every focus request according to configuration
#[derive(Debug, Clone)]
pub struct ConsoleFocus {
    grant: bool,
    held: bool,
}

impl ConsoleFocus {
    pub fn new(grant: bool) -> Self {
        Self { grant, held: false }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }
}

impl FocusEnvironment for ConsoleFocus {
    fn request(&mut self) -> bool {
        if self.grant {
            info!("Audio focus granted");
            self.held = true;
        } else {
            info!("Audio focus denied by environment");
        }
        self.grant
    }

    fn abandon(&mut self) {
        info!("Audio focus abandoned");
        self.held = false;
    }
}
