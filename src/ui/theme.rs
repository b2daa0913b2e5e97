use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

pub struct Icons;

impl Icons {
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const BRAIN: &str = "🧠";
    pub const DATABASE: &str = "🗄️";
    pub const SEARCH: &str = "🔍";
    pub const NEW: &str = "✨";
    pub const MOD: &str = "📝";
    pub const SAME: &str = "💤";
    pub const PAGE: &str = "📄";
    pub const SAVE: &str = "💾";
    pub const RESTORE: &str = "♻️";
    pub const DEL: &str = "🗑️";
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
    pub user: Style,
    pub agent: Style,
    pub system: Style,
}

impl Theme {
    pub fn detect() -> Self {
        if console::Term::stdout().is_term() {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            info: Style::new().magenta(),
            dim: Style::new().bright_black(),
            user: Style::new().blue().bold(),
            agent: Style::new().green(),
            system: Style::new().yellow().dimmed(),
        }
    }

    pub fn plain() -> Self {
        Self {
            header: Style::new(),
            success: Style::new(),
            error: Style::new(),
            warn: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            user: Style::new(),
            agent: Style::new(),
            system: Style::new(),
        }
    }

    /// Style for a message role; unknown roles are dimmed
    pub fn role(&self, role: &str) -> Style {
        match role {
            "user" => self.user.clone(),
            "agent" => self.agent.clone(),
            "system" => self.system.clone(),
            _ => self.dim.clone(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
