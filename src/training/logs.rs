use crate::logging::LogPanel;

/// How a training log stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Completed,
    Failed,
    Cancelled,
    Closed,
}

const SENTINELS: [(&str, Terminal); 4] = [
    ("TREINAMENTO_COMPLETO", Terminal::Completed),
    ("ERRO_TREINAMENTO", Terminal::Failed),
    ("CANCELADO PELO USUÁRIO", Terminal::Cancelled),
    ("Fim da conexão de log", Terminal::Closed),
];

impl Terminal {
    /// First sentinel found in `chunk`, in priority order.
    pub fn detect(chunk: &str) -> Option<Self> {
        SENTINELS
            .iter()
            .find(|(marker, _)| chunk.contains(marker))
            .map(|(_, terminal)| *terminal)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Closed => "closed",
        }
    }
}

/// Appends streamed log chunks to a panel and watches for sentinels.
#[derive(Debug, Clone, Default)]
pub struct LogConsumer {
    panel: LogPanel,
    finished: Option<Terminal>,
}

impl LogConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one chunk; returns the terminal state if the chunk ends the run.
    pub fn push(&mut self, chunk: &str) -> Option<Terminal> {
        self.panel.append(chunk);
        let terminal = Terminal::detect(chunk);
        if let Some(terminal) = terminal {
            tracing::info!(outcome = terminal.label(), "Training log stream finished");
            self.finished = Some(terminal);
        }
        terminal
    }

    pub fn finished(&self) -> Option<Terminal> {
        self.finished
    }

    pub fn panel(&self) -> &LogPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut LogPanel {
        &mut self.panel
    }

    /// Start over with `header` as the only panel content.
    pub fn restart(&mut self, header: impl Into<String>) {
        self.panel.reset(header);
        self.finished = None;
    }
}
