// input.rs - Commands that drive a running game

use std::future::Future;

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Quit,
    Menu,
    Save,
    Pause,
    PanLeft,
    PanRight,
    PageUp,
    PageDown,
    Randomize,
}

/// A one-shot stream of commands. `None` means the source is gone for good.
pub trait InputSource: Send + 'static {
    fn next_command(&mut self) -> impl Future<Output = Option<Command>> + Send;
}

impl InputSource for mpsc::Receiver<Command> {
    async fn next_command(&mut self) -> Option<Command> {
        self.recv().await
    }
}

impl InputSource for mpsc::UnboundedReceiver<Command> {
    async fn next_command(&mut self) -> Option<Command> {
        self.recv().await
    }
}
