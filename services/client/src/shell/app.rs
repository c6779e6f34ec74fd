//! services/client/src/shell/app.rs
//!
//! The router/shell and the single event loop of the client.
//!
//! Every input (typed lines, chat transport events, sign-in credentials, upload
//! statuses and the thinking ticker) is handled one at a time on this loop, so
//! the shell state needs no locking.

use crate::error::ClientError;
use crate::shell::state::{LoginResult, ShellContext};
use crate::shell::view::{AuthUi, View};
use futures::channel::mpsc::UnboundedReceiver;
use futures::StreamExt;
use paper_desk_core::{
    resolve, ChatUpdate, IdentityBridge, Navigation, Route, SelectedFile, TransportEvent,
    LOGIN_FAILED_ALERT, THINKING_INTERVAL,
};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

//=========================================================================================
// Commands
//=========================================================================================

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Navigate(String),
    Login,
    Logout,
    SelectFile(PathBuf),
    Upload,
    Help,
    Quit,
    Unknown(String),
    Text(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            return Command::Navigate(trimmed.to_string());
        }
        let Some(rest) = trimmed.strip_prefix(':') else {
            return Command::Text(line.to_string());
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name {
            "login" => Command::Login,
            "logout" => Command::Logout,
            "upload" => Command::Upload,
            "help" => Command::Help,
            "q" | "quit" => Command::Quit,
            "file" if !arg.is_empty() => Command::SelectFile(PathBuf::from(arg)),
            _ => Command::Unknown(trimmed.to_string()),
        }
    }
}

const HELP: &str = "#/landing #/chat #/upload | :login | :logout | :file <path> | :upload | :quit";

//=========================================================================================
// Shell Operations
//=========================================================================================

impl<V: View> ShellContext<V> {
    /// Renders the auth chrome and routes the initial fragment.
    pub fn start(&mut self) {
        self.set_auth_ui();
        self.route();
    }

    /// Changes the fragment. Like a browser, setting the current fragment again
    /// does not re-route.
    pub fn navigate(&mut self, fragment: &str) {
        if self.fragment == fragment {
            return;
        }
        self.fragment = fragment.to_string();
        self.route();
    }

    fn route(&mut self) {
        self.set_auth_ui();
        match resolve(&self.fragment, self.session.is_authed()) {
            Navigation::Redirect(route) => {
                info!("{} requires sign-in, redirecting.", self.fragment);
                self.navigate(route.fragment());
            }
            Navigation::Show(Route::Chat) => {
                self.view.show_panel(Route::Chat);
                let updates = self.chat.connect(self.session.token());
                self.render(updates);
            }
            Navigation::Show(route) => {
                self.view.show_panel(route);
                let updates = self.chat.disconnect();
                self.render(updates);
            }
        }
    }

    fn set_auth_ui(&mut self) {
        let ui = AuthUi::new(self.session.is_authed(), self.session.display_identity());
        self.view.auth_ui(&ui);
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.set_auth_ui();
        self.navigate(Route::Landing.fragment());
    }

    /// Handles a credential from the sign-in widget. The exchange runs in the
    /// background and its result comes back through `login_results`.
    pub fn on_credential(&mut self, credential: String) {
        let identity = self.identity.clone();
        let results = self.login_results.clone();
        tokio::spawn(async move {
            let _ = results.send(identity.exchange(&credential).await);
        });
    }

    pub fn on_login_result(&mut self, result: LoginResult) {
        let signed_in =
            result.and_then(|token| IdentityBridge::complete(&mut self.session, &token));
        match signed_in {
            Ok(()) => {
                self.set_auth_ui();
                self.navigate(Route::Chat.fragment());
            }
            Err(e) => {
                error!("Login failed: {}", e);
                self.view.alert(LOGIN_FAILED_ALERT);
            }
        }
    }

    pub fn on_transport(&mut self, event: TransportEvent) {
        let updates = self.chat.handle(event);
        self.render(updates);
    }

    pub fn on_tick(&mut self) {
        if let Some(update) = self.chat.tick() {
            self.view.chat(&update);
        }
    }

    pub fn on_upload_status(&mut self, text: &str) {
        self.view.upload_result(text);
    }

    /// Free text goes to the chat when the chat panel is showing.
    pub fn submit_text(&mut self, text: &str) {
        if Route::from_fragment(&self.fragment) != Route::Chat {
            if !text.trim().is_empty() {
                self.view.notice("Open #/chat to talk to the assistant.");
            }
            return;
        }
        let updates = self.chat.send(text);
        self.render(updates);
    }

    pub fn select_file(&mut self, path: PathBuf) {
        self.view.notice(&format!("Selected {}", path.display()));
        self.selected_file = Some(path);
    }

    /// Starts the upload flow in the background. Its statuses come back through
    /// `upload_status`.
    pub fn start_upload(&mut self) {
        if Route::from_fragment(&self.fragment) != Route::Upload {
            self.view.notice("Open #/upload first.");
            return;
        }
        let token = self.session.token().to_string();
        let path = self.selected_file.clone();
        let flow = self.upload.clone();
        let status = self.upload_status.clone();

        tokio::spawn(async move {
            let file = match path {
                Some(path) if !token.is_empty() => match read_selected_file(&path).await {
                    Ok(file) => Some(file),
                    Err(e) => {
                        let _ = status.send(format!("Could not read {}: {}", path.display(), e));
                        return;
                    }
                },
                _ => None,
            };
            let outcome = flow
                .run(&token, file, &mut |text: &str| {
                    let _ = status.send(text.to_string());
                })
                .await;
            let _ = status.send(outcome.to_string());
        });
    }

    pub fn execute(&mut self, command: Command) {
        match command {
            Command::Navigate(fragment) => self.navigate(&fragment),
            Command::Login => match &self.sign_in_url {
                Some(url) => {
                    let text = format!("Open {} in a browser to sign in with Google.", url);
                    self.view.notice(&text);
                }
                None => self.view.notice("The sign-in page is not running."),
            },
            Command::Logout => self.logout(),
            Command::SelectFile(path) => self.select_file(path),
            Command::Upload => self.start_upload(),
            Command::Help => self.view.notice(HELP),
            Command::Unknown(input) => {
                self.view.notice(&format!("Unknown command {}. {}", input, HELP))
            }
            Command::Text(text) => self.submit_text(&text),
            Command::Quit => {}
        }
    }

    fn render(&mut self, updates: Vec<ChatUpdate>) {
        for update in &updates {
            self.view.chat(update);
        }
    }
}

async fn read_selected_file(path: &Path) -> std::io::Result<SelectedFile> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.bin".to_string());
    let content_type = path
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.eq_ignore_ascii_case("pdf"))
        .map(|_| "application/pdf".to_string());
    Ok(SelectedFile {
        file_name,
        content_type,
        bytes: bytes.into(),
    })
}

//=========================================================================================
// Event Loop
//=========================================================================================

/// Reads one typed line. Bytes that are not UTF-8 are replaced, never fatal.
///
/// Partial input stays in `buf` when the read is cancelled, so the next call
/// picks the line up where it left off.
async fn read_line<R: AsyncBufRead + Unpin>(
    input: &mut R,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<String>> {
    let read = input.read_until(b'\n', buf).await?;
    if read == 0 && buf.is_empty() {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf)
        .trim_end_matches(|c: char| c == '\r' || c == '\n')
        .to_string();
    buf.clear();
    Ok(Some(line))
}

/// Runs the client until stdin closes or `:quit` is typed.
pub async fn run<V: View>(
    mut shell: ShellContext<V>,
    mut transport_events: UnboundedReceiver<TransportEvent>,
    mut credentials: mpsc::UnboundedReceiver<String>,
    mut upload_status: mpsc::UnboundedReceiver<String>,
    mut login_results: mpsc::UnboundedReceiver<LoginResult>,
) -> Result<(), ClientError> {
    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut pending = Vec::new();
    let mut ticker = tokio::time::interval(THINKING_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    shell.start();
    loop {
        let was_thinking = shell.chat.is_thinking();
        tokio::select! {
            line = read_line(&mut stdin, &mut pending) => match line {
                Ok(Some(line)) => match Command::parse(&line) {
                    Command::Quit => break,
                    command => shell.execute(command),
                },
                Ok(None) => break,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!("Stdin is no longer readable, exiting: {}", e);
                    break;
                }
            },
            Some(event) = transport_events.next() => shell.on_transport(event),
            Some(credential) = credentials.recv() => shell.on_credential(credential),
            Some(result) = login_results.recv() => shell.on_login_result(result),
            Some(status) = upload_status.recv() => shell.on_upload_status(&status),
            _ = ticker.tick(), if was_thinking => shell.on_tick(),
        }
        if !was_thinking && shell.chat.is_thinking() {
            ticker.reset();
        }
    }

    let updates = shell.chat.disconnect();
    shell.render(updates);
    info!("Client exiting.");
    Ok(())
}
