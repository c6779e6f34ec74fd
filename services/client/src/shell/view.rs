//! services/client/src/shell/view.rs
//!
//! What the shell renders, and the terminal implementation of it.

use paper_desk_core::{ChatUpdate, Role, Route};
use std::io::{self, Write};

/// Auth-dependent chrome: nav items, the signed-in label and the landing status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUi {
    pub nav_visible: bool,
    pub signed_in_label: String,
    pub landing_status: String,
}

impl AuthUi {
    pub fn new(authed: bool, identity: String) -> Self {
        Self {
            nav_visible: authed,
            signed_in_label: if authed { identity } else { String::new() },
            landing_status: if authed {
                "You are signed in.".to_string()
            } else {
                "Not signed in.".to_string()
            },
        }
    }
}

pub trait View: Send {
    fn show_panel(&mut self, route: Route);
    fn auth_ui(&mut self, ui: &AuthUi);
    fn chat(&mut self, update: &ChatUpdate);
    fn upload_result(&mut self, text: &str);
    fn alert(&mut self, text: &str);
    fn notice(&mut self, text: &str);
}

//=========================================================================================
// Terminal View
//=========================================================================================

/// Streams the chat to stdout.
///
/// The status line is drawn last on the screen and overwritten in place; it is
/// held back while an assistant bubble is being streamed.
#[derive(Default)]
pub struct TerminalView {
    status: String,
    status_drawn: bool,
    /// The assistant bubble being streamed and how much of it is printed.
    streaming: Option<(usize, usize)>,
}

impl TerminalView {
    fn clear_status(&mut self, out: &mut impl Write) {
        if self.status_drawn {
            let _ = write!(out, "\r\x1b[2K");
            self.status_drawn = false;
        }
    }

    fn draw_status(&mut self, out: &mut impl Write) {
        if self.streaming.is_some() || self.status.is_empty() {
            return;
        }
        let _ = write!(out, "\r\x1b[2K[{}]", self.status);
        self.status_drawn = true;
    }

    fn line(&mut self, text: &str) {
        let mut out = io::stdout().lock();
        self.clear_status(&mut out);
        let _ = writeln!(out, "{}", text);
        self.draw_status(&mut out);
        let _ = out.flush();
    }
}

impl View for TerminalView {
    fn show_panel(&mut self, route: Route) {
        let hint = match route {
            Route::Landing => "landing  (:login to sign in)",
            Route::Chat => "chat  (type a message and press Enter)",
            Route::Upload => "upload  (:file <path>, then :upload)",
        };
        self.line(&format!("== {} {}", route.fragment(), hint));
    }

    fn auth_ui(&mut self, ui: &AuthUi) {
        let nav = if ui.nav_visible {
            "#/landing #/chat #/upload :logout"
        } else {
            "#/landing"
        };
        let user = if ui.signed_in_label.is_empty() {
            String::new()
        } else {
            format!(" | {}", ui.signed_in_label)
        };
        self.line(&format!("{} | {}{}", ui.landing_status, nav, user));
    }

    fn chat(&mut self, update: &ChatUpdate) {
        let mut out = io::stdout().lock();
        match update {
            ChatUpdate::Status(text) => {
                self.status = text.clone();
                self.draw_status(&mut out);
            }
            ChatUpdate::BubbleAdded {
                role: Role::User,
                text,
                ..
            } => {
                self.clear_status(&mut out);
                let _ = writeln!(out, "you> {}", text);
                self.draw_status(&mut out);
            }
            ChatUpdate::BubbleAdded {
                index,
                role: Role::Assistant,
                text,
            } => {
                self.clear_status(&mut out);
                let _ = write!(out, "assistant> {}", text);
                self.streaming = Some((*index, text.len()));
            }
            ChatUpdate::BubbleChanged { index, text } => match self.streaming {
                Some((open, printed))
                    if open == *index
                        && text.len() >= printed
                        && text.is_char_boundary(printed) =>
                {
                    let _ = write!(out, "{}", &text[printed..]);
                    self.streaming = Some((open, text.len()));
                }
                _ => {
                    self.clear_status(&mut out);
                    let _ = write!(out, "\nassistant> {}", text);
                    self.streaming = Some((*index, text.len()));
                }
            },
            ChatUpdate::BubbleClosed { .. } => {
                let _ = writeln!(out);
                self.streaming = None;
                self.draw_status(&mut out);
            }
        }
        let _ = out.flush();
    }

    fn upload_result(&mut self, text: &str) {
        self.line(text);
    }

    fn alert(&mut self, text: &str) {
        self.line(&format!("!! {}", text));
    }

    fn notice(&mut self, text: &str) {
        self.line(text);
    }
}
