//! Line-oriented front end
//!
//! Turns typed lines into `ClientRequest`s and notifications into text.
//! Kept free of I/O so the binary stays a thin loop.

use std::fmt::Write as _;

use ttt_core::{BotDifficulty, Cell, InvitationId, MatchState, Position, UserId};

use crate::services::{ClientNotification, ClientRequest};

pub const HELP: &str = "\
commands:
  login <username> <password>          log in and connect
  register <username> <password> [email]
  connect | disconnect
  users                                online users
  invites                              pending invitations
  invite <user-id>
  accept <invitation-id> | reject <invitation-id>
  bot <easy|medium|hard>               play against the computer
  move <0-8>                           cells are numbered row by row
  forfeit, then confirm | cancel
  lobby                                leave a finished match
  leaderboard | stats | history
  logout | quit";

/// Parse one input line
pub fn parse_line(line: &str) -> Result<ClientRequest, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Err("empty command".to_string());
    };
    let args: Vec<&str> = words.collect();

    let request = match (command.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("login", [username, password]) => ClientRequest::Login {
            username: (*username).to_string(),
            password: (*password).to_string(),
        },
        ("register", [username, password]) => ClientRequest::Register {
            username: (*username).to_string(),
            password: (*password).to_string(),
            email: None,
        },
        ("register", [username, password, email]) => ClientRequest::Register {
            username: (*username).to_string(),
            password: (*password).to_string(),
            email: Some((*email).to_string()),
        },
        ("connect", []) => ClientRequest::Connect,
        ("disconnect", []) => ClientRequest::Disconnect,
        ("users", []) => ClientRequest::ListUsers,
        ("invites", []) => ClientRequest::ListInvitations,
        ("invite", [id]) => ClientRequest::Invite(
            UserId::parse(id).map_err(|_| format!("not a user id: {id}"))?,
        ),
        ("accept", [id]) => ClientRequest::Accept(parse_invitation(id)?),
        ("reject", [id]) => ClientRequest::Reject(parse_invitation(id)?),
        ("bot", [level]) => ClientRequest::PlayVsBot(
            level
                .parse::<BotDifficulty>()
                .map_err(|e| e.to_string())?,
        ),
        ("move", [cell]) => {
            ClientRequest::MakeMove(cell.parse::<Position>().map_err(|e| e.to_string())?)
        }
        ("forfeit", []) => ClientRequest::Forfeit,
        ("confirm", []) => ClientRequest::ConfirmForfeit,
        ("cancel", []) => ClientRequest::CancelForfeit,
        ("lobby", []) => ClientRequest::ReturnToLobby,
        ("leaderboard", []) => ClientRequest::Leaderboard,
        ("stats", []) => ClientRequest::Stats,
        ("history", []) => ClientRequest::History,
        ("logout", []) => ClientRequest::Logout,
        ("quit" | "exit", []) => ClientRequest::Shutdown,
        (
            "login" | "register" | "connect" | "disconnect" | "users" | "invites" | "invite"
            | "accept" | "reject" | "bot" | "move" | "forfeit" | "confirm" | "cancel" | "lobby"
            | "leaderboard" | "stats" | "history" | "logout" | "quit" | "exit",
            _,
        ) => return Err(format!("wrong arguments for '{command}'; type 'help'")),
        _ => return Err(format!("unknown command '{command}'; type 'help'")),
    };
    Ok(request)
}

fn parse_invitation(raw: &str) -> Result<InvitationId, String> {
    InvitationId::parse(raw).map_err(|_| format!("not an invitation id: {raw}"))
}

/// Draw the board; empty cells show their index, winning cells are bracketed
pub fn render_board(state: &MatchState) -> String {
    let highlighted = state.highlighted();
    let mut out = String::new();
    for (row, cells) in state.board().rows().enumerate() {
        if row > 0 {
            out.push_str("\n---+---+---\n");
        }
        for (col, cell) in cells.iter().enumerate() {
            let index = row * 3 + col;
            let mark = match cell {
                Cell::Empty => char::from_digit(index as u32, 10).unwrap_or('?'),
                other => other.as_char(),
            };
            let is_win = highlighted.iter().any(|p| p.index() == index);
            if col > 0 {
                out.push('|');
            }
            if is_win {
                let _ = write!(out, "[{mark}]");
            } else {
                let _ = write!(out, " {mark} ");
            }
        }
    }
    out
}

fn turn_line(state: &MatchState, local_user: Option<UserId>) -> String {
    let owner = state.turn_owner();
    if local_user.is_some() && owner == local_user {
        return "Your turn".to_string();
    }
    let name = [state.player1(), state.player2()]
        .into_iter()
        .find(|slot| slot.id == owner)
        .map_or("opponent", |slot| slot.username.as_str());
    format!("Waiting for {name}")
}

/// Text for one notification
pub fn render_notification(notification: &ClientNotification, local_user: Option<UserId>) -> String {
    match notification {
        ClientNotification::LoggedIn { username, .. } => format!("Logged in as {username}"),
        ClientNotification::LoggedOut => "Logged out".to_string(),
        ClientNotification::Connecting => "Connecting...".to_string(),
        ClientNotification::SessionReady {
            username, resumed, ..
        } => {
            if *resumed {
                format!("Session restored for {username}")
            } else {
                format!("Connected as {username}")
            }
        }
        ClientNotification::SessionRevoked { reason } => {
            format!("Session ended ({reason}); please log in again")
        }
        ClientNotification::ReauthRequested => "Re-authenticating...".to_string(),
        ClientNotification::Disconnected { reason } => format!("Disconnected: {reason}"),
        ClientNotification::PresenceChanged(users) => {
            if users.is_empty() {
                return "No other players online".to_string();
            }
            let mut out = String::from("Online:");
            for user in users {
                let status = if user.in_game { " (in game)" } else { "" };
                let _ = write!(out, "\n  #{} {}{status}", user.user_id, user.username);
            }
            out
        }
        ClientNotification::InvitationReceived(inv) => format!(
            "{} invited you (accept {} / reject {})",
            inv.from_username, inv.invitation_id, inv.invitation_id
        ),
        ClientNotification::InvitationSent { to_username } => {
            format!("Invitation sent to {to_username}")
        }
        ClientNotification::InvitationDeclined { invitation_id } => {
            format!("Invitation {invitation_id} was declined")
        }
        ClientNotification::PendingInvitations(list) => {
            if list.is_empty() {
                return "No pending invitations".to_string();
            }
            let mut out = String::from("Invitations:");
            for inv in list {
                let _ = write!(out, "\n  {} from {}", inv.invitation_id, inv.from_username);
            }
            out
        }
        ClientNotification::MatchStarted(state) => format!(
            "Match {}: {} (X) vs {} (O)",
            state.game_id(),
            state.player1().username,
            state.player2().username
        ),
        ClientNotification::MatchJoined { game_id } => format!("Joined match {game_id}"),
        ClientNotification::BoardChanged(state) => format!(
            "{}\n{}",
            render_board(state),
            turn_line(state, local_user)
        ),
        ClientNotification::MatchFinished { state, outcome } => {
            let headline = outcome.map_or("Match over", |o| o.headline());
            format!("{}\n{headline} (type 'lobby' to leave)", render_board(state))
        }
        ClientNotification::ForfeitPending { game_id } => {
            format!("Forfeit match {game_id}? type 'confirm' or 'cancel'")
        }
        ClientNotification::ReturnedToLobby => "Back in the lobby".to_string(),
        ClientNotification::ServerError { message } => format!("Server: {message}"),
        ClientNotification::RequestFailed { message, .. } => format!("Error: {message}"),
        ClientNotification::Leaderboard(entries) => {
            let mut out = String::from("Leaderboard:");
            for e in entries {
                let _ = write!(
                    out,
                    "\n  {:>2}. {:<20} {:>4} pts  {}W {}L {}D  {:.1}%",
                    e.rank, e.username, e.ranking_points, e.wins, e.losses, e.draws, e.win_rate
                );
            }
            out
        }
        ClientNotification::Stats(s) => format!(
            "Games {}  W {}  L {}  D {}  win rate {:.1}%  points {}  streak {} (best {})",
            s.total_games,
            s.wins,
            s.losses,
            s.draws,
            s.win_rate,
            s.ranking_points,
            s.current_streak,
            s.best_streak
        ),
        ClientNotification::History(entries) => {
            if entries.is_empty() {
                return "No finished games".to_string();
            }
            let mut out = String::from("History:");
            for e in entries {
                let when = e
                    .finished_at_naive()
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                let bot = if e.is_bot_game { " (bot)" } else { "" };
                let _ = write!(
                    out,
                    "\n  #{} vs {}{bot}: {:?} {when}",
                    e.game_id, e.opponent, e.result
                );
            }
            out
        }
    }
}
